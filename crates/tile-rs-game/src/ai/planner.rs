//! Goal planner: A* over sets of true facts.
//!
//! Nodes are fact sets. From a node, every action whose preconditions hold
//! adds one edge per effect not yet in the set. The search ends at the
//! first set containing the goal fact.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tile_rs_world::search::{self, Edge, SearchOutcome};
use tracing::trace;

use super::action::Action;
use super::fact::Fact;
use crate::error::GameError;

/// Wall-clock budget for one planning search.
pub const PLAN_TIMEOUT: Duration = Duration::from_millis(10);

/// A set of facts assumed true.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FactSet(BTreeSet<Fact>);

impl FactSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, fact: Fact) -> bool {
        self.0.contains(&fact)
    }

    pub fn insert(&mut self, fact: Fact) -> bool {
        self.0.insert(fact)
    }

    /// A copy with `fact` added.
    pub fn with(&self, fact: Fact) -> Self {
        let mut next = self.clone();
        next.insert(fact);
        next
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Fact> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Fact> for FactSet {
    fn from_iter<I: IntoIterator<Item = Fact>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for FactSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, fact) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            f.write_str(fact.name())?;
        }
        Ok(())
    }
}

/// Every fact some action lists as a precondition.
pub fn precondition_facts(actions: &[Arc<dyn Action>]) -> BTreeSet<Fact> {
    actions
        .iter()
        .flat_map(|a| a.preconditions().iter().copied())
        .collect()
}

/// Search for the cheapest action chain reaching `goal` from `initial`.
///
/// Returns the chain in execution order, or `None` when the goal is
/// unreachable or the search timed out.
pub fn plan(
    actions: &[Arc<dyn Action>],
    goal: Fact,
    initial: &FactSet,
    timeout: Option<Duration>,
) -> Option<Vec<Arc<dyn Action>>> {
    let base = initial.len();
    let outcome = search::astar(
        initial.clone(),
        |state: &FactSet| state.contains(goal),
        |state: &FactSet| {
            let mut edges = Vec::new();
            for (index, action) in actions.iter().enumerate() {
                if !action.preconditions().iter().all(|f| state.contains(*f)) {
                    continue;
                }
                for effect in action.effects() {
                    if state.contains(*effect) {
                        continue;
                    }
                    edges.push(Edge {
                        to: state.with(*effect),
                        label: index,
                        cost: action.cost(),
                    });
                }
            }
            edges
        },
        |state: &FactSet| state.len().saturating_sub(base) as f32,
        timeout,
    );

    match outcome {
        SearchOutcome::Success(path) => {
            Some(path.labels().map(|i| Arc::clone(&actions[*i])).collect())
        }
        SearchOutcome::NoPath(_) => {
            trace!("No plan for '{}' from [{}]", goal, initial);
            None
        }
        SearchOutcome::Timeout(_) => {
            trace!("Planning for '{}' from [{}] timed out", goal, initial);
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Plans
// ---------------------------------------------------------------------------

/// A cached action chain for one goal.
#[derive(Clone)]
pub struct Plan {
    pub goal: Fact,
    /// Stored back to front: the next step is last.
    stack: Vec<Arc<dyn Action>>,
    pub should_recreate: bool,
}

impl Plan {
    /// Build from actions in execution order.
    pub fn new(goal: Fact, steps: Vec<Arc<dyn Action>>) -> Self {
        let mut stack = steps;
        stack.reverse();
        Self {
            goal,
            stack,
            should_recreate: false,
        }
    }

    pub fn next(&self) -> Option<&Arc<dyn Action>> {
        self.stack.last()
    }

    /// Drop the current step.
    pub fn advance(&mut self) -> Option<Arc<dyn Action>> {
        self.stack.pop()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    /// Remaining step names in execution order.
    pub fn step_names(&self) -> Vec<&'static str> {
        self.stack.iter().rev().map(|a| a.name()).collect()
    }

    pub fn record(&self) -> PlanRecord {
        PlanRecord {
            goal: self.goal,
            steps: self.step_names().into_iter().map(String::from).collect(),
        }
    }
}

impl fmt::Debug for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plan")
            .field("goal", &self.goal)
            .field("steps", &self.step_names())
            .field("should_recreate", &self.should_recreate)
            .finish()
    }
}

/// Serializable form of a plan, for logging and replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanRecord {
    pub goal: Fact,
    /// Action names in execution order.
    pub steps: Vec<String>,
}

impl PlanRecord {
    /// Rebuild the plan against an action catalog.
    pub fn restore(&self, actions: &[Arc<dyn Action>]) -> Result<Plan, GameError> {
        let steps = self
            .steps
            .iter()
            .map(|name| {
                actions
                    .iter()
                    .find(|a| a.name() == name.as_str())
                    .cloned()
                    .ok_or_else(|| GameError::UnknownAction(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Plan::new(self.goal, steps))
    }
}
