//! The action trait the planner chains together.

use std::collections::BTreeMap;

use tile_rs_world::CreatureId;

use super::fact::Fact;
use super::state::CreatureState;
use crate::game_world::GameWorld;

/// Result of running an action for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionStatus {
    /// Done; move on to the next step of the plan.
    Complete,
    /// Could not proceed; the plan must be rebuilt.
    Failed,
    /// Still working. The step ends once its effects hold.
    Continue,
}

/// Mutable access an action gets while it runs.
pub struct ActionContext<'a> {
    pub state: &'a mut CreatureState,
    pub world: &'a mut GameWorld,
    /// AI states of every other creature.
    pub peers: &'a mut BTreeMap<CreatureId, CreatureState>,
}

/// A step a creature can take toward a goal.
///
/// Actions are stateless and shared between creatures; anything they need
/// to remember lives on the [`CreatureState`].
pub trait Action: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &'static str;

    fn cost(&self) -> f32;

    /// Facts that must hold before the action may run.
    fn preconditions(&self) -> &[Fact];

    /// Facts the action makes true.
    fn effects(&self) -> &[Fact];

    /// Extra gate checked before running, beyond the preconditions.
    fn is_available(&self, _state: &CreatureState, _world: &GameWorld) -> bool {
        true
    }

    fn tick(&self, _ctx: &mut ActionContext<'_>) -> ActionStatus {
        ActionStatus::Continue
    }
}
