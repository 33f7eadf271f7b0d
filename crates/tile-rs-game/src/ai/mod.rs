//! Creature AI: facts, goals, actions, the goal planner, and per-creature
//! decision state.

pub mod action;
pub mod actions;
pub mod fact;
pub mod goal;
pub mod planner;
pub mod state;

pub use action::{Action, ActionContext, ActionStatus};
pub use fact::{Fact, FactCache};
pub use goal::{Goal, GoalCondition};
pub use planner::{Plan, PlanRecord};
pub use state::CreatureState;
