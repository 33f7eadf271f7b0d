//! Goals: a desired fact, a priority, and when the goal counts as done.

use std::fmt;

use tile_rs_world::CreatureId;

use super::fact::Fact;
use crate::creature::{Creature, PlayerId};
use crate::game_world::GameWorld;

/// Priorities of the built-in goals. Higher runs first.
pub mod priority {
    pub const KILL_TARGET: i32 = 100;
    pub const HIDE_FROM_TARGET: i32 = 90;
    pub const FOLLOW_OWNER: i32 = 50;
    pub const EAT: i32 = 10;
    pub const ROAM: i32 = 1;
}

/// When a goal is satisfied.
pub enum GoalCondition {
    /// Food reached at least this value.
    FoodAtLeast(u32),
    /// The creature is gone or dead.
    CreatureDead(CreatureId),
    /// Owner is offline, or within `range` tiles.
    NearOwner { owner: PlayerId, range: u32 },
    /// The creature is a grass eater that got hungry.
    UntilHungry,
    Never,
    Custom(Box<dyn Fn(&Creature, &GameWorld) -> bool + Send + Sync>),
}

impl fmt::Debug for GoalCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GoalCondition::FoodAtLeast(n) => f.debug_tuple("FoodAtLeast").field(n).finish(),
            GoalCondition::CreatureDead(id) => f.debug_tuple("CreatureDead").field(id).finish(),
            GoalCondition::NearOwner { owner, range } => f
                .debug_struct("NearOwner")
                .field("owner", owner)
                .field("range", range)
                .finish(),
            GoalCondition::UntilHungry => f.write_str("UntilHungry"),
            GoalCondition::Never => f.write_str("Never"),
            GoalCondition::Custom(_) => f.write_str("Custom"),
        }
    }
}

type DoneCallback = Box<dyn FnMut(CreatureId, &mut GameWorld) + Send>;

pub struct Goal {
    pub desired_effect: Fact,
    pub priority: i32,
    pub condition: GoalCondition,
    /// Drop the goal instead of replanning when no plan exists or an action fails.
    pub do_not_retry: bool,
    on_done: Option<DoneCallback>,
}

impl Goal {
    pub fn new(desired_effect: Fact, priority: i32, condition: GoalCondition) -> Self {
        Self {
            desired_effect,
            priority,
            condition,
            do_not_retry: false,
            on_done: None,
        }
    }

    pub fn do_not_retry(mut self) -> Self {
        self.do_not_retry = true;
        self
    }

    /// Run `callback` once the goal is satisfied.
    pub fn on_done(mut self, callback: impl FnMut(CreatureId, &mut GameWorld) + Send + 'static) -> Self {
        self.on_done = Some(Box::new(callback));
        self
    }

    pub fn is_satisfied(&self, creature: &Creature, world: &GameWorld) -> bool {
        match &self.condition {
            GoalCondition::FoodAtLeast(food) => creature.food >= *food,
            GoalCondition::CreatureDead(id) => world
                .creatures
                .get(*id)
                .map(|c| !c.is_alive())
                .unwrap_or(true),
            GoalCondition::NearOwner { owner, range } => {
                match world.creatures.creature_for_player(*owner) {
                    None => true,
                    Some(owner) => creature.pos.max_diff(owner.pos) <= *range,
                }
            }
            GoalCondition::UntilHungry => creature.is_hungry(),
            GoalCondition::Never => false,
            GoalCondition::Custom(check) => check(creature, world),
        }
    }

    pub(crate) fn complete(&mut self, id: CreatureId, world: &mut GameWorld) {
        if let Some(callback) = self.on_done.as_mut() {
            callback(id, world);
        }
    }
}

impl fmt::Debug for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Goal")
            .field("desired_effect", &self.desired_effect)
            .field("priority", &self.priority)
            .field("condition", &self.condition)
            .field("do_not_retry", &self.do_not_retry)
            .finish()
    }
}

/// Insert `goal` keeping `goals` sorted by descending priority. Equal
/// priorities keep insertion order. Replaces any goal with the same effect.
pub fn insert_sorted(goals: &mut Vec<Goal>, goal: Goal) {
    goals.retain(|g| g.desired_effect != goal.desired_effect);
    let index = goals
        .iter()
        .position(|g| g.priority < goal.priority)
        .unwrap_or(goals.len());
    goals.insert(index, goal);
}
