//! Events produced by the game world, consumed by the network layer.

use serde::{Deserialize, Serialize};
use tile_rs_world::{CreatureId, Point};

use crate::ai::Fact;
use crate::combat::MissReason;
use crate::creature::{PlayerId, Skill};

/// A single changed creature attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "attribute", content = "value", rename_all = "snake_case")]
pub enum CreatureAttribute {
    Pos(Point),
    Life(i32),
    Stamina(i32),
    Mana(i32),
    Food(u32),
    TamedBy(Option<PlayerId>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    /// A creature entered the world.
    CreatureAdded {
        id: CreatureId,
        name: String,
        pos: Point,
    },
    /// A creature left the world (death or logout).
    CreatureRemoved { id: CreatureId, pos: Point },
    /// Some attributes of a creature changed.
    PartialCreatureUpdate {
        id: CreatureId,
        changes: Vec<CreatureAttribute>,
    },
    FloorChanged { pos: Point, floor: u16 },
    /// One-shot animation on a tile.
    Animation { pos: Point, name: String },
    /// Animation travelling between two tiles.
    ProjectileAnimation {
        from: Point,
        to: Point,
        name: String,
    },
    /// Skill experience granted to a player.
    Xp {
        player: PlayerId,
        skill: Skill,
        xp: u64,
    },
    /// A player's attack target changed server-side.
    SetAttackTarget {
        player: PlayerId,
        target: Option<CreatureId>,
    },
    AttackMissed {
        attacker: CreatureId,
        target: CreatureId,
        reason: MissReason,
    },
    /// A creature satisfied one of its goals.
    GoalCompleted { id: CreatureId, goal: Fact },
}

/// Outgoing events queued by world operations.
#[derive(Debug, Default)]
pub struct OutgoingEvents {
    pub events: Vec<GameEvent>,
}

impl OutgoingEvents {
    pub fn push(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn drain(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
