//! Game-level errors.

use thiserror::Error;
use tile_rs_world::{CreatureId, Point, WorldError};

use crate::creature::PlayerId;

#[derive(Debug, Error)]
pub enum GameError {
    #[error("unknown creature: {0}")]
    UnknownCreature(CreatureId),

    #[error("unknown monster template: {0}")]
    UnknownMonster(u32),

    #[error("unknown spell: {0}")]
    UnknownSpell(u32),

    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("tile is not walkable: {0}")]
    NotWalkable(Point),

    #[error("player {0:?} has no creature in the world")]
    PlayerNotConnected(PlayerId),

    #[error("player {0:?} is already connected")]
    PlayerAlreadyConnected(PlayerId),

    #[error("cannot move from {from} to {to}")]
    InvalidMove { from: Point, to: Point },

    #[error("invalid target: {0}")]
    InvalidTarget(CreatureId),

    #[error("creature {0} is already tamed")]
    AlreadyTamed(CreatureId),

    #[error("world error: {0}")]
    World(#[from] WorldError),
}
