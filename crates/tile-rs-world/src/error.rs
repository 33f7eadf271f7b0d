//! World-level errors.

use thiserror::Error;

use crate::position::Point;

#[derive(Debug, Error)]
pub enum WorldError {
    #[error("unknown partition: {0}")]
    UnknownPartition(u32),

    #[error("partition {0} already exists")]
    DuplicatePartition(u32),

    #[error("position out of bounds: {0}")]
    OutOfBounds(Point),

    #[error("failed to load sector ({x},{y},{z}) of partition {w}: {reason}")]
    SectorLoad {
        w: u32,
        x: u32,
        y: u32,
        z: u32,
        reason: String,
    },

    #[error("unknown item type: {0}")]
    UnknownItem(u32),
}
