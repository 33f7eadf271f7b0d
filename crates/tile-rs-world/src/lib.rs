//! World management: tiles, sectors, items, spatial queries, and pathfinding.

pub mod error;
pub mod item_registry;
pub mod map;
pub mod pathfinding;
pub mod position;
pub mod search;
pub mod sector;
pub mod tile;

pub use error::WorldError;
pub use map::{Partition, WorldMap};
pub use pathfinding::{GridPathPlanner, PathPlanner};
pub use position::Point;
pub use tile::{CreatureId, Item, Tile};
