//! Tile contents and floor value ranges.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// Nothing to stand on.
pub const VOID_FLOOR: u16 = 0;

/// Shallow water: walkable, but creatures do not regenerate while in it.
pub const WATER_FLOOR: u16 = 1;

/// Bare ground left behind once grass is eaten down.
pub const DIRT_FLOOR: u16 = 2;

/// Floor values that count as grass. Higher values are lusher.
pub const GRASS_FLOORS: RangeInclusive<u16> = 100..=199;

/// Whether a floor value is grass.
pub fn is_grass(floor: u16) -> bool {
    GRASS_FLOORS.contains(&floor)
}

/// Whether a floor value is water.
pub fn is_water(floor: u16) -> bool {
    floor == WATER_FLOOR
}

/// Stable identity of a creature, shared by the map (occupancy) and the
/// creature registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CreatureId(pub u32);

impl std::fmt::Display for CreatureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An item instance lying on a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Key into the item registry.
    pub type_id: u32,
    pub quantity: u32,
}

impl Item {
    pub fn new(type_id: u32) -> Self {
        Self {
            type_id,
            quantity: 1,
        }
    }
}

/// One map cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tile {
    pub floor: u16,
    pub item: Option<Item>,
    /// The creature standing here, if any.
    pub creature: Option<CreatureId>,
}

impl Tile {
    pub fn with_floor(floor: u16) -> Self {
        Self {
            floor,
            ..Default::default()
        }
    }
}
