//! Item type definitions.
//!
//! Provides walkability and sight blocking for map items, and weapon stats for
//! equipped items. Built-in definitions can be extended with custom ones.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Well-known built-in item type IDs.
pub mod item_id {
    pub const WALL: u32 = 1;
    pub const ROCK: u32 = 2;
    pub const FLOWER: u32 = 3;
    pub const WOODEN_SWORD: u32 = 10;
    pub const IRON_SWORD: u32 = 11;
    pub const SHORT_BOW: u32 = 20;
    pub const OAK_WAND: u32 = 30;
}

/// How a weapon is wielded. Decides which skills an attack trains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponClass {
    Melee,
    Ranged,
    Magic,
}

/// Combat stats for an item that can be equipped as a weapon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponStats {
    pub class: WeaponClass,
    pub damage_low: u32,
    pub damage_high: u32,
    /// Closest distance the weapon can be used from (Chebyshev tiles).
    pub min_range: u32,
    pub max_range: u32,
}

/// Properties for a single item type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDefinition {
    pub id: u32,
    pub name: String,
    /// Creatures can stand on a tile holding this item.
    pub walkable: bool,
    /// Breaks line of sight through the tile.
    pub blocks_sight: bool,
    #[serde(default)]
    pub weapon: Option<WeaponStats>,
}

/// Registry of all known item types.
pub struct ItemRegistry {
    by_id: HashMap<u32, ItemDefinition>,
}

impl Default for ItemRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemRegistry {
    /// Build the registry with the built-in item types.
    pub fn new() -> Self {
        let mut registry = Self {
            by_id: HashMap::new(),
        };
        for def in builtin_items() {
            registry.register(def);
        }
        registry
    }

    /// An empty registry with no definitions.
    pub fn empty() -> Self {
        Self {
            by_id: HashMap::new(),
        }
    }

    /// Look up an item definition by type ID.
    pub fn get(&self, id: u32) -> Option<&ItemDefinition> {
        self.by_id.get(&id)
    }

    /// Look up an item definition by display name (case-insensitive).
    pub fn by_name(&self, name: &str) -> Option<&ItemDefinition> {
        self.by_id
            .values()
            .find(|def| def.name.eq_ignore_ascii_case(name))
    }

    /// Register or replace an item definition.
    pub fn register(&mut self, def: ItemDefinition) {
        self.by_id.insert(def.id, def);
    }

    /// Number of registered definitions.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Whether an item of this type can be stood on. Unknown types block.
    pub fn is_walkable(&self, id: u32) -> bool {
        self.get(id).map(|d| d.walkable).unwrap_or(false)
    }

    /// Whether an item of this type blocks sight. Unknown types do not.
    pub fn blocks_sight(&self, id: u32) -> bool {
        self.get(id).map(|d| d.blocks_sight).unwrap_or(false)
    }

    /// Weapon stats for an item type, if it is a weapon.
    pub fn weapon(&self, id: u32) -> Option<&WeaponStats> {
        self.get(id).and_then(|d| d.weapon.as_ref())
    }
}

fn plain(id: u32, name: &str, walkable: bool, blocks_sight: bool) -> ItemDefinition {
    ItemDefinition {
        id,
        name: name.into(),
        walkable,
        blocks_sight,
        weapon: None,
    }
}

fn weapon(id: u32, name: &str, stats: WeaponStats) -> ItemDefinition {
    ItemDefinition {
        id,
        name: name.into(),
        walkable: true,
        blocks_sight: false,
        weapon: Some(stats),
    }
}

fn builtin_items() -> Vec<ItemDefinition> {
    vec![
        plain(item_id::WALL, "Wall", false, true),
        plain(item_id::ROCK, "Rock", false, false),
        plain(item_id::FLOWER, "Flower", true, false),
        weapon(
            item_id::WOODEN_SWORD,
            "Wooden Sword",
            WeaponStats {
                class: WeaponClass::Melee,
                damage_low: 1,
                damage_high: 4,
                min_range: 1,
                max_range: 1,
            },
        ),
        weapon(
            item_id::IRON_SWORD,
            "Iron Sword",
            WeaponStats {
                class: WeaponClass::Melee,
                damage_low: 3,
                damage_high: 7,
                min_range: 1,
                max_range: 1,
            },
        ),
        weapon(
            item_id::SHORT_BOW,
            "Short Bow",
            WeaponStats {
                class: WeaponClass::Ranged,
                damage_low: 2,
                damage_high: 5,
                min_range: 2,
                max_range: 6,
            },
        ),
        weapon(
            item_id::OAK_WAND,
            "Oak Wand",
            WeaponStats {
                class: WeaponClass::Magic,
                damage_low: 1,
                damage_high: 3,
                min_range: 2,
                max_range: 5,
            },
        ),
    ]
}
