//! Monster templates.
//!
//! Provides a registry of known monster types with their stats. Built-in
//! templates are hardcoded; more can be registered at runtime.

use serde::{Deserialize, Serialize};
use tile_rs_world::item_registry::item_id;

use crate::creature::{CombatStats, CreatureDescriptor, MagicChance, Skill};
use crate::spells::spell_id;

/// Well-known built-in template IDs.
pub mod monster_id {
    pub const RAT: u32 = 1;
    pub const COW: u32 = 2;
    pub const WOLF: u32 = 3;
    pub const GOBLIN_ARCHER: u32 = 4;
    pub const IMP: u32 = 5;
}

/// Definition of a monster type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonsterTemplate {
    pub id: u32,
    pub name: String,
    pub life: i32,
    #[serde(default)]
    pub mana: i32,
    pub speed: u32,
    pub combat: CombatStats,
    /// Item type ID of the equipped weapon.
    #[serde(default)]
    pub weapon: Option<u32>,
    #[serde(default)]
    pub roam: bool,
    #[serde(default)]
    pub eat_grass: bool,
    #[serde(default)]
    pub magic_chances: Vec<MagicChance>,
    #[serde(default)]
    pub skills: Vec<(Skill, u32)>,
}

impl MonsterTemplate {
    /// Creature descriptor for spawning an instance of this template.
    pub fn descriptor(&self) -> CreatureDescriptor {
        let mut desc = CreatureDescriptor::new(self.name.clone(), self.life);
        desc.template_id = Some(self.id);
        desc.mana = self.mana;
        desc.speed = self.speed;
        desc.combat = self.combat;
        desc.roam = self.roam;
        desc.eat_grass = self.eat_grass;
        desc.magic_chances = self.magic_chances.clone();
        desc.skills = self.skills.clone();
        match self.weapon {
            Some(weapon) => desc.with_weapon(weapon),
            None => desc,
        }
    }
}

/// Registry of spawnable monster types.
pub struct MonsterRegistry {
    templates: Vec<MonsterTemplate>,
}

impl Default for MonsterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MonsterRegistry {
    /// Build the registry with the built-in monsters.
    pub fn new() -> Self {
        Self {
            templates: vec![
                MonsterTemplate {
                    id: monster_id::RAT,
                    name: "Rat".into(),
                    life: 10,
                    mana: 0,
                    speed: 4,
                    combat: CombatStats {
                        damage_low: 1,
                        damage_high: 2,
                        attack_speed: 1.5,
                    },
                    weapon: None,
                    roam: true,
                    eat_grass: false,
                    magic_chances: Vec::new(),
                    skills: Vec::new(),
                },
                MonsterTemplate {
                    id: monster_id::COW,
                    name: "Cow".into(),
                    life: 25,
                    mana: 0,
                    speed: 2,
                    combat: CombatStats {
                        damage_low: 0,
                        damage_high: 1,
                        attack_speed: 2.0,
                    },
                    weapon: None,
                    roam: true,
                    eat_grass: true,
                    magic_chances: Vec::new(),
                    skills: Vec::new(),
                },
                MonsterTemplate {
                    id: monster_id::WOLF,
                    name: "Wolf".into(),
                    life: 30,
                    mana: 0,
                    speed: 6,
                    combat: CombatStats {
                        damage_low: 2,
                        damage_high: 5,
                        attack_speed: 1.0,
                    },
                    weapon: None,
                    roam: true,
                    eat_grass: false,
                    magic_chances: Vec::new(),
                    skills: vec![(Skill::Unarmed, 3)],
                },
                MonsterTemplate {
                    id: monster_id::GOBLIN_ARCHER,
                    name: "Goblin Archer".into(),
                    life: 35,
                    mana: 0,
                    speed: 4,
                    combat: CombatStats {
                        damage_low: 1,
                        damage_high: 3,
                        attack_speed: 1.5,
                    },
                    weapon: Some(item_id::SHORT_BOW),
                    roam: true,
                    eat_grass: false,
                    magic_chances: Vec::new(),
                    skills: vec![(Skill::Ranged, 4)],
                },
                MonsterTemplate {
                    id: monster_id::IMP,
                    name: "Imp".into(),
                    life: 25,
                    mana: 40,
                    speed: 5,
                    combat: CombatStats {
                        damage_low: 1,
                        damage_high: 2,
                        attack_speed: 2.0,
                    },
                    weapon: Some(item_id::OAK_WAND),
                    roam: true,
                    eat_grass: false,
                    magic_chances: vec![
                        MagicChance {
                            spell_id: spell_id::FIREBALL,
                            chance: 30,
                        },
                        MagicChance {
                            spell_id: spell_id::HEAL,
                            chance: 10,
                        },
                    ],
                    skills: vec![(Skill::Magic, 4)],
                },
            ],
        }
    }

    /// Look up a template by ID.
    pub fn get(&self, id: u32) -> Option<&MonsterTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    /// Look up a template by name (case-insensitive).
    pub fn by_name(&self, name: &str) -> Option<&MonsterTemplate> {
        self.templates
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }

    /// All known templates.
    pub fn all(&self) -> &[MonsterTemplate] {
        &self.templates
    }

    /// Register a custom template, replacing one with the same ID.
    pub fn register(&mut self, template: MonsterTemplate) {
        self.templates.retain(|t| t.id != template.id);
        self.templates.push(template);
    }
}
