//! Creature data: vital stats, skills, equipment and behaviour flags.
//!
//! Creatures are shared by monsters and player avatars. Everything the AI
//! remembers between ticks lives in [`crate::ai::CreatureState`]; this module
//! only holds what the rest of the world can observe.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tile_rs_world::{CreatureId, Item, Point};

/// Identifies a connected player account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player {}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// A bounded resource such as life, stamina or mana.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stat {
    pub current: i32,
    pub max: i32,
}

impl Stat {
    pub fn full(max: i32) -> Self {
        Self { current: max, max }
    }

    pub fn is_full(&self) -> bool {
        self.current >= self.max
    }

    /// Add `delta` (negative to drain), never below zero or above `max`.
    /// Returns the change actually applied.
    pub fn adjust(&mut self, delta: i32) -> i32 {
        let before = self.current;
        let ceiling = self.max.max(before);
        self.current = (before + delta).clamp(0, ceiling);
        self.current - before
    }

    /// Spend `amount` if available.
    pub fn spend(&mut self, amount: i32) -> bool {
        if self.current < amount {
            return false;
        }
        self.current -= amount;
        true
    }
}

// ---------------------------------------------------------------------------
// Skills
// ---------------------------------------------------------------------------

/// Trainable combat skills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Skill {
    Unarmed,
    Melee,
    Ranged,
    Magic,
    MeleeDefense,
    RangedDefense,
    MagicDefense,
}

impl Skill {
    pub fn name(self) -> &'static str {
        match self {
            Skill::Unarmed => "unarmed",
            Skill::Melee => "melee",
            Skill::Ranged => "ranged",
            Skill::Magic => "magic",
            Skill::MeleeDefense => "melee defense",
            Skill::RangedDefense => "ranged defense",
            Skill::MagicDefense => "magic defense",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillValue {
    pub level: u32,
    pub xp: u64,
}

impl Default for SkillValue {
    fn default() -> Self {
        Self { level: 1, xp: 0 }
    }
}

/// Experience needed to advance from `level` to the next.
pub fn xp_for_next_level(level: u32) -> u64 {
    100 * u64::from(level.max(1))
}

/// Skill levels and experience. Skills never trained sit at level 1.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skills(BTreeMap<Skill, SkillValue>);

impl Skills {
    pub fn level(&self, skill: Skill) -> u32 {
        self.0.get(&skill).map(|v| v.level).unwrap_or(1)
    }

    pub fn get(&self, skill: Skill) -> SkillValue {
        self.0.get(&skill).copied().unwrap_or_default()
    }

    pub fn set_level(&mut self, skill: Skill, level: u32) {
        self.0.entry(skill).or_default().level = level.max(1);
    }

    /// Grant experience. Returns the number of levels gained.
    pub fn add_xp(&mut self, skill: Skill, xp: u64) -> u32 {
        let value = self.0.entry(skill).or_default();
        value.xp += xp;
        let mut gained = 0;
        while value.xp >= xp_for_next_level(value.level) {
            value.xp -= xp_for_next_level(value.level);
            value.level += 1;
            gained += 1;
        }
        gained
    }
}

// ---------------------------------------------------------------------------
// Creature
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentSlot {
    Head,
    Chest,
    Legs,
    Weapon,
    Shield,
}

/// Chance (percent) that an attack turn casts the given spell instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MagicChance {
    pub spell_id: u32,
    pub chance: u32,
}

/// Unarmed attack profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombatStats {
    pub damage_low: u32,
    pub damage_high: u32,
    /// Seconds between attacks.
    pub attack_speed: f32,
}

impl Default for CombatStats {
    fn default() -> Self {
        Self {
            damage_low: 0,
            damage_high: 1,
            attack_speed: 1.0,
        }
    }
}

/// Food value at which a grass eater is full.
pub const FULL_FOOD: u32 = 100;

/// Food value at or below which a grass eater goes looking for grass.
pub const HUNGRY_FOOD: u32 = 10;

/// A monster or player avatar in the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Creature {
    pub id: CreatureId,
    pub name: String,
    /// Monster template this creature was spawned from.
    pub template_id: Option<u32>,
    pub pos: Point,
    pub life: Stat,
    pub stamina: Stat,
    pub mana: Stat,
    /// Movement speed, 0 (slowest) to 10.
    pub speed: u32,
    pub combat: CombatStats,
    pub equipment: BTreeMap<EquipmentSlot, Item>,
    pub skills: Skills,
    pub tamed_by: Option<PlayerId>,
    pub roam: bool,
    pub eat_grass: bool,
    pub food: u32,
    pub magic_chances: Vec<MagicChance>,
    /// Set when a player controls this creature.
    pub player_id: Option<PlayerId>,
}

impl Creature {
    pub fn from_descriptor(id: CreatureId, pos: Point, desc: CreatureDescriptor) -> Self {
        let mut skills = Skills::default();
        for (skill, level) in desc.skills {
            skills.set_level(skill, level);
        }
        Self {
            id,
            name: desc.name,
            template_id: desc.template_id,
            pos,
            life: Stat::full(desc.life),
            stamina: Stat::full(desc.stamina),
            mana: Stat::full(desc.mana),
            speed: desc.speed,
            combat: desc.combat,
            equipment: desc.equipment,
            skills,
            tamed_by: desc.tamed_by,
            roam: desc.roam,
            eat_grass: desc.eat_grass,
            food: desc.food,
            magic_chances: desc.magic_chances,
            player_id: desc.player_id,
        }
    }

    pub fn is_player(&self) -> bool {
        self.player_id.is_some()
    }

    pub fn is_alive(&self) -> bool {
        self.life.current > 0
    }

    pub fn weapon(&self) -> Option<Item> {
        self.equipment.get(&EquipmentSlot::Weapon).copied()
    }

    pub fn is_hungry(&self) -> bool {
        self.eat_grass && self.food <= HUNGRY_FOOD
    }
}

/// Everything needed to create a creature except its id and position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatureDescriptor {
    pub name: String,
    #[serde(default)]
    pub template_id: Option<u32>,
    pub life: i32,
    #[serde(default = "default_pool")]
    pub stamina: i32,
    #[serde(default)]
    pub mana: i32,
    #[serde(default = "default_speed")]
    pub speed: u32,
    #[serde(default)]
    pub combat: CombatStats,
    #[serde(default)]
    pub equipment: BTreeMap<EquipmentSlot, Item>,
    #[serde(default)]
    pub skills: Vec<(Skill, u32)>,
    #[serde(default)]
    pub tamed_by: Option<PlayerId>,
    #[serde(default)]
    pub roam: bool,
    #[serde(default)]
    pub eat_grass: bool,
    #[serde(default = "default_food")]
    pub food: u32,
    #[serde(default)]
    pub magic_chances: Vec<MagicChance>,
    #[serde(default)]
    pub player_id: Option<PlayerId>,
}

fn default_pool() -> i32 {
    20
}

fn default_speed() -> u32 {
    5
}

fn default_food() -> u32 {
    FULL_FOOD
}

impl CreatureDescriptor {
    pub fn new(name: impl Into<String>, life: i32) -> Self {
        Self {
            name: name.into(),
            template_id: None,
            life,
            stamina: default_pool(),
            mana: 0,
            speed: default_speed(),
            combat: CombatStats::default(),
            equipment: BTreeMap::new(),
            skills: Vec::new(),
            tamed_by: None,
            roam: false,
            eat_grass: false,
            food: FULL_FOOD,
            magic_chances: Vec::new(),
            player_id: None,
        }
    }

    /// Descriptor for a player avatar.
    pub fn player(player: PlayerId, name: impl Into<String>) -> Self {
        let mut desc = Self::new(name, 50);
        desc.mana = 30;
        desc.speed = 6;
        desc.player_id = Some(player);
        desc
    }

    pub fn with_weapon(mut self, type_id: u32) -> Self {
        self.equipment.insert(EquipmentSlot::Weapon, Item::new(type_id));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stat_adjust_clamps() {
        let mut life = Stat::full(10);
        assert_eq!(life.adjust(-4), -4);
        assert_eq!(life.current, 6);
        assert_eq!(life.adjust(-20), -6);
        assert_eq!(life.current, 0);
        assert_eq!(life.adjust(25), 10);
        assert!(life.is_full());
    }

    #[test]
    fn stat_spend_requires_enough() {
        let mut mana = Stat::full(5);
        assert!(mana.spend(3));
        assert!(!mana.spend(3));
        assert_eq!(mana.current, 2);
    }

    #[test]
    fn skill_levels_up_with_xp() {
        let mut skills = Skills::default();
        assert_eq!(skills.level(Skill::Melee), 1);
        assert_eq!(skills.add_xp(Skill::Melee, 99), 0);
        assert_eq!(skills.add_xp(Skill::Melee, 1), 1);
        assert_eq!(skills.level(Skill::Melee), 2);
        // 200 to reach level 3, 300 more to reach level 4.
        assert_eq!(skills.add_xp(Skill::Melee, 500), 2);
        assert_eq!(skills.level(Skill::Melee), 4);
        assert_eq!(skills.get(Skill::Melee).xp, 0);
    }

    #[test]
    fn descriptor_builds_creature() {
        let desc = CreatureDescriptor::new("Rat", 10).with_weapon(10);
        let creature = Creature::from_descriptor(CreatureId(1), Point::new(0, 1, 2, 0), desc);
        assert_eq!(creature.life.current, 10);
        assert_eq!(creature.weapon().map(|i| i.type_id), Some(10));
        assert!(creature.is_alive());
        assert!(!creature.is_player());
        assert!(!creature.is_hungry());
    }

    #[test]
    fn hunger_needs_grass_eater() {
        let mut desc = CreatureDescriptor::new("Cow", 20);
        desc.food = 5;
        let mut creature = Creature::from_descriptor(CreatureId(1), Point::new(0, 0, 0, 0), desc);
        assert!(!creature.is_hungry());
        creature.eat_grass = true;
        assert!(creature.is_hungry());
    }
}
