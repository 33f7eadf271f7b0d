//! Spell definitions.

use serde::{Deserialize, Serialize};

use crate::creature::Skill;

/// Well-known built-in spell IDs.
pub mod spell_id {
    pub const FIREBALL: u32 = 1;
    pub const HEAL: u32 = 2;
    pub const MEND_OTHER: u32 = 3;
    pub const LIGHTNING: u32 = 4;
}

/// Who a spell lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpellTarget {
    /// The caster.
    Caster,
    /// The caster's current attack target.
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spell {
    pub id: u32,
    pub name: String,
    pub target: SpellTarget,
    /// Life change on the target. Negative values are damage.
    pub life: i32,
    /// Fractional spread applied to damage, e.g. 0.2 for +/-20%.
    #[serde(default)]
    pub variance: f32,
    pub mana: i32,
    pub skill: Skill,
    #[serde(default)]
    pub min_range: u32,
    #[serde(default)]
    pub max_range: u32,
    /// Animation played on the target on success.
    #[serde(default)]
    pub animation: Option<String>,
    /// Animation travelling from caster to target.
    #[serde(default)]
    pub projectile_animation: Option<String>,
}

impl Spell {
    pub fn is_damaging(&self) -> bool {
        self.life < 0
    }
}

/// All spells creatures can cast.
pub struct SpellBook {
    spells: Vec<Spell>,
}

impl Default for SpellBook {
    fn default() -> Self {
        Self::new()
    }
}

impl SpellBook {
    pub fn new() -> Self {
        Self {
            spells: vec![
                Spell {
                    id: spell_id::FIREBALL,
                    name: "Fireball".into(),
                    target: SpellTarget::Other,
                    life: -8,
                    variance: 0.25,
                    mana: 10,
                    skill: Skill::Magic,
                    min_range: 1,
                    max_range: 6,
                    animation: Some("fire".into()),
                    projectile_animation: Some("fireball".into()),
                },
                Spell {
                    id: spell_id::HEAL,
                    name: "Heal".into(),
                    target: SpellTarget::Caster,
                    life: 10,
                    variance: 0.0,
                    mana: 8,
                    skill: Skill::Magic,
                    min_range: 0,
                    max_range: 0,
                    animation: Some("sparkle".into()),
                    projectile_animation: None,
                },
                Spell {
                    id: spell_id::MEND_OTHER,
                    name: "Mend Other".into(),
                    target: SpellTarget::Other,
                    life: 8,
                    variance: 0.0,
                    mana: 8,
                    skill: Skill::Magic,
                    min_range: 1,
                    max_range: 4,
                    animation: Some("sparkle".into()),
                    projectile_animation: None,
                },
                Spell {
                    id: spell_id::LIGHTNING,
                    name: "Lightning".into(),
                    target: SpellTarget::Other,
                    life: -14,
                    variance: 0.5,
                    mana: 20,
                    skill: Skill::Magic,
                    min_range: 2,
                    max_range: 8,
                    animation: Some("lightning".into()),
                    projectile_animation: None,
                },
            ],
        }
    }

    pub fn get(&self, id: u32) -> Option<&Spell> {
        self.spells.iter().find(|s| s.id == id)
    }

    pub fn by_name(&self, name: &str) -> Option<&Spell> {
        self.spells.iter().find(|s| s.name.eq_ignore_ascii_case(name))
    }

    pub fn all(&self) -> &[Spell] {
        &self.spells
    }

    /// Register a spell, replacing one with the same ID.
    pub fn register(&mut self, spell: Spell) {
        self.spells.retain(|s| s.id != spell.id);
        self.spells.push(spell);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fireball_damages_other() {
        let book = SpellBook::new();
        let fireball = book.get(spell_id::FIREBALL).unwrap();
        assert!(fireball.is_damaging());
        assert_eq!(fireball.target, SpellTarget::Other);
    }

    #[test]
    fn heal_targets_caster() {
        let book = SpellBook::new();
        let heal = book.by_name("HEAL").unwrap();
        assert!(!heal.is_damaging());
        assert_eq!(heal.target, SpellTarget::Caster);
    }

    #[test]
    fn spell_from_json_uses_defaults() {
        let spell: Spell = serde_json::from_str(
            r#"{"id":9,"name":"Poke","target":"other","life":-1,"mana":1,"skill":"magic"}"#,
        )
        .unwrap();
        assert_eq!(spell.variance, 0.0);
        assert!(spell.animation.is_none());
        let mut book = SpellBook::new();
        book.register(spell);
        assert!(book.get(9).is_some());
    }
}
