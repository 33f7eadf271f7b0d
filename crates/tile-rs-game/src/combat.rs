//! Attack resolution: range and sight checks, resource costs, block rolls,
//! damage, experience and death.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tile_rs_world::item_registry::{WeaponClass, WeaponStats};
use tile_rs_world::CreatureId;
use tracing::debug;

use crate::creature::{Creature, Skill};
use crate::events::{CreatureAttribute, GameEvent};
use crate::game_world::GameWorld;
use crate::spells::{Spell, SpellTarget};

/// Lowest and highest chance an attack gets past the defender.
const MIN_HIT_CHANCE: f64 = 0.1;
const MAX_HIT_CHANCE: f64 = 0.95;

/// Experience for successfully defending.
const BLOCK_XP: u64 = 5;

/// Why an attack did not land.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissReason {
    AttackerMissing,
    TargetMissing,
    TargetDead,
    OutOfRange,
    NoLineOfSight,
    NotEnoughStamina,
    NotEnoughMana,
    Blocked,
}

/// What an attack consumes from the attacker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackCost {
    Stamina(i32),
    Mana(i32),
}

/// A single attack or spell cast, fully resolved before it is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct AttackDescriptor {
    pub actor: CreatureId,
    pub target: CreatureId,
    /// Life removed from the target. Zero for non-damaging spells.
    pub damage: i32,
    /// Life restored to the target.
    pub heal: i32,
    pub can_be_blocked: bool,
    pub cost: AttackCost,
    pub attack_skill: Skill,
    pub defense_skill: Option<Skill>,
    pub min_range: u32,
    pub max_range: u32,
    pub line_of_sight: bool,
    pub spell: Option<u32>,
    pub success_animation: Option<String>,
    pub projectile_animation: Option<String>,
}

// ---------------------------------------------------------------------------
// Building attacks
// ---------------------------------------------------------------------------

/// Attack and defense skills trained by a weapon class. `None` is unarmed.
pub fn skills_for_weapon(class: Option<WeaponClass>) -> (Skill, Skill) {
    match class {
        None => (Skill::Unarmed, Skill::MeleeDefense),
        Some(WeaponClass::Melee) => (Skill::Melee, Skill::MeleeDefense),
        Some(WeaponClass::Ranged) => (Skill::Ranged, Skill::RangedDefense),
        Some(WeaponClass::Magic) => (Skill::Magic, Skill::MagicDefense),
    }
}

fn roll_between(rng: &mut impl Rng, a: i32, b: i32) -> i32 {
    let (low, high) = (a.min(b), a.max(b));
    rng.gen_range(low..=high)
}

/// A plain weapon (or unarmed) attack on `target`.
pub fn weapon_attack(
    attacker: &Creature,
    target: CreatureId,
    weapon: Option<WeaponStats>,
    rng: &mut impl Rng,
) -> AttackDescriptor {
    let class = weapon.map(|w| w.class);
    let (low, high, min_range, max_range) = match weapon {
        Some(w) => (w.damage_low, w.damage_high, w.min_range, w.max_range),
        None => (attacker.combat.damage_low, attacker.combat.damage_high, 1, 1),
    };
    let (attack_skill, defense_skill) = skills_for_weapon(class);
    let projectile_animation = match class {
        Some(WeaponClass::Ranged) => Some("arrow".to_string()),
        Some(WeaponClass::Magic) => Some("magic_bolt".to_string()),
        _ => None,
    };
    AttackDescriptor {
        actor: attacker.id,
        target,
        damage: roll_between(rng, low as i32, high as i32),
        heal: 0,
        can_be_blocked: true,
        cost: AttackCost::Stamina(1),
        attack_skill,
        defense_skill: Some(defense_skill),
        min_range,
        max_range,
        line_of_sight: matches!(class, Some(WeaponClass::Ranged | WeaponClass::Magic)),
        spell: None,
        success_animation: Some("hit".to_string()),
        projectile_animation,
    }
}

/// Casting `spell`. Self-targeted spells ignore `target`.
pub fn spell_attack(
    caster: &Creature,
    target: CreatureId,
    spell: &Spell,
    rng: &mut impl Rng,
) -> AttackDescriptor {
    let target = match spell.target {
        SpellTarget::Caster => caster.id,
        SpellTarget::Other => target,
    };
    let (damage, heal) = if spell.is_damaging() {
        let base = -spell.life;
        let spread = (base as f32 * spell.variance).round() as i32;
        (roll_between(rng, base - spread, base + spread).max(0), 0)
    } else {
        (0, spell.life)
    };
    let at_other = spell.target == SpellTarget::Other;
    AttackDescriptor {
        actor: caster.id,
        target,
        damage,
        heal,
        can_be_blocked: spell.is_damaging(),
        cost: AttackCost::Mana(spell.mana),
        attack_skill: spell.skill,
        defense_skill: spell.is_damaging().then_some(Skill::MagicDefense),
        min_range: spell.min_range,
        max_range: spell.max_range,
        line_of_sight: at_other,
        spell: Some(spell.id),
        success_animation: spell.animation.clone(),
        projectile_animation: spell.projectile_animation.clone(),
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Chance an attack at `attack` skill level gets past `defense`.
pub fn hit_chance(attack: u32, defense: u32) -> f64 {
    let attack = f64::from(attack.max(1));
    let defense = f64::from(defense.max(1));
    (attack / (attack + defense) + 0.25).clamp(MIN_HIT_CHANCE, MAX_HIT_CHANCE)
}

/// Resolve an attack. Returns why it missed, or `None` when it landed.
///
/// A landed attack drains the target (or heals it), trains the attacker's
/// skill, plays animations, and removes the target if it died.
pub fn handle_attack(world: &mut GameWorld, attack: &AttackDescriptor) -> Option<MissReason> {
    let miss = check_and_pay(world, attack);
    if let Some(reason) = miss {
        debug!(
            "Attack {} -> {} missed: {:?}",
            attack.actor, attack.target, reason
        );
        world.events.push(GameEvent::AttackMissed {
            attacker: attack.actor,
            target: attack.target,
            reason,
        });
        return miss;
    }
    apply(world, attack);
    None
}

fn check_and_pay(world: &mut GameWorld, attack: &AttackDescriptor) -> Option<MissReason> {
    let Some(actor) = world.creatures.get(attack.actor) else {
        return Some(MissReason::AttackerMissing);
    };
    let Some(target) = world.creatures.get(attack.target) else {
        return Some(MissReason::TargetMissing);
    };
    if !target.is_alive() {
        return Some(MissReason::TargetDead);
    }

    if attack.actor != attack.target {
        let distance = actor.pos.max_diff(target.pos);
        if distance < attack.min_range || distance > attack.max_range {
            return Some(MissReason::OutOfRange);
        }
        if attack.line_of_sight && !world.map.has_line_of_sight(actor.pos, target.pos) {
            return Some(MissReason::NoLineOfSight);
        }
    }

    let defense_level = attack
        .defense_skill
        .map(|skill| target.skills.level(skill))
        .unwrap_or(1);
    let attack_level = actor.skills.level(attack.attack_skill);

    let Some(actor) = world.creatures.get_mut(attack.actor) else {
        return Some(MissReason::AttackerMissing);
    };
    let change = match attack.cost {
        AttackCost::Stamina(amount) => {
            if !actor.stamina.spend(amount) {
                return Some(MissReason::NotEnoughStamina);
            }
            CreatureAttribute::Stamina(actor.stamina.current)
        }
        AttackCost::Mana(amount) => {
            if !actor.mana.spend(amount) {
                return Some(MissReason::NotEnoughMana);
            }
            CreatureAttribute::Mana(actor.mana.current)
        }
    };
    world.broadcast_partial_creature_update(attack.actor, vec![change]);

    if attack.can_be_blocked && attack.defense_skill.is_some() {
        let chance = hit_chance(attack_level, defense_level);
        if !world.rng.gen_bool(chance) {
            if let Some(skill) = attack.defense_skill {
                grant_xp(world, attack.target, skill, BLOCK_XP);
            }
            return Some(MissReason::Blocked);
        }
    }
    None
}

fn apply(world: &mut GameWorld, attack: &AttackDescriptor) {
    let Some(target) = world.creatures.get_mut(attack.target) else {
        return;
    };
    let before = target.life.current;
    if attack.damage > 0 {
        target.life.adjust(-attack.damage);
    }
    if attack.heal > 0 {
        target.life.adjust(attack.heal);
    }
    let life = target.life.current;
    let target_pos = target.pos;
    let dead = !target.is_alive();
    if life != before {
        world.broadcast_partial_creature_update(attack.target, vec![CreatureAttribute::Life(life)]);
    }

    let xp = u64::from(attack.damage.max(attack.heal).max(1).unsigned_abs()) * 2;
    grant_xp(world, attack.actor, attack.attack_skill, xp);

    if let Some(name) = &attack.projectile_animation {
        if let Some(actor) = world.creatures.get(attack.actor) {
            let from = actor.pos;
            world.events.push(GameEvent::ProjectileAnimation {
                from,
                to: target_pos,
                name: name.clone(),
            });
        }
    }
    if let Some(name) = &attack.success_animation {
        world.animate(target_pos, name.clone());
    }

    if dead {
        debug!("Creature {} killed by {}", attack.target, attack.actor);
        world.animate(target_pos, "death");
        world.remove_creature(attack.target);
    }
}

fn grant_xp(world: &mut GameWorld, id: CreatureId, skill: Skill, xp: u64) {
    let Some(creature) = world.creatures.get_mut(id) else {
        return;
    };
    let gained = creature.skills.add_xp(skill, xp);
    if gained > 0 {
        debug!(
            "Creature {} reached {} level {}",
            id,
            skill.name(),
            creature.skills.level(skill)
        );
    }
    if let Some(player) = creature.player_id {
        world.events.push(GameEvent::Xp { player, skill, xp });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creature::CreatureDescriptor;
    use crate::game_world::test_support::flat_world;
    use crate::spells::{spell_id, SpellBook};
    use tile_rs_world::item_registry::item_id;
    use tile_rs_world::tile::{Item, DIRT_FLOOR};
    use tile_rs_world::Point;

    fn unblockable(actor: CreatureId, target: CreatureId, damage: i32) -> AttackDescriptor {
        AttackDescriptor {
            actor,
            target,
            damage,
            heal: 0,
            can_be_blocked: false,
            cost: AttackCost::Stamina(1),
            attack_skill: Skill::Unarmed,
            defense_skill: None,
            min_range: 1,
            max_range: 1,
            line_of_sight: false,
            spell: None,
            success_animation: None,
            projectile_animation: None,
        }
    }

    fn pair(world: &mut GameWorld, gap: i32) -> (CreatureId, CreatureId) {
        let a = world
            .create_creature(CreatureDescriptor::new("A", 20), Point::new(0, 5, 5, 0))
            .unwrap();
        let b = world
            .create_creature(CreatureDescriptor::new("B", 10), Point::new(0, 5 + gap, 5, 0))
            .unwrap();
        (a, b)
    }

    #[test]
    fn hit_drains_life_and_stamina() {
        let mut world = flat_world(20, DIRT_FLOOR);
        let (a, b) = pair(&mut world, 1);
        assert_eq!(handle_attack(&mut world, &unblockable(a, b, 4)), None);
        assert_eq!(world.creature(b).unwrap().life.current, 6);
        let attacker = world.creature(a).unwrap();
        assert_eq!(attacker.stamina.current, attacker.stamina.max - 1);
        assert!(attacker.skills.get(Skill::Unarmed).xp > 0);
    }

    #[test]
    fn out_of_range_misses() {
        let mut world = flat_world(20, DIRT_FLOOR);
        let (a, b) = pair(&mut world, 3);
        assert_eq!(
            handle_attack(&mut world, &unblockable(a, b, 4)),
            Some(MissReason::OutOfRange)
        );
        assert_eq!(world.creature(b).unwrap().life.current, 10);
    }

    #[test]
    fn wall_blocks_ranged_attack() {
        let mut world = flat_world(20, DIRT_FLOOR);
        let (a, b) = pair(&mut world, 3);
        world
            .map
            .set_item(Point::new(0, 6, 5, 0), Some(Item::new(item_id::WALL)))
            .unwrap();
        let mut attack = unblockable(a, b, 4);
        attack.max_range = 5;
        attack.line_of_sight = true;
        assert_eq!(
            handle_attack(&mut world, &attack),
            Some(MissReason::NoLineOfSight)
        );
    }

    #[test]
    fn no_stamina_no_attack() {
        let mut world = flat_world(20, DIRT_FLOOR);
        let (a, b) = pair(&mut world, 1);
        world.creatures.get_mut(a).unwrap().stamina.current = 0;
        assert_eq!(
            handle_attack(&mut world, &unblockable(a, b, 4)),
            Some(MissReason::NotEnoughStamina)
        );
    }

    #[test]
    fn lethal_hit_removes_target() {
        let mut world = flat_world(20, DIRT_FLOOR);
        let (a, b) = pair(&mut world, 1);
        assert_eq!(handle_attack(&mut world, &unblockable(a, b, 50)), None);
        assert!(world.creature(b).is_none());
        assert_eq!(world.take_removed(), vec![b]);
        assert_eq!(
            handle_attack(&mut world, &unblockable(a, b, 1)),
            Some(MissReason::TargetMissing)
        );
    }

    #[test]
    fn self_heal_spends_mana() {
        let mut world = flat_world(20, DIRT_FLOOR);
        let mut desc = CreatureDescriptor::new("Imp", 30);
        desc.mana = 20;
        let imp = world.create_creature(desc, Point::new(0, 2, 2, 0)).unwrap();
        world.creatures.get_mut(imp).unwrap().life.current = 10;
        let book = SpellBook::new();
        let heal = book.get(spell_id::HEAL).unwrap();
        let caster = world.creature(imp).unwrap().clone();
        let attack = spell_attack(&caster, CreatureId(999), heal, &mut world.rng);
        assert_eq!(attack.target, imp);
        assert_eq!(attack.damage, 0);
        assert_eq!(handle_attack(&mut world, &attack), None);
        let imp = world.creature(imp).unwrap();
        assert_eq!(imp.life.current, 20);
        assert_eq!(imp.mana.current, 12);
    }

    #[test]
    fn fireball_damage_within_variance() {
        let mut world = flat_world(20, DIRT_FLOOR);
        let (a, b) = pair(&mut world, 2);
        let book = SpellBook::new();
        let fireball = book.get(spell_id::FIREBALL).unwrap();
        let caster = world.creature(a).unwrap().clone();
        for _ in 0..50 {
            let attack = spell_attack(&caster, b, fireball, &mut world.rng);
            assert!((6..=10).contains(&attack.damage));
            assert_eq!(attack.cost, AttackCost::Mana(10));
            assert!(attack.line_of_sight);
        }
    }

    #[test]
    fn bow_attack_is_ranged() {
        let mut world = flat_world(20, DIRT_FLOOR);
        let (a, b) = pair(&mut world, 4);
        let bow = world.map.items.weapon(item_id::SHORT_BOW).copied();
        let archer = world.creature(a).unwrap().clone();
        let attack = weapon_attack(&archer, b, bow, &mut world.rng);
        assert_eq!(attack.attack_skill, Skill::Ranged);
        assert_eq!(attack.defense_skill, Some(Skill::RangedDefense));
        assert!(attack.line_of_sight);
        assert!((2..=5).contains(&attack.damage));
    }

    #[test]
    fn hit_chance_is_bounded() {
        assert!(hit_chance(1, 1000) >= MIN_HIT_CHANCE);
        assert!(hit_chance(1000, 1) <= MAX_HIT_CHANCE);
        assert!(hit_chance(5, 1) > hit_chance(1, 5));
    }
}
