//! Built-in actions.

use std::sync::Arc;

use rand::Rng;
use tile_rs_world::tile::is_grass;
use tile_rs_world::CreatureId;
use tracing::{debug, warn};

use super::action::{Action, ActionContext, ActionStatus};
use super::fact::Fact;
use super::state::CreatureState;
use crate::clock::Rate;
use crate::creature::FULL_FOOD;
use crate::events::CreatureAttribute;
use crate::game_world::GameWorld;
use crate::spells::Spell;

/// How far a wanderer strays per leg, in each axis.
pub const WANDER_RADIUS: i32 = 3;
/// Longest path a follower will take before giving up.
pub const MAX_FOLLOW_PATH: usize = 20;
/// How long a follower waits after setting out.
pub const FOLLOW_PAUSE: Rate = Rate::Seconds(2.0);
/// Food gained per bite.
pub const FOOD_PER_BITE: u32 = 10;
/// How much a bite lowers the floor value.
pub const GRAZED_FLOOR_DROP: u16 = 20;
pub const EAT_PAUSE: Rate = Rate::Seconds(10.0);
/// Search radius for the nearest grass tile.
pub const GRASS_SEARCH_RADIUS: u32 = 8;

/// The standard action catalog every monster plans with.
pub fn default_actions() -> Vec<Arc<dyn Action>> {
    vec![
        Arc::new(Wander),
        Arc::new(AttackTarget),
        Arc::new(FollowTarget),
        Arc::new(EvadeTarget),
        Arc::new(EatGrass),
        Arc::new(FindGrass),
    ]
}

fn position(world: &GameWorld, id: CreatureId) -> Option<tile_rs_world::Point> {
    world.creatures.get(id).map(|c| c.pos)
}

// ---------------------------------------------------------------------------
// Wander
// ---------------------------------------------------------------------------

/// Stroll to random nearby tiles. Never finishes on its own.
#[derive(Debug)]
pub struct Wander;

impl Action for Wander {
    fn name(&self) -> &'static str {
        "Wander"
    }

    fn cost(&self) -> f32 {
        100.0
    }

    fn preconditions(&self) -> &[Fact] {
        &[]
    }

    fn effects(&self) -> &[Fact] {
        &[Fact::Wander]
    }

    fn is_available(&self, state: &CreatureState, _world: &GameWorld) -> bool {
        state.target().is_none()
    }

    fn tick(&self, ctx: &mut ActionContext<'_>) -> ActionStatus {
        if ctx.state.has_path() {
            return ActionStatus::Continue;
        }
        let Some(pos) = position(ctx.world, ctx.state.id) else {
            return ActionStatus::Failed;
        };
        let dx = ctx.world.rng.gen_range(-WANDER_RADIUS..=WANDER_RADIUS);
        let dy = ctx.world.rng.gen_range(-WANDER_RADIUS..=WANDER_RADIUS);
        let path = ctx.world.find_path(pos, pos.offset(dx, dy));
        ctx.state.set_path(path);
        ActionStatus::Continue
    }
}

// ---------------------------------------------------------------------------
// Combat
// ---------------------------------------------------------------------------

/// Attack the current target, sometimes with a spell.
#[derive(Debug)]
pub struct AttackTarget;

/// Roll the creature's magic chances. Only affordable spells are picked.
fn roll_spell(world: &mut GameWorld, id: CreatureId) -> Option<Spell> {
    let creature = world.creatures.get(id)?;
    if creature.magic_chances.is_empty() {
        return None;
    }
    let roll = world.rng.gen_range(0..100u32);
    let mut threshold = 0;
    for chance in &creature.magic_chances {
        threshold += chance.chance;
        if roll < threshold {
            let spell = world.spells.get(chance.spell_id)?;
            if creature.mana.current < spell.mana {
                return None;
            }
            return Some(spell.clone());
        }
    }
    None
}

impl Action for AttackTarget {
    fn name(&self) -> &'static str {
        "AttackTarget"
    }

    fn cost(&self) -> f32 {
        10.0
    }

    fn preconditions(&self) -> &[Fact] {
        &[Fact::NearTarget]
    }

    fn effects(&self) -> &[Fact] {
        &[Fact::KillCreature]
    }

    fn is_available(&self, state: &CreatureState, _world: &GameWorld) -> bool {
        state.timers().attack == 0
    }

    fn tick(&self, ctx: &mut ActionContext<'_>) -> ActionStatus {
        let spell = roll_spell(ctx.world, ctx.state.id);
        ctx.state.attack(ctx.world, ctx.peers, spell, false);
        // Cooldown-gated: only lands if the spell attempt did not.
        ctx.state.attack(ctx.world, ctx.peers, None, false);
        ActionStatus::Continue
    }
}

/// Walk toward the follow target until within usable range.
#[derive(Debug)]
pub struct FollowTarget;

impl Action for FollowTarget {
    fn name(&self) -> &'static str {
        "FollowTarget"
    }

    fn cost(&self) -> f32 {
        1.0
    }

    fn preconditions(&self) -> &[Fact] {
        &[Fact::TooFarTarget]
    }

    fn effects(&self) -> &[Fact] {
        &[Fact::NearTarget]
    }

    fn tick(&self, ctx: &mut ActionContext<'_>) -> ActionStatus {
        let (Some(from), Some(to)) = (
            position(ctx.world, ctx.state.id),
            ctx.state.follow_target(ctx.world).map(|c| c.pos),
        ) else {
            ctx.state.give_up_target();
            return ActionStatus::Failed;
        };
        let path = ctx.world.find_path(from, to);
        if path.is_empty() || path.len() >= MAX_FOLLOW_PATH {
            debug!(
                "Creature {} cannot reach {} ({} steps), giving up",
                ctx.state.id,
                to,
                path.len()
            );
            ctx.state.give_up_target();
            return ActionStatus::Failed;
        }
        ctx.state.set_path(path);
        let pause = ctx.world.clock.rate_to_ticks(FOLLOW_PAUSE);
        ctx.state.idle(pause);
        ActionStatus::Continue
    }
}

/// Step directly away from the attack target.
#[derive(Debug)]
pub struct EvadeTarget;

impl Action for EvadeTarget {
    fn name(&self) -> &'static str {
        "EvadeTarget"
    }

    fn cost(&self) -> f32 {
        5.0
    }

    fn preconditions(&self) -> &[Fact] {
        &[Fact::TooCloseTarget]
    }

    fn effects(&self) -> &[Fact] {
        &[Fact::HiddenFromTarget, Fact::NearTarget]
    }

    fn tick(&self, ctx: &mut ActionContext<'_>) -> ActionStatus {
        let Some(target) = ctx.state.target() else {
            return ActionStatus::Failed;
        };
        let (Some(me), Some(threat)) = (position(ctx.world, ctx.state.id), position(ctx.world, target))
        else {
            return ActionStatus::Failed;
        };
        let (dx, dy) = match me.direction_away_from(threat) {
            (0, 0) => (1, 0),
            away => away,
        };
        let path = ctx.world.find_path(me, me.offset(dx, dy));
        ctx.state.set_path(path);
        ActionStatus::Continue
    }
}

// ---------------------------------------------------------------------------
// Grazing
// ---------------------------------------------------------------------------

/// Eat the grass underfoot.
#[derive(Debug)]
pub struct EatGrass;

impl Action for EatGrass {
    fn name(&self) -> &'static str {
        "EatGrass"
    }

    fn cost(&self) -> f32 {
        1.0
    }

    fn preconditions(&self) -> &[Fact] {
        &[Fact::OnGrass]
    }

    fn effects(&self) -> &[Fact] {
        &[Fact::Food]
    }

    fn tick(&self, ctx: &mut ActionContext<'_>) -> ActionStatus {
        let id = ctx.state.id;
        let Some(creature) = ctx.world.creatures.get_mut(id) else {
            return ActionStatus::Failed;
        };
        creature.food = (creature.food + FOOD_PER_BITE).min(FULL_FOOD);
        let (food, pos) = (creature.food, creature.pos);
        ctx.world
            .broadcast_partial_creature_update(id, vec![CreatureAttribute::Food(food)]);

        if let Some(floor) = ctx.world.map.floor(pos) {
            if let Err(err) = ctx.world.set_floor(pos, floor.saturating_sub(GRAZED_FLOOR_DROP)) {
                warn!("Creature {} could not graze at {}: {}", id, pos, err);
            }
        }

        let pause = ctx.world.clock.rate_to_ticks(EAT_PAUSE);
        ctx.state.idle(pause);
        if food >= FULL_FOOD {
            ActionStatus::Complete
        } else {
            ActionStatus::Continue
        }
    }
}

/// Walk to the nearest free grass tile, or somewhere random if none is near.
#[derive(Debug)]
pub struct FindGrass;

impl Action for FindGrass {
    fn name(&self) -> &'static str {
        "FindGrass"
    }

    fn cost(&self) -> f32 {
        1.0
    }

    fn preconditions(&self) -> &[Fact] {
        &[]
    }

    fn effects(&self) -> &[Fact] {
        &[Fact::OnGrass]
    }

    fn tick(&self, ctx: &mut ActionContext<'_>) -> ActionStatus {
        if ctx.state.fact(Fact::OnGrass, ctx.world) {
            return ActionStatus::Complete;
        }
        if ctx.state.has_path() {
            return ActionStatus::Continue;
        }
        let Some(pos) = position(ctx.world, ctx.state.id) else {
            return ActionStatus::Failed;
        };
        let map = &ctx.world.map;
        let found = map.find_nearest(pos, GRASS_SEARCH_RADIUS, false, |p, tile| {
            is_grass(tile.floor) && map.walkable(p)
        });
        let dest = match found {
            Some(dest) => dest,
            None => {
                let r = GRASS_SEARCH_RADIUS as i32;
                let dx = ctx.world.rng.gen_range(-r..=r);
                let dy = ctx.world.rng.gen_range(-r..=r);
                pos.offset(dx, dy)
            }
        };
        let path = ctx.world.find_path(pos, dest);
        ctx.state.set_path(path);
        ActionStatus::Continue
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::creature::CreatureDescriptor;
    use crate::game_world::test_support::flat_world;
    use tile_rs_world::item_registry::item_id;
    use tile_rs_world::tile::DIRT_FLOOR;
    use tile_rs_world::{GridPathPlanner, Item, Point};

    /// Open world whose path searches never time out.
    fn world(size: u32) -> GameWorld {
        flat_world(size, DIRT_FLOOR).with_path_planner(Box::new(GridPathPlanner {
            margin: 10,
            timeout: None,
        }))
    }

    fn spawn(world: &mut GameWorld, name: &str, x: i32, y: i32) -> CreatureId {
        world
            .create_creature(CreatureDescriptor::new(name, 10), Point::new(0, x, y, 0))
            .unwrap()
    }

    fn run(action: &dyn Action, state: &mut CreatureState, world: &mut GameWorld) -> ActionStatus {
        let mut peers = BTreeMap::new();
        action.tick(&mut ActionContext {
            state,
            world,
            peers: &mut peers,
        })
    }

    fn hunting(me: CreatureId, target: CreatureId) -> CreatureState {
        let mut state = CreatureState::with_default_actions(me);
        state.add_enemy(target);
        state.set_target(Some(target));
        state
    }

    #[test]
    fn follow_sets_path_and_pauses() {
        let mut world = world(30);
        let me = spawn(&mut world, "Wolf", 5, 5);
        let prey = spawn(&mut world, "Rat", 9, 5);
        let mut state = hunting(me, prey);

        assert_eq!(run(&FollowTarget, &mut state, &mut world), ActionStatus::Continue);
        assert_eq!(state.path().len(), 4);
        assert_eq!(state.path().back(), Some(&Point::new(0, 9, 5, 0)));
        assert_eq!(state.timers().idle, world.clock.rate_to_ticks(FOLLOW_PAUSE));
        assert_eq!(state.target(), Some(prey));
    }

    #[test]
    fn follow_gives_up_on_distant_target() {
        let mut world = world(40);
        let me = spawn(&mut world, "Wolf", 2, 2);
        let prey = spawn(&mut world, "Rat", 25, 25);
        let mut state = hunting(me, prey);

        assert_eq!(run(&FollowTarget, &mut state, &mut world), ActionStatus::Failed);
        assert_eq!(state.target(), None);
        assert!(!state.enemies().contains(&prey));
        assert!(!state.has_path());
    }

    #[test]
    fn follow_gives_up_on_walled_in_target() {
        let mut world = world(30);
        let me = spawn(&mut world, "Wolf", 5, 5);
        let prey_pos = Point::new(0, 10, 10, 0);
        let prey = spawn(&mut world, "Rat", prey_pos.x, prey_pos.y);
        for n in prey_pos.neighbors4() {
            world
                .map
                .set_item(n, Some(Item::new(item_id::WALL)))
                .unwrap();
        }
        let mut state = hunting(me, prey);

        assert_eq!(run(&FollowTarget, &mut state, &mut world), ActionStatus::Failed);
        assert_eq!(state.target(), None);
        assert!(state.enemies().is_empty());
    }

    #[test]
    fn evade_steps_away_from_target() {
        let mut world = world(30);
        let me = spawn(&mut world, "Archer", 10, 10);
        let threat = spawn(&mut world, "Wolf", 8, 10);
        let mut state = hunting(me, threat);

        assert_eq!(run(&EvadeTarget, &mut state, &mut world), ActionStatus::Continue);
        assert_eq!(
            state.path().iter().copied().collect::<Vec<_>>(),
            vec![Point::new(0, 11, 10, 0)]
        );
    }

    #[test]
    fn evade_without_target_fails() {
        let mut world = world(30);
        let me = spawn(&mut world, "Archer", 10, 10);
        let mut state = CreatureState::with_default_actions(me);

        assert_eq!(run(&EvadeTarget, &mut state, &mut world), ActionStatus::Failed);
        assert!(!state.has_path());
    }
}
