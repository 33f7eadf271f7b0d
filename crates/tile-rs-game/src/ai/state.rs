//! Per-creature AI state and the creature tick.
//!
//! Each tick runs, in order: spell cleanup, timer countdown, regeneration,
//! standing goals (hunger, roaming, following an owner), goal completion,
//! player attacks, planning, one movement step, target acquisition, and
//! finally one action from the highest-priority goal with a usable plan.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use tile_rs_world::tile::is_water;
use tile_rs_world::{CreatureId, Point};
use tracing::{debug, trace};

use super::action::{Action, ActionContext, ActionStatus};
use super::actions::default_actions;
use super::fact::{self, Fact, FactCache, FactContext};
use super::goal::{self, priority, Goal, GoalCondition};
use super::planner::{self, FactSet, Plan, PLAN_TIMEOUT};
use crate::clock::Rate;
use crate::combat;
use crate::creature::{Creature, FULL_FOOD};
use crate::events::{CreatureAttribute, GameEvent};
use crate::game_world::GameWorld;
use crate::spells::{Spell, SpellTarget};

/// Delay between steps, indexed by `len - speed` (clamped).
pub const MOVEMENT_DELAYS_MS: [u64; 10] = [400, 500, 600, 800, 1000, 1500, 2000, 3000, 4000, 5000];
/// Enemies further than this are ignored when choosing a target.
pub const TARGET_CUTOFF: u32 = 20;
/// Interval between regeneration ticks.
pub const REGEN_RATE: Rate = Rate::Seconds(2.0);
/// How close a tamed creature stays to its owner.
pub const TAME_FOLLOW_RANGE: u32 = 2;

pub fn movement_delay_ms(speed: u32) -> u64 {
    let last = MOVEMENT_DELAYS_MS.len() as i64 - 1;
    let index = (MOVEMENT_DELAYS_MS.len() as i64 - i64::from(speed)).clamp(0, last);
    MOVEMENT_DELAYS_MS[index as usize]
}

/// Countdowns in ticks. Zero means ready.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timers {
    pub attack: u64,
    pub movement: u64,
    pub idle: u64,
    pub regeneration: u64,
}

impl Timers {
    fn decrement(&mut self) {
        self.attack = self.attack.saturating_sub(1);
        self.movement = self.movement.saturating_sub(1);
        self.idle = self.idle.saturating_sub(1);
        self.regeneration = self.regeneration.saturating_sub(1);
    }
}

pub struct CreatureState {
    pub id: CreatureId,
    actions: Vec<Arc<dyn Action>>,
    /// Sorted by descending priority.
    goals: Vec<Goal>,
    plans: BTreeMap<Fact, Plan>,
    recreate_all: bool,
    target: Option<CreatureId>,
    enemies: Vec<CreatureId>,
    path: VecDeque<Point>,
    timers: Timers,
    current_spell: Option<u32>,
    facts: FactCache,
    plan_timeout: Option<Duration>,
    plans_built: u64,
}

impl std::fmt::Debug for CreatureState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreatureState")
            .field("id", &self.id)
            .field("goals", &self.goals)
            .field("plans", &self.plans)
            .field("target", &self.target)
            .field("enemies", &self.enemies)
            .field("path_len", &self.path.len())
            .field("timers", &self.timers)
            .finish()
    }
}

impl CreatureState {
    pub fn new(id: CreatureId, actions: Vec<Arc<dyn Action>>) -> Self {
        Self {
            id,
            actions,
            goals: Vec::new(),
            plans: BTreeMap::new(),
            recreate_all: false,
            target: None,
            enemies: Vec::new(),
            path: VecDeque::new(),
            timers: Timers::default(),
            current_spell: None,
            facts: FactCache::default(),
            plan_timeout: Some(PLAN_TIMEOUT),
            plans_built: 0,
        }
    }

    /// State using the built-in action catalog.
    pub fn with_default_actions(id: CreatureId) -> Self {
        Self::new(id, default_actions())
    }

    pub fn with_plan_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.plan_timeout = timeout;
        self
    }

    pub fn actions(&self) -> &[Arc<dyn Action>] {
        &self.actions
    }

    // -----------------------------------------------------------------------
    // Goals and plans
    // -----------------------------------------------------------------------

    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    pub fn has_goal(&self, effect: Fact) -> bool {
        self.goals.iter().any(|g| g.desired_effect == effect)
    }

    /// Add a goal in priority order, replacing one with the same effect.
    pub fn add_goal(&mut self, goal: Goal) {
        self.plans.remove(&goal.desired_effect);
        goal::insert_sorted(&mut self.goals, goal);
    }

    pub fn remove_goal(&mut self, effect: Fact) {
        self.goals.retain(|g| g.desired_effect != effect);
        self.plans.remove(&effect);
    }

    /// Drop every goal and plan.
    pub fn reset_goals(&mut self) {
        self.goals.clear();
        self.plans.clear();
        self.recreate_all = true;
    }

    pub fn plan(&self, effect: Fact) -> Option<&Plan> {
        self.plans.get(&effect)
    }

    /// Force every plan to be rebuilt on the next tick.
    pub fn invalidate_all_plans(&mut self) {
        self.recreate_all = true;
    }

    /// Total plans built since creation.
    pub fn plans_built(&self) -> u64 {
        self.plans_built
    }

    // -----------------------------------------------------------------------
    // Targets
    // -----------------------------------------------------------------------

    pub fn target(&self) -> Option<CreatureId> {
        self.target
    }

    /// Set the attack target directly (player commands).
    pub fn set_target(&mut self, target: Option<CreatureId>) {
        self.target = target;
    }

    pub fn enemies(&self) -> &[CreatureId] {
        &self.enemies
    }

    pub fn add_enemy(&mut self, enemy: CreatureId) {
        if enemy != self.id && !self.enemies.contains(&enemy) {
            self.enemies.push(enemy);
        }
    }

    pub fn forget_enemy(&mut self, enemy: CreatureId) {
        self.enemies.retain(|e| *e != enemy);
    }

    /// Stop hunting the current target and forget it as an enemy.
    pub fn give_up_target(&mut self) {
        if let Some(target) = self.target.take() {
            self.forget_enemy(target);
            self.reset_goals();
        }
        self.path.clear();
    }

    /// The creature to stay in range of: the attack target, else the owner
    /// of a tamed creature.
    pub fn follow_target<'w>(&self, world: &'w GameWorld) -> Option<&'w Creature> {
        follow_target_of(self.id, self.target, world)
    }

    /// Forget a creature that left the world.
    pub fn respond_to_creature_removal(&mut self, id: CreatureId) {
        self.forget_enemy(id);
        if self.target == Some(id) {
            self.target = None;
            self.current_spell = None;
            self.path.clear();
            self.reset_goals();
        }
    }

    // -----------------------------------------------------------------------
    // Movement, timers, spells
    // -----------------------------------------------------------------------

    pub fn path(&self) -> &VecDeque<Point> {
        &self.path
    }

    pub fn has_path(&self) -> bool {
        !self.path.is_empty()
    }

    pub fn set_path(&mut self, path: Vec<Point>) {
        self.path = path.into();
    }

    pub fn clear_path(&mut self) {
        self.path.clear();
    }

    pub fn timers(&self) -> Timers {
        self.timers
    }

    /// Pause action selection for `ticks`.
    pub fn idle(&mut self, ticks: u64) {
        self.timers.idle = ticks;
    }

    pub fn current_spell(&self) -> Option<u32> {
        self.current_spell
    }

    pub fn set_current_spell(&mut self, spell: Option<u32>) {
        self.current_spell = spell;
    }

    // -----------------------------------------------------------------------
    // Facts
    // -----------------------------------------------------------------------

    /// Value of `fact` this tick, memoized until [`CreatureState::clear_facts`].
    pub fn fact(&mut self, fact: Fact, world: &GameWorld) -> bool {
        let (id, target) = (self.id, self.target);
        self.facts
            .get_or_eval(fact, || evaluate_fact(id, target, fact, world))
    }

    pub fn clear_facts(&mut self) {
        self.facts.clear();
    }


    // -----------------------------------------------------------------------
    // Combat
    // -----------------------------------------------------------------------

    /// Attack the current target (or cast `spell`) if the attack cooldown
    /// allows. `pending` marks a spell queued by a player command; damaging
    /// pending spells are used up and clear the target.
    pub fn attack(
        &mut self,
        world: &mut GameWorld,
        peers: &mut BTreeMap<CreatureId, CreatureState>,
        spell: Option<Spell>,
        pending: bool,
    ) {
        if self.timers.attack > 0 {
            return;
        }
        let Some(creature) = world.creatures.get(self.id) else {
            return;
        };
        let attack_speed = creature.combat.attack_speed;
        let descriptor = match (&spell, self.target) {
            (Some(spell), _) if spell.target == SpellTarget::Caster => {
                combat::spell_attack(creature, self.id, spell, &mut world.rng)
            }
            (Some(spell), Some(target)) => {
                combat::spell_attack(creature, target, spell, &mut world.rng)
            }
            (None, Some(target)) => {
                let weapon = creature
                    .weapon()
                    .and_then(|item| world.map.items.weapon(item.type_id))
                    .copied();
                combat::weapon_attack(creature, target, weapon, &mut world.rng)
            }
            (_, None) => return,
        };

        let miss = combat::handle_attack(world, &descriptor);
        self.timers.attack = world.clock.rate_to_ticks(Rate::Seconds(attack_speed));

        if miss.is_none() {
            let regen = world.clock.rate_to_ticks(REGEN_RATE);
            self.timers.regeneration = regen;
            if descriptor.target != self.id {
                if let Some(peer) = peers.get_mut(&descriptor.target) {
                    peer.timers.regeneration = regen;
                    // Friendly spells do not provoke.
                    if spell.as_ref().map_or(true, |s| s.is_damaging()) {
                        peer.add_enemy(self.id);
                    }
                }
            }
        }

        if pending && spell.as_ref().is_some_and(|s| s.is_damaging()) {
            self.current_spell = None;
            self.target = None;
            if let Some(player) = world.creatures.get(self.id).and_then(|c| c.player_id) {
                world.events.push(GameEvent::SetAttackTarget {
                    player,
                    target: None,
                });
            }
        }
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Advance this creature by one tick. `peers` holds every other
    /// creature's state.
    pub fn tick(&mut self, world: &mut GameWorld, peers: &mut BTreeMap<CreatureId, CreatureState>) {
        let Some(creature) = world.creatures.get(self.id) else {
            return;
        };
        let is_player = creature.is_player();
        self.facts.clear();

        self.drop_stale_spell(world);
        self.timers.decrement();
        self.regenerate(world);
        self.assert_standing_goals(world);
        self.complete_satisfied_goals(world);

        if is_player {
            let spell = self
                .current_spell
                .and_then(|id| world.spells.get(id).cloned());
            self.attack(world, peers, spell, true);
            return;
        }

        self.create_plans(world);
        self.step_movement(world);
        self.acquire_target(world);

        if self.timers.idle > 0 || self.plans.is_empty() || self.goals.is_empty() {
            return;
        }
        self.act(world, peers);
    }

    /// Only spells aimed at another creature stay queued between ticks.
    fn drop_stale_spell(&mut self, world: &GameWorld) {
        if let Some(id) = self.current_spell {
            let keep = world
                .spells
                .get(id)
                .is_some_and(|s| s.target == SpellTarget::Other);
            if !keep {
                self.current_spell = None;
            }
        }
    }

    fn regenerate(&mut self, world: &mut GameWorld) {
        if self.timers.regeneration > 0 {
            return;
        }
        let Some(creature) = world.creatures.get_mut(self.id) else {
            return;
        };
        if world.map.floor(creature.pos).is_some_and(is_water) {
            return;
        }
        let mut changes = Vec::new();
        if !creature.stamina.is_full() {
            creature.stamina.adjust(1);
            changes.push(CreatureAttribute::Stamina(creature.stamina.current));
        }
        if !creature.mana.is_full() {
            creature.mana.adjust(1);
            changes.push(CreatureAttribute::Mana(creature.mana.current));
        }
        self.timers.regeneration = world.clock.rate_to_ticks(REGEN_RATE);
        world.broadcast_partial_creature_update(self.id, changes);
    }

    fn assert_standing_goals(&mut self, world: &GameWorld) {
        let Some(creature) = world.creatures.get(self.id) else {
            return;
        };
        if self.goals.is_empty() && creature.is_hungry() {
            self.add_goal(Goal::new(
                Fact::Food,
                priority::EAT,
                GoalCondition::FoodAtLeast(FULL_FOOD),
            ));
        }
        if self.goals.is_empty() && creature.roam && !creature.is_player() {
            self.add_goal(Goal::new(
                Fact::Wander,
                priority::ROAM,
                GoalCondition::UntilHungry,
            ));
        }
        if let Some(owner) = creature.tamed_by {
            if self.target.is_none() && !self.has_goal(Fact::NearTarget) {
                let follow = Goal::new(
                    Fact::NearTarget,
                    priority::FOLLOW_OWNER,
                    GoalCondition::NearOwner {
                        owner,
                        range: TAME_FOLLOW_RANGE,
                    },
                );
                if !follow.is_satisfied(creature, world) {
                    self.add_goal(follow);
                }
            }
        }
    }

    fn complete_satisfied_goals(&mut self, world: &mut GameWorld) {
        let Some(creature) = world.creatures.get(self.id) else {
            return;
        };
        let (finished, remaining): (Vec<Goal>, Vec<Goal>) = std::mem::take(&mut self.goals)
            .into_iter()
            .partition(|g| g.is_satisfied(creature, world));
        self.goals = remaining;

        for mut goal in finished {
            let effect = goal.desired_effect;
            debug!("Creature {} completed goal '{}'", self.id, effect);
            self.plans.remove(&effect);
            goal.complete(self.id, world);
            world.events.push(GameEvent::GoalCompleted {
                id: self.id,
                goal: effect,
            });
        }
    }

    fn create_plans(&mut self, world: &GameWorld) {
        if self.recreate_all {
            self.plans.clear();
            self.recreate_all = false;
        }
        let stale: Vec<Fact> = self
            .goals
            .iter()
            .map(|g| g.desired_effect)
            .filter(|effect| {
                self.plans
                    .get(effect)
                    .map_or(true, |p| p.should_recreate || p.is_empty())
            })
            .collect();
        if stale.is_empty() {
            return;
        }

        self.facts.clear();
        let initial: FactSet = planner::precondition_facts(&self.actions)
            .into_iter()
            .filter(|f| self.fact(*f, world))
            .collect();

        for effect in stale {
            match planner::plan(&self.actions, effect, &initial, self.plan_timeout) {
                Some(steps) => {
                    let plan = Plan::new(effect, steps);
                    trace!(
                        "Creature {} planned '{}' from [{}]: {:?}",
                        self.id,
                        effect,
                        initial,
                        plan.step_names()
                    );
                    self.plans_built += 1;
                    self.plans.insert(effect, plan);
                }
                None => {
                    self.plans.remove(&effect);
                }
            }
        }
    }

    /// Gated by the movement timer alone; a pending attack cooldown does not
    /// hold a creature in place.
    fn step_movement(&mut self, world: &mut GameWorld) {
        if self.timers.movement > 0 {
            return;
        }
        let Some(&next) = self.path.front() else {
            return;
        };
        let Some(creature) = world.creatures.get(self.id) else {
            return;
        };
        let (pos, speed) = (creature.pos, creature.speed);
        if pos.max_diff(next) != 1 || !world.map.walkable(next) {
            self.path.clear();
            return;
        }
        self.path.pop_front();
        if let Err(err) = world.move_creature(self.id, next) {
            debug!("Creature {} could not step to {}: {}", self.id, next, err);
            self.path.clear();
            return;
        }
        self.timers.movement = world
            .clock
            .rate_to_ticks(Rate::Millis(movement_delay_ms(speed)));
    }

    /// With no target, hunt the nearest enemy within [`TARGET_CUTOFF`].
    fn acquire_target(&mut self, world: &GameWorld) {
        if self.target.is_some() || self.enemies.is_empty() {
            return;
        }
        let Some(me) = world.creatures.get(self.id) else {
            return;
        };
        self.enemies.retain(|id| world.creatures.contains(*id));
        let nearest = self
            .enemies
            .iter()
            .filter_map(|id| world.creatures.get(*id))
            .filter(|enemy| enemy.is_alive())
            .map(|enemy| (me.pos.max_diff(enemy.pos), enemy.id))
            .filter(|(distance, _)| *distance <= TARGET_CUTOFF)
            .min_by_key(|(distance, _)| *distance);

        if let Some((distance, enemy)) = nearest {
            debug!(
                "Creature {} targets {} at distance {}",
                self.id, enemy, distance
            );
            self.reset_goals();
            self.target = Some(enemy);
            self.path.clear();
            self.add_goal(Goal::new(
                Fact::KillCreature,
                priority::KILL_TARGET,
                GoalCondition::CreatureDead(enemy),
            ));
            self.add_goal(Goal::new(
                Fact::HiddenFromTarget,
                priority::HIDE_FROM_TARGET,
                GoalCondition::CreatureDead(enemy),
            ));
        }
    }

    fn act(&mut self, world: &mut GameWorld, peers: &mut BTreeMap<CreatureId, CreatureState>) {
        let candidates: Vec<(Fact, bool)> = self
            .goals
            .iter()
            .map(|g| (g.desired_effect, g.do_not_retry))
            .collect();

        let mut abandoned = Vec::new();
        let mut chosen = None;
        for (effect, do_not_retry) in candidates {
            let action = match self.plans.get(&effect) {
                None => {
                    if do_not_retry {
                        abandoned.push(effect);
                    }
                    continue;
                }
                Some(plan) if plan.should_recreate => continue,
                Some(plan) => match plan.next() {
                    Some(action) => Arc::clone(action),
                    None => continue,
                },
            };
            if !action.is_available(self, world) {
                continue;
            }
            if !action.preconditions().iter().all(|f| self.fact(*f, world)) {
                continue;
            }
            chosen = Some((effect, do_not_retry, action));
            break;
        }

        for effect in abandoned {
            debug!("Creature {} abandons goal '{}'", self.id, effect);
            self.remove_goal(effect);
        }

        let Some((effect, do_not_retry, action)) = chosen else {
            self.invalidate_all_plans();
            return;
        };

        trace!("Creature {} runs {} for '{}'", self.id, action.name(), effect);
        let status = action.tick(&mut ActionContext {
            state: &mut *self,
            world: &mut *world,
            peers: &mut *peers,
        });

        match status {
            ActionStatus::Complete => {
                if let Some(plan) = self.plans.get_mut(&effect) {
                    plan.advance();
                }
            }
            ActionStatus::Failed => {
                if do_not_retry {
                    self.remove_goal(effect);
                } else if let Some(plan) = self.plans.get_mut(&effect) {
                    plan.should_recreate = true;
                }
            }
            ActionStatus::Continue => {
                self.facts.clear();
                if action.effects().iter().all(|f| self.fact(*f, world)) {
                    if let Some(plan) = self.plans.get_mut(&effect) {
                        plan.advance();
                    }
                    self.path.clear();
                }
            }
        }
    }
}

/// The attack target, else the owner of a tamed creature.
fn follow_target_of(
    id: CreatureId,
    target: Option<CreatureId>,
    world: &GameWorld,
) -> Option<&Creature> {
    if let Some(target) = target {
        return world.creatures.get(target);
    }
    let owner = world.creatures.get(id)?.tamed_by?;
    world.creatures.creature_for_player(owner)
}

/// Usable distance band to the follow target.
fn follow_range(target: Option<CreatureId>, creature: &Creature, world: &GameWorld) -> (u32, u32) {
    if target.is_none() && creature.tamed_by.is_some() {
        return (1, TAME_FOLLOW_RANGE);
    }
    creature
        .weapon()
        .and_then(|item| world.map.items.weapon(item.type_id))
        .map(|w| (w.min_range, w.max_range))
        .unwrap_or((1, 1))
}

fn evaluate_fact(
    id: CreatureId,
    target: Option<CreatureId>,
    fact: Fact,
    world: &GameWorld,
) -> bool {
    let Some(creature) = world.creatures.get(id) else {
        return false;
    };
    let (min_range, max_range) = follow_range(target, creature, world);
    let ctx = FactContext {
        creature,
        map: &world.map,
        attack_target: target.and_then(|t| world.creatures.get(t)),
        hunting: target.is_some(),
        follow_target: follow_target_of(id, target, world),
        min_range,
        max_range,
    };
    fact::evaluate(fact, &ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creature::{CombatStats, CreatureDescriptor, PlayerId};
    use crate::game_world::test_support::flat_world;
    use crate::spells::spell_id;
    use tile_rs_world::tile::{DIRT_FLOOR, WATER_FLOOR};

    fn spawn(world: &mut GameWorld, name: &str, x: i32, y: i32) -> CreatureId {
        world
            .create_creature(CreatureDescriptor::new(name, 10), Point::new(0, x, y, 0))
            .unwrap()
    }

    fn no_peers() -> BTreeMap<CreatureId, CreatureState> {
        BTreeMap::new()
    }

    #[test]
    fn movement_delay_table() {
        assert_eq!(movement_delay_ms(10), 400);
        assert_eq!(movement_delay_ms(20), 400);
        assert_eq!(movement_delay_ms(5), 1500);
        assert_eq!(movement_delay_ms(1), 5000);
        assert_eq!(movement_delay_ms(0), 5000);
    }

    #[test]
    fn timers_stop_at_zero() {
        let mut world = flat_world(20, DIRT_FLOOR);
        let id = spawn(&mut world, "Guard", 5, 5);
        let mut state = CreatureState::with_default_actions(id);
        state.idle(2);
        for _ in 0..3 {
            state.tick(&mut world, &mut no_peers());
        }
        assert_eq!(state.timers().idle, 0);
    }

    #[test]
    fn facts_are_memoized_until_cleared() {
        let mut world = flat_world(20, 150);
        let id = spawn(&mut world, "Cow", 5, 5);
        let mut state = CreatureState::with_default_actions(id);
        assert!(state.fact(Fact::OnGrass, &world));
        world.set_floor(Point::new(0, 5, 5, 0), DIRT_FLOOR).unwrap();
        assert!(state.fact(Fact::OnGrass, &world));
        state.clear_facts();
        assert!(!state.fact(Fact::OnGrass, &world));
    }

    #[test]
    fn existing_target_is_kept() {
        let mut world = flat_world(30, DIRT_FLOOR);
        let me = spawn(&mut world, "Guard", 10, 10);
        let hunted = spawn(&mut world, "Far", 15, 10);
        let close = spawn(&mut world, "Close", 11, 10);
        let mut state = CreatureState::with_default_actions(me);
        state.set_target(Some(hunted));
        state.add_enemy(close);
        state.tick(&mut world, &mut no_peers());
        assert_eq!(state.target(), Some(hunted));
    }

    #[test]
    fn nearest_enemy_becomes_target() {
        let mut world = flat_world(30, DIRT_FLOOR);
        let me = spawn(&mut world, "Wolf", 10, 10);
        let far = spawn(&mut world, "Far", 16, 10);
        let near = spawn(&mut world, "Near", 10, 13);
        let mut state = CreatureState::with_default_actions(me);
        state.add_enemy(far);
        state.add_enemy(near);
        state.add_enemy(me);
        assert_eq!(state.enemies(), &[far, near]);

        state.tick(&mut world, &mut no_peers());
        assert_eq!(state.target(), Some(near));
        let goals: Vec<(Fact, i32)> = state
            .goals()
            .iter()
            .map(|g| (g.desired_effect, g.priority))
            .collect();
        assert_eq!(
            goals,
            vec![(Fact::KillCreature, 100), (Fact::HiddenFromTarget, 90)]
        );
    }

    #[test]
    fn enemies_past_cutoff_are_ignored() {
        let mut world = flat_world(30, DIRT_FLOOR);
        let me = spawn(&mut world, "Wolf", 2, 2);
        let far = spawn(&mut world, "Far", 27, 2);
        let mut state = CreatureState::with_default_actions(me);
        state.add_enemy(far);
        state.tick(&mut world, &mut no_peers());
        assert_eq!(state.target(), None);
    }

    #[test]
    fn removal_clears_target_and_enemy() {
        let mut world = flat_world(30, DIRT_FLOOR);
        let me = spawn(&mut world, "Wolf", 2, 2);
        let a = spawn(&mut world, "A", 3, 2);
        let b = spawn(&mut world, "B", 4, 2);
        let mut state = CreatureState::with_default_actions(me);
        state.add_enemy(a);
        state.add_enemy(b);
        state.tick(&mut world, &mut no_peers());
        assert_eq!(state.target(), Some(a));

        state.respond_to_creature_removal(a);
        assert_eq!(state.target(), None);
        assert_eq!(state.enemies(), &[b]);
        assert!(state.goals().is_empty());

        state.respond_to_creature_removal(b);
        assert!(state.enemies().is_empty());
    }

    #[test]
    fn regenerates_every_two_seconds_off_water() {
        let mut world = flat_world(20, DIRT_FLOOR);
        let id = spawn(&mut world, "Guard", 5, 5);
        world.creatures.get_mut(id).unwrap().stamina.current = 5;
        let mut state = CreatureState::with_default_actions(id);
        state.tick(&mut world, &mut no_peers());
        assert_eq!(world.creature(id).unwrap().stamina.current, 6);
        for _ in 0..39 {
            state.tick(&mut world, &mut no_peers());
        }
        assert_eq!(world.creature(id).unwrap().stamina.current, 6);
        state.tick(&mut world, &mut no_peers());
        assert_eq!(world.creature(id).unwrap().stamina.current, 7);

        world.set_floor(Point::new(0, 5, 5, 0), WATER_FLOOR).unwrap();
        for _ in 0..100 {
            state.tick(&mut world, &mut no_peers());
        }
        assert_eq!(world.creature(id).unwrap().stamina.current, 7);
    }

    #[test]
    fn plans_are_reused_while_valid() {
        let mut world = flat_world(30, DIRT_FLOOR);
        let mut desc = CreatureDescriptor::new("Rat", 10);
        desc.roam = true;
        let id = world.create_creature(desc, Point::new(0, 15, 15, 0)).unwrap();
        let mut state = CreatureState::with_default_actions(id).with_plan_timeout(None);
        for _ in 0..50 {
            state.tick(&mut world, &mut no_peers());
        }
        assert_eq!(state.plans_built(), 1);
        assert_eq!(
            state.plan(Fact::Wander).map(|p| p.step_names()),
            Some(vec!["Wander"])
        );
    }

    #[test]
    fn do_not_retry_goal_without_plan_is_dropped() {
        let mut world = flat_world(20, DIRT_FLOOR);
        let id = spawn(&mut world, "Guard", 5, 5);
        let mut state = CreatureState::with_default_actions(id).with_plan_timeout(None);
        state.add_goal(Goal::new(Fact::Wander, priority::ROAM, GoalCondition::Never));
        state.add_goal(Goal::new(Fact::HiddenFromTarget, 5, GoalCondition::Never).do_not_retry());
        state.tick(&mut world, &mut no_peers());
        assert!(!state.has_goal(Fact::HiddenFromTarget));
        assert!(state.has_goal(Fact::Wander));
    }

    #[test]
    fn pending_damaging_spell_is_used_up() {
        let mut world = flat_world(20, DIRT_FLOOR);
        let player = world
            .create_creature(
                CreatureDescriptor::player(PlayerId(1), "Ann"),
                Point::new(0, 5, 5, 0),
            )
            .unwrap();
        let rat = spawn(&mut world, "Rat", 8, 5);
        let mut state = CreatureState::with_default_actions(player);
        state.set_target(Some(rat));
        state.set_current_spell(Some(spell_id::FIREBALL));
        world.drain_events();

        state.tick(&mut world, &mut no_peers());
        assert_eq!(state.current_spell(), None);
        assert_eq!(state.target(), None);
        let mana = world.creature(player).unwrap().mana;
        assert_eq!(mana.current, mana.max - 10);
        assert!(world.drain_events().iter().any(|e| matches!(
            e,
            GameEvent::SetAttackTarget {
                player: PlayerId(1),
                target: None
            }
        )));
    }

    #[test]
    fn self_targeted_spell_is_not_kept() {
        let mut world = flat_world(20, DIRT_FLOOR);
        let id = spawn(&mut world, "Guard", 5, 5);
        let mut state = CreatureState::with_default_actions(id);
        state.set_current_spell(Some(spell_id::HEAL));
        state.tick(&mut world, &mut no_peers());
        assert_eq!(state.current_spell(), None);
    }

    #[test]
    fn landed_hit_makes_attacker_an_enemy() {
        let mut world = flat_world(20, DIRT_FLOOR);
        let mut desc = CreatureDescriptor::new("Wolf", 30);
        desc.combat = CombatStats {
            damage_low: 2,
            damage_high: 3,
            attack_speed: 1.0,
        };
        let wolf = world.create_creature(desc, Point::new(0, 5, 5, 0)).unwrap();
        let mut sheep = CreatureDescriptor::new("Sheep", 100);
        sheep.stamina = 5;
        let sheep = world.create_creature(sheep, Point::new(0, 6, 5, 0)).unwrap();

        let mut state = CreatureState::with_default_actions(wolf);
        state.set_target(Some(sheep));
        let mut peers = BTreeMap::new();
        peers.insert(sheep, CreatureState::with_default_actions(sheep));

        for _ in 0..15 {
            state.timers.attack = 0;
            state.attack(&mut world, &mut peers, None, false);
            if peers[&sheep].enemies().contains(&wolf) {
                break;
            }
        }
        assert_eq!(peers[&sheep].enemies(), &[wolf]);
        assert!(world.creature(sheep).unwrap().life.current < 100);
        assert!(state.timers().regeneration > 0);
        assert!(peers[&sheep].timers().regeneration > 0);
    }

    #[test]
    fn zero_damage_hit_still_provokes() {
        let mut world = flat_world(20, DIRT_FLOOR);
        let mut desc = CreatureDescriptor::new("Kitten", 10);
        desc.combat = CombatStats {
            damage_low: 0,
            damage_high: 0,
            attack_speed: 1.0,
        };
        let kitten = world.create_creature(desc, Point::new(0, 5, 5, 0)).unwrap();
        let dog = spawn(&mut world, "Dog", 6, 5);

        let mut state = CreatureState::with_default_actions(kitten);
        state.set_target(Some(dog));
        let mut peers = BTreeMap::new();
        peers.insert(dog, CreatureState::with_default_actions(dog));

        for _ in 0..15 {
            state.timers.attack = 0;
            state.attack(&mut world, &mut peers, None, false);
            if peers[&dog].timers().regeneration > 0 {
                break;
            }
        }
        assert!(peers[&dog].timers().regeneration > 0);
        assert_eq!(peers[&dog].enemies(), &[kitten]);
        assert_eq!(world.creature(dog).unwrap().life.current, 10);
    }

    #[test]
    fn friendly_spell_resets_regen_without_provoking() {
        let mut world = flat_world(20, DIRT_FLOOR);
        let mut desc = CreatureDescriptor::new("Healer", 20);
        desc.mana = 30;
        let healer = world.create_creature(desc, Point::new(0, 5, 5, 0)).unwrap();
        let ally = spawn(&mut world, "Ally", 7, 5);
        world.creatures.get_mut(ally).unwrap().life.current = 1;

        let mut state = CreatureState::with_default_actions(healer);
        state.set_target(Some(ally));
        let mut peers = BTreeMap::new();
        peers.insert(ally, CreatureState::with_default_actions(ally));

        let mend = world.spells.get(spell_id::MEND_OTHER).cloned();
        state.attack(&mut world, &mut peers, mend, false);
        assert_eq!(world.creature(ally).unwrap().life.current, 9);
        assert!(peers[&ally].timers().regeneration > 0);
        assert!(peers[&ally].enemies().is_empty());
        assert_eq!(state.target(), Some(ally));
    }
}
