//! The simulation: game world, AI states, and periodic tick sections.

use std::collections::BTreeMap;
use std::sync::Arc;

use tile_rs_world::{CreatureId, Point};
use tracing::{debug, info, warn};

use crate::ai::actions::default_actions;
use crate::ai::{Action, CreatureState};
use crate::clock::Rate;
use crate::creature::{Creature, CreatureDescriptor, PlayerId};
use crate::error::GameError;
use crate::events::{CreatureAttribute, GameEvent};
use crate::game_world::GameWorld;
use crate::tasks::{TaskRunner, TickSection};

/// Radius of sectors kept loaded around every creature.
pub const SIGHT_RADIUS: u32 = 24;

/// Counters reported by the stats section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulationStats {
    pub ticks: u64,
    pub creatures: usize,
    pub plans_built: u64,
    pub removed: u64,
}

pub struct Simulation {
    pub world: GameWorld,
    /// Keyed by creature id, so iteration follows creation order.
    states: BTreeMap<CreatureId, CreatureState>,
    tasks: TaskRunner<Simulation>,
    actions: Vec<Arc<dyn Action>>,
    removed_total: u64,
}

impl Simulation {
    pub fn new(world: GameWorld) -> Self {
        Self::with_actions(world, default_actions())
    }

    /// A simulation whose creatures plan with a custom action catalog.
    pub fn with_actions(world: GameWorld, actions: Vec<Arc<dyn Action>>) -> Self {
        Self {
            world,
            states: BTreeMap::new(),
            tasks: TaskRunner::new(),
            actions,
            removed_total: 0,
        }
    }

    // -----------------------------------------------------------------------
    // Creatures
    // -----------------------------------------------------------------------

    pub fn create_creature(
        &mut self,
        desc: CreatureDescriptor,
        pos: Point,
    ) -> Result<CreatureId, GameError> {
        let id = self.world.create_creature(desc, pos)?;
        self.register_state(id);
        Ok(id)
    }

    pub fn spawn_monster(&mut self, template_id: u32, pos: Point) -> Result<CreatureId, GameError> {
        let id = self.world.spawn_monster(template_id, pos)?;
        self.register_state(id);
        Ok(id)
    }

    fn register_state(&mut self, id: CreatureId) {
        self.states
            .insert(id, CreatureState::new(id, self.actions.clone()));
    }

    /// Remove a creature and tell every AI state about it.
    pub fn remove_creature(&mut self, id: CreatureId) -> Option<Creature> {
        let creature = self.world.remove_creature(id);
        self.flush_removals();
        creature
    }

    /// Put a player's avatar in the world.
    pub fn connect_player(
        &mut self,
        player: PlayerId,
        name: &str,
        pos: Point,
    ) -> Result<CreatureId, GameError> {
        if self.world.creatures.is_connected(player) {
            return Err(GameError::PlayerAlreadyConnected(player));
        }
        let id = self.create_creature(CreatureDescriptor::player(player, name), pos)?;
        info!("{} connected as creature {}", player, id);
        Ok(id)
    }

    /// Take a player's avatar out of the world.
    pub fn disconnect_player(&mut self, player: PlayerId) -> Result<(), GameError> {
        let id = self
            .world
            .creatures
            .creature_id_for_player(player)
            .ok_or(GameError::PlayerNotConnected(player))?;
        self.remove_creature(id);
        info!("{} disconnected", player);
        Ok(())
    }

    /// Make `creature` follow and fight for `player`.
    pub fn tame(&mut self, creature: CreatureId, player: PlayerId) -> Result<(), GameError> {
        let owner = self.world.creatures.creature_id_for_player(player);
        let target = self
            .world
            .creatures
            .get_mut(creature)
            .ok_or(GameError::UnknownCreature(creature))?;
        if target.is_player() {
            return Err(GameError::InvalidTarget(creature));
        }
        if target.tamed_by.is_some() {
            return Err(GameError::AlreadyTamed(creature));
        }
        target.tamed_by = Some(player);
        self.world.broadcast_partial_creature_update(
            creature,
            vec![CreatureAttribute::TamedBy(Some(player))],
        );
        if let Some(state) = self.states.get_mut(&creature) {
            if let Some(owner) = owner {
                state.forget_enemy(owner);
                if state.target() == Some(owner) {
                    state.give_up_target();
                }
            }
            state.reset_goals();
        }
        debug!("Creature {} tamed by {}", creature, player);
        Ok(())
    }

    pub fn state(&self, id: CreatureId) -> Option<&CreatureState> {
        self.states.get(&id)
    }

    pub fn state_mut(&mut self, id: CreatureId) -> Option<&mut CreatureState> {
        self.states.get_mut(&id)
    }

    /// Run `f` on one creature's state with the rest as peers.
    pub(crate) fn with_state<R>(
        &mut self,
        id: CreatureId,
        f: impl FnOnce(&mut CreatureState, &mut GameWorld, &mut BTreeMap<CreatureId, CreatureState>) -> R,
    ) -> Option<R> {
        let mut state = self.states.remove(&id)?;
        let result = f(&mut state, &mut self.world, &mut self.states);
        self.states.insert(id, state);
        self.flush_removals();
        Some(result)
    }

    // -----------------------------------------------------------------------
    // Ticking
    // -----------------------------------------------------------------------

    /// Run `section` every `section.rate` from now on.
    pub fn register_tick_section(&mut self, section: TickSection<Simulation>) {
        debug!("Registered tick section '{}'", section.description);
        let clock = self.world.clock;
        self.tasks.register_tick_section(&clock, section);
    }

    /// Advance the whole simulation by one tick.
    pub fn tick(&mut self) {
        let tick = self.world.clock.advance();

        let ids: Vec<CreatureId> = self.states.keys().copied().collect();
        for id in ids {
            if let Some(pos) = self.world.creatures.get(id).map(|c| c.pos) {
                if let Err(err) = self.world.map.load_sectors_around(pos, SIGHT_RADIUS) {
                    warn!("Could not load sectors around creature {}: {}", id, err);
                }
            }
            self.with_state(id, |state, world, peers| state.tick(world, peers));
        }

        let mut tasks = std::mem::take(&mut self.tasks);
        tasks.run_due(tick, self);
        tasks.absorb(std::mem::take(&mut self.tasks));
        self.tasks = tasks;
        self.flush_removals();
    }

    /// Deliver queued removals to every AI state.
    fn flush_removals(&mut self) {
        for id in self.world.take_removed() {
            self.removed_total += 1;
            self.states.remove(&id);
            for state in self.states.values_mut() {
                state.respond_to_creature_removal(id);
            }
        }
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.world.drain_events()
    }

    pub fn stats(&self) -> SimulationStats {
        SimulationStats {
            ticks: self.world.clock.current_tick(),
            creatures: self.world.creatures.len(),
            plans_built: self.states.values().map(|s| s.plans_built()).sum(),
            removed: self.removed_total,
        }
    }

    /// Register a section that logs [`SimulationStats`] every `rate`.
    pub fn register_stats_section(&mut self, rate: Rate) {
        self.register_tick_section(TickSection::new("stats", rate, |sim: &mut Simulation| {
            let stats = sim.stats();
            info!(
                "tick {}: {} creatures, {} plans built, {} removed",
                stats.ticks, stats.creatures, stats.plans_built, stats.removed
            );
        }));
    }
}
