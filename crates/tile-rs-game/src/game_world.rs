//! Game world: map, creatures, registries, clock, RNG and the event bus.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;
use tile_rs_world::{CreatureId, GridPathPlanner, PathPlanner, Point, WorldMap};

use crate::clock::Clock;
use crate::creature::{Creature, CreatureDescriptor};
use crate::error::GameError;
use crate::events::{CreatureAttribute, GameEvent, OutgoingEvents};
use crate::monster::MonsterRegistry;
use crate::registry::CreatureRegistry;
use crate::spells::SpellBook;

/// Everything the simulation reads and mutates, minus per-creature AI state.
pub struct GameWorld {
    pub map: WorldMap,
    pub creatures: CreatureRegistry,
    pub monsters: MonsterRegistry,
    pub spells: SpellBook,
    pub clock: Clock,
    pub events: OutgoingEvents,
    pub rng: StdRng,
    path_planner: Box<dyn PathPlanner>,
    /// Creatures removed since the last flush, in removal order.
    removed: Vec<CreatureId>,
}

impl GameWorld {
    pub fn new(map: WorldMap, clock: Clock, seed: u64) -> Self {
        Self {
            map,
            creatures: CreatureRegistry::new(),
            monsters: MonsterRegistry::new(),
            spells: SpellBook::new(),
            clock,
            events: OutgoingEvents::default(),
            rng: StdRng::seed_from_u64(seed),
            path_planner: Box::new(GridPathPlanner::default()),
            removed: Vec::new(),
        }
    }

    pub fn with_path_planner(mut self, planner: Box<dyn PathPlanner>) -> Self {
        self.path_planner = planner;
        self
    }

    /// Route from `from` to `to`, excluding `from`. Empty when unreachable.
    pub fn find_path(&self, from: Point, to: Point) -> Vec<Point> {
        self.path_planner.find_path(&self.map, from, to)
    }

    pub fn creature(&self, id: CreatureId) -> Option<&Creature> {
        self.creatures.get(id)
    }

    /// Place a new creature. The tile must be walkable.
    pub fn create_creature(
        &mut self,
        desc: CreatureDescriptor,
        pos: Point,
    ) -> Result<CreatureId, GameError> {
        self.map.load_sectors_around(pos, 0)?;
        if !self.map.walkable(pos) {
            return Err(GameError::NotWalkable(pos));
        }
        let name = desc.name.clone();
        let id = self.creatures.insert(desc, pos);
        self.map.set_creature(pos, Some(id))?;
        debug!("Creature {} '{}' added at {}", id, name, pos);
        self.events.push(GameEvent::CreatureAdded { id, name, pos });
        Ok(id)
    }

    /// Spawn an instance of a monster template.
    pub fn spawn_monster(&mut self, template_id: u32, pos: Point) -> Result<CreatureId, GameError> {
        let desc = self
            .monsters
            .get(template_id)
            .ok_or(GameError::UnknownMonster(template_id))?
            .descriptor();
        self.create_creature(desc, pos)
    }

    /// Take a creature out of the world. AI states learn about it on the
    /// next flush of [`GameWorld::take_removed`].
    pub fn remove_creature(&mut self, id: CreatureId) -> Option<Creature> {
        let creature = self.creatures.remove(id)?;
        if let Ok(tile) = self.map.tile_mut(creature.pos) {
            if tile.creature == Some(id) {
                tile.creature = None;
            }
        }
        debug!("Creature {} '{}' removed", id, creature.name);
        self.events.push(GameEvent::CreatureRemoved {
            id,
            pos: creature.pos,
        });
        self.removed.push(id);
        Some(creature)
    }

    pub fn take_removed(&mut self) -> Vec<CreatureId> {
        std::mem::take(&mut self.removed)
    }

    /// Step a creature onto a walkable tile.
    pub fn move_creature(&mut self, id: CreatureId, to: Point) -> Result<(), GameError> {
        let from = self
            .creatures
            .get(id)
            .map(|c| c.pos)
            .ok_or(GameError::UnknownCreature(id))?;
        if !self.map.walkable(to) {
            return Err(GameError::NotWalkable(to));
        }
        self.map.set_creature(from, None)?;
        self.map.set_creature(to, Some(id))?;
        if let Some(creature) = self.creatures.get_mut(id) {
            creature.pos = to;
        }
        self.broadcast_partial_creature_update(id, vec![CreatureAttribute::Pos(to)]);
        Ok(())
    }

    pub fn set_floor(&mut self, pos: Point, floor: u16) -> Result<(), GameError> {
        self.map.set_floor(pos, floor)?;
        self.events.push(GameEvent::FloorChanged { pos, floor });
        Ok(())
    }

    pub fn broadcast_partial_creature_update(
        &mut self,
        id: CreatureId,
        changes: Vec<CreatureAttribute>,
    ) {
        if changes.is_empty() {
            return;
        }
        self.events
            .push(GameEvent::PartialCreatureUpdate { id, changes });
    }

    pub fn animate(&mut self, pos: Point, name: impl Into<String>) {
        self.events.push(GameEvent::Animation {
            pos,
            name: name.into(),
        });
    }

    /// Drain all pending outgoing events.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.events.drain()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use tile_rs_world::sector::FlatSectorLoader;
    use tile_rs_world::Partition;

    use super::*;

    /// A `size` x `size` single-level world with every tile on `floor`.
    pub fn flat_world(size: u32, floor: u16) -> GameWorld {
        let mut map = WorldMap::default();
        map.add_partition(
            0,
            Partition::new(size, size, 1, Box::new(FlatSectorLoader::new(floor))),
        )
        .unwrap();
        map.load_sectors_around(Point::new(0, 0, 0, 0), size).unwrap();
        GameWorld::new(map, Clock::new(50), 7)
    }
}
