//! Monster spawners: keep up to `limit` instances of a template alive
//! around a point.

use rand::Rng;
use tile_rs_world::{CreatureId, Point};
use tracing::{debug, trace};

use crate::clock::Rate;
use crate::simulation::Simulation;
use crate::tasks::TickSection;

/// Random tiles tried per run before giving up until the next one.
const PLACEMENT_ATTEMPTS: usize = 10;

#[derive(Debug, Clone)]
pub struct Spawner {
    pub template_id: u32,
    pub limit: usize,
    pub center: Point,
    pub radius: u32,
    spawned: Vec<CreatureId>,
}

impl Spawner {
    pub fn new(template_id: u32, limit: usize, center: Point, radius: u32) -> Self {
        Self {
            template_id,
            limit,
            center,
            radius,
            spawned: Vec::new(),
        }
    }

    /// Creatures from this spawner still in the world.
    pub fn alive(&self) -> &[CreatureId] {
        &self.spawned
    }

    /// Forget dead instances and spawn one more if below the limit.
    /// Returns the new creature, if any.
    pub fn run(&mut self, sim: &mut Simulation) -> Option<CreatureId> {
        self.spawned.retain(|id| sim.world.creatures.contains(*id));
        if self.spawned.len() >= self.limit {
            return None;
        }

        let radius = self.radius as i32;
        if let Err(err) = sim.world.map.load_sectors_around(self.center, self.radius) {
            debug!("Spawner at {} cannot load its area: {}", self.center, err);
            return None;
        }
        for _ in 0..PLACEMENT_ATTEMPTS {
            let pos = self.center.offset(
                sim.world.rng.gen_range(-radius..=radius),
                sim.world.rng.gen_range(-radius..=radius),
            );
            if !sim.world.map.walkable(pos) {
                continue;
            }
            match sim.spawn_monster(self.template_id, pos) {
                Ok(id) => {
                    trace!("Spawner at {} spawned creature {}", self.center, id);
                    self.spawned.push(id);
                    return Some(id);
                }
                Err(err) => {
                    debug!("Spawner at {} failed: {}", self.center, err);
                    return None;
                }
            }
        }
        None
    }
}

/// Run `spawner` as a tick section every `rate`.
pub fn register_spawner(sim: &mut Simulation, mut spawner: Spawner, rate: Rate) {
    let description = format!("spawner {} at {}", spawner.template_id, spawner.center);
    sim.register_tick_section(TickSection::new(description, rate, move |sim: &mut Simulation| {
        spawner.run(sim);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_world::test_support::flat_world;
    use crate::monster::monster_id;
    use tile_rs_world::tile::DIRT_FLOOR;

    #[test]
    fn spawns_up_to_limit_inside_radius() {
        let mut sim = Simulation::new(flat_world(30, DIRT_FLOOR));
        let center = Point::new(0, 15, 15, 0);
        let mut spawner = Spawner::new(monster_id::RAT, 3, center, 2);
        for _ in 0..50 {
            spawner.run(&mut sim);
        }
        assert_eq!(spawner.alive().len(), 3);
        for id in spawner.alive() {
            let creature = sim.world.creature(*id).unwrap();
            assert!(creature.pos.max_diff(center) <= 2);
            assert_eq!(creature.template_id, Some(monster_id::RAT));
        }
    }

    #[test]
    fn replaces_dead_instances() {
        let mut sim = Simulation::new(flat_world(30, DIRT_FLOOR));
        let mut spawner = Spawner::new(monster_id::RAT, 1, Point::new(0, 10, 10, 0), 3);
        let first = (0..20).find_map(|_| spawner.run(&mut sim)).unwrap();
        assert!(spawner.run(&mut sim).is_none());
        sim.remove_creature(first);
        let second = (0..20).find_map(|_| spawner.run(&mut sim)).unwrap();
        assert_ne!(first, second);
        assert_eq!(spawner.alive(), &[second]);
    }

    #[test]
    fn unknown_template_spawns_nothing() {
        let mut sim = Simulation::new(flat_world(30, DIRT_FLOOR));
        let mut spawner = Spawner::new(999, 1, Point::new(0, 10, 10, 0), 3);
        assert!((0..10).all(|_| spawner.run(&mut sim).is_none()));
        assert!(sim.world.creatures.is_empty());
    }

    #[test]
    fn registered_spawner_runs_on_schedule() {
        let mut sim = Simulation::new(flat_world(30, DIRT_FLOOR));
        register_spawner(
            &mut sim,
            Spawner::new(monster_id::COW, 2, Point::new(0, 10, 10, 0), 4),
            Rate::Seconds(1.0),
        );
        for _ in 0..19 {
            sim.tick();
        }
        assert!(sim.world.creatures.is_empty());
        for _ in 0..200 {
            sim.tick();
        }
        assert_eq!(sim.world.creatures.len(), 2);
    }
}
