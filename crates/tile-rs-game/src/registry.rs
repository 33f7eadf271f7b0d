//! Live creatures keyed by id, plus the player-to-creature mapping.

use std::collections::{BTreeMap, HashMap};

use tile_rs_world::{CreatureId, Point};

use crate::creature::{Creature, CreatureDescriptor, PlayerId};

/// All creatures currently in the world. Ids are handed out in increasing
/// order and never reused.
#[derive(Debug)]
pub struct CreatureRegistry {
    creatures: BTreeMap<CreatureId, Creature>,
    players: HashMap<PlayerId, CreatureId>,
    next_id: u32,
}

impl Default for CreatureRegistry {
    fn default() -> Self {
        Self {
            creatures: BTreeMap::new(),
            players: HashMap::new(),
            next_id: 1,
        }
    }
}

impl CreatureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a creature from `desc` at `pos`. Player creatures are mapped
    /// to their player id.
    pub fn insert(&mut self, desc: CreatureDescriptor, pos: Point) -> CreatureId {
        let id = CreatureId(self.next_id);
        self.next_id += 1;
        let creature = Creature::from_descriptor(id, pos, desc);
        if let Some(player) = creature.player_id {
            self.players.insert(player, id);
        }
        self.creatures.insert(id, creature);
        id
    }

    pub fn remove(&mut self, id: CreatureId) -> Option<Creature> {
        let creature = self.creatures.remove(&id)?;
        if let Some(player) = creature.player_id {
            if self.players.get(&player) == Some(&id) {
                self.players.remove(&player);
            }
        }
        Some(creature)
    }

    pub fn get(&self, id: CreatureId) -> Option<&Creature> {
        self.creatures.get(&id)
    }

    pub fn get_mut(&mut self, id: CreatureId) -> Option<&mut Creature> {
        self.creatures.get_mut(&id)
    }

    pub fn contains(&self, id: CreatureId) -> bool {
        self.creatures.contains_key(&id)
    }

    /// The creature a player controls, if they are connected.
    pub fn creature_for_player(&self, player: PlayerId) -> Option<&Creature> {
        self.players.get(&player).and_then(|id| self.creatures.get(id))
    }

    pub fn creature_id_for_player(&self, player: PlayerId) -> Option<CreatureId> {
        self.players.get(&player).copied()
    }

    pub fn is_connected(&self, player: PlayerId) -> bool {
        self.players.contains_key(&player)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Creature> {
        self.creatures.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = CreatureId> + '_ {
        self.creatures.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.creatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.creatures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_increase() {
        let mut reg = CreatureRegistry::new();
        let a = reg.insert(CreatureDescriptor::new("A", 5), Point::new(0, 0, 0, 0));
        let b = reg.insert(CreatureDescriptor::new("B", 5), Point::new(0, 1, 0, 0));
        assert!(a < b);
        reg.remove(a);
        let c = reg.insert(CreatureDescriptor::new("C", 5), Point::new(0, 2, 0, 0));
        assert!(b < c);
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn player_mapping_follows_creature() {
        let mut reg = CreatureRegistry::new();
        let player = PlayerId(7);
        let id = reg.insert(CreatureDescriptor::player(player, "Ann"), Point::new(0, 0, 0, 0));
        assert_eq!(reg.creature_for_player(player).map(|c| c.id), Some(id));
        assert!(reg.is_connected(player));
        reg.remove(id);
        assert!(!reg.is_connected(player));
        assert!(reg.creature_for_player(player).is_none());
    }
}
