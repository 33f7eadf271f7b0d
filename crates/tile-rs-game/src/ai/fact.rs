//! World facts the planner reasons about.
//!
//! A fact is a named boolean evaluated for one creature against the current
//! world. Values are memoized per tick in a [`FactCache`].

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tile_rs_world::tile::is_grass;
use tile_rs_world::WorldMap;

use crate::creature::Creature;

/// Distance at which a creature counts as hidden from its target.
pub const HIDDEN_DISTANCE: u32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Fact {
    /// Standing on a grass floor.
    OnGrass,
    /// Closer to the follow target than the usable range allows.
    TooCloseTarget,
    /// Further from the follow target than the usable range allows.
    TooFarTarget,
    /// Within usable range of the follow target.
    NearTarget,
    /// No attack target, or at least [`HIDDEN_DISTANCE`] away from it.
    HiddenFromTarget,
    /// No attack target remains.
    KillCreature,
    /// Goal-only fact; never observed true.
    Food,
    /// Goal-only fact; never observed true.
    Wander,
}

impl Fact {
    pub const ALL: [Fact; 8] = [
        Fact::OnGrass,
        Fact::TooCloseTarget,
        Fact::TooFarTarget,
        Fact::NearTarget,
        Fact::HiddenFromTarget,
        Fact::KillCreature,
        Fact::Food,
        Fact::Wander,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Fact::OnGrass => "on-grass",
            Fact::TooCloseTarget => "too-close-target",
            Fact::TooFarTarget => "too-far-target",
            Fact::NearTarget => "near-target",
            Fact::HiddenFromTarget => "hidden-from-target",
            Fact::KillCreature => "kill-creature",
            Fact::Food => "food",
            Fact::Wander => "wander",
        }
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Fact {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Fact::ALL
            .into_iter()
            .find(|fact| fact.name() == s)
            .ok_or_else(|| format!("unknown fact '{}'", s))
    }
}

/// Everything a fact needs to know about one creature's situation.
pub struct FactContext<'a> {
    pub creature: &'a Creature,
    pub map: &'a WorldMap,
    /// Creature being hunted, if any.
    pub attack_target: Option<&'a Creature>,
    /// Whether an attack target is set at all.
    pub hunting: bool,
    /// Creature to stay in range of: the attack target, else the owner.
    pub follow_target: Option<&'a Creature>,
    /// Usable distance band to the follow target, inclusive.
    pub min_range: u32,
    pub max_range: u32,
}

impl FactContext<'_> {
    fn follow_distance(&self) -> Option<u32> {
        self.follow_target
            .map(|target| self.creature.pos.max_diff(target.pos))
    }
}

/// Evaluate `fact` right now.
pub fn evaluate(fact: Fact, ctx: &FactContext<'_>) -> bool {
    match fact {
        Fact::OnGrass => ctx.map.floor(ctx.creature.pos).is_some_and(is_grass),
        Fact::TooCloseTarget => ctx.follow_distance().is_some_and(|d| d < ctx.min_range),
        Fact::TooFarTarget => ctx.follow_distance().is_some_and(|d| d > ctx.max_range),
        Fact::NearTarget => ctx
            .follow_distance()
            .is_some_and(|d| d >= ctx.min_range && d <= ctx.max_range),
        Fact::HiddenFromTarget => match ctx.attack_target {
            None => true,
            Some(target) => ctx.creature.pos.max_diff(target.pos) >= HIDDEN_DISTANCE,
        },
        Fact::KillCreature => !ctx.hunting,
        Fact::Food | Fact::Wander => false,
    }
}

/// Per-tick memo of fact values for one creature.
#[derive(Debug, Default, Clone)]
pub struct FactCache {
    values: HashMap<Fact, bool>,
}

impl FactCache {
    /// Cached value, or evaluate and remember it.
    pub fn get_or_eval(&mut self, fact: Fact, eval: impl FnOnce() -> bool) -> bool {
        *self.values.entry(fact).or_insert_with(eval)
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creature::CreatureDescriptor;
    use tile_rs_world::sector::FlatSectorLoader;
    use tile_rs_world::tile::DIRT_FLOOR;
    use tile_rs_world::{CreatureId, Partition, Point};

    fn map() -> WorldMap {
        let mut map = WorldMap::default();
        map.add_partition(0, Partition::new(40, 40, 1, Box::new(FlatSectorLoader::new(DIRT_FLOOR))))
            .unwrap();
        map.load_sectors_around(Point::new(0, 0, 0, 0), 40).unwrap();
        map
    }

    fn creature_at(id: u32, x: i32) -> Creature {
        Creature::from_descriptor(
            CreatureId(id),
            Point::new(0, x, 5, 0),
            CreatureDescriptor::new("C", 10),
        )
    }

    fn context<'a>(
        me: &'a Creature,
        target: Option<&'a Creature>,
        map: &'a WorldMap,
        range: (u32, u32),
    ) -> FactContext<'a> {
        FactContext {
            creature: me,
            map,
            attack_target: target,
            hunting: target.is_some(),
            follow_target: target,
            min_range: range.0,
            max_range: range.1,
        }
    }

    #[test]
    fn names_round_trip() {
        for fact in Fact::ALL {
            assert_eq!(fact.name().parse::<Fact>(), Ok(fact));
            assert_eq!(
                serde_json::to_string(&fact).unwrap(),
                format!("\"{}\"", fact.name())
            );
        }
        assert!("flying".parse::<Fact>().is_err());
    }

    #[test]
    fn range_facts_are_exclusive() {
        let map = map();
        let me = creature_at(1, 10);
        for (min, max) in [(1, 1), (2, 6), (1, 2)] {
            for x in 11..25 {
                let other = creature_at(2, x);
                let ctx = context(&me, Some(&other), &map, (min, max));
                let set = [Fact::TooCloseTarget, Fact::TooFarTarget, Fact::NearTarget]
                    .into_iter()
                    .filter(|f| evaluate(*f, &ctx))
                    .count();
                assert_eq!(set, 1, "distance {} range {}..={}", x - 10, min, max);
            }
        }
    }

    #[test]
    fn range_facts_without_target_are_false() {
        let map = map();
        let me = creature_at(1, 10);
        let ctx = context(&me, None, &map, (1, 1));
        assert!(!evaluate(Fact::NearTarget, &ctx));
        assert!(!evaluate(Fact::TooFarTarget, &ctx));
        assert!(!evaluate(Fact::TooCloseTarget, &ctx));
        assert!(evaluate(Fact::HiddenFromTarget, &ctx));
        assert!(evaluate(Fact::KillCreature, &ctx));
    }

    #[test]
    fn hidden_at_seven_tiles() {
        let map = map();
        let me = creature_at(1, 10);
        let near = creature_at(2, 16);
        let far = creature_at(3, 17);
        assert!(!evaluate(Fact::HiddenFromTarget, &context(&me, Some(&near), &map, (1, 1))));
        assert!(evaluate(Fact::HiddenFromTarget, &context(&me, Some(&far), &map, (1, 1))));
    }

    #[test]
    fn virtual_facts_are_false() {
        let map = map();
        let me = creature_at(1, 10);
        let ctx = context(&me, None, &map, (1, 1));
        assert!(!evaluate(Fact::Food, &ctx));
        assert!(!evaluate(Fact::Wander, &ctx));
        assert!(!evaluate(Fact::OnGrass, &ctx));
    }

    #[test]
    fn cache_evaluates_once() {
        let mut cache = FactCache::default();
        let mut calls = 0;
        assert!(cache.get_or_eval(Fact::OnGrass, || {
            calls += 1;
            true
        }));
        assert!(cache.get_or_eval(Fact::OnGrass, || {
            calls += 1;
            false
        }));
        assert_eq!(calls, 1);
        cache.clear();
        assert!(cache.is_empty());
        assert!(!cache.get_or_eval(Fact::OnGrass, || false));
    }
}
