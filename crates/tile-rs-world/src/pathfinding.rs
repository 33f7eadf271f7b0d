//! Tile pathfinding.
//!
//! A path is the ordered list of tiles to step through, excluding the start
//! tile and including the destination. The destination may be occupied (a
//! creature walking to its target); the mover notices that when the last step
//! turns out to be blocked.

use std::time::Duration;

use tracing::trace;

use crate::map::WorldMap;
use crate::position::Point;
use crate::search::{self, Edge, SearchOutcome};

/// Finds routes between tiles of one partition.
pub trait PathPlanner: Send {
    /// Waypoints from `from` to `to`. Empty when unreachable.
    fn find_path(&self, map: &WorldMap, from: Point, to: Point) -> Vec<Point>;
}

/// Four-neighbour A* over walkable tiles.
#[derive(Debug, Clone, Copy)]
pub struct GridPathPlanner {
    /// How far outside the start/goal bounding box the search may wander.
    pub margin: i32,
    /// Wall-clock budget per search. On timeout the best partial path is used.
    pub timeout: Option<Duration>,
}

impl Default for GridPathPlanner {
    fn default() -> Self {
        Self {
            margin: 10,
            timeout: Some(Duration::from_millis(20)),
        }
    }
}

impl PathPlanner for GridPathPlanner {
    fn find_path(&self, map: &WorldMap, from: Point, to: Point) -> Vec<Point> {
        if !from.same_plane(to) || from == to || !map.in_bounds(to) {
            return Vec::new();
        }

        let min_x = from.x.min(to.x) - self.margin;
        let max_x = from.x.max(to.x) + self.margin;
        let min_y = from.y.min(to.y) - self.margin;
        let max_y = from.y.max(to.y) + self.margin;
        let in_window = |p: &Point| p.x >= min_x && p.x <= max_x && p.y >= min_y && p.y <= max_y;

        let outcome = search::astar(
            from,
            |p| *p == to,
            |p: &Point| {
                p.neighbors4()
                    .into_iter()
                    .filter(|n| in_window(n) && (*n == to || map.walkable(*n)))
                    .map(|n| Edge {
                        to: n,
                        label: (),
                        cost: 1.0,
                    })
                    .collect()
            },
            |p| p.manhattan(to) as f32,
            self.timeout,
        );

        if !outcome.is_success() {
            if !matches!(outcome, SearchOutcome::Timeout(_)) {
                return Vec::new();
            }
            trace!("Path search {} -> {} timed out, using partial path", from, to);
        }
        outcome.into_path().nodes().copied().collect()
    }
}
