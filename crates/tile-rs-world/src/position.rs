//! Tile coordinates and distance helpers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A tile position: partition `w`, then `x`/`y` on the floor plane and level `z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    pub w: u32,
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Point {
    pub const fn new(w: u32, x: i32, y: i32, z: i32) -> Self {
        Self { w, x, y, z }
    }

    /// Same partition and level, shifted on the floor plane.
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            w: self.w,
            x: self.x + dx,
            y: self.y + dy,
            z: self.z,
        }
    }

    /// Whether both points share a partition and a level.
    pub fn same_plane(self, other: Point) -> bool {
        self.w == other.w && self.z == other.z
    }

    /// Largest per-axis difference on the floor plane (Chebyshev distance).
    ///
    /// Points on different partitions or levels are infinitely far apart,
    /// reported as `u32::MAX`.
    pub fn max_diff(self, other: Point) -> u32 {
        if !self.same_plane(other) {
            return u32::MAX;
        }
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }

    /// Manhattan distance on the floor plane, `u32::MAX` across planes.
    pub fn manhattan(self, other: Point) -> u32 {
        if !self.same_plane(other) {
            return u32::MAX;
        }
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// The four orthogonal neighbours, in north/east/south/west order.
    pub fn neighbors4(self) -> [Point; 4] {
        [
            self.offset(0, -1),
            self.offset(1, 0),
            self.offset(0, 1),
            self.offset(-1, 0),
        ]
    }

    /// Unit step pointing from `threat` toward `self`, per axis.
    ///
    /// Returns `(0, 0)` when both points coincide.
    pub fn direction_away_from(self, threat: Point) -> (i32, i32) {
        ((self.x - threat.x).signum(), (self.y - threat.y).signum())
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.w, self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_diff_is_chebyshev() {
        let a = Point::new(0, 0, 0, 0);
        assert_eq!(a.max_diff(Point::new(0, 3, -5, 0)), 5);
        assert_eq!(a.max_diff(Point::new(0, -2, 1, 0)), 2);
        assert_eq!(a.max_diff(a), 0);
    }

    #[test]
    fn max_diff_across_planes_is_infinite() {
        let a = Point::new(0, 0, 0, 0);
        assert_eq!(a.max_diff(Point::new(1, 0, 0, 0)), u32::MAX);
        assert_eq!(a.max_diff(Point::new(0, 0, 0, 1)), u32::MAX);
    }

    #[test]
    fn manhattan_distance() {
        let a = Point::new(0, 1, 1, 0);
        assert_eq!(a.manhattan(Point::new(0, 4, -1, 0)), 5);
    }

    #[test]
    fn direction_away() {
        let me = Point::new(0, 5, 5, 0);
        assert_eq!(me.direction_away_from(Point::new(0, 7, 5, 0)), (-1, 0));
        assert_eq!(me.direction_away_from(Point::new(0, 2, 9, 0)), (1, -1));
        assert_eq!(me.direction_away_from(me), (0, 0));
    }

    #[test]
    fn serde_roundtrip() {
        let p = Point::new(2, -4, 9, 1);
        let json = serde_json::to_string(&p).unwrap();
        let back: Point = serde_json::from_str(&json).unwrap();
        assert_eq!(p, back);
    }
}
