//! The world map: partitions of lazily loaded sectors, plus spatial queries.
//!
//! Reads never load anything: a tile in a sector that has not been loaded yet
//! reads as `None` and is treated as unwalkable. Callers that need an area to
//! exist (the simulation, before ticking a creature) call
//! [`WorldMap::load_sectors_around`] first. Writes load on demand.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::error::WorldError;
use crate::item_registry::ItemRegistry;
use crate::position::Point;
use crate::sector::{Sector, SectorLoader, SectorPoint, SECTOR_SIZE};
use crate::tile::{CreatureId, Item, Tile, VOID_FLOOR};

/// One independent map area (a "world" in the `w` coordinate).
pub struct Partition {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    sectors: HashMap<SectorPoint, Sector>,
    loader: Box<dyn SectorLoader>,
}

impl Partition {
    pub fn new(width: u32, height: u32, depth: u32, loader: Box<dyn SectorLoader>) -> Self {
        Self {
            width,
            height,
            depth,
            sectors: HashMap::new(),
            loader,
        }
    }

    /// Whether a position (ignoring `w`) lies inside this partition.
    pub fn in_bounds(&self, pos: Point) -> bool {
        pos.x >= 0
            && pos.y >= 0
            && pos.z >= 0
            && (pos.x as u32) < self.width
            && (pos.y as u32) < self.height
            && (pos.z as u32) < self.depth
    }

    /// Number of sectors currently loaded.
    pub fn loaded_sector_count(&self) -> usize {
        self.sectors.len()
    }

    pub fn is_loaded(&self, sector: SectorPoint) -> bool {
        self.sectors.contains_key(&sector)
    }

    fn tile(&self, pos: Point) -> Option<&Tile> {
        if !self.in_bounds(pos) {
            return None;
        }
        let sp = SectorPoint::containing(pos)?;
        self.sectors.get(&sp).map(|sector| sector.tile(pos))
    }

    fn ensure_loaded(&mut self, w: u32, sp: SectorPoint) -> Result<&mut Sector, WorldError> {
        if !self.sectors.contains_key(&sp) {
            let sector = self.loader.load(w, sp)?;
            debug!("Loaded sector ({},{},{}) of partition {}", sp.x, sp.y, sp.z, w);
            self.sectors.insert(sp, sector);
        }
        self.sectors.get_mut(&sp).ok_or_else(|| WorldError::SectorLoad {
            w,
            x: sp.x,
            y: sp.y,
            z: sp.z,
            reason: "sector vanished after load".into(),
        })
    }

    fn tile_mut(&mut self, pos: Point) -> Result<&mut Tile, WorldError> {
        if !self.in_bounds(pos) {
            return Err(WorldError::OutOfBounds(pos));
        }
        let sp = SectorPoint::containing(pos).ok_or(WorldError::OutOfBounds(pos))?;
        Ok(self.ensure_loaded(pos.w, sp)?.tile_mut(pos))
    }
}

/// All partitions plus the item definitions needed to interpret their tiles.
pub struct WorldMap {
    partitions: BTreeMap<u32, Partition>,
    pub items: ItemRegistry,
}

impl Default for WorldMap {
    fn default() -> Self {
        Self::new(ItemRegistry::new())
    }
}

impl WorldMap {
    pub fn new(items: ItemRegistry) -> Self {
        Self {
            partitions: BTreeMap::new(),
            items,
        }
    }

    /// Add a partition under id `w`.
    pub fn add_partition(&mut self, w: u32, partition: Partition) -> Result<(), WorldError> {
        if self.partitions.contains_key(&w) {
            return Err(WorldError::DuplicatePartition(w));
        }
        self.partitions.insert(w, partition);
        Ok(())
    }

    pub fn partition(&self, w: u32) -> Option<&Partition> {
        self.partitions.get(&w)
    }

    pub fn partition_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.partitions.keys().copied()
    }

    pub fn in_bounds(&self, pos: Point) -> bool {
        self.partition(pos.w)
            .map(|p| p.in_bounds(pos))
            .unwrap_or(false)
    }

    /// Make sure every sector overlapping the square of `radius` tiles around
    /// `center` is loaded. Returns how many sectors were newly loaded.
    pub fn load_sectors_around(&mut self, center: Point, radius: u32) -> Result<usize, WorldError> {
        let partition = self
            .partitions
            .get_mut(&center.w)
            .ok_or(WorldError::UnknownPartition(center.w))?;
        if center.z < 0 || center.z as u32 >= partition.depth {
            return Err(WorldError::OutOfBounds(center));
        }
        let r = radius as i32;
        let min_x = (center.x - r).max(0);
        let min_y = (center.y - r).max(0);
        let max_x = (center.x + r).min(partition.width as i32 - 1);
        let max_y = (center.y + r).min(partition.height as i32 - 1);
        if max_x < min_x || max_y < min_y {
            return Ok(0);
        }

        let size = SECTOR_SIZE as i32;
        let mut loaded = 0;
        for sy in (min_y / size)..=(max_y / size) {
            for sx in (min_x / size)..=(max_x / size) {
                let sp = SectorPoint {
                    x: sx as u32,
                    y: sy as u32,
                    z: center.z as u32,
                };
                if !partition.is_loaded(sp) {
                    partition.ensure_loaded(center.w, sp)?;
                    loaded += 1;
                }
            }
        }
        Ok(loaded)
    }

    /// The tile at `pos`, or `None` when out of bounds or not loaded.
    pub fn tile(&self, pos: Point) -> Option<&Tile> {
        self.partition(pos.w)?.tile(pos)
    }

    /// Mutable tile access, loading its sector if needed.
    pub fn tile_mut(&mut self, pos: Point) -> Result<&mut Tile, WorldError> {
        self.partitions
            .get_mut(&pos.w)
            .ok_or(WorldError::UnknownPartition(pos.w))?
            .tile_mut(pos)
    }

    pub fn floor(&self, pos: Point) -> Option<u16> {
        self.tile(pos).map(|t| t.floor)
    }

    /// Floor and item allow standing here, ignoring creatures.
    pub fn is_passable(&self, pos: Point) -> bool {
        match self.tile(pos) {
            Some(tile) => self.tile_is_passable(tile),
            None => false,
        }
    }

    fn tile_is_passable(&self, tile: &Tile) -> bool {
        if tile.floor == VOID_FLOOR {
            return false;
        }
        match tile.item {
            Some(item) => self.items.is_walkable(item.type_id),
            None => true,
        }
    }

    /// A creature could step onto `pos` right now.
    pub fn walkable(&self, pos: Point) -> bool {
        match self.tile(pos) {
            Some(tile) => tile.creature.is_none() && self.tile_is_passable(tile),
            None => false,
        }
    }

    pub fn set_floor(&mut self, pos: Point, floor: u16) -> Result<(), WorldError> {
        self.tile_mut(pos)?.floor = floor;
        Ok(())
    }

    pub fn set_item(&mut self, pos: Point, item: Option<Item>) -> Result<(), WorldError> {
        if let Some(item) = item {
            if self.items.get(item.type_id).is_none() {
                return Err(WorldError::UnknownItem(item.type_id));
            }
        }
        self.tile_mut(pos)?.item = item;
        Ok(())
    }

    /// Record (or clear) the creature occupying a tile.
    pub fn set_creature(&mut self, pos: Point, creature: Option<CreatureId>) -> Result<(), WorldError> {
        self.tile_mut(pos)?.creature = creature;
        Ok(())
    }

    fn blocks_sight(&self, pos: Point) -> bool {
        match self.tile(pos) {
            Some(tile) => tile
                .item
                .map(|item| self.items.blocks_sight(item.type_id))
                .unwrap_or(false),
            None => true,
        }
    }

    /// Whether nothing between `from` and `to` blocks sight.
    ///
    /// Walks a Bresenham line; the end points themselves never block.
    pub fn has_line_of_sight(&self, from: Point, to: Point) -> bool {
        if !from.same_plane(to) {
            return false;
        }
        let dx = (to.x - from.x).abs();
        let dy = -(to.y - from.y).abs();
        let sx = if from.x < to.x { 1 } else { -1 };
        let sy = if from.y < to.y { 1 } else { -1 };
        let mut err = dx + dy;
        let (mut x, mut y) = (from.x, from.y);

        loop {
            if x == to.x && y == to.y {
                return true;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
            let step = Point::new(from.w, x, y, from.z);
            if step != to && self.blocks_sight(step) {
                return false;
            }
        }
    }

    /// The closest loaded tile within `range` (Chebyshev) of `origin` that
    /// satisfies `predicate`, searching ring by ring outward.
    ///
    /// With `line_of_sight` set, candidates must also be visible from `origin`.
    pub fn find_nearest<F>(
        &self,
        origin: Point,
        range: u32,
        line_of_sight: bool,
        predicate: F,
    ) -> Option<Point>
    where
        F: Fn(Point, &Tile) -> bool,
    {
        let r_max = range as i32;
        for r in 0..=r_max {
            for y in -r..=r {
                for x in -r..=r {
                    if x.abs() != r && y.abs() != r {
                        continue;
                    }
                    let pos = origin.offset(x, y);
                    let Some(tile) = self.tile(pos) else {
                        continue;
                    };
                    if !predicate(pos, tile) {
                        continue;
                    }
                    if line_of_sight && !self.has_line_of_sight(origin, pos) {
                        continue;
                    }
                    return Some(pos);
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item_registry::item_id;
    use crate::sector::FlatSectorLoader;
    use crate::tile::{is_grass, DIRT_FLOOR, WATER_FLOOR};

    fn test_map(width: u32, height: u32) -> WorldMap {
        let mut map = WorldMap::default();
        map.add_partition(
            0,
            Partition::new(width, height, 1, Box::new(FlatSectorLoader::new(DIRT_FLOOR))),
        )
        .unwrap();
        map.load_sectors_around(Point::new(0, 0, 0, 0), width.max(height))
            .unwrap();
        map
    }

    #[test]
    fn unloaded_tiles_are_not_walkable() {
        let mut map = WorldMap::default();
        map.add_partition(
            0,
            Partition::new(100, 100, 1, Box::new(FlatSectorLoader::new(DIRT_FLOOR))),
        )
        .unwrap();
        let pos = Point::new(0, 50, 50, 0);
        assert!(map.tile(pos).is_none());
        assert!(!map.walkable(pos));

        let loaded = map.load_sectors_around(pos, 0).unwrap();
        assert_eq!(loaded, 1);
        assert!(map.walkable(pos));
        assert_eq!(map.partition(0).unwrap().loaded_sector_count(), 1);
    }

    #[test]
    fn load_around_covers_neighbouring_sectors() {
        let mut map = WorldMap::default();
        map.add_partition(
            0,
            Partition::new(100, 100, 1, Box::new(FlatSectorLoader::new(DIRT_FLOOR))),
        )
        .unwrap();
        // (20,20) radius 1 touches sectors (0,0), (1,0), (0,1), (1,1).
        let loaded = map.load_sectors_around(Point::new(0, 20, 20, 0), 1).unwrap();
        assert_eq!(loaded, 4);
        // Nothing new the second time.
        let loaded = map.load_sectors_around(Point::new(0, 20, 20, 0), 1).unwrap();
        assert_eq!(loaded, 0);
    }

    #[test]
    fn unknown_partition_errors() {
        let mut map = WorldMap::default();
        let err = map.set_floor(Point::new(7, 0, 0, 0), 1).unwrap_err();
        assert!(matches!(err, WorldError::UnknownPartition(7)));
    }

    #[test]
    fn out_of_bounds_write_errors() {
        let mut map = test_map(10, 10);
        let err = map.set_floor(Point::new(0, 10, 0, 0), 1).unwrap_err();
        assert!(matches!(err, WorldError::OutOfBounds(_)));
    }

    #[test]
    fn walls_and_creatures_block() {
        let mut map = test_map(10, 10);
        let wall = Point::new(0, 2, 2, 0);
        map.set_item(wall, Some(Item::new(item_id::WALL))).unwrap();
        assert!(!map.walkable(wall));

        let occupied = Point::new(0, 3, 3, 0);
        map.set_creature(occupied, Some(CreatureId(1))).unwrap();
        assert!(!map.walkable(occupied));
        assert!(map.is_passable(occupied));

        let flower = Point::new(0, 4, 4, 0);
        map.set_item(flower, Some(Item::new(item_id::FLOWER))).unwrap();
        assert!(map.walkable(flower));
    }

    #[test]
    fn water_is_walkable_void_is_not() {
        let mut map = test_map(10, 10);
        map.set_floor(Point::new(0, 1, 1, 0), WATER_FLOOR).unwrap();
        map.set_floor(Point::new(0, 1, 2, 0), VOID_FLOOR).unwrap();
        assert!(map.walkable(Point::new(0, 1, 1, 0)));
        assert!(!map.walkable(Point::new(0, 1, 2, 0)));
    }

    #[test]
    fn set_unknown_item_errors() {
        let mut map = test_map(10, 10);
        let err = map
            .set_item(Point::new(0, 1, 1, 0), Some(Item::new(4242)))
            .unwrap_err();
        assert!(matches!(err, WorldError::UnknownItem(4242)));
    }

    #[test]
    fn line_of_sight_blocked_by_wall() {
        let mut map = test_map(20, 20);
        let from = Point::new(0, 0, 5, 0);
        let to = Point::new(0, 10, 5, 0);
        assert!(map.has_line_of_sight(from, to));

        map.set_item(Point::new(0, 5, 5, 0), Some(Item::new(item_id::WALL)))
            .unwrap();
        assert!(!map.has_line_of_sight(from, to));
        // A wall at the end point does not hide that tile itself.
        assert!(map.has_line_of_sight(from, Point::new(0, 5, 5, 0)));
        // Rocks block movement but not sight.
        map.set_item(Point::new(0, 5, 5, 0), Some(Item::new(item_id::ROCK)))
            .unwrap();
        assert!(map.has_line_of_sight(from, to));
    }

    #[test]
    fn find_nearest_prefers_closer_rings() {
        let mut map = test_map(20, 20);
        let origin = Point::new(0, 10, 10, 0);
        map.set_floor(Point::new(0, 14, 10, 0), 150).unwrap();
        map.set_floor(Point::new(0, 8, 8, 0), 150).unwrap();

        let found = map.find_nearest(origin, 8, false, |_, tile| is_grass(tile.floor));
        assert_eq!(found, Some(Point::new(0, 8, 8, 0)));
    }

    #[test]
    fn find_nearest_respects_range_and_sight() {
        let mut map = test_map(30, 30);
        let origin = Point::new(0, 10, 10, 0);
        map.set_floor(Point::new(0, 20, 10, 0), 150).unwrap();
        assert!(map
            .find_nearest(origin, 8, false, |_, tile| is_grass(tile.floor))
            .is_none());

        map.set_floor(Point::new(0, 13, 10, 0), 150).unwrap();
        map.set_item(Point::new(0, 12, 10, 0), Some(Item::new(item_id::WALL)))
            .unwrap();
        assert_eq!(
            map.find_nearest(origin, 8, false, |_, tile| is_grass(tile.floor)),
            Some(Point::new(0, 13, 10, 0))
        );
        // Behind the wall, the next visible grass is out of range.
        assert!(map
            .find_nearest(origin, 8, true, |_, tile| is_grass(tile.floor))
            .is_none());
    }
}
