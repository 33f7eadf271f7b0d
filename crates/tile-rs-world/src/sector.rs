//! Sectors: fixed-size tile blocks that partitions load on demand.

use crate::error::WorldError;
use crate::position::Point;
use crate::tile::Tile;

/// Sector edge length in tiles.
pub const SECTOR_SIZE: u32 = 20;

/// Sector coordinates within a partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectorPoint {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl SectorPoint {
    /// The sector containing a tile position, or `None` for negative coordinates.
    pub fn containing(pos: Point) -> Option<Self> {
        if pos.x < 0 || pos.y < 0 || pos.z < 0 {
            return None;
        }
        Some(Self {
            x: pos.x as u32 / SECTOR_SIZE,
            y: pos.y as u32 / SECTOR_SIZE,
            z: pos.z as u32,
        })
    }
}

/// A `SECTOR_SIZE` x `SECTOR_SIZE` block of tiles on one level.
#[derive(Debug, Clone)]
pub struct Sector {
    /// Row-major: `y * SECTOR_SIZE + x`.
    tiles: Vec<Tile>,
}

impl Sector {
    /// A sector with every tile set to the same floor.
    pub fn filled(floor: u16) -> Self {
        let count = (SECTOR_SIZE * SECTOR_SIZE) as usize;
        Self {
            tiles: vec![Tile::with_floor(floor); count],
        }
    }

    /// Build from a tile list; must hold exactly `SECTOR_SIZE^2` tiles.
    pub fn from_tiles(tiles: Vec<Tile>) -> Option<Self> {
        if tiles.len() != (SECTOR_SIZE * SECTOR_SIZE) as usize {
            return None;
        }
        Some(Self { tiles })
    }

    fn index(pos: Point) -> usize {
        let lx = pos.x as u32 % SECTOR_SIZE;
        let ly = pos.y as u32 % SECTOR_SIZE;
        (ly * SECTOR_SIZE + lx) as usize
    }

    /// Tile at a world position that lies inside this sector.
    pub fn tile(&self, pos: Point) -> &Tile {
        &self.tiles[Self::index(pos)]
    }

    pub fn tile_mut(&mut self, pos: Point) -> &mut Tile {
        &mut self.tiles[Self::index(pos)]
    }
}

/// Source of sector contents, called the first time a sector is touched.
pub trait SectorLoader: Send {
    fn load(&mut self, w: u32, sector: SectorPoint) -> Result<Sector, WorldError>;
}

/// Loader that fills every sector with a single floor.
#[derive(Debug, Clone, Copy)]
pub struct FlatSectorLoader {
    pub floor: u16,
}

impl FlatSectorLoader {
    pub fn new(floor: u16) -> Self {
        Self { floor }
    }
}

impl SectorLoader for FlatSectorLoader {
    fn load(&mut self, _w: u32, _sector: SectorPoint) -> Result<Sector, WorldError> {
        Ok(Sector::filled(self.floor))
    }
}
