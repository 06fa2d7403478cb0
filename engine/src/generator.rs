//! Chunk generation. A `ChunkGenerator` is the one seam a host world
//! implementation plugs into; the deterministic generators here exist for
//! tests and the CLI demo binary only.

use crate::chunk::{Chunk, CHUNK_BLOCKS};
use crate::errors::PathfinderError;
use crate::geometry::ChunkPos;

/// Produces chunk solidity data given a world seed and a chunk coordinate.
/// Implementations must be deterministic for a fixed `(seed, pos)` pair:
/// the cache relies on never needing to regenerate a chunk once evicted
/// and later re-requested with the same seed. A chunk is either fully
/// produced or an error is surfaced; there is no partial-result case.
pub trait ChunkGenerator: Send + Sync {
    fn generate(&self, seed: i64, pos: ChunkPos) -> Result<Chunk, PathfinderError>;
}

/// Every block empty. Useful as a baseline and for tests that only care
/// about cache/cull behavior rather than obstacle geometry.
#[derive(Debug, Default)]
pub struct FlatWorldGenerator;

impl ChunkGenerator for FlatWorldGenerator {
    fn generate(&self, _seed: i64, _pos: ChunkPos) -> Result<Chunk, PathfinderError> {
        Ok(Chunk::from_solidity(Box::new([false; CHUNK_BLOCKS]), false))
    }
}

/// A flat floor at `floor_y` with everything below it solid and everything
/// above it open, mimicking a superflat void world.
#[derive(Debug)]
pub struct FloorWorldGenerator {
    pub floor_y: i32,
}

impl ChunkGenerator for FloorWorldGenerator {
    fn generate(&self, _seed: i64, _pos: ChunkPos) -> Result<Chunk, PathfinderError> {
        let mut solid = Box::new([false; CHUNK_BLOCKS]);
        for y in 0..=self.floor_y.clamp(0, 127) {
            for z in 0..16 {
                for x in 0..16 {
                    solid[((y << 8) | (z << 4) | x) as usize] = true;
                }
            }
        }
        Ok(Chunk::from_solidity(solid, false))
    }
}

/// Always fails generation, reporting `cx,cz` in the error. Models a host
/// world whose chunk source rejected or could not produce a region (for
/// example an out-of-bounds or unloaded chunk), and exercises the
/// `PathfinderError::Generation` path through the cache and the driver.
#[derive(Debug, Default)]
pub struct FailingGenerator;

impl ChunkGenerator for FailingGenerator {
    fn generate(&self, _seed: i64, pos: ChunkPos) -> Result<Chunk, PathfinderError> {
        Err(PathfinderError::Generation(format!(
            "no data available for chunk {},{}",
            pos.cx, pos.cz
        )))
    }
}

/// A flat floor at `floor_y`, plus solid walls at every chunk boundary
/// with a single one-block-wide doorway, used to force the search through
/// a narrow known corridor in integration tests.
#[derive(Debug)]
pub struct WalledWorldGenerator {
    pub floor_y: i32,
    pub wall_x: i32,
    pub doorway_z: i32,
}

impl ChunkGenerator for WalledWorldGenerator {
    fn generate(&self, _seed: i64, pos: ChunkPos) -> Result<Chunk, PathfinderError> {
        let mut solid = Box::new([false; CHUNK_BLOCKS]);
        for y in 0..=self.floor_y.clamp(0, 127) {
            for z in 0..16 {
                for x in 0..16 {
                    solid[((y << 8) | (z << 4) | x) as usize] = true;
                }
            }
        }
        let local_wall_x = self.wall_x - pos.cx * 16;
        if (0..16).contains(&local_wall_x) {
            let local_doorway_z = self.doorway_z - pos.cz * 16;
            for y in (self.floor_y + 1)..128 {
                for z in 0..16 {
                    if z == local_doorway_z {
                        continue;
                    }
                    solid[((y << 8) | (z << 4) | local_wall_x) as usize] = true;
                }
            }
        }
        Ok(Chunk::from_solidity(solid, false))
    }
}
