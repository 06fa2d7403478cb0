//! Host-facing entry point: `Context` owns the chunk cache, the
//! generator, the configuration, and the cancellation flag for one
//! pathfinding session, and exposes the operations a host runtime drives.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::cache::ChunkCache;
use crate::chunk::{Chunk, CHUNK_BLOCKS};
use crate::config::{PathfinderConfig, TimeoutOverrides};
use crate::errors::PathfinderError;
use crate::generator::ChunkGenerator;
use crate::geometry::{BlockPos, ChunkPos, NodePos, Size};
use crate::search::{self, Path};

const X_BITS: u32 = 26;
const Y_BITS: u32 = 12;
const Z_BITS: u32 = 26;

/// Packs a `BlockPos` into `x:26 | y:12 | z:26` bits, per §6.
pub fn pack_block_pos(pos: BlockPos) -> i64 {
    let x = (pos.x as i64) & ((1i64 << X_BITS) - 1);
    let y = (pos.y as i64) & ((1i64 << Y_BITS) - 1);
    let z = (pos.z as i64) & ((1i64 << Z_BITS) - 1);
    (x << (Y_BITS + Z_BITS)) | (y << Z_BITS) | z
}

fn sign_extend(value: i64, bits: u32) -> i32 {
    let shift = 64 - bits;
    ((value << shift) >> shift) as i32
}

/// Unpacks a value produced by [`pack_block_pos`]. Sign-extends `x` and
/// `z` so negative coordinates round-trip (the original implementation
/// this was distilled from did not, and silently wrapped negative
/// coordinates into large positive ones).
pub fn unpack_block_pos(packed: i64) -> BlockPos {
    let x_mask = (1i64 << X_BITS) - 1;
    let y_mask = (1i64 << Y_BITS) - 1;
    let z_mask = (1i64 << Z_BITS) - 1;
    let z_raw = packed & z_mask;
    let y_raw = (packed >> Z_BITS) & y_mask;
    let x_raw = (packed >> (Z_BITS + Y_BITS)) & x_mask;
    BlockPos::new(sign_extend(x_raw, X_BITS), y_raw as i32, sign_extend(z_raw, Z_BITS))
}

/// A single pathfinding session: one seed, one generator, one chunk
/// cache, and one cancellation flag, shared across however many
/// `find_path` calls the host makes.
pub struct Context {
    generator: Arc<dyn ChunkGenerator>,
    cache: ChunkCache,
    config: PathfinderConfig,
    cancel: AtomicBool,
}

impl Context {
    pub fn new(seed: i64, generator: Arc<dyn ChunkGenerator>, config: PathfinderConfig) -> Self {
        utils::parallel::init_threadpool(config.prefetch_threads);
        Self {
            generator,
            cache: ChunkCache::new(seed),
            config,
            cancel: AtomicBool::new(false),
        }
    }

    /// Stores a host-supplied chunk, preempting generation for `(cx, cz)`.
    pub fn insert_chunk(&self, cx: i32, cz: i32, solidity: &[bool; CHUNK_BLOCKS]) -> Result<(), PathfinderError> {
        let chunk = Chunk::from_host_array(solidity.as_slice())?;
        self.cache.insert(ChunkPos::new(cx, cz), chunk);
        Ok(())
    }

    pub fn get_or_create_chunk(&self, cx: i32, cz: i32) -> Result<Arc<Chunk>, PathfinderError> {
        self.cache.get_or_generate(ChunkPos::new(cx, cz), self.generator.as_ref())
    }

    pub fn get_chunk(&self, cx: i32, cz: i32) -> Option<Arc<Chunk>> {
        self.cache.get(ChunkPos::new(cx, cz))
    }

    pub fn cull_far_chunks(&self, cx: i32, cz: i32, max_distance_blocks: i64) {
        self.cache.cull_far(ChunkPos::new(cx, cz), max_distance_blocks);
    }

    /// Finds a path from `start` to `goal`. `coarse_min` selects whether
    /// the start node is promoted to an `X4` cube (`true`) or an `X2`
    /// cube (`false`) before the search begins. `timeout_overrides`, when
    /// present, replaces this call's primary/failure timeouts without
    /// touching the `PathfinderConfig` this `Context` was built with, so a
    /// host can vary one search's budget without discarding the chunk
    /// cache by rebuilding the `Context`.
    #[tracing::instrument(skip(self))]
    pub fn find_path(
        &self,
        start: BlockPos,
        goal: BlockPos,
        coarse_min: bool,
        timeout_overrides: Option<TimeoutOverrides>,
    ) -> Result<Option<Path>, PathfinderError> {
        if !start.is_in_bounds() {
            return Err(PathfinderError::OutOfBounds { y: start.y });
        }
        if !goal.is_in_bounds() {
            return Err(PathfinderError::OutOfBounds { y: goal.y });
        }
        let start_size = if coarse_min { Size::X4 } else { Size::X2 };
        let start_node = self.nearest_empty_cube(start, start_size)?;
        search::find_path(
            start_node,
            goal,
            &self.cache,
            self.generator.as_ref(),
            &self.cancel,
            &self.config,
            timeout_overrides,
        )
    }

    /// Sets the cancellation flag, returning its previous value.
    pub fn cancel(&self) -> bool {
        self.cancel.swap(true, Ordering::SeqCst)
    }

    pub fn reset_cancel(&self) {
        self.cancel.store(false, Ordering::SeqCst);
    }

    /// Spirals outward from `point`, aligned to `size`'s grid, looking for
    /// the nearest fully empty cube to seed the search from. Falls back to
    /// the cube directly containing `point` if none is found within the
    /// search radius (the driver still functions against a blocked start;
    /// neighbor enumeration just shrinks around it).
    fn nearest_empty_cube(&self, point: BlockPos, size: Size) -> Result<NodePos, PathfinderError> {
        const MAX_RADIUS: i32 = 4;
        let side = size.side();
        let align = |v: i32| v.div_euclid(side) * side;
        let base = BlockPos::new(align(point.x), align(point.y), align(point.z));

        for radius in 0..=MAX_RADIUS {
            for dz in -radius..=radius {
                for dy in -radius..=radius {
                    for dx in -radius..=radius {
                        if dx.abs().max(dy.abs()).max(dz.abs()) != radius {
                            continue;
                        }
                        let origin = BlockPos::new(base.x + dx * side, base.y + dy * side, base.z + dz * side);
                        if origin.y < 0 || origin.y + side > 128 {
                            continue;
                        }
                        let chunk_pos = origin.to_chunk_pos();
                        let chunk = self.cache.get_or_generate(chunk_pos, self.generator.as_ref())?;
                        let lx = origin.x.rem_euclid(16);
                        let lz = origin.z.rem_euclid(16);
                        if chunk.is_empty(size, lx, origin.y, lz) {
                            return Ok(NodePos::new(size, origin));
                        }
                    }
                }
            }
        }
        Ok(NodePos::new(size, base))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::FlatWorldGenerator;

    #[test]
    fn block_pos_round_trips_through_packing_including_negatives() {
        let positions = [
            BlockPos::new(0, 0, 0),
            BlockPos::new(-1, 64, -1),
            BlockPos::new(-33554432, 127, -33554432),
            BlockPos::new(33554431, 0, 33554431),
        ];
        for pos in positions {
            let packed = pack_block_pos(pos);
            assert_eq!(unpack_block_pos(packed), pos, "round trip failed for {pos:?}");
        }
    }

    #[test]
    fn out_of_bounds_start_is_rejected() {
        let ctx = Context::new(0, Arc::new(FlatWorldGenerator), PathfinderConfig::default());
        let err = ctx.find_path(BlockPos::new(0, -1, 0), BlockPos::new(0, 64, 0), false, None).unwrap_err();
        assert_eq!(err, PathfinderError::OutOfBounds { y: -1 });
    }

    #[test]
    fn insert_chunk_rejects_wrong_length() {
        let ctx = Context::new(0, Arc::new(FlatWorldGenerator), PathfinderConfig::default());
        let short: Vec<bool> = vec![false; 10];
        let err = Chunk::from_host_array(&short).unwrap_err();
        assert!(matches!(err, PathfinderError::MalformedInput { .. }));
        // Context::insert_chunk takes a fixed-size array, so only the
        // underlying Chunk constructor is exercised for the short case.
        let _ = ctx;
    }

    #[test]
    fn coarse_min_promotes_start_node_to_x4() {
        let ctx = Context::new(0, Arc::new(FlatWorldGenerator), PathfinderConfig::default());
        let start = BlockPos::new(0, 64, 0);
        let node = ctx.nearest_empty_cube(start, Size::X4).unwrap();
        assert_eq!(node.size, Size::X4);
    }

    #[test]
    fn timeout_override_is_honored_without_mutating_context_config() {
        let config = PathfinderConfig::default();
        let ctx = Context::new(0, Arc::new(FlatWorldGenerator), config);
        let overrides = TimeoutOverrides { primary_timeout_ms: Some(0), failure_timeout_ms: Some(50) };
        let result = ctx
            .find_path(BlockPos::new(0, 64, 0), BlockPos::new(100_000, 64, 0), false, Some(overrides))
            .unwrap();
        assert!(result.is_some());
        assert_eq!(ctx.config, config, "overrides must not mutate the baked-in config");
    }
}
