//! Dense per-chunk solidity storage plus the hierarchical "is this N`*`N`*`N
//! sub-cube fully empty" aggregates the neighbor-enumeration pass queries.

use crate::errors::PathfinderError;
use crate::geometry::Size;

pub const CHUNK_BLOCKS: usize = 16 * 128 * 16;
const WIDTH: i32 = 16;
const HEIGHT: i32 = 128;

/// Local-tile index within a chunk: `i = (y<<8) | (z<<4) | x`.
fn lti(x: i32, y: i32, z: i32) -> usize {
    debug_assert!((0..WIDTH).contains(&x));
    debug_assert!((0..HEIGHT).contains(&y));
    debug_assert!((0..WIDTH).contains(&z));
    ((y << 8) | (z << 4) | x) as usize
}

/// A 16x128x16 column of voxels, aligned to the chunk grid, plus
/// precomputed emptiness aggregates for sizes 2, 4, 8, 16.
#[derive(Debug, Clone)]
pub struct Chunk {
    solid: Box<[bool; CHUNK_BLOCKS]>,
    /// `aggregates[k]` holds `is_empty` for size `2^(k+1)` (k=0 -> X2 .. k=3 -> X16),
    /// indexed by `agg_index` at that size's resolution.
    aggregates: [Vec<bool>; 4],
    /// True if this chunk was supplied by the host via `insert_chunk`
    /// rather than produced by a `ChunkGenerator`.
    pub host_supplied: bool,
}

impl Chunk {
    /// Builds a chunk from a raw solidity grid, populating all four
    /// aggregate levels bottom-up.
    pub fn from_solidity(solid: Box<[bool; CHUNK_BLOCKS]>, host_supplied: bool) -> Self {
        let mut chunk = Self {
            solid,
            aggregates: [Vec::new(), Vec::new(), Vec::new(), Vec::new()],
            host_supplied,
        };
        chunk.rebuild_aggregates();
        chunk
    }

    /// Builds a chunk from a host-supplied flat array, validating its
    /// length per §6/§7 (`MalformedInput`).
    pub fn from_host_array(flat: &[bool]) -> Result<Self, PathfinderError> {
        if flat.len() != CHUNK_BLOCKS {
            return Err(PathfinderError::MalformedInput {
                expected: CHUNK_BLOCKS,
                actual: flat.len(),
            });
        }
        let mut solid = Box::new([false; CHUNK_BLOCKS]);
        solid.copy_from_slice(flat);
        Ok(Self::from_solidity(solid, true))
    }

    pub fn set_block(&mut self, x: i32, y: i32, z: i32, is_solid: bool) {
        self.solid[lti(x, y, z)] = is_solid;
    }

    /// Whether the single block at local coordinates `(x,y,z)` is empty.
    /// Blocks outside the vertical band are treated as solid, per §4.1.
    pub fn is_block_empty(&self, x: i32, y: i32, z: i32) -> bool {
        if !(0..HEIGHT).contains(&y) {
            return false;
        }
        !self.solid[lti(x, y, z)]
    }

    /// Whether the aligned cube of the given size, with local-space origin
    /// `(x,y,z)`, is fully empty. `origin` must already be aligned to
    /// `size.side()`; `size == X1` degrades to a single-block query.
    pub fn is_empty(&self, size: Size, x: i32, y: i32, z: i32) -> bool {
        if size == Size::X1 {
            return self.is_block_empty(x, y, z);
        }
        let side = size.side();
        if x < 0 || z < 0 || x + side > WIDTH || z + side > WIDTH {
            return false;
        }
        if y < 0 || y + side > HEIGHT {
            return false;
        }
        let level = size as usize - 1;
        let idx = self.agg_index(size, x, y, z);
        self.aggregates[level][idx]
    }

    fn agg_index(&self, size: Size, x: i32, y: i32, z: i32) -> usize {
        let side = size.side();
        let w = WIDTH / side;
        let h = HEIGHT / side;
        let (lx, ly, lz) = (x / side, y / side, z / side);
        ((ly * w + lz) * w + lx) as usize
    }

    fn rebuild_aggregates(&mut self) {
        let mut prev_side = 1i32;
        for (level, size) in [Size::X2, Size::X4, Size::X8, Size::X16].into_iter().enumerate() {
            let side = size.side();
            let w = (WIDTH / side) as usize;
            let h = (HEIGHT / side) as usize;
            let mut grid = vec![false; w * h * w];
            for ly in 0..h as i32 {
                for lz in 0..w as i32 {
                    for lx in 0..w as i32 {
                        let (ox, oy, oz) = (lx * side, ly * side, lz * side);
                        let empty = if level == 0 {
                            (0..2).all(|dx| {
                                (0..2).all(|dy| {
                                    (0..2).all(|dz| {
                                        self.is_block_empty(
                                            ox + dx * prev_side,
                                            oy + dy * prev_side,
                                            oz + dz * prev_side,
                                        )
                                    })
                                })
                            })
                        } else {
                            let child_level = level - 1;
                            (0..2).all(|dx| {
                                (0..2).all(|dy| {
                                    (0..2).all(|dz| {
                                        let cx = ox + dx * prev_side;
                                        let cy = oy + dy * prev_side;
                                        let cz = oz + dz * prev_side;
                                        let cw = (WIDTH / prev_side) as i32;
                                        let (clx, cly, clz) =
                                            (cx / prev_side, cy / prev_side, cz / prev_side);
                                        self.aggregates[child_level]
                                            [((cly * cw + clz) * cw + clx) as usize]
                                    })
                                })
                            })
                        };
                        grid[(ly as usize * w + lz as usize) * w + lx as usize] = empty;
                    }
                }
            }
            self.aggregates[level] = grid;
            prev_side = side;
        }
    }
}
