//! Neighbor enumeration: the Grow/Shrink pair that turns "cube C at size s,
//! face f" into the set of adjacent cubes reachable in one A* step.

use std::sync::Arc;

use crate::chunk::Chunk;
use crate::errors::PathfinderError;
use crate::geometry::{BlockPos, Face, NodePos, Size};

const HEIGHT: i32 = 128;

/// How neighbor enumeration resolves a chunk position to its data. The
/// driver supplies a closure backed by the already-prefetched chunks for
/// the current step; a lookup miss means the prefetch invariant was
/// violated and surfaces as `MissingNeighborChunk`.
pub trait ChunkLookup {
    fn chunk_at(&self, cx: i32, cz: i32) -> Option<Arc<Chunk>>;
}

impl<F> ChunkLookup for F
where
    F: Fn(i32, i32) -> Option<Arc<Chunk>>,
{
    fn chunk_at(&self, cx: i32, cz: i32) -> Option<Arc<Chunk>> {
        self(cx, cz)
    }
}

fn align_down(v: i32, side: i32) -> i32 {
    v.div_euclid(side) * side
}

fn is_empty_at(lookup: &dyn ChunkLookup, size: Size, origin: BlockPos) -> Result<bool, PathfinderError> {
    let chunk_pos = origin.to_chunk_pos();
    let chunk = lookup
        .chunk_at(chunk_pos.cx, chunk_pos.cz)
        .ok_or(PathfinderError::MissingNeighborChunk { cx: chunk_pos.cx, cz: chunk_pos.cz })?;
    let lx = origin.x.rem_euclid(16);
    let lz = origin.z.rem_euclid(16);
    Ok(chunk.is_empty(size, lx, origin.y, lz))
}

/// Which axis a face's candidate split fixes, and on which side.
fn touching_axis(face: Face) -> usize {
    match face {
        Face::East | Face::West => 0,
        Face::Up | Face::Down => 1,
        Face::North | Face::South => 2,
    }
}

/// The fixed coordinate along `touching_axis(face)` for quadrants that lie
/// on the face of the candidate cube nearest to where it was entered from.
fn fixed_coord(face: Face, origin: BlockPos, size: i32, half: i32) -> i32 {
    let (dx, dy, dz) = face.delta();
    let (d, axis_origin) = match touching_axis(face) {
        0 => (dx, origin.x),
        1 => (dy, origin.y),
        _ => (dz, origin.z),
    };
    if d > 0 {
        axis_origin
    } else {
        axis_origin + size - half
    }
}

fn quadrant_origins(face: Face, origin: BlockPos, size: i32, half: i32) -> [BlockPos; 4] {
    let fixed = fixed_coord(face, origin, size, half);
    match touching_axis(face) {
        0 => [
            BlockPos::new(fixed, origin.y, origin.z),
            BlockPos::new(fixed, origin.y + half, origin.z),
            BlockPos::new(fixed, origin.y, origin.z + half),
            BlockPos::new(fixed, origin.y + half, origin.z + half),
        ],
        1 => [
            BlockPos::new(origin.x, fixed, origin.z),
            BlockPos::new(origin.x + half, fixed, origin.z),
            BlockPos::new(origin.x, fixed, origin.z + half),
            BlockPos::new(origin.x + half, fixed, origin.z + half),
        ],
        _ => [
            BlockPos::new(origin.x, origin.y, fixed),
            BlockPos::new(origin.x + half, origin.y, fixed),
            BlockPos::new(origin.x, origin.y + half, fixed),
            BlockPos::new(origin.x + half, origin.y + half, fixed),
        ],
    }
}

fn shrink_and_emit(
    lookup: &dyn ChunkLookup,
    face: Face,
    size: Size,
    origin: BlockPos,
    min_neighbor_size: Size,
    out: &mut Vec<NodePos>,
) -> Result<(), PathfinderError> {
    if is_empty_at(lookup, size, origin)? {
        out.push(NodePos::new(size, origin));
        return Ok(());
    }
    let child_size = match size.shrink() {
        Some(cs) if cs >= min_neighbor_size => cs,
        _ => return Ok(()),
    };
    let half = child_size.side();
    for quadrant_origin in quadrant_origins(face, origin, size.side(), half) {
        shrink_and_emit(lookup, face, child_size, quadrant_origin, min_neighbor_size, out)?;
    }
    Ok(())
}

/// Enumerates the cubes reachable from `cur` by stepping across `face`.
/// Returns zero, one (grown or shrunk), or several (shrunk into
/// quadrants) `NodePos` candidates.
pub fn enumerate_neighbors(
    cur: NodePos,
    face: Face,
    lookup: &dyn ChunkLookup,
    min_neighbor_size: Size,
) -> Result<Vec<NodePos>, PathfinderError> {
    let s = cur.size;
    let mut origin = cur.origin.offset(face, s.side());
    let mut r = s;

    loop {
        let Some(bigger) = r.grow() else { break };
        let bigger_side = bigger.side();
        let aligned = BlockPos::new(
            align_down(origin.x, bigger_side),
            align_down(origin.y, bigger_side),
            align_down(origin.z, bigger_side),
        );
        if is_empty_at(lookup, bigger, aligned)? {
            origin = aligned;
            r = bigger;
        } else {
            break;
        }
    }

    if face.is_vertical() && (origin.y < 0 || origin.y + r.side() > HEIGHT) {
        return Ok(Vec::new());
    }

    if r != s {
        return Ok(vec![NodePos::new(r, origin)]);
    }

    let mut out = Vec::new();
    shrink_and_emit(lookup, face, r, origin, min_neighbor_size, &mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::CHUNK_BLOCKS;
    use crate::geometry::ChunkPos;
    use std::collections::HashMap;

    fn lookup_from(chunks: HashMap<ChunkPos, Arc<Chunk>>) -> impl ChunkLookup {
        move |cx: i32, cz: i32| chunks.get(&ChunkPos::new(cx, cz)).cloned()
    }

    fn empty_world(radius: i32) -> HashMap<ChunkPos, Arc<Chunk>> {
        let mut map = HashMap::new();
        for cx in -radius..=radius {
            for cz in -radius..=radius {
                map.insert(
                    ChunkPos::new(cx, cz),
                    Arc::new(Chunk::from_solidity(Box::new([false; CHUNK_BLOCKS]), false)),
                );
            }
        }
        map
    }

    #[test]
    fn fully_empty_world_grows_neighbor_to_max_size() {
        let lookup = lookup_from(empty_world(2));
        let cur = NodePos::new(Size::X1, BlockPos::new(0, 64, 0));
        let neighbors = enumerate_neighbors(cur, Face::East, &lookup, Size::X2).unwrap();
        assert_eq!(neighbors.len(), 1);
        assert_eq!(neighbors[0].size, Size::X16);
    }

    #[test]
    fn solid_wall_shrinks_into_quadrants_not_below_floor() {
        let mut world = empty_world(2);
        // a fully solid chunk at cx=1, so stepping East from (15,64,0) hits it.
        world.insert(
            ChunkPos::new(1, 0),
            Arc::new(Chunk::from_solidity(Box::new([true; CHUNK_BLOCKS]), false)),
        );
        let lookup = lookup_from(world);
        let cur = NodePos::new(Size::X1, BlockPos::new(15, 64, 0));
        let neighbors = enumerate_neighbors(cur, Face::East, &lookup, Size::X2).unwrap();
        assert!(neighbors.is_empty(), "a fully solid neighbor chunk yields no passable candidate");
    }

    #[test]
    fn missing_chunk_surfaces_as_error() {
        let lookup = lookup_from(HashMap::new());
        let cur = NodePos::new(Size::X1, BlockPos::new(0, 64, 0));
        let err = enumerate_neighbors(cur, Face::East, &lookup, Size::X2).unwrap_err();
        assert!(matches!(err, PathfinderError::MissingNeighborChunk { .. }));
    }

    #[test]
    fn vertical_candidate_above_height_band_is_discarded() {
        let lookup = lookup_from(empty_world(1));
        let cur = NodePos::new(Size::X16, BlockPos::new(0, 112, 0));
        let neighbors = enumerate_neighbors(cur, Face::Up, &lookup, Size::X2).unwrap();
        assert!(neighbors.is_empty());
    }

    #[test]
    fn quadrant_origins_for_up_fix_y_at_origin() {
        let origin = BlockPos::new(0, 64, 0);
        let quads = quadrant_origins(Face::Up, origin, 4, 2);
        for q in quads {
            assert_eq!(q.y, 64);
        }
    }
}
