//! The A* driver: per-segment search (`find_path_segment`) and the outer
//! multi-segment loop (`find_path`) that splices segments together.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use rayon::prelude::*;

use crate::cache::ChunkCache;
use crate::config::{PathfinderConfig, TimeoutOverrides};
use crate::errors::PathfinderError;
use crate::generator::ChunkGenerator;
use crate::geometry::{BlockPos, BlockPosF, ChunkPos, NodePos, ALL_FACES};
use crate::neighbors::enumerate_neighbors;
use crate::node::{NodeGraph, NodeState, PathNode};
use crate::heap::OpenSet;

/// Floating-point slack below which a candidate improvement is treated as
/// noise rather than real progress (matches the relaxation and
/// best-so-far update thresholds specified for this driver).
const PROGRESS_EPSILON: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    Segment,
    Finished,
}

#[derive(Debug, Clone)]
pub struct Path {
    pub kind: PathKind,
    pub start: BlockPos,
    pub goal: BlockPos,
    pub blocks: Vec<BlockPos>,
    pub nodes: Vec<PathNode>,
}

impl Path {
    /// Packs `blocks` into the host interchange format (§6): a finished
    /// flag plus a flat `i64` per block.
    pub fn pack_blocks(&self) -> (bool, Vec<i64>) {
        let finished = self.kind == PathKind::Finished;
        (finished, self.blocks.iter().copied().map(crate::api::pack_block_pos).collect())
    }
}

fn create_path(graph: &mut NodeGraph, terminal: NodePos, start: BlockPos, goal: BlockPos, kind: PathKind) -> Path {
    let chain = graph.reconstruct(terminal);
    let mut blocks = Vec::with_capacity(chain.len());
    let mut nodes = Vec::with_capacity(chain.len());
    for pos in chain {
        blocks.push(pos.center());
        if let Some(node) = graph.take(pos) {
            nodes.push(node);
        }
    }
    Path { kind, start, goal, blocks, nodes }
}

/// Splices segments produced by repeated `find_path_segment` calls into a
/// single path, concatenating `blocks`/`nodes` in order.
fn splice(mut segments: Vec<Path>) -> Option<Path> {
    if segments.is_empty() {
        return None;
    }
    let mut out = segments.remove(0);
    for seg in segments {
        out.blocks.extend(seg.blocks);
        out.nodes.extend(seg.nodes);
        out.kind = seg.kind;
        out.goal = seg.goal;
    }
    Some(out)
}

/// Ensures the chunk at `pos` and its four horizontal neighbors are
/// present in the cache, generating missing ones. Runs at most once per
/// chunk position per search (tracked by `prefetched`); the four
/// neighbors are generated concurrently on the global rayon pool.
fn ensure_neighbors_prefetched(
    pos: ChunkPos,
    cache: &ChunkCache,
    generator: &dyn ChunkGenerator,
    prefetched: &mut HashSet<ChunkPos>,
) -> Result<(), PathfinderError> {
    if !prefetched.insert(pos) {
        return Ok(());
    }
    cache.get_or_generate(pos, generator)?;
    let neighbors = [
        ChunkPos::new(pos.cx + 1, pos.cz),
        ChunkPos::new(pos.cx - 1, pos.cz),
        ChunkPos::new(pos.cx, pos.cz + 1),
        ChunkPos::new(pos.cx, pos.cz - 1),
    ];
    let results: Vec<Result<_, PathfinderError>> =
        neighbors.par_iter().map(|&n| cache.get_or_generate(n, generator)).collect();
    for result in results {
        result?;
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn relax(
    cur: NodePos,
    cur_g: f64,
    candidate: NodePos,
    graph: &mut NodeGraph,
    open: &mut OpenSet,
    goal_f: BlockPosF,
    start_f: BlockPosF,
    best: &mut (NodePos, f64),
    failing: &mut bool,
    min_segment_distance: f64,
) {
    let tentative_g = cur_g + 1.0;
    let was_in_open = {
        let node = graph.get_or_create(candidate, goal_f);
        if node.g - tentative_g <= PROGRESS_EPSILON {
            return;
        }
        let in_open = node.heap_index.is_some();
        node.prev = Some(cur);
        node.g = tentative_g;
        node.f = tentative_g + node.h;
        node.state = NodeState::Open;
        in_open
    };
    if was_in_open {
        open.update(candidate, graph);
    } else {
        open.insert(candidate, graph);
    }
    let new_f = graph.f(candidate);
    if best.1 - new_f > PROGRESS_EPSILON {
        *best = (candidate, new_f);
        if candidate.center_f().distance(start_f) > min_segment_distance {
            *failing = false;
        }
    }
}

/// Runs a single A* segment from `start` toward `goal`. Returns
/// `Ok(Some(Path))` with `kind = Finished` if the goal radius was reached,
/// `Ok(Some(Path))` with `kind = Segment` if the search ran out of time or
/// was canceled but made meaningful progress, or `Ok(None)` if it made no
/// progress at all.
///
/// `overrides` replaces `config`'s `primary_timeout_ms`/`failure_timeout_ms`
/// for this call only, letting a caller vary one search's budget without
/// touching the `PathfinderConfig` baked into the surrounding `Context`.
#[tracing::instrument(skip(cache, generator, cancel, config))]
pub fn find_path_segment(
    start: NodePos,
    goal: BlockPos,
    cache: &ChunkCache,
    generator: &dyn ChunkGenerator,
    cancel: &AtomicBool,
    config: &PathfinderConfig,
    overrides: Option<TimeoutOverrides>,
) -> Result<Option<Path>, PathfinderError> {
    let goal_f = BlockPosF::from(goal);
    let start_f = start.center_f();

    let mut graph = NodeGraph::new();
    let mut open = OpenSet::new();
    let mut prefetched = HashSet::new();

    {
        let start_node = graph.get_or_create(start, goal_f);
        start_node.g = 0.0;
        start_node.f = start_node.h;
        start_node.state = NodeState::Open;
    }
    open.insert(start, &mut graph);
    let mut best = (start, graph.f(start));

    ensure_neighbors_prefetched(start.chunk_pos(), cache, generator, &mut prefetched)?;

    let primary_timeout_ms = overrides.and_then(|o| o.primary_timeout_ms).unwrap_or(config.primary_timeout_ms);
    let failure_timeout_ms = overrides.and_then(|o| o.failure_timeout_ms).unwrap_or(config.failure_timeout_ms);
    let started = Instant::now();
    let primary_timeout = Duration::from_millis(primary_timeout_ms);
    let failure_timeout = Duration::from_millis(failure_timeout_ms);
    let mut failing = true;
    let mut popped = 0u32;

    while !open.is_empty() {
        popped += 1;
        if popped % config.timeout_check_interval == 0 {
            if cancel.load(Ordering::Relaxed) {
                break;
            }
            let elapsed = started.elapsed();
            if elapsed >= failure_timeout {
                break;
            }
            if elapsed >= primary_timeout && !failing {
                break;
            }
        }

        let cur = open.pop_min(&mut graph).expect("open set checked non-empty");
        graph.set_state(cur, NodeState::Closed);
        let cur_g = graph.get(cur).map(|n| n.g).unwrap_or(f64::INFINITY);

        if cur.center_f().distance(goal_f) <= config.goal_radius {
            return Ok(Some(create_path(&mut graph, cur, start.origin, goal, PathKind::Finished)));
        }

        ensure_neighbors_prefetched(cur.chunk_pos(), cache, generator, &mut prefetched)?;

        let lookup = |cx: i32, cz: i32| cache.get(ChunkPos::new(cx, cz));
        for face in ALL_FACES {
            let candidates = enumerate_neighbors(cur, face, &lookup, config.min_neighbor_size)?;
            for candidate in candidates {
                relax(
                    cur,
                    cur_g,
                    candidate,
                    &mut graph,
                    &mut open,
                    goal_f,
                    start_f,
                    &mut best,
                    &mut failing,
                    config.min_segment_distance,
                );
            }
        }
    }

    if best.0.center_f().distance(start_f) > config.min_segment_distance {
        Ok(Some(create_path(&mut graph, best.0, start.origin, goal, PathKind::Segment)))
    } else {
        Ok(None)
    }
}

/// Repeatedly calls `find_path_segment` from the last segment's endpoint
/// until a `Finished` segment is produced or a segment attempt yields
/// nothing, splicing all accumulated segments together. `overrides` is
/// forwarded to every segment call unchanged.
#[tracing::instrument(skip(cache, generator, cancel, config))]
pub fn find_path(
    start: NodePos,
    goal: BlockPos,
    cache: &ChunkCache,
    generator: &dyn ChunkGenerator,
    cancel: &AtomicBool,
    config: &PathfinderConfig,
    overrides: Option<TimeoutOverrides>,
) -> Result<Option<Path>, PathfinderError> {
    let mut segments = Vec::new();
    let mut cursor = start;
    loop {
        match find_path_segment(cursor, goal, cache, generator, cancel, config, overrides)? {
            Some(seg) if seg.kind == PathKind::Finished => {
                segments.push(seg);
                return Ok(splice(segments));
            }
            Some(seg) => {
                cursor = seg.nodes.last().expect("non-empty segment").pos;
                segments.push(seg);
            }
            None => return Ok(splice(segments)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{FlatWorldGenerator, WalledWorldGenerator};
    use crate::geometry::Size;

    fn cache_for(seed: i64) -> ChunkCache {
        ChunkCache::new(seed)
    }

    #[test]
    fn trivial_path_in_empty_world_finishes_immediately() {
        let cache = cache_for(0);
        let generator = FlatWorldGenerator;
        let cancel = AtomicBool::new(false);
        let config = PathfinderConfig::default();
        let start = NodePos::new(Size::X1, BlockPos::new(0, 64, 0));
        let goal = BlockPos::new(0, 64, 1);
        let path = find_path(start, goal, &cache, &generator, &cancel, &config, None).unwrap().unwrap();
        assert_eq!(path.kind, PathKind::Finished);
        assert!(path.blocks.len() <= 2);
    }

    #[test]
    fn goal_equal_to_start_finishes_trivially() {
        let cache = cache_for(0);
        let generator = FlatWorldGenerator;
        let cancel = AtomicBool::new(false);
        let config = PathfinderConfig::default();
        let start = NodePos::new(Size::X1, BlockPos::new(0, 64, 0));
        let goal = BlockPos::new(0, 64, 0);
        let path = find_path(start, goal, &cache, &generator, &cancel, &config, None).unwrap().unwrap();
        assert_eq!(path.kind, PathKind::Finished);
        assert!(path.blocks[0].distance_sq(BlockPosF::from(goal)).sqrt() <= config.goal_radius);
    }

    #[test]
    fn wall_with_no_doorway_in_range_yields_no_finished_path() {
        let cache = cache_for(0);
        let generator = WalledWorldGenerator { floor_y: 63, wall_x: 0, doorway_z: 1000 };
        let cancel = AtomicBool::new(false);
        let mut config = PathfinderConfig::default();
        config.failure_timeout_ms = 500;
        let start = NodePos::new(Size::X1, BlockPos::new(-5, 64, 0));
        let goal = BlockPos::new(5, 64, 0);
        let result = find_path(start, goal, &cache, &generator, &cancel, &config, None).unwrap();
        if let Some(path) = result {
            assert_ne!(path.kind, PathKind::Finished);
        }
    }

    #[test]
    fn cancellation_returns_best_so_far_without_panicking() {
        let cache = cache_for(0);
        let generator = WalledWorldGenerator { floor_y: 63, wall_x: 0, doorway_z: 1000 };
        let cancel = AtomicBool::new(true);
        let config = PathfinderConfig::default();
        let start = NodePos::new(Size::X1, BlockPos::new(-5, 64, 0));
        let goal = BlockPos::new(5, 64, 0);
        let result = find_path(start, goal, &cache, &generator, &cancel, &config, None);
        assert!(result.is_ok());
    }

    #[test]
    fn per_call_timeout_override_forces_a_segment_on_a_long_search() {
        let cache = cache_for(0);
        let generator = FlatWorldGenerator;
        let cancel = AtomicBool::new(false);
        let config = PathfinderConfig::default();
        let overrides = crate::config::TimeoutOverrides {
            primary_timeout_ms: Some(0),
            failure_timeout_ms: Some(50),
        };
        let start = NodePos::new(Size::X1, BlockPos::new(0, 64, 0));
        let goal = BlockPos::new(100_000, 64, 0);
        let result = find_path(start, goal, &cache, &generator, &cancel, &config, Some(overrides)).unwrap();
        assert!(result.is_some());
        assert_ne!(result.unwrap().kind, PathKind::Finished);
    }
}
