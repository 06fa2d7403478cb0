//! Thread-safe, lazily-filled chunk cache.
//!
//! The driver and the bounded prefetch pool both call into this from
//! multiple threads, so generation (expensive, calls into an arbitrary
//! `ChunkGenerator`) must never run while holding the lock. This mirrors
//! the double-checked-locking insertion pattern used around this
//! workspace's concurrent stores, adapted from a lock-free map to a plain
//! mutex because the spec calls for release-then-reacquire around
//! generation rather than a lock-free fast path.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::chunk::Chunk;
use crate::errors::PathfinderError;
use crate::generator::ChunkGenerator;
use crate::geometry::ChunkPos;

#[derive(Debug)]
pub struct ChunkCache {
    seed: i64,
    chunks: Mutex<HashMap<ChunkPos, Arc<Chunk>>>,
}

impl ChunkCache {
    pub fn new(seed: i64) -> Self {
        Self {
            seed,
            chunks: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, pos: ChunkPos) -> Option<Arc<Chunk>> {
        self.chunks.lock().expect("chunk cache mutex poisoned").get(&pos).cloned()
    }

    /// Returns the cached chunk at `pos`, generating and inserting it via
    /// `generator` if absent. Double-checked: the lock is dropped before
    /// calling `generator.generate`, then re-acquired to insert only if
    /// nobody else won the race in the meantime. A generation failure is
    /// surfaced as-is and nothing is inserted; there is no partial chunk.
    #[tracing::instrument(skip(self, generator))]
    pub fn get_or_generate(&self, pos: ChunkPos, generator: &dyn ChunkGenerator) -> Result<Arc<Chunk>, PathfinderError> {
        if let Some(chunk) = self.get(pos) {
            return Ok(chunk);
        }
        let generated = Arc::new(generator.generate(self.seed, pos)?);
        let mut guard = self.chunks.lock().expect("chunk cache mutex poisoned");
        Ok(Arc::clone(guard.entry(pos).or_insert(generated)))
    }

    /// Stores a host-supplied chunk, overwriting any existing entry
    /// (generator-supplied or otherwise) at `pos`.
    pub fn insert(&self, pos: ChunkPos, chunk: Chunk) {
        self.chunks
            .lock()
            .expect("chunk cache mutex poisoned")
            .insert(pos, Arc::new(chunk));
    }

    /// Removes every entry whose chunk-distance squared to `center`
    /// exceeds `(max_distance_blocks/16)^2`. Victims are collected before
    /// removal so the map is never mutated while iterated.
    #[tracing::instrument(skip(self))]
    pub fn cull_far(&self, center: ChunkPos, max_distance_blocks: i64) {
        let max_chunk_dist = max_distance_blocks / 16;
        let threshold = max_chunk_dist * max_chunk_dist;
        let mut guard = self.chunks.lock().expect("chunk cache mutex poisoned");
        let victims: Vec<ChunkPos> = guard
            .keys()
            .copied()
            .filter(|pos| pos.distance_sq(center) > threshold)
            .collect();
        for victim in victims {
            guard.remove(&victim);
        }
    }

    pub fn len(&self) -> usize {
        self.chunks.lock().expect("chunk cache mutex poisoned").len()
    }
}
