//! Indexed binary min-heap ordered by `f`, supporting decrease-key.
//!
//! `std::collections::BinaryHeap` (used for similarity top-n elsewhere in
//! this workspace) doesn't support updating an entry already inside the
//! heap, which the A* open set needs whenever a node's `f` drops after a
//! relaxation. This heap tracks each entry's slot directly on the node so
//! `update` can sift it up without a linear scan.

use crate::geometry::NodePos;
use crate::node::NodeGraph;

/// A binary min-heap over `NodePos` keyed by the referenced node's `f`,
/// ordered via `cmp` callbacks into a `NodeGraph` rather than owning the
/// nodes itself (the node graph is the single owner of `PathNode`s).
#[derive(Debug, Default)]
pub struct OpenSet {
    heap: Vec<NodePos>,
}

impl OpenSet {
    pub fn new() -> Self {
        Self { heap: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Inserts `pos` into the heap. The caller must not already have
    /// `pos` present (no duplicate-insert guard here; `graph` tracks
    /// `state` for that).
    pub fn insert(&mut self, pos: NodePos, graph: &mut NodeGraph) {
        let idx = self.heap.len();
        self.heap.push(pos);
        graph.set_heap_index(pos, Some(idx));
        self.sift_up(idx, graph);
    }

    /// Removes and returns the lowest-`f` node.
    pub fn pop_min(&mut self, graph: &mut NodeGraph) -> Option<NodePos> {
        if self.heap.is_empty() {
            return None;
        }
        let min = self.heap[0];
        let last = self.heap.pop().unwrap();
        graph.set_heap_index(min, None);
        if !self.heap.is_empty() {
            self.heap[0] = last;
            graph.set_heap_index(last, Some(0));
            self.sift_down(0, graph);
        }
        Some(min)
    }

    /// Re-establishes heap order after `pos`'s `f` has *decreased*.
    /// Callers only ever lower `f` (relaxation), so this only sifts up.
    pub fn update(&mut self, pos: NodePos, graph: &mut NodeGraph) {
        if let Some(idx) = graph.heap_index(pos) {
            self.sift_up(idx, graph);
        }
    }

    fn sift_up(&mut self, mut idx: usize, graph: &mut NodeGraph) {
        while idx > 0 {
            let parent = (idx - 1) / 2;
            if graph.f(self.heap[idx]) < graph.f(self.heap[parent]) {
                self.swap(idx, parent, graph);
                idx = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut idx: usize, graph: &mut NodeGraph) {
        let len = self.heap.len();
        loop {
            let left = idx * 2 + 1;
            let right = idx * 2 + 2;
            let mut smallest = idx;
            if left < len && graph.f(self.heap[left]) < graph.f(self.heap[smallest]) {
                smallest = left;
            }
            if right < len && graph.f(self.heap[right]) < graph.f(self.heap[smallest]) {
                smallest = right;
            }
            if smallest == idx {
                break;
            }
            self.swap(idx, smallest, graph);
            idx = smallest;
        }
    }

    fn swap(&mut self, a: usize, b: usize, graph: &mut NodeGraph) {
        self.heap.swap(a, b);
        graph.set_heap_index(self.heap[a], Some(a));
        graph.set_heap_index(self.heap[b], Some(b));
    }
}
