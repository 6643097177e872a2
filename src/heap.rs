//! Bounded max-heap top-K selection shared by the Hamming and cosine
//! scanners: maintain a heap of capacity `min(k, n)` keyed
//! on distance, evict the worst candidate whenever a closer one appears,
//! and sort the survivors ascending by distance with ties broken by
//! ascending position.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Candidate<D> {
    position: usize,
    distance: D,
}

// Heap ordering only ever looks at `distance` — position breaks ties in the
// final sort, not in the heap, so two candidates at equal distance compare
// equal here regardless of insertion order.
impl<D: Ord> PartialOrd for Candidate<D> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<D: Ord> Ord for Candidate<D> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance.cmp(&other.distance)
    }
}

/// Scans positions `0..n`, keeping the `min(k, n)` with smallest
/// `distance(position)` in a bounded max-heap (root = worst surviving
/// candidate, evicted on improvement), then returns them sorted ascending
/// by distance with ties broken by ascending position.
///
/// Callers must ensure `k > 0`; `n == 0` returns an empty result regardless.
pub(crate) fn select<D: Ord + Copy>(
    n: usize,
    k: usize,
    mut distance: impl FnMut(usize) -> D,
) -> Vec<(usize, D)> {
    if n == 0 {
        return Vec::new();
    }
    debug_assert!(k > 0, "k must be positive");

    let capacity = k.min(n);
    let mut heap: BinaryHeap<Candidate<D>> = BinaryHeap::with_capacity(capacity);

    for position in 0..n {
        let d = distance(position);
        if heap.len() < capacity {
            heap.push(Candidate { position, distance: d });
        } else if d < heap.peek().expect("heap at capacity is non-empty").distance {
            heap.pop();
            heap.push(Candidate { position, distance: d });
        }
    }

    let mut out: Vec<(usize, D)> = heap
        .into_iter()
        .map(|c| (c.position, c.distance))
        .collect();
    out.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));
    out
}
