//! The in-memory index: three parallel, append-only sequences (ids,
//! normalized float vectors, packed sign-bit vectors) plus the insert-time
//! density histogram.
//!
//! ## Memory layout
//!
//! Both `fvecs` and `bvecs` are flat structure-of-arrays buffers, not
//! `Vec<Vec<_>>` — row `p` of `fvecs` occupies `fvecs[p*dims..(p+1)*dims]`,
//! row `p` of `bvecs` occupies `bvecs[p*words..(p+1)*words]`. A search
//! walks one contiguous allocation instead of chasing `N` heap pointers.
//!
//! ## Locking
//!
//! Every index operation — mutating or reading — must take the
//! *same* exclusive lock, with no reader/writer distinction: a search in
//! flight must never observe a half-inserted entry, and the ordering
//! guarantee (ascending distance, stable tie-break) has to hold even under
//! concurrent inserts. A `Mutex` gives that directly. (The Design Notes
//! describe a lock-free snapshot scheme as a possible future relaxation;
//! see `DESIGN.md` for why this implementation keeps the simpler, provably
//! correct form instead.)

use crate::bitpack::{self, words_for_dims};
use crate::cosine;
use crate::error::{CoreError, CoreResult};
use crate::hamming;
use crate::histogram::{Histogram, Snapshot};
use crate::normalize::normalize_in_place;
use parking_lot::Mutex;

struct IndexInner {
    dims: usize,
    words: usize,
    ids: Vec<i32>,
    fvecs: Vec<f32>,
    bvecs: Vec<u64>,
    density: Histogram,
}

pub struct Index {
    inner: Mutex<IndexInner>,
}

impl Index {
    pub fn new(dims: usize) -> Self {
        Self::with_capacity(dims, 4)
    }

    /// `capacity` is the initial row count to reserve for; both SoA
    /// buffers grow by the usual amortized-doubling `Vec` strategy past
    /// that.
    pub fn with_capacity(dims: usize, capacity: usize) -> Self {
        assert!(dims > 0, "dimension must be > 0");
        let words = words_for_dims(dims);
        let capacity = capacity.max(4);
        Self {
            inner: Mutex::new(IndexInner {
                dims,
                words,
                ids: Vec::with_capacity(capacity),
                fvecs: Vec::with_capacity(capacity * dims),
                bvecs: Vec::with_capacity(capacity * words),
                density: Histogram::new(dims as u64 + 1),
            }),
        }
    }

    pub fn dims(&self) -> usize {
        self.inner.lock().dims
    }

    pub fn len(&self) -> usize {
        self.inner.lock().ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Normalizes `embedding` in place, packs its sign bits, and appends a
    /// new row. Rejects a dimension mismatch or an all-zero embedding.
    pub fn add(&self, id: i32, mut embedding: Vec<f32>) -> CoreResult<()> {
        let mut inner = self.inner.lock();
        if embedding.len() != inner.dims {
            return Err(CoreError::invalid_argument(format!(
                "embedding has {} dimensions, index expects {}",
                embedding.len(),
                inner.dims
            )));
        }
        if embedding.iter().all(|&x| x == 0.0) {
            return Err(CoreError::invalid_argument("embedding must not be the zero vector"));
        }

        // Pack before normalizing: sign(x) == sign(alpha * x) for alpha > 0,
        // so packing the raw embedding and the normalized one agree.
        let packed = bitpack::pack(&embedding);
        normalize_in_place(&mut embedding);

        let set_bits: u32 = packed.iter().map(|w| w.count_ones()).sum();
        inner.density.record(set_bits as u64 + 1);

        inner.ids.push(id);
        inner.fvecs.extend_from_slice(&embedding);
        inner.bvecs.extend_from_slice(&packed);
        Ok(())
    }

    /// Top-`k` ids by cosine distance against the full-precision vectors
    /// `find_closest`. `query` is normalized on a local copy; the
    /// caller's buffer is untouched.
    pub fn find_closest(&self, query: &[f32], k: usize) -> CoreResult<Vec<i32>> {
        debug_assert!(k > 0, "k must be positive");
        let inner = self.inner.lock();
        if query.len() != inner.dims {
            return Err(CoreError::invalid_argument(format!(
                "query has {} dimensions, index expects {}",
                query.len(),
                inner.dims
            )));
        }
        let n = inner.ids.len();
        if n == 0 {
            return Ok(Vec::new());
        }
        let mut q = query.to_vec();
        normalize_in_place(&mut q);
        let hits = cosine::top_k_cosine(&q, &inner.fvecs, inner.dims, n, k.min(n));
        Ok(hits.into_iter().map(|(p, _)| inner.ids[p]).collect())
    }

    /// Top-`k` ids by Hamming distance against the packed vectors
    /// (`find_closest_binary`). The query need not be pre-normalized:
    /// packing only looks at sign, which normalization never changes.
    pub fn find_closest_binary(&self, query: &[f32], k: usize) -> CoreResult<Vec<(i32, u32)>> {
        debug_assert!(k > 0, "k must be positive");
        let inner = self.inner.lock();
        if query.len() != inner.dims {
            return Err(CoreError::invalid_argument(format!(
                "query has {} dimensions, index expects {}",
                query.len(),
                inner.dims
            )));
        }
        let n = inner.ids.len();
        if n == 0 {
            return Ok(Vec::new());
        }
        let packed = bitpack::pack(query);
        let hits = hamming::top_k_hamming(&packed, &inner.bvecs, inner.words, n, k.min(n));
        Ok(hits.into_iter().map(|(p, d)| (inner.ids[p], d)).collect())
    }

    /// Clears all three sequences and re-adds every item (`reindex`).
    /// Not used on the hot insert/search paths — provided for
    /// bulk rebuilds (e.g. after a store migration).
    pub fn reindex(&self, items: Vec<(i32, Vec<f32>)>) -> CoreResult<()> {
        {
            let mut inner = self.inner.lock();
            inner.ids.clear();
            inner.fvecs.clear();
            inner.bvecs.clear();
        }
        for (id, embedding) in items {
            self.add(id, embedding)?;
        }
        Ok(())
    }

    /// Summary (mean, p10, p90) of set-bit counts across every packed
    /// vector, clipped to >= 1 at record time (Design Notes: "density
    /// histogram clipping").
    pub fn density_summary(&self) -> Snapshot {
        self.inner.lock().density.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequences_stay_equal_length_after_inserts() {
        let idx = Index::new(4);
        for i in 0..10 {
            idx.add(i, vec![i as f32 + 1.0, -1.0, 0.0, 2.0]).unwrap();
        }
        let inner = idx.inner.lock();
        assert_eq!(inner.ids.len(), 10);
        assert_eq!(inner.fvecs.len(), 10 * 4);
        assert_eq!(inner.bvecs.len(), 10 * inner.words);
    }

    #[test]
    fn rejects_dimension_mismatch() {
        let idx = Index::new(4);
        let err = idx.add(1, vec![1.0, 2.0]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument { .. }));
    }

    #[test]
    fn rejects_zero_vector() {
        let idx = Index::new(3);
        let err = idx.add(1, vec![0.0, 0.0, 0.0]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument { .. }));
    }

    #[test]
    fn s5_id_round_trip() {
        let idx = Index::new(4);
        idx.add(3, vec![0.0, 0.0, 1.0, 0.0]).unwrap();
        idx.add(1, vec![1.0, 0.0, 0.0, 0.0]).unwrap();
        idx.add(2, vec![0.0, 1.0, 0.0, 0.0]).unwrap();
        let hits = idx.find_closest(&[0.0, 1.0, 0.0, 0.0], 1).unwrap();
        assert_eq!(hits, vec![2]);
    }

    #[test]
    fn s6_empty_index_returns_empty() {
        let idx = Index::new(4);
        assert!(idx.find_closest(&[1.0, 0.0, 0.0, 0.0], 5).unwrap().is_empty());
        assert!(idx.find_closest_binary(&[1.0, 0.0, 0.0, 0.0], 5).unwrap().is_empty());
    }

    #[test]
    fn binary_and_full_agree_on_an_easy_case() {
        let idx = Index::new(8);
        idx.add(10, vec![1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0]).unwrap();
        idx.add(20, vec![-1.0, -1.0, -1.0, -1.0, -1.0, -1.0, -1.0, -1.0]).unwrap();
        let full = idx.find_closest(&[1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0], 1).unwrap();
        let binary = idx.find_closest_binary(&[1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0], 1).unwrap();
        assert_eq!(full, vec![10]);
        assert_eq!(binary[0].0, 10);
        assert_eq!(binary[0].1, 0);
    }

    #[test]
    fn reindex_clears_and_rebuilds() {
        let idx = Index::new(4);
        idx.add(1, vec![1.0, 0.0, 0.0, 0.0]).unwrap();
        idx.add(2, vec![0.0, 1.0, 0.0, 0.0]).unwrap();
        idx.reindex(vec![(9, vec![0.0, 0.0, 1.0, 0.0])]).unwrap();
        assert_eq!(idx.len(), 1);
        let hits = idx.find_closest(&[0.0, 0.0, 1.0, 0.0], 1).unwrap();
        assert_eq!(hits, vec![9]);
    }

    #[test]
    fn density_summary_reflects_inserts() {
        let idx = Index::new(64);
        idx.add(1, vec![1.0; 64]).unwrap();
        let s = idx.density_summary();
        assert_eq!(s.count, 1);
        // 64 set bits, clipped sample is 65.
        assert!((s.mean - 65.0).abs() < 1.0);
    }
}
