//! Full-precision cosine-distance scanner over unit-normalized vectors.
//!
//! The database is a flat structure-of-arrays buffer — row `i` occupies
//! `db[i*dim..(i+1)*dim]` — so the scan walks memory sequentially instead
//! of chasing `Vec<Vec<f32>>` pointers. The inner dot product is unrolled
//! into 8 independent accumulators so the compiler doesn't serialize the
//! multiply-adds on a single dependency chain.

use crate::heap;
use std::cmp::Ordering;

/// `f32` distance wrapped for `Ord`: distances here are always finite
/// (`1 - dot` of unit vectors lies in `[0, 2]`), but NaN is still given a
/// defined, if arbitrary, place in the order rather than panicking.
#[derive(Clone, Copy, Debug, PartialEq)]
struct OrdDistance(f32);

impl Eq for OrdDistance {}

impl PartialOrd for OrdDistance {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrdDistance {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.partial_cmp(&other.0).unwrap_or(Ordering::Equal)
    }
}

/// Hand-unrolled dot product, 8 `f32` lanes per iteration.
///
/// # Safety
/// `chunks = a.len() / 8`, so every index touched inside the loop
/// (`i*8 + 0..=7` for `i < chunks`) is less than `chunks*8 <= a.len()`.
/// Both slices are required to have equal length by the caller.
#[inline(always)]
fn dot_product_unrolled(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    let len = a.len();
    let chunks = len / 8;

    let mut acc0 = 0.0f32;
    let mut acc1 = 0.0f32;
    let mut acc2 = 0.0f32;
    let mut acc3 = 0.0f32;
    let mut acc4 = 0.0f32;
    let mut acc5 = 0.0f32;
    let mut acc6 = 0.0f32;
    let mut acc7 = 0.0f32;

    unsafe {
        for i in 0..chunks {
            let base = i * 8;
            acc0 += a.get_unchecked(base) * b.get_unchecked(base);
            acc1 += a.get_unchecked(base + 1) * b.get_unchecked(base + 1);
            acc2 += a.get_unchecked(base + 2) * b.get_unchecked(base + 2);
            acc3 += a.get_unchecked(base + 3) * b.get_unchecked(base + 3);
            acc4 += a.get_unchecked(base + 4) * b.get_unchecked(base + 4);
            acc5 += a.get_unchecked(base + 5) * b.get_unchecked(base + 5);
            acc6 += a.get_unchecked(base + 6) * b.get_unchecked(base + 6);
            acc7 += a.get_unchecked(base + 7) * b.get_unchecked(base + 7);
        }
    }

    let mut result = acc0 + acc1 + acc2 + acc3 + acc4 + acc5 + acc6 + acc7;
    for i in chunks * 8..len {
        result += a[i] * b[i];
    }
    result
}

#[inline]
fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    1.0 - dot_product_unrolled(a, b)
}

/// Returns the `min(k, n)` positions of `db` (a flat SoA buffer of `n` rows
/// of `dim` floats each) closest to `q` by cosine distance, ascending, with
/// ties broken by ascending position. `q` and every row of `db` must already
/// be unit-normalized (a scanner precondition).
pub fn top_k_cosine(q: &[f32], db: &[f32], dim: usize, n: usize, k: usize) -> Vec<(usize, f32)> {
    debug_assert_eq!(q.len(), dim);
    debug_assert_eq!(db.len(), n * dim);
    debug_assert!(k > 0, "k must be positive");

    heap::select(n, k, |i| {
        let row = &db[i * dim..(i + 1) * dim];
        OrdDistance(cosine_distance(q, row))
    })
    .into_iter()
    .map(|(i, d)| (i, d.0))
    .collect()
}
