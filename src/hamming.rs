//! Popcount-based Hamming-distance scanner over sign-bit-packed vectors —
//! the coarse stage of the two-stage search pipeline.
//!
//! Same flat SoA layout and bounded-heap selection as the cosine scanner
//! (`src/cosine.rs`), but the inner loop XORs and popcounts 4 `u64` words
//! per iteration instead of fused-multiply-adding floats.

use crate::heap;

/// # Safety
/// `chunks = a.len() / 4`, so every index touched (`i*4 + 0..=3` for
/// `i < chunks`) is less than `chunks*4 <= a.len()`. Caller guarantees
/// `a.len() == b.len()`.
#[inline(always)]
fn hamming_distance(a: &[u64], b: &[u64]) -> u32 {
    debug_assert_eq!(a.len(), b.len());
    let len = a.len();
    let chunks = len / 4;

    let mut acc0 = 0u32;
    let mut acc1 = 0u32;
    let mut acc2 = 0u32;
    let mut acc3 = 0u32;

    unsafe {
        for i in 0..chunks {
            let base = i * 4;
            acc0 += (a.get_unchecked(base) ^ b.get_unchecked(base)).count_ones();
            acc1 += (a.get_unchecked(base + 1) ^ b.get_unchecked(base + 1)).count_ones();
            acc2 += (a.get_unchecked(base + 2) ^ b.get_unchecked(base + 2)).count_ones();
            acc3 += (a.get_unchecked(base + 3) ^ b.get_unchecked(base + 3)).count_ones();
        }
    }

    let mut result = acc0 + acc1 + acc2 + acc3;
    for i in chunks * 4..len {
        result += (a[i] ^ b[i]).count_ones();
    }
    result
}

/// Returns the `min(k, n)` positions of `db` (a flat SoA buffer of `n` rows
/// of `words` `u64`s each) closest to `q` by Hamming distance, ascending,
/// with ties broken by ascending position.
pub fn top_k_hamming(q: &[u64], db: &[u64], words: usize, n: usize, k: usize) -> Vec<(usize, u32)> {
    debug_assert_eq!(q.len(), words);
    debug_assert_eq!(db.len(), n * words);
    debug_assert!(k > 0, "k must be positive");

    heap::select(n, k, |i| hamming_distance(q, &db[i * words..(i + 1) * words]))
}
