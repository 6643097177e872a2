//! Sign-bit quantization of a dense float vector into packed 64-bit words.
//!
//! `sign(alpha * x) == sign(x)` for any `alpha > 0`, so packing the
//! normalized embedding is equivalent to packing the raw one — the query
//! path never needs to normalize before calling [`pack`].

/// Number of 64-bit words needed to hold `dims` sign bits.
#[inline]
pub fn words_for_dims(dims: usize) -> usize {
    dims.div_ceil(64)
}

/// Packs `v` into sign-bit words: bit `d % 64` of word `d / 64` is set iff
/// `v[d] >= 0.0` (strict zero packs to `1`). Tail bits beyond `v.len()` in
/// the final word are left clear.
pub fn pack(v: &[f32]) -> Vec<u64> {
    let mut words = vec![0u64; words_for_dims(v.len())];
    pack_into(v, &mut words);
    words
}

/// Packs `v` into a caller-provided row, avoiding an allocation per call.
/// `out.len()` must equal `words_for_dims(v.len())`.
pub fn pack_into(v: &[f32], out: &mut [u64]) {
    debug_assert_eq!(out.len(), words_for_dims(v.len()));
    for w in out.iter_mut() {
        *w = 0;
    }
    for (d, &x) in v.iter().enumerate() {
        if x >= 0.0 {
            out[d / 64] |= 1u64 << (d % 64);
        }
    }
}
