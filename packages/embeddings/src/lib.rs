//! A deterministic, dependency-free `Embedder`: every float of the
//! embedding comes from a SHA256 stream keyed on the input text, the same
//! seed-to-bit-pattern construction `n8n_hamming::HammingVector::from_seed`
//! uses to turn a string into a reproducible vector.
//!
//! This is not a semantic model — equal strings embed identically and
//! nothing else is guaranteed — but it gives the kernel a real,
//! self-contained `Embedder` to run against without pulling in an ONNX
//! runtime and a tokenizer.

use annvec::{CoreError, CoreResult, Embedder};
use sha2::{Digest, Sha256};

pub struct HashingEmbedder {
    dims: usize,
}

impl HashingEmbedder {
    pub fn new(dims: usize) -> Self {
        assert!(dims > 0, "dimensions must be > 0");
        Self { dims }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.dims);
        let mut hasher = Sha256::new();
        let mut chunk_idx: u64 = 0;
        while out.len() < self.dims {
            hasher.update(text.as_bytes());
            hasher.update(chunk_idx.to_le_bytes());
            let hash = hasher.finalize_reset();
            for byte in hash.iter() {
                if out.len() == self.dims {
                    break;
                }
                // Map a hash byte into [-1.0, 1.0) so the resulting vector
                // has a genuine sign mix, not an all-positive bias.
                out.push((*byte as f32 - 128.0) / 128.0);
            }
            chunk_idx += 1;
        }
        out
    }
}

impl Embedder for HashingEmbedder {
    fn embed(&self, text: &str) -> CoreResult<Vec<f32>> {
        if text.is_empty() {
            return Err(CoreError::invalid_argument("cannot embed empty text"));
        }
        Ok(self.embed_one(text))
    }

    fn embed_batch(&self, texts: &[String]) -> CoreResult<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    fn dimensions(&self) -> usize {
        self.dims
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_text_embeds_identically() {
        let e = HashingEmbedder::new(64);
        assert_eq!(e.embed("hello").unwrap(), e.embed("hello").unwrap());
    }

    #[test]
    fn different_text_embeds_differently() {
        let e = HashingEmbedder::new(64);
        assert_ne!(e.embed("hello").unwrap(), e.embed("world").unwrap());
    }

    #[test]
    fn produces_requested_dimensionality() {
        let e = HashingEmbedder::new(300);
        assert_eq!(e.embed("anything").unwrap().len(), 300);
        assert_eq!(e.dimensions(), 300);
    }

    #[test]
    fn rejects_empty_text() {
        let e = HashingEmbedder::new(16);
        assert!(e.embed("").is_err());
    }
}
