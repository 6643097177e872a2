//! Persisted record formats: `bincode` gives a reversible encode/decode
//! pair without hand-rolling a wire format.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};

/// A caller-supplied item as it crosses the Kernel boundary.
/// `embedding` may be empty on input — the Kernel fills it in via the
/// embedder before the item is ever added to the index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Item {
    pub id: i32,
    pub semantic_key: String,
    pub payload: String,
    pub embedding: Vec<f32>,
}

/// Encodes an `Item` to its persisted byte representation.
pub fn encode(item: &Item) -> CoreResult<Vec<u8>> {
    bincode::serialize(item).map_err(|e| CoreError::internal(e.to_string()))
}

/// Decodes bytes produced by [`encode`] back into an `Item`. Failures here
/// are `CorruptRecord`, not `Internal` — a single bad record must not be
/// fatal to the caller.
pub fn decode(bytes: &[u8]) -> CoreResult<Item> {
    bincode::deserialize(bytes).map_err(|e| CoreError::CorruptRecord { message: e.to_string() })
}

/// One entry of the offline latency-replay query file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRecord {
    pub query_string: String,
    pub embedding: Vec<f32>,
}

/// Encodes a batch of query records for the offline latency harness.
pub fn encode_queries(queries: &[QueryRecord]) -> CoreResult<Vec<u8>> {
    bincode::serialize(queries).map_err(|e| CoreError::internal(e.to_string()))
}

/// Decodes a batch of query records written by [`encode_queries`].
pub fn decode_queries(bytes: &[u8]) -> CoreResult<Vec<QueryRecord>> {
    bincode::deserialize(bytes).map_err(|e| CoreError::CorruptRecord { message: e.to_string() })
}
