//! Wires the core `Kernel` to a concrete `Store`/`Embedder` pair and
//! provides the newline-delimited-JSON ingestion helpers the CLI's
//! `inputfile`/`preparequeries`/`testqueries` subcommands need.

use annvec::{decode_queries, encode_queries, CoreError, CoreResult, Item, Kernel, QueryRecord};
use configs::app_config::AppConfig;
use embeddings::HashingEmbedder;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicI32, Ordering};
use storage::FileStore;

/// The concrete Kernel this workspace ships: a durable single-file store
/// paired with the dependency-free hashing embedder.
pub type AnnvecKernel = Kernel<FileStore, HashingEmbedder>;

/// Opens a Kernel against `config`'s storage path and embedding
/// dimensionality.
pub fn open(config: &AppConfig) -> CoreResult<AnnvecKernel> {
    let store = FileStore::open(&config.storage_path)?;
    let embedder = HashingEmbedder::new(config.dimensions);
    Kernel::new(store, embedder)
}

/// One line of an `inputfile` ingestion document. `embedding` is
/// optional — when absent, the Kernel embeds `semantic_key` on save.
#[derive(Debug, Deserialize)]
struct IngestRecord {
    semantic_key: String,
    payload: String,
    #[serde(default)]
    embedding: Vec<f32>,
}

fn read_lines(path: &Path) -> CoreResult<Vec<String>> {
    let content = fs::read_to_string(path).map_err(|e| CoreError::internal(format!("reading {}: {e}", path.display())))?;
    Ok(content.lines().filter(|l| !l.trim().is_empty()).map(str::to_string).collect())
}

/// Bulk-loads a newline-delimited JSON file of `{semantic_key, payload,
/// embedding?}` records into `kernel`, assigning each a fresh id past the
/// kernel's current high-water mark.
pub fn ingest_file(kernel: &AnnvecKernel, path: &Path) -> CoreResult<usize> {
    let lines = read_lines(path)?;
    let next_id = AtomicI32::new(kernel.max_id());
    let mut items = Vec::with_capacity(lines.len());
    for (line_no, line) in lines.iter().enumerate() {
        let record: IngestRecord = serde_json::from_str(line)
            .map_err(|e| CoreError::invalid_argument(format!("{}:{}: {e}", path.display(), line_no + 1)))?;
        let id = next_id.fetch_add(1, Ordering::Relaxed) + 1;
        items.push(Item { id, semantic_key: record.semantic_key, payload: record.payload, embedding: record.embedding });
    }
    let count = items.len();
    kernel.save_batch(items)?;
    tracing::info!(count, path = %path.display(), "ingested file");
    Ok(count)
}

/// Reads a newline-delimited JSON file of bare query strings, embeds each
/// through `kernel`, and writes the bincode query-record format to
/// `out_path`.
pub fn prepare_queries(kernel: &AnnvecKernel, in_path: &Path, out_path: &Path) -> CoreResult<usize> {
    let lines = read_lines(in_path)?;
    let mut records = Vec::with_capacity(lines.len());
    for line in &lines {
        let query_string: String = serde_json::from_str(line)
            .map_err(|e| CoreError::invalid_argument(format!("{}: {e}", in_path.display())))?;
        let embedding = kernel.embed_text(&query_string)?;
        records.push(QueryRecord { query_string, embedding });
    }
    let bytes = encode_queries(&records)?;
    fs::write(out_path, bytes).map_err(|e| CoreError::internal(format!("writing {}: {e}", out_path.display())))?;
    tracing::info!(count = records.len(), path = %out_path.display(), "prepared query file");
    Ok(records.len())
}

/// Loads a query file, ready for `testqueries`-style replay.
pub fn load_queries(path: &Path) -> CoreResult<Vec<QueryRecord>> {
    let bytes = fs::read(path).map_err(|e| CoreError::internal(format!("reading {}: {e}", path.display())))?;
    decode_queries(&bytes)
}
