//! The search pipeline: owns an [`Index`], talks to an external [`Store`]
//! and [`Embedder`], and stitches the two-stage coarse/re-rank search
//! together.

use crate::cosine;
use crate::error::{CoreError, CoreResult};
use crate::histogram::{Histogram, Snapshot as HistogramSnapshot};
use crate::index::Index;
use crate::normalize::normalize_in_place;
use crate::record::{self, Item};
use std::sync::atomic::{AtomicI32, Ordering};
use std::time::Instant;

/// A fixed-dimension text embedder. Implementations may call out
/// to a network service; the core never does so itself and only ever sees
/// this trait.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> CoreResult<Vec<f32>>;
    fn embed_batch(&self, texts: &[String]) -> CoreResult<Vec<Vec<f32>>>;
    fn dimensions(&self) -> usize;
}

/// A durable `i32 -> bytes` map. `read_all_keys` makes no
/// ordering promise; the Kernel only calls it once, at load.
pub trait Store: Send + Sync {
    fn upsert(&self, id: i32, bytes: Vec<u8>) -> CoreResult<()>;
    fn read(&self, id: i32) -> CoreResult<Option<Vec<u8>>>;
    fn read_all_keys(&self) -> CoreResult<Vec<i32>>;
}

fn validate_k(k: usize) -> CoreResult<()> {
    if k == 0 {
        return Err(CoreError::invalid_argument("k must be positive"));
    }
    if k > 100 {
        return Err(CoreError::invalid_argument("k must not exceed 100"));
    }
    Ok(())
}

/// A snapshot of every per-stage latency histogram the Kernel maintains.
#[derive(Debug, Clone, Copy, Default)]
pub struct LatencySnapshot {
    pub embed: HistogramSnapshot,
    pub search_full: HistogramSnapshot,
    pub search_binary: HistogramSnapshot,
    pub read: HistogramSnapshot,
    pub rerank: HistogramSnapshot,
}

pub struct Kernel<S, E> {
    index: Index,
    store: S,
    embedder: E,
    max_id: AtomicI32,
    hist_embed: Histogram,
    hist_search_full: Histogram,
    hist_search_binary: Histogram,
    hist_read: Histogram,
    hist_rerank: Histogram,
}

/// Latency histograms cover microsecond observations up to one minute;
/// every search-pipeline stage comfortably fits inside that range.
const LATENCY_MAX_MICROS: u64 = 60_000_000;

impl<S: Store, E: Embedder> Kernel<S, E> {
    /// Builds a Kernel whose dimensionality is fixed by `embedder`, then
    /// loads every item the store advertises. A dimensionality
    /// mismatch between the embedder and an already-loaded record is
    /// fatal.
    pub fn new(store: S, embedder: E) -> CoreResult<Self> {
        let dims = embedder.dimensions();
        let kernel = Self {
            index: Index::new(dims),
            store,
            embedder,
            max_id: AtomicI32::new(0),
            hist_embed: Histogram::new(LATENCY_MAX_MICROS),
            hist_search_full: Histogram::new(LATENCY_MAX_MICROS),
            hist_search_binary: Histogram::new(LATENCY_MAX_MICROS),
            hist_read: Histogram::new(LATENCY_MAX_MICROS),
            hist_rerank: Histogram::new(LATENCY_MAX_MICROS),
        };
        kernel.load()?;
        Ok(kernel)
    }

    fn load(&self) -> CoreResult<()> {
        let keys = self.store.read_all_keys()?;
        let mut loaded = 0u64;
        for id in keys {
            match self.store.read(id) {
                Ok(Some(bytes)) => match record::decode(&bytes) {
                    Ok(item) => {
                        if item.embedding.len() != self.index.dims() {
                            return Err(CoreError::internal(format!(
                                "dimensionality mismatch loading id {}: embedder reports {} dims, stored item has {}",
                                id,
                                self.index.dims(),
                                item.embedding.len()
                            )));
                        }
                        self.index.add(item.id, item.embedding)?;
                        self.bump_max_id(item.id);
                        loaded += 1;
                    }
                    Err(error) => {
                        tracing::warn!(id, %error, "skipping corrupt record on load");
                    }
                },
                Ok(None) => tracing::warn!(id, "advertised key missing from store on load"),
                Err(error) => tracing::warn!(id, %error, "failed to read record on load"),
            }
        }
        if loaded > 0 {
            let s = self.index.density_summary();
            tracing::info!(loaded, mean = s.mean, p10 = s.p10, p90 = s.p90, "index loaded");
        }
        Ok(())
    }

    fn bump_max_id(&self, id: i32) {
        self.max_id.fetch_max(id, Ordering::Relaxed);
    }

    pub fn max_id(&self) -> i32 {
        self.max_id.load(Ordering::Relaxed)
    }

    pub fn dims(&self) -> usize {
        self.index.dims()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Saves one item, embedding it first if it arrived without one
    pub fn save_item(&self, item: Item) -> CoreResult<()> {
        self.save_batch(vec![item])
    }

    /// Saves a batch of items, embedding any that lack a vector in a
    /// single batch call (preferred for groups over one-at-a-time saves).
    /// Text embedded for a bare item is its `semantic_key`.
    pub fn save_batch(&self, mut items: Vec<Item>) -> CoreResult<()> {
        let need_embedding: Vec<usize> = items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.embedding.is_empty())
            .map(|(i, _)| i)
            .collect();

        if !need_embedding.is_empty() {
            let texts: Vec<String> = need_embedding.iter().map(|&i| items[i].semantic_key.clone()).collect();
            let t0 = Instant::now();
            let embeddings = self.embedder.embed_batch(&texts)?;
            self.hist_embed.record(t0.elapsed().as_micros() as u64);
            if embeddings.len() != need_embedding.len() {
                return Err(CoreError::internal("embedder returned a different count than requested"));
            }
            for (&idx, embedding) in need_embedding.iter().zip(embeddings) {
                items[idx].embedding = embedding;
            }
        }

        for item in items {
            let bytes = record::encode(&item)?;
            self.store.upsert(item.id, bytes)?;
            self.index.add(item.id, item.embedding)?;
            self.bump_max_id(item.id);
        }
        Ok(())
    }

    /// Embeds arbitrary text through the configured embedder, recording
    /// the same latency histogram the search-by-text paths use. Exposed
    /// for offline tooling (e.g. a query-replay file preparer) that needs
    /// an embedding without running a search.
    pub fn embed_text(&self, text: &str) -> CoreResult<Vec<f32>> {
        self.embed_query(text)
    }

    fn embed_query(&self, text: &str) -> CoreResult<Vec<f32>> {
        if text.is_empty() {
            return Err(CoreError::invalid_argument("query text must not be empty"));
        }
        let t0 = Instant::now();
        let v = self.embedder.embed(text)?;
        self.hist_embed.record(t0.elapsed().as_micros() as u64);
        Ok(v)
    }

    fn read_items(&self, ids: &[i32]) -> CoreResult<Vec<Item>> {
        let t0 = Instant::now();
        let mut out = Vec::with_capacity(ids.len());
        for &id in ids {
            out.push(self.read_item(id)?);
        }
        self.hist_read.record(t0.elapsed().as_micros() as u64);
        Ok(out)
    }

    fn read_item(&self, id: i32) -> CoreResult<Item> {
        match self.store.read(id)? {
            Some(bytes) => record::decode(&bytes),
            None => Err(CoreError::NotFound { id }),
        }
    }

    /// Full-precision search, returning payloads in scanner
    /// order.
    pub fn search_full(&self, query: &[f32], k: usize) -> CoreResult<Vec<String>> {
        let ids = self.search_full_ids(query, k)?;
        Ok(self.read_items(&ids)?.into_iter().map(|item| item.payload).collect())
    }

    /// Same pipeline as [`Self::search_full`], returning ids instead of
    /// payloads.
    pub fn search_full_ids(&self, query: &[f32], k: usize) -> CoreResult<Vec<i32>> {
        validate_k(k)?;
        let t0 = Instant::now();
        let ids = self.index.find_closest(query, k)?;
        self.hist_search_full.record(t0.elapsed().as_micros() as u64);
        Ok(ids)
    }

    /// Embeds `text`, then runs [`Self::search_full`].
    pub fn search_full_text(&self, text: &str, k: usize) -> CoreResult<Vec<String>> {
        let query = self.embed_query(text)?;
        self.search_full(&query, k)
    }

    fn hamming_stage(&self, query: &[f32], k: usize, reorder: bool, overshoot: usize) -> CoreResult<Vec<i32>> {
        validate_k(k)?;
        let overshoot = if reorder { overshoot } else { 0 };
        let t0 = Instant::now();
        let hits = self.index.find_closest_binary(query, k + overshoot)?;
        self.hist_search_binary.record(t0.elapsed().as_micros() as u64);
        Ok(hits.into_iter().map(|(id, _)| id).collect())
    }

    /// Re-ranks `items` by cosine distance against `query` (normalized on
    /// a local copy — the stored embeddings are already normalized at
    /// insert; see Design Notes, "re-rank without normalization"), taking
    /// the first `k` in the new order.
    fn rerank(&self, query: &[f32], items: &[Item], k: usize) -> CoreResult<Vec<Item>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }
        let dim = self.index.dims();
        let mut q = query.to_vec();
        normalize_in_place(&mut q);

        let mut flat = Vec::with_capacity(items.len() * dim);
        for item in items {
            if item.embedding.len() != dim {
                return Err(CoreError::internal(format!(
                    "stored embedding for id {} has {} dims, expected {}",
                    item.id,
                    item.embedding.len(),
                    dim
                )));
            }
            flat.extend_from_slice(&item.embedding);
        }

        let t0 = Instant::now();
        let order = cosine::top_k_cosine(&q, &flat, dim, items.len(), k.min(items.len()));
        self.hist_rerank.record(t0.elapsed().as_micros() as u64);
        Ok(order.into_iter().map(|(p, _)| items[p].clone()).collect())
    }

    /// Binary-coarse search with optional full-precision re-rank,
    /// returning payloads.
    pub fn search_binary(&self, query: &[f32], k: usize, reorder: bool, overshoot: usize) -> CoreResult<Vec<String>> {
        let ids = self.hamming_stage(query, k, reorder, overshoot)?;
        let items = self.read_items(&ids)?;
        if !reorder {
            return Ok(items.into_iter().take(k).map(|item| item.payload).collect());
        }
        let reranked = self.rerank(query, &items, k)?;
        Ok(reranked.into_iter().map(|item| item.payload).collect())
    }

    /// Same pipeline as [`Self::search_binary`], returning ids. When
    /// `reorder` is false this skips the store round-trip entirely
    pub fn search_binary_ids(&self, query: &[f32], k: usize, reorder: bool, overshoot: usize) -> CoreResult<Vec<i32>> {
        let ids = self.hamming_stage(query, k, reorder, overshoot)?;
        if !reorder {
            return Ok(ids.into_iter().take(k).collect());
        }
        let items = self.read_items(&ids)?;
        let reranked = self.rerank(query, &items, k)?;
        Ok(reranked.into_iter().map(|item| item.id).collect())
    }

    /// Embeds `text`, then runs [`Self::search_binary`].
    pub fn search_binary_text(&self, text: &str, k: usize, reorder: bool, overshoot: usize) -> CoreResult<Vec<String>> {
        let query = self.embed_query(text)?;
        self.search_binary(&query, k, reorder, overshoot)
    }

    pub fn density_summary(&self) -> HistogramSnapshot {
        self.index.density_summary()
    }

    pub fn latency_snapshot(&self) -> LatencySnapshot {
        LatencySnapshot {
            embed: self.hist_embed.snapshot(),
            search_full: self.hist_search_full.snapshot(),
            search_binary: self.hist_search_binary.snapshot(),
            read: self.hist_read.snapshot(),
            rerank: self.hist_rerank.snapshot(),
        }
    }
}
