//! A two-stage approximate nearest-neighbor search kernel: a coarse
//! sign-bit/Hamming scan over the whole corpus, optionally followed by a
//! full-precision cosine re-rank of the survivors.
//!
//! ## Architecture
//!
//! Both the coarse and full-precision corpora live in flat
//! structure-of-arrays buffers (see [`index`]) rather than one allocation
//! per row — a search is a single sequential scan, not a chase through `N`
//! heap pointers. The scanning inner loops (see [`cosine`], [`hamming`])
//! are hand-unrolled so the compiler can keep several independent
//! multiply-add/XOR-popcount chains in flight instead of serializing on
//! one accumulator; bounds checks are elided there with `unsafe` blocks
//! that carry a `SAFETY:` comment proving the access is in range.
//!
//! [`Index`] is the only thing that needs to be thread-safe on its own;
//! [`Kernel`] composes it with a caller-supplied [`Store`] and [`Embedder`]
//! to provide the full insert/search surface.

mod bitpack;
mod cosine;
mod error;
mod hamming;
mod heap;
mod histogram;
mod index;
mod kernel;
mod normalize;
mod record;

pub use bitpack::{pack, words_for_dims};
pub use error::{CoreError, CoreResult};
pub use histogram::{Histogram, Snapshot as HistogramSnapshot};
pub use index::Index;
pub use kernel::{Embedder, Kernel, LatencySnapshot, Store};
pub use record::{decode, decode_queries, encode, encode_queries, Item, QueryRecord};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;
