//! ```bash
//! RUSTFLAGS="-C target-cpu=native" cargo run --example load_test --release
//! ```

use annvec::{Item, Kernel};
use embeddings::HashingEmbedder;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::{fs, path::PathBuf, time::Instant};
use storage::FileStore;

/// OpenAI ada-002 / text-embedding-3-small output dimension.
const DIM: usize = 1536;
/// Number of vectors to generate for the load test.
const N_VECS: usize = 10_000;
/// Number of queries to run for verification.
const N_QUERIES: usize = 100;
/// Top-k requested from every search.
const K: usize = 1;
/// Deterministic seed for reproducibility.
const SEED: u64 = 42;

fn random_vector(rng: &mut StdRng, dim: usize) -> Vec<f32> {
    (0..dim).map(|_| rng.gen::<f32>() * 2.0 - 1.0).collect()
}

fn fmt_bytes(n: u64) -> String {
    match n {
        b if b < 1024 => format!("{b} B"),
        b if b < 1024 * 1024 => format!("{:.2} KiB", b as f64 / 1024.0),
        b if b < 1024 * 1024 * 1024 => format!("{:.2} MiB", b as f64 / (1024.0 * 1024.0)),
        b => format!("{:.2} GiB", b as f64 / (1024.0 * 1024.0 * 1024.0)),
    }
}

fn divider() {
    println!("{}", "─".repeat(60));
}

fn main() -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════════╗");
    println!("║           annvec Load Test & Persistence Verifier         ║");
    println!("╚══════════════════════════════════════════════════════════╝");
    println!();

    // ── Phase 1: Data Generation ─────────────────────────────────────────
    divider();
    println!("Phase 1 — Generating random vectors");
    println!("  Vectors:   {N_VECS}");
    println!("  Dimension: {DIM}");
    println!("  Raw data:  {} (uncompressed, f32)", fmt_bytes((N_VECS * DIM * 4) as u64));

    let t0 = Instant::now();
    let mut rng = StdRng::seed_from_u64(SEED);
    let vectors: Vec<Vec<f32>> = (0..N_VECS).map(|_| random_vector(&mut rng, DIM)).collect();
    println!("  Generated in {:?}", t0.elapsed());

    // ── Phase 2: Insertion ────────────────────────────────────────────────
    divider();
    println!("Phase 2 — Inserting into a file-backed Kernel (with L2 normalization)");

    let store_path = PathBuf::from("/tmp/annvec_load_test.bin");
    let _ = fs::remove_file(&store_path);

    let t0 = Instant::now();
    let kernel = Kernel::new(FileStore::open(&store_path)?, HashingEmbedder::new(DIM))?;
    let items: Vec<Item> = vectors
        .iter()
        .enumerate()
        .map(|(i, v)| Item { id: i as i32, semantic_key: format!("vec-{i}"), payload: format!("payload-{i}"), embedding: v.clone() })
        .collect();
    kernel.save_batch(items)?;
    let insert_duration = t0.elapsed();
    println!("  Inserted {N_VECS} vectors in {insert_duration:?}");
    println!("  Throughput: {:.0} vectors/sec", N_VECS as f64 / insert_duration.as_secs_f64());

    // ── Phase 3: Baseline Searches (pre-reopen) ──────────────────────────
    divider();
    println!("Phase 3 — Running {N_QUERIES} baseline searches");

    let mut query_rng = StdRng::seed_from_u64(SEED + 1);
    let queries: Vec<Vec<f32>> = (0..N_QUERIES).map(|_| random_vector(&mut query_rng, DIM)).collect();

    let t0 = Instant::now();
    let baseline_results: Vec<Vec<i32>> = queries.iter().map(|q| kernel.search_full_ids(q, K).unwrap()).collect();
    let search_duration = t0.elapsed();

    println!("  Completed in {:?}", search_duration);
    println!("  Average per query: {:.2} µs", search_duration.as_micros() as f64 / N_QUERIES as f64);

    // ── Phase 4: Reopen from Disk ─────────────────────────────────────────
    divider();
    println!("Phase 4 — Reopening the index from disk");

    let file_size = fs::metadata(&store_path)?.len();
    println!("  Store file: {}", store_path.display());
    println!("  File size:  {}", fmt_bytes(file_size));

    let t0 = Instant::now();
    let reopened = Kernel::new(FileStore::open(&store_path)?, HashingEmbedder::new(DIM))?;
    let load_duration = t0.elapsed();

    println!("  Loaded in: {load_duration:?}");
    println!("  Vectors in loaded index: {}", reopened.len());
    println!("  Dimension in loaded index: {}", reopened.dims());

    // ── Phase 5: Integrity Verification ──────────────────────────────────
    divider();
    println!("Phase 5 — Verifying round-trip integrity");
    println!("  Running {N_QUERIES} identical queries on the reopened index...");

    let t0 = Instant::now();
    let reopened_results: Vec<Vec<i32>> = queries.iter().map(|q| reopened.search_full_ids(q, K).unwrap()).collect();
    let verify_duration = t0.elapsed();

    let mut mismatches = 0usize;
    for (i, (orig, loaded)) in baseline_results.iter().zip(reopened_results.iter()).enumerate() {
        if orig != loaded {
            eprintln!("  ✗ Query {i}: ID mismatch — original={orig:?}, reopened={loaded:?}");
            mismatches += 1;
        }
    }

    println!("  Verified in {:?}", verify_duration);
    println!("  Mismatches: {mismatches}/{N_QUERIES}");

    // ── Phase 6: Summary ──────────────────────────────────────────────────
    divider();
    if mismatches == 0 {
        println!("✅ Round-trip integrity: PASSED");
    } else {
        println!("❌ Round-trip integrity: FAILED ({mismatches} mismatches)");
    }

    println!();
    println!("Performance Summary");
    println!("──────────────────────────────────────────────────");
    println!("  Insert throughput:      {:.0} vec/s", N_VECS as f64 / insert_duration.as_secs_f64());
    println!("  Search latency (avg):   {:.2} µs/query ({N_VECS} vecs, dim={DIM})", search_duration.as_micros() as f64 / N_QUERIES as f64);
    println!("  Reopen time:            {load_duration:?}");
    println!("──────────────────────────────────────────────────");

    let _ = fs::remove_file(&store_path);
    let _ = fs::remove_file(store_path.with_extension("bin.tmp"));

    Ok(())
}
