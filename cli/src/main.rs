use clap::{Parser, Subcommand};
use configs::app_config::AppConfig;
use engine::{ingest_file, load_queries, open, prepare_queries};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "annvec", about = "Two-stage binary-quantized + cosine ANN search")]
struct Cli {
    /// Path to a JSON config file. Falls back to environment variables
    /// (via `.env`) when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load the index from the configured store and enter an interactive
    /// search loop.
    Serve,
    /// Bulk-load a newline-delimited JSON file of items.
    Inputfile { path: PathBuf },
    /// Embed `query` and print the top-`k` payloads by full-precision
    /// cosine distance.
    Search {
        query: String,
        #[arg(default_value_t = 10)]
        k: usize,
    },
    /// Embed every query string in `input` and write a replayable query
    /// file to `output`.
    Preparequeries { input: PathBuf, output: PathBuf },
    /// Replay a prepared query file through both search stages and report
    /// latency/recall.
    Testqueries { file: PathBuf },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match AppConfig::from_file(&path.to_string_lossy()) {
            Ok(config) => config,
            Err(error) => {
                eprintln!("failed to load config from {}: {error}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => AppConfig::from_env(),
    };

    let filter = tracing_subscriber::EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run(config, cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(%error, "command failed");
            ExitCode::FAILURE
        }
    }
}

fn run(config: AppConfig, command: Command) -> annvec::CoreResult<()> {
    match command {
        Command::Serve => serve(config),
        Command::Inputfile { path } => {
            let kernel = open(&config)?;
            let count = ingest_file(&kernel, &path)?;
            println!("loaded {count} items");
            Ok(())
        }
        Command::Search { query, k } => {
            let kernel = open(&config)?;
            for payload in kernel.search_full_text(&query, k)? {
                println!("{payload}");
            }
            Ok(())
        }
        Command::Preparequeries { input, output } => {
            let kernel = open(&config)?;
            let count = prepare_queries(&kernel, &input, &output)?;
            println!("prepared {count} queries");
            Ok(())
        }
        Command::Testqueries { file } => testqueries(&config, &file),
    }
}

/// Stands in for the HTTP server this spec leaves unimplemented: a plain
/// read-eval-print loop over `search_full_text`.
fn serve(config: AppConfig) -> annvec::CoreResult<()> {
    let kernel = open(&config)?;
    println!("annvec ready: {} items, {} dims. enter a query (blank line to quit).", kernel.len(), kernel.dims());
    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush().ok();
        let mut line = String::new();
        if stdin.read_line(&mut line).unwrap_or(0) == 0 {
            break;
        }
        let query = line.trim();
        if query.is_empty() {
            break;
        }
        match kernel.search_full_text(query, 10) {
            Ok(hits) => {
                for payload in hits {
                    println!("{payload}");
                }
            }
            Err(error) => println!("error: {error}"),
        }
    }
    Ok(())
}

fn testqueries(config: &AppConfig, file: &std::path::Path) -> annvec::CoreResult<()> {
    let kernel = open(config)?;
    let queries = load_queries(file)?;
    let k = 10;
    let mut agreement = 0usize;
    let mut total = 0usize;
    for record in &queries {
        let full = kernel.search_full_ids(&record.embedding, k)?;
        // recall@K is a fixed measurement against the re-ranked binary path,
        // not whatever a deployment's `reorder` default happens to be.
        let binary = kernel.search_binary_ids(&record.embedding, k, true, config.overshoot)?;
        total += full.len();
        agreement += full.iter().filter(|id| binary.contains(id)).count();
    }
    let recall = if total == 0 { 0.0 } else { agreement as f64 / total as f64 };
    let latency = kernel.latency_snapshot();
    println!("queries replayed: {}", queries.len());
    println!("recall@{k} of binary vs full: {:.4}", recall);
    println!(
        "search_full   : count={} mean={:.1}us p10={} p90={}",
        latency.search_full.count, latency.search_full.mean, latency.search_full.p10, latency.search_full.p90
    );
    println!(
        "search_binary : count={} mean={:.1}us p10={} p90={}",
        latency.search_binary.count, latency.search_binary.mean, latency.search_binary.p10, latency.search_binary.p90
    );
    println!(
        "rerank        : count={} mean={:.1}us p10={} p90={}",
        latency.rerank.count, latency.rerank.mean, latency.rerank.p10, latency.rerank.p90
    );
    println!(
        "read          : count={} mean={:.1}us p10={} p90={}",
        latency.read.count, latency.read.mean, latency.read.p10, latency.read.p90
    );
    Ok(())
}
