//! Reel-Sweep main entry point
//!
//! This is the command-line interface for the Reel-Sweep catalogue crawler.

use anyhow::Context;
use clap::Parser;
use reel_sweep::config::{load_config_with_hash, Config};
use reel_sweep::crawler::{run_crawl, ChunkPlan};
use reel_sweep::output::{
    latest_checkpoint, load_dataset, load_statistics, print_statistics, render_selection,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Reel-Sweep: a resumable movie catalogue crawler
///
/// Reel-Sweep walks a numeric identifier range, extracts movie details from
/// every page that exists, and writes a cumulative CSV checkpoint after each
/// chunk so an interrupted crawl picks up where it stopped.
#[derive(Parser, Debug)]
#[command(name = "reel-sweep")]
#[command(version)]
#[command(about = "A resumable movie catalogue crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Start from the first identifier; the checkpoint directory must be empty
    #[arg(long)]
    fresh: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with_all = ["stats", "showcase"])]
    dry_run: bool,

    /// Show statistics for the latest checkpoint and exit
    #[arg(long, conflicts_with_all = ["dry_run", "showcase", "fresh"])]
    stats: bool,

    /// Show a random sample of the showcase dataset and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats", "fresh"])]
    showcase: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config, cli.fresh)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.showcase {
        handle_showcase(&config);
    } else {
        handle_crawl(config, &config_hash, cli.fresh).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("reel_sweep=info,warn"),
            1 => EnvFilter::new("reel_sweep=debug,info"),
            2 => EnvFilter::new("reel_sweep=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config, fresh: bool) -> anyhow::Result<()> {
    println!("=== Reel-Sweep Dry Run ===\n");

    println!("Crawler Configuration:");
    println!(
        "  Max concurrent requests: {}",
        config.crawler.max_concurrent_requests
    );
    println!("  Chunk size: {}", config.crawler.chunk_size);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!(
        "  Delay between requests: {}-{}ms",
        config.crawler.min_delay_ms, config.crawler.max_delay_ms
    );

    println!("\nTarget:");
    println!("  Base URL: {}", config.target.base_url);
    println!(
        "  Identifiers: {}..={} ({} total)",
        config.target.first_id,
        config.target.last_id,
        config.target.len()
    );

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    let dir = Path::new(&config.output.checkpoint_dir);
    println!("\nOutput:");
    println!("  Checkpoint directory: {}", dir.display());

    let latest = latest_checkpoint(dir)?;
    let skip = match (&latest, fresh) {
        (Some(checkpoint), false) => {
            println!(
                "  Resuming from: {} ({} identifiers covered)",
                checkpoint.path.display(),
                checkpoint.processed
            );
            checkpoint.processed
        }
        (Some(_), true) => {
            println!("  ✗ --fresh would be refused: the directory already holds checkpoints");
            0
        }
        (None, _) => {
            println!("  No previous checkpoints");
            0
        }
    };

    let plan = ChunkPlan::new(
        config.target.first_id,
        config.target.last_id,
        config.crawler.chunk_size,
        skip,
    );

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would crawl {} identifiers in {} chunks",
        plan.remaining_ids(),
        plan.remaining_chunks()
    );
    if let Some(first) = plan.clone().next() {
        println!(
            "  First chunk: #{} ({}..={})",
            first.index, first.first_id, first.last_id
        );
    }

    Ok(())
}

/// Handles the --stats mode: shows statistics for the latest checkpoint
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let dir = Path::new(&config.output.checkpoint_dir);
    println!("Checkpoint directory: {}\n", dir.display());

    match load_statistics(dir).context("Failed to read the latest checkpoint")? {
        Some(stats) => print_statistics(&stats),
        None => println!("No checkpoints found"),
    }

    Ok(())
}

/// Handles the --showcase mode
///
/// Dataset problems are printed as messages; they never fail the process.
fn handle_showcase(config: &Config) {
    let showcase = &config.showcase;
    let path = Path::new(&showcase.dataset_path);

    let dataset = match load_dataset(path) {
        Ok(dataset) => dataset,
        Err(e) => {
            eprintln!("✗ {}", e);
            return;
        }
    };

    let selection = dataset.sample(
        &mut rand::thread_rng(),
        showcase.sample_size,
        &showcase.placeholder_url,
    );
    println!("=== Random selection of {} movies ===\n", selection.cards.len());
    print!("{}", render_selection(&selection));
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, config_hash: &str, fresh: bool) -> anyhow::Result<()> {
    if fresh {
        tracing::info!("Starting fresh crawl");
    } else {
        tracing::info!("Starting crawl (will resume from the latest checkpoint)");
    }

    tracing::info!(
        "Range {}..={}, chunk size {}, {} concurrent requests",
        config.target.first_id,
        config.target.last_id,
        config.crawler.chunk_size,
        config.crawler.max_concurrent_requests
    );

    match run_crawl(config, fresh, Some(config_hash)).await {
        Ok(report) => {
            tracing::info!(
                "Crawl completed: {} records total, {} added ({:.1}% hit rate), peak {} requests in flight, {}s",
                report.records_total,
                report.records_added,
                report.hit_rate(),
                report.peak_in_flight,
                report.duration_seconds()
            );
            for (reason, count) in &report.absent {
                tracing::info!("  absent ({}): {}", reason, count);
            }
            if let Some(path) = &report.last_checkpoint {
                tracing::info!("Latest checkpoint: {}", path.display());
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
