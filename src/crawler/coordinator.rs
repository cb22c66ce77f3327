//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! the crawling process, including:
//! - Preparing the checkpoint directory and resuming from the latest checkpoint
//! - Running every identifier of a chunk concurrently under the fetch permits
//! - Accumulating records across chunks
//! - Writing a cumulative checkpoint before the next chunk starts

use crate::config::Config;
use crate::crawler::extractor::Extractor;
use crate::crawler::fetcher::{build_http_client, FetchPermits, Fetcher};
use crate::crawler::scheduler::{Chunk, ChunkPlan};
use crate::crawler::worker::process;
use crate::output::checkpoint::{
    latest_checkpoint, load_checkpoint, read_config_hash, write_config_hash, CheckpointFile,
    CheckpointWriter,
};
use crate::record::Record;
use crate::state::ChunkState;
use crate::{Result, SweepError};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;

/// Outcome of a crawl run
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Checkpoint the run resumed from, if any
    pub resumed_from: Option<PathBuf>,

    /// Chunks completed by this run
    pub chunks_processed: u64,

    /// Identifiers attempted by this run
    pub ids_processed: u64,

    /// Identifiers covered by the latest checkpoint
    pub ids_covered: u64,

    /// Records in the latest checkpoint
    pub records_total: usize,

    /// Records extracted by this run
    pub records_added: usize,

    /// Identifiers without content, by reason
    pub absent: BTreeMap<String, u64>,

    /// Highest number of fetches in flight at once
    pub peak_in_flight: usize,

    pub last_checkpoint: Option<PathBuf>,
}

impl CrawlReport {
    /// Share of attempted identifiers that produced a record, in percent
    pub fn hit_rate(&self) -> f64 {
        if self.ids_processed == 0 {
            return 0.0;
        }
        self.records_added as f64 / self.ids_processed as f64 * 100.0
    }

    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }
}

/// Results of one chunk
#[derive(Debug, Default)]
struct ChunkOutcome {
    records: Vec<Record>,
    absent: BTreeMap<String, u64>,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    fetcher: Arc<Fetcher>,
    extractor: Arc<Extractor>,
    writer: CheckpointWriter,
    records: Vec<Record>,
    resumed_from: Option<CheckpointFile>,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `fresh` - Start from the first identifier; the checkpoint directory
    ///   must not already hold checkpoints
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run, with any previous checkpoint loaded
    /// * `Err(SweepError)` - Failed to initialize
    pub fn new(config: Config, fresh: bool) -> Result<Self> {
        let writer = CheckpointWriter::new(&config.output.checkpoint_dir);
        writer.ensure_dir()?;

        let existing = latest_checkpoint(writer.dir())?;
        let (records, resumed_from) = match existing {
            Some(_) if fresh => {
                return Err(SweepError::CheckpointDirNotEmpty {
                    dir: writer.dir().to_path_buf(),
                });
            }
            Some(checkpoint) => {
                let records = load_checkpoint(&checkpoint.path)?;
                tracing::info!(
                    "Resuming from {} ({} identifiers covered, {} records)",
                    checkpoint.path.display(),
                    checkpoint.processed,
                    records.len()
                );
                if checkpoint.processed > config.target.len() {
                    tracing::warn!(
                        "Checkpoint covers {} identifiers but the range only has {}",
                        checkpoint.processed,
                        config.target.len()
                    );
                }
                (records, Some(checkpoint))
            }
            None => {
                tracing::info!("No previous checkpoints found, starting at {}", config.target.first_id);
                (Vec::new(), None)
            }
        };

        let extractor = Extractor::new()?;
        let client = build_http_client(&config.user_agent, &config.crawler)?;
        let permits = Arc::new(FetchPermits::new(
            config.crawler.max_concurrent_requests as usize,
        ));
        let fetcher = Fetcher::new(client, permits, config.target.clone(), &config.crawler);

        Ok(Self {
            config: Arc::new(config),
            fetcher: Arc::new(fetcher),
            extractor: Arc::new(extractor),
            writer,
            records,
            resumed_from,
        })
    }

    /// Stores the config hash next to the checkpoints
    ///
    /// Warns when resuming under a configuration whose hash differs from the
    /// one recorded by an earlier run.
    pub fn record_config_hash(&self, hash: &str) -> Result<()> {
        if let Some(previous) = read_config_hash(self.writer.dir())? {
            if previous != hash && self.resumed_from.is_some() {
                tracing::warn!(
                    "Configuration changed since the checkpoints were written (was {}, now {})",
                    previous,
                    hash
                );
            }
        }
        write_config_hash(self.writer.dir(), hash)
    }

    /// Identifiers already covered by the checkpoint being resumed
    pub fn resume_offset(&self) -> u64 {
        self.resumed_from.as_ref().map_or(0, |c| c.processed)
    }

    /// Records accumulated so far
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn permits(&self) -> &Arc<FetchPermits> {
        self.fetcher.permits()
    }

    /// Runs the main crawl loop
    ///
    /// Chunks run strictly one after another: chunk k+1 starts only after
    /// the checkpoint for chunk k is on disk. A checkpoint write failure
    /// stops the run.
    pub async fn run(&mut self) -> Result<CrawlReport> {
        let target = &self.config.target;
        let chunk_size = self.config.crawler.chunk_size;
        let plan = ChunkPlan::new(target.first_id, target.last_id, chunk_size, self.resume_offset());
        let total_chunks = ChunkPlan::new(target.first_id, target.last_id, chunk_size, 0).remaining_chunks();

        let mut report = CrawlReport {
            started_at: Utc::now(),
            finished_at: Utc::now(),
            resumed_from: self.resumed_from.as_ref().map(|c| c.path.clone()),
            chunks_processed: 0,
            ids_processed: 0,
            ids_covered: self.resume_offset().min(target.len()),
            records_total: self.records.len(),
            records_added: 0,
            absent: BTreeMap::new(),
            peak_in_flight: 0,
            last_checkpoint: self.resumed_from.as_ref().map(|c| c.path.clone()),
        };

        if plan.remaining_chunks() == 0 {
            tracing::info!("Nothing left to crawl: every identifier is covered");
        } else {
            tracing::info!(
                "Crawling {} identifiers in {} chunks of up to {}",
                plan.remaining_ids(),
                plan.remaining_chunks(),
                chunk_size
            );
        }

        let start_time = Instant::now();
        for mut chunk in plan {
            let chunk_start = Instant::now();

            chunk.advance(ChunkState::InFlight)?;
            let outcome = self.run_chunk(&chunk).await;
            chunk.advance(ChunkState::Collected)?;

            let found = outcome.records.len();
            self.records.extend(outcome.records);
            for (reason, count) in outcome.absent {
                *report.absent.entry(reason).or_insert(0) += count;
            }

            let path = self.writer.write(&self.records, chunk.processed_through)?;
            chunk.advance(ChunkState::Checkpointed)?;

            report.chunks_processed += 1;
            report.ids_processed += chunk.len();
            report.ids_covered = chunk.processed_through;
            report.records_added += found;
            report.records_total = self.records.len();
            report.last_checkpoint = Some(path);

            let elapsed = start_time.elapsed();
            tracing::info!(
                "Chunk {}/{} ({}..={}): {} records in {:.1?}, {} total, {:.1} ids/sec",
                chunk.index,
                total_chunks,
                chunk.first_id,
                chunk.last_id,
                found,
                chunk_start.elapsed(),
                self.records.len(),
                report.ids_processed as f64 / elapsed.as_secs_f64().max(f64::EPSILON)
            );
        }

        report.finished_at = Utc::now();
        report.peak_in_flight = self.fetcher.permits().peak();

        tracing::info!(
            "Crawl completed: {} chunks, {} identifiers, {} new records in {:?}",
            report.chunks_processed,
            report.ids_processed,
            report.records_added,
            start_time.elapsed()
        );

        Ok(report)
    }

    /// Runs every identifier of a chunk concurrently and waits for all of them
    async fn run_chunk(&self, chunk: &Chunk) -> ChunkOutcome {
        let mut tasks = JoinSet::new();
        for id in chunk.ids() {
            let fetcher = Arc::clone(&self.fetcher);
            let extractor = Arc::clone(&self.extractor);
            tasks.spawn(async move { process(&fetcher, &extractor, id).await });
        }

        let mut outcome = ChunkOutcome::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(record)) => outcome.records.push(record),
                Ok(Err(absent)) => {
                    *outcome.absent.entry(absent.reason().to_string()).or_insert(0) += 1;
                }
                Err(e) => {
                    tracing::error!("Worker task in chunk {} failed: {}", chunk.index, e);
                    *outcome.absent.entry("task_failed".to_string()).or_insert(0) += 1;
                }
            }
        }
        outcome
    }
}

/// Runs the main crawl operation
///
/// When `config_hash` is given it is recorded next to the checkpoints
/// before the first chunk starts.
///
/// # Example
///
/// ```no_run
/// use reel_sweep::config::load_config;
/// use reel_sweep::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("config.toml"))?;
/// let report = run_crawl(config, false, None).await?;
/// println!("{} records", report.records_total);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(
    config: Config,
    fresh: bool,
    config_hash: Option<&str>,
) -> Result<CrawlReport> {
    let mut coordinator = Coordinator::new(config, fresh)?;
    if let Some(hash) = config_hash {
        coordinator.record_config_hash(hash)?;
    }
    coordinator.run().await
}
