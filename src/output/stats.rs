//! Statistics generation from checkpoints
//!
//! This module provides functionality for summarizing the latest
//! checkpoint in a directory and displaying the result.

use crate::output::checkpoint::{latest_checkpoint, load_checkpoint, union_columns};
use crate::record::{Record, REACTIONS};
use crate::Result;
use std::path::{Path, PathBuf};

/// Checkpoint statistics summary
#[derive(Debug, Clone)]
pub struct CheckpointStatistics {
    /// Checkpoint the statistics were computed from
    pub checkpoint: PathBuf,

    /// Identifiers covered by the checkpoint
    pub ids_processed: u64,

    /// Records in the checkpoint
    pub records: usize,

    /// Distinct columns across all records
    pub columns: usize,

    pub with_rating: usize,
    pub with_poster: usize,
    pub with_description: usize,

    /// Sum of each canonical reaction counter, in table order
    pub reaction_totals: Vec<(String, u64)>,
}

impl CheckpointStatistics {
    /// Computes statistics for a set of records
    pub fn from_records(checkpoint: PathBuf, ids_processed: u64, records: &[Record]) -> Self {
        let reaction_totals = REACTIONS
            .iter()
            .map(|(_, label)| {
                let total: u64 = records.iter().filter_map(|r| r.reaction(label)).sum();
                (label.to_string(), total)
            })
            .collect();

        Self {
            checkpoint,
            ids_processed,
            records: records.len(),
            columns: union_columns(records).len(),
            with_rating: records.iter().filter(|r| r.rating.is_some()).count(),
            with_poster: records.iter().filter(|r| r.poster_url.is_some()).count(),
            with_description: records.iter().filter(|r| r.description.is_some()).count(),
            reaction_totals,
        }
    }

    /// Share of covered identifiers that produced a record, in percent
    pub fn hit_rate(&self) -> f64 {
        if self.ids_processed == 0 {
            0.0
        } else {
            self.records as f64 / self.ids_processed as f64 * 100.0
        }
    }
}

/// Loads statistics from the latest checkpoint in a directory
///
/// # Returns
///
/// * `Ok(Some(CheckpointStatistics))` - Statistics for the latest checkpoint
/// * `Ok(None)` - The directory has no checkpoints
/// * `Err(SweepError)` - The checkpoint could not be read
pub fn load_statistics(dir: &Path) -> Result<Option<CheckpointStatistics>> {
    let Some(checkpoint) = latest_checkpoint(dir)? else {
        return Ok(None);
    };
    let records = load_checkpoint(&checkpoint.path)?;
    Ok(Some(CheckpointStatistics::from_records(
        checkpoint.path,
        checkpoint.processed,
        &records,
    )))
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CheckpointStatistics) {
    println!("=== Checkpoint Statistics ===\n");

    println!("Overview:");
    println!("  Checkpoint: {}", stats.checkpoint.display());
    println!("  Identifiers covered: {}", stats.ids_processed);
    println!("  Records: {} ({:.1}% hit rate)", stats.records, stats.hit_rate());
    println!("  Columns: {}", stats.columns);
    println!();

    println!("Field Coverage:");
    for (name, count) in [
        ("rating", stats.with_rating),
        ("poster", stats.with_poster),
        ("description", stats.with_description),
    ] {
        println!(
            "  {}: {} ({:.1}%)",
            name,
            count,
            percent(count, stats.records)
        );
    }
    println!();

    let mut reactions: Vec<_> = stats
        .reaction_totals
        .iter()
        .filter(|(_, total)| *total > 0)
        .collect();
    if !reactions.is_empty() {
        println!("Reactions:");
        reactions.sort_by(|a, b| b.1.cmp(&a.1));
        for (label, total) in reactions {
            println!("  {}: {}", label, total);
        }
        println!();
    }
}
