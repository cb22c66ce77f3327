//! Output module for checkpoints, statistics and the showcase
//!
//! This module handles:
//! - Writing and reading cumulative CSV checkpoints
//! - Summarizing the latest checkpoint
//! - Sampling a finished dataset for display

pub mod checkpoint;
pub mod showcase;
pub mod stats;

pub use checkpoint::{
    latest_checkpoint, list_checkpoints, load_checkpoint, CheckpointFile, CheckpointWriter,
};
pub use showcase::{load_dataset, render_selection, Card, Dataset, Selection, ShowcaseError};
pub use stats::{load_statistics, print_statistics, CheckpointStatistics};
