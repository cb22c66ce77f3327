//! Reel-Sweep: a resumable, checkpointed movie catalogue crawler
//!
//! This crate walks a dense numeric identifier space, fetches one page per
//! identifier under a global concurrency limit, extracts a fixed schema of
//! movie fields from each page, and writes cumulative CSV checkpoints after
//! every chunk so long crawls can be resumed.

pub mod config;
pub mod crawler;
pub mod output;
pub mod record;
pub mod state;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Reel-Sweep operations
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid CSS selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Checkpoint already exists: {}", path.display())]
    CheckpointExists { path: PathBuf },

    #[error(
        "Checkpoint directory {} already holds checkpoints; remove them or drop --fresh to resume",
        dir.display()
    )]
    CheckpointDirNotEmpty { dir: PathBuf },

    #[error("Malformed checkpoint {}: {message}", path.display())]
    MalformedCheckpoint { path: PathBuf, message: String },

    #[error("Invalid chunk transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::ChunkState,
        to: state::ChunkState,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Reel-Sweep operations
pub type Result<T> = std::result::Result<T, SweepError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use record::{FieldValue, Record};
pub use state::ChunkState;
