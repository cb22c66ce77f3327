//! Crawler module for page fetching and extraction
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching under a run-wide concurrency bound
//! - HTML extraction into records
//! - Chunk scheduling over the identifier range
//! - Overall crawl coordination and checkpointing

mod coordinator;
mod extractor;
mod fetcher;
mod scheduler;
mod worker;

pub use coordinator::{run_crawl, Coordinator, CrawlReport};
pub use extractor::Extractor;
pub use fetcher::{build_http_client, Absent, FetchPermit, FetchPermits, Fetcher, Markup};
pub use scheduler::{Chunk, ChunkPlan};
pub use worker::process;
