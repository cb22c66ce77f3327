//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `ChunkState`: lifecycle of one chunk (pending, in flight, collected, checkpointed)

mod chunk_state;

pub use chunk_state::ChunkState;
