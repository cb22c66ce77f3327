//! Chunk scheduling over the identifier range
//!
//! This module handles:
//! - Partitioning the range into fixed-size, contiguous chunks
//! - Skipping the prefix already covered by a checkpoint
//! - Enforcing each chunk's state lifecycle
//!
//! Chunk boundaries are purely positional: they depend only on the range
//! start and the chunk size.

use crate::state::ChunkState;
use crate::SweepError;
use std::ops::RangeInclusive;

/// A contiguous slice of the identifier range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// 1-based position of the chunk within the full range
    pub index: u64,

    /// First identifier (inclusive)
    pub first_id: u64,

    /// Last identifier (inclusive)
    pub last_id: u64,

    /// Identifiers covered from the start of the range through this chunk
    pub processed_through: u64,

    state: ChunkState,
}

impl Chunk {
    pub fn ids(&self) -> RangeInclusive<u64> {
        self.first_id..=self.last_id
    }

    /// Number of identifiers in the chunk; never zero
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> u64 {
        self.last_id - self.first_id + 1
    }

    pub fn state(&self) -> ChunkState {
        self.state
    }

    /// Moves the chunk to its next state
    ///
    /// # Errors
    ///
    /// `SweepError::InvalidTransition` if `to` is not the direct successor
    /// of the current state.
    pub fn advance(&mut self, to: ChunkState) -> Result<(), SweepError> {
        if !self.state.can_transition_to(to) {
            return Err(SweepError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        tracing::trace!("Chunk {}: {} -> {}", self.index, self.state, to);
        self.state = to;
        Ok(())
    }
}

/// Iterator over the chunks still to be crawled, in range order
#[derive(Debug, Clone)]
pub struct ChunkPlan {
    range_first: u64,
    last_id: u64,
    chunk_size: u64,
    next_start: Option<u64>,
}

impl ChunkPlan {
    /// Plans chunks for `first_id..=last_id`, skipping the first `skip` identifiers
    ///
    /// # Example
    ///
    /// ```
    /// use reel_sweep::crawler::ChunkPlan;
    ///
    /// let chunks: Vec<_> = ChunkPlan::new(10, 21, 5, 0).collect();
    /// assert_eq!(chunks.len(), 3);
    /// assert_eq!(chunks[2].ids(), 20..=21);
    /// assert_eq!(chunks[2].processed_through, 12);
    /// ```
    pub fn new(first_id: u64, last_id: u64, chunk_size: u64, skip: u64) -> Self {
        let chunk_size = chunk_size.max(1);
        let next_start = first_id
            .checked_add(skip)
            .filter(|start| *start <= last_id && first_id <= last_id);

        Self {
            range_first: first_id,
            last_id,
            chunk_size,
            next_start,
        }
    }

    /// Number of identifiers not yet handed out
    pub fn remaining_ids(&self) -> u64 {
        self.next_start
            .map_or(0, |start| self.last_id - start + 1)
    }

    /// Number of chunks not yet handed out
    pub fn remaining_chunks(&self) -> u64 {
        let ids = self.remaining_ids();
        ids / self.chunk_size + u64::from(ids % self.chunk_size != 0)
    }
}

impl Iterator for ChunkPlan {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        let start = self.next_start?;
        let end = start
            .saturating_add(self.chunk_size - 1)
            .min(self.last_id);
        let offset = start - self.range_first;

        self.next_start = end.checked_add(1).filter(|next| *next <= self.last_id);

        Some(Chunk {
            index: offset / self.chunk_size + 1,
            first_id: start,
            last_id: end,
            processed_through: end - self.range_first + 1,
            state: ChunkState::Pending,
        })
    }
}
