/// Chunk state definitions for tracking crawl progress
///
/// Every chunk moves through the same four states, strictly in order.
use std::fmt;

/// Represents the current state of a chunk in the crawl process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkState {
    /// Chunk is waiting for earlier chunks to be checkpointed
    Pending,

    /// Fetches for the chunk's identifiers are running
    InFlight,

    /// Every unit of work finished and results were appended
    Collected,

    /// The cumulative checkpoint covering this chunk is on disk
    Checkpointed,
}

impl ChunkState {
    /// Returns the only state this one may move to, if any
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Pending => Some(Self::InFlight),
            Self::InFlight => Some(Self::Collected),
            Self::Collected => Some(Self::Checkpointed),
            Self::Checkpointed => None,
        }
    }

    /// Returns true if moving from this state to `to` is allowed
    pub fn can_transition_to(&self, to: ChunkState) -> bool {
        self.next() == Some(to)
    }

    /// Returns true once the chunk's progress is durable
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Checkpointed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InFlight => "in_flight",
            Self::Collected => "collected",
            Self::Checkpointed => "checkpointed",
        }
    }

    /// Returns all possible chunk states, in lifecycle order
    pub fn all_states() -> [Self; 4] {
        [
            Self::Pending,
            Self::InFlight,
            Self::Collected,
            Self::Checkpointed,
        ]
    }
}

impl fmt::Display for ChunkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
