//! Matchmaking queues

pub mod queue;
pub mod service;

pub use queue::{MatchmakingQueue, QueuedPlayer};
pub use service::{QueueError, QueueManager, QueueStats};
