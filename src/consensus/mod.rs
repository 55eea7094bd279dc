//! Longest-valid-chain consensus
//!
//! [`ConsensusEngine`] runs one reconciliation pass against every registered
//! peer; [`SyncScheduler`] drives passes on a timer.

pub mod engine;
pub mod scheduler;

pub use engine::{ConsensusEngine, ConsensusOutcome, SyncState};
pub use scheduler::SyncScheduler;
