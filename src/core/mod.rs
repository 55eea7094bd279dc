//! Core blockchain functionality
//!
//! Blocks and transactions, the validated chain, hashing and proof of work,
//! the balance ledger and the miner.

pub mod block;
pub mod chain;
pub mod hasher;
pub mod ledger;
pub mod miner;
pub mod proof_of_work;
pub mod transaction;

pub use block::{Block, GENESIS_PREVIOUS_HASH};
pub use chain::Chain;
pub use hasher::{hash_fields, BlockHasher};
pub use ledger::Ledger;
pub use miner::Miner;
pub use proof_of_work::{ProofOfWork, MAX_DIFFICULTY};
pub use transaction::{Transaction, SYSTEM_SENDER};
