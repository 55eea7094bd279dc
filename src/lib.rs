//! # Ledger Node - A Small Proof-of-Work Ledger Network
//!
//! Each node keeps an in-memory chain of blocks, a pool of pending transfers
//! and a list of peers. Nodes mine blocks with proof of work and converge on
//! the longest valid chain among their peers.
//!
//! ## How the Code Is Organized
//! - `core/`: blocks, transactions, hashing, proof of work, chain validation,
//!   balances and the miner
//! - `storage/`: the pool of pending transactions
//! - `node/`: the node handle that owns chain, pool and peers
//! - `consensus/`: longest-valid-chain reconciliation and its scheduler
//! - `network/`: the JSON protocol, TCP server and client, peer registry
//! - `config/`: settings from defaults, TOML, environment and flags
//! - `utils/`: digests, clock and encodings
//! - `cli/`: command-line interface
//!
//! ## Where to Start
//! 1. `node/mod.rs` for every operation a node exposes
//! 2. `core/chain.rs` for what makes a chain valid
//! 3. `consensus/engine.rs` for how nodes converge

pub mod cli;
pub mod config;
pub mod consensus;
pub mod core;
pub mod error;
pub mod network;
pub mod node;
pub mod storage;
pub mod utils;

#[cfg(test)]
pub mod testnet;

// Re-export commonly used types for convenience
pub use cli::{Command, Opt};
pub use config::Settings;
pub use consensus::{ConsensusEngine, ConsensusOutcome, SyncScheduler, SyncState};
pub use core::{Block, Chain, Ledger, Miner, ProofOfWork, Transaction, SYSTEM_SENDER};
pub use error::{BlockchainError, Result};
pub use network::{
    NodeStatus, PeerClient, PeerRegistry, Request, Response, Server, TcpPeerClient,
};
pub use node::Node;
pub use storage::TransactionPool;
pub use utils::current_timestamp;
