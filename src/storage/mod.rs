//! In-memory node storage
//!
//! The node keeps nothing on disk; restarting clears the chain and the pool.
//! This module holds the pool of transactions waiting to be mined.

pub mod memory_pool;

pub use memory_pool::TransactionPool;
