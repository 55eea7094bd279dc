use crate::core::{hash_fields, Transaction};
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// `previous_hash` of the genesis block
pub const GENESIS_PREVIOUS_HASH: &str = "0";
const GENESIS_TIMESTAMP: i64 = 0;
const GENESIS_NONCE: u64 = 0;

// Field order is the wire order peers exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    index: u64,
    timestamp: i64,
    transactions: Vec<Transaction>,
    previous_hash: String,
    nonce: u64,
    hash: String,
}

impl Block {
    /// Assembles a block from already-computed parts. Nothing is checked here;
    /// blocks only become trusted through `Chain::append_block` or
    /// `Chain::from_blocks`.
    pub fn from_parts(
        index: u64,
        timestamp: i64,
        transactions: Vec<Transaction>,
        previous_hash: String,
        nonce: u64,
        hash: String,
    ) -> Block {
        Block {
            index,
            timestamp,
            transactions,
            previous_hash,
            nonce,
            hash,
        }
    }

    /// The fixed first block shared by every node
    pub fn genesis() -> Block {
        let hash = hash_fields(0, GENESIS_TIMESTAMP, &[], GENESIS_PREVIOUS_HASH, GENESIS_NONCE)
            .unwrap_or_default();
        Block {
            index: 0,
            timestamp: GENESIS_TIMESTAMP,
            transactions: vec![],
            previous_hash: GENESIS_PREVIOUS_HASH.to_string(),
            nonce: GENESIS_NONCE,
            hash,
        }
    }

    /// Recomputes the hash from the block's fields
    pub fn compute_hash(&self) -> Result<String> {
        hash_fields(
            self.index,
            self.timestamp,
            &self.transactions,
            &self.previous_hash,
            self.nonce,
        )
    }

    pub fn get_index(&self) -> u64 {
        self.index
    }

    pub fn get_timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn get_transactions(&self) -> &[Transaction] {
        self.transactions.as_slice()
    }

    pub fn get_previous_hash(&self) -> &str {
        self.previous_hash.as_str()
    }

    pub fn get_nonce(&self) -> u64 {
        self.nonce
    }

    pub fn get_hash(&self) -> &str {
        self.hash.as_str()
    }
}
