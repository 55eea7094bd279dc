//! Block content hashing
//!
//! The digest covers `(index, timestamp, transactions, previous_hash, nonce)`.
//! Everything but the nonce is encoded once per candidate so the nonce search
//! only pays for one SHA-256 per attempt.

use crate::core::Transaction;
use crate::error::Result;
use crate::utils::{encode_canonical, sha256_digest_parts};
use data_encoding::HEXLOWER;

pub struct BlockHasher {
    prefix: Vec<u8>,
}

impl BlockHasher {
    pub fn new(
        index: u64,
        timestamp: i64,
        transactions: &[Transaction],
        previous_hash: &str,
    ) -> Result<BlockHasher> {
        let prefix = encode_canonical((index, timestamp, transactions, previous_hash))?;
        Ok(BlockHasher { prefix })
    }

    /// Raw 32-byte digest for a given nonce
    pub fn digest(&self, nonce: u64) -> Vec<u8> {
        sha256_digest_parts(&self.prefix, &nonce.to_be_bytes())
    }

    pub fn hex_digest(&self, nonce: u64) -> String {
        HEXLOWER.encode(&self.digest(nonce))
    }
}

/// One-shot hash of all canonical block fields
pub fn hash_fields(
    index: u64,
    timestamp: i64,
    transactions: &[Transaction],
    previous_hash: &str,
    nonce: u64,
) -> Result<String> {
    Ok(BlockHasher::new(index, timestamp, transactions, previous_hash)?.hex_digest(nonce))
}
