use crate::core::{Block, BlockHasher};
use crate::error::{BlockchainError, Result};
use data_encoding::HEXLOWER;
use log::debug;
use num_bigint::{BigInt, Sign};
use std::borrow::Borrow;
use std::ops::ShlAssign;

/// Highest difficulty (leading zero bits) a node can be configured with
pub const MAX_DIFFICULTY: u32 = 255;

const MAX_NONCE: u64 = u64::MAX;
const PROGRESS_INTERVAL: u64 = 100_000;

/// A hash meets the target when, read as a 256-bit big-endian integer, it is
/// below `2^(256 - difficulty)`: at least `difficulty` leading zero bits.
pub struct ProofOfWork {
    target: BigInt,
    difficulty: u32,
}

impl ProofOfWork {
    pub fn new(difficulty: u32) -> ProofOfWork {
        let mut target = BigInt::from(1);
        target.shl_assign(256 - difficulty.min(256));
        ProofOfWork { target, difficulty }
    }

    pub fn get_difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn is_satisfied_by(&self, digest: &[u8]) -> bool {
        let hash_int = BigInt::from_bytes_be(Sign::Plus, digest);
        hash_int.lt(self.target.borrow())
    }

    /// Same predicate over a lowercase hex hash; anything that is not a
    /// 32-byte hex digest fails
    pub fn is_satisfied_by_hex(&self, hash: &str) -> bool {
        match HEXLOWER.decode(hash.as_bytes()) {
            Ok(bytes) if bytes.len() == 32 => self.is_satisfied_by(&bytes),
            _ => false,
        }
    }

    /// Checks that the stored hash is the real hash of the block's fields and
    /// that it meets the target
    pub fn validate(&self, block: &Block) -> bool {
        match block.compute_hash() {
            Ok(computed) => computed == block.get_hash() && self.is_satisfied_by_hex(&computed),
            Err(_) => false,
        }
    }

    /// Searches nonces from zero; returns the first nonce that meets the target
    /// and its hex hash
    pub fn run(&self, hasher: &BlockHasher) -> Result<(u64, String)> {
        let mut nonce = 0;
        loop {
            let hash = hasher.digest(nonce);
            if self.is_satisfied_by(&hash) {
                return Ok((nonce, HEXLOWER.encode(hash.as_slice())));
            }
            if nonce == MAX_NONCE {
                return Err(BlockchainError::Mining(format!(
                    "nonce space exhausted at difficulty {}",
                    self.difficulty
                )));
            }
            nonce += 1;
            if nonce % PROGRESS_INTERVAL == 0 {
                debug!("Mining: tried {nonce} nonces at difficulty {}", self.difficulty);
            }
        }
    }
}
