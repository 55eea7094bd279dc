// The chain owned by a node: genesis first, every later block linked to the one
// before it and carrying valid proof of work. Nothing ever edits a block in
// place; a chain either grows by one validated block or is replaced whole.

use crate::core::{Block, ProofOfWork};
use crate::error::{BlockchainError, Result};
use log::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    blocks: Vec<Block>,
    difficulty: u32,
}

impl Chain {
    /// A chain holding only the genesis block
    pub fn new(difficulty: u32) -> Chain {
        Chain {
            blocks: vec![Block::genesis()],
            difficulty,
        }
    }

    /// Builds a chain from a peer-supplied block sequence, validating all of it
    pub fn from_blocks(blocks: Vec<Block>, difficulty: u32) -> Result<Chain> {
        Self::validate_blocks(&blocks, difficulty)?;
        Ok(Chain { blocks, difficulty })
    }

    pub fn is_valid_chain(blocks: &[Block], difficulty: u32) -> bool {
        Self::validate_blocks(blocks, difficulty).is_ok()
    }

    /// Walks the whole sequence: genesis equality, then every adjacent pair
    pub fn validate_blocks(blocks: &[Block], difficulty: u32) -> Result<()> {
        let genesis = blocks
            .first()
            .ok_or_else(|| BlockchainError::InvalidChain("chain is empty".to_string()))?;
        if *genesis != Block::genesis() {
            return Err(BlockchainError::InvalidChain(
                "genesis block does not match".to_string(),
            ));
        }

        let pow = ProofOfWork::new(difficulty);
        for pair in blocks.windows(2) {
            Self::validate_successor(&pair[0], &pair[1], &pow).map_err(|e| {
                BlockchainError::InvalidChain(format!("block {}: {e}", pair[1].get_index()))
            })?;
        }
        Ok(())
    }

    /// Checks `block` as the direct successor of `tip`
    fn validate_successor(tip: &Block, block: &Block, pow: &ProofOfWork) -> Result<()> {
        if block.get_previous_hash() != tip.get_hash() {
            return Err(BlockchainError::InvalidBlock(format!(
                "previous hash {} does not match tip {}",
                block.get_previous_hash(),
                tip.get_hash()
            )));
        }
        if tip.get_index().checked_add(1) != Some(block.get_index()) {
            return Err(BlockchainError::InvalidBlock(format!(
                "index {} does not follow {}",
                block.get_index(),
                tip.get_index()
            )));
        }
        if block.get_timestamp() < tip.get_timestamp() {
            return Err(BlockchainError::InvalidBlock(format!(
                "timestamp {} is before parent timestamp {}",
                block.get_timestamp(),
                tip.get_timestamp()
            )));
        }
        if let Some(tx) = block.get_transactions().iter().find(|tx| !tx.is_well_formed()) {
            return Err(BlockchainError::InvalidBlock(format!(
                "malformed transaction {tx:?}"
            )));
        }
        if !pow.validate(block) {
            return Err(BlockchainError::InvalidBlock(format!(
                "hash {} is wrong or misses difficulty {}",
                block.get_hash(),
                pow.get_difficulty()
            )));
        }
        Ok(())
    }

    /// Appends `block` if it extends the current tip; the chain is untouched
    /// on error
    pub fn append_block(&mut self, block: Block) -> Result<()> {
        let pow = ProofOfWork::new(self.difficulty);
        Self::validate_successor(self.last(), &block, &pow)?;
        debug!("Appending block {} ({})", block.get_index(), block.get_hash());
        self.blocks.push(block);
        Ok(())
    }

    pub fn last(&self) -> &Block {
        // a chain always holds at least the genesis block
        &self.blocks[self.blocks.len() - 1]
    }

    pub fn blocks(&self) -> &[Block] {
        self.blocks.as_slice()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// A chain always holds at least its genesis block
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn get_difficulty(&self) -> u32 {
        self.difficulty
    }

    /// Number of leading blocks shared with `other`
    pub fn common_prefix_len(&self, other: &Chain) -> usize {
        self.blocks
            .iter()
            .zip(other.blocks.iter())
            .take_while(|(a, b)| a.get_hash() == b.get_hash())
            .count()
    }
}
