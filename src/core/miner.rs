// Block production: package pending transactions plus the reward, then search
// for a nonce. The miner never touches the chain it mines on; appending the
// result (and dropping the mined transactions from the pool) is the caller's job.

use crate::core::{Block, BlockHasher, Chain, ProofOfWork, Transaction};
use crate::error::Result;
use crate::utils::current_timestamp;
use log::info;
use std::time::Instant;

pub struct Miner {
    reward: i64,
}

impl Miner {
    pub fn new(reward: i64) -> Miner {
        Miner { reward }
    }

    /// Mines the next block on top of `chain`
    pub fn mine_block(
        &self,
        chain: &Chain,
        pending: Vec<Transaction>,
        miner: &str,
    ) -> Result<Block> {
        self.mine_on_tip(chain.last(), chain.get_difficulty(), pending, miner)
    }

    /// Mines a successor of `tip`. Works from a snapshot so it can run without
    /// holding any lock on the node's chain.
    pub fn mine_on_tip(
        &self,
        tip: &Block,
        difficulty: u32,
        pending: Vec<Transaction>,
        miner: &str,
    ) -> Result<Block> {
        let mut transactions = pending;
        transactions.push(Transaction::reward(miner, self.reward)?);

        let index = tip.get_index() + 1;
        // never go backwards, even if this node's clock is behind the tip's
        let timestamp = current_timestamp()?.max(tip.get_timestamp());
        let previous_hash = tip.get_hash().to_string();

        info!(
            "Mining block {index} with {} transactions (difficulty: {difficulty})",
            transactions.len()
        );
        let started = Instant::now();
        let hasher = BlockHasher::new(index, timestamp, &transactions, &previous_hash)?;
        let (nonce, hash) = ProofOfWork::new(difficulty).run(&hasher)?;
        info!(
            "Block {index} mined in {:.2}s with nonce {nonce}: {hash}",
            started.elapsed().as_secs_f64()
        );

        Ok(Block::from_parts(
            index,
            timestamp,
            transactions,
            previous_hash,
            nonce,
            hash,
        ))
    }
}
