//! The node handle
//!
//! A [`Node`] owns the chain and the pending pool behind one mutex, plus the
//! peer registry and the settings it was started with. Every operation that
//! needs a consistent (chain, pool) pair takes that mutex for the whole
//! read-modify-write. Slow work (the nonce search, peer I/O) happens outside it.

use crate::config::Settings;
use crate::core::{Block, Chain, Ledger, Miner, Transaction};
use crate::error::{BlockchainError, Result};
use crate::network::{NodeStatus, PeerClient, PeerRegistry};
use crate::storage::TransactionPool;
use log::{debug, info, warn};
use std::sync::{Mutex, MutexGuard, PoisonError};

struct NodeState {
    chain: Chain,
    pool: TransactionPool,
}

pub struct Node {
    state: Mutex<NodeState>,
    peers: PeerRegistry,
    miner: Miner,
    settings: Settings,
}

impl Node {
    /// A node at genesis, with the configured peers registered
    pub fn new(settings: Settings) -> Node {
        let node = Node {
            state: Mutex::new(NodeState {
                chain: Chain::new(settings.difficulty),
                pool: TransactionPool::new(),
            }),
            peers: PeerRegistry::new(),
            miner: Miner::new(settings.mining_reward),
            settings,
        };
        for peer in node.settings.peers.clone() {
            node.register_peer(&peer);
        }
        node
    }

    // State is only written after validation succeeds, so a panic elsewhere
    // cannot leave it half-updated and a poisoned lock is safe to reuse.
    fn lock_state(&self) -> MutexGuard<'_, NodeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Validates and queues a transfer. Senders other than `system` must be
    /// able to cover it from their chain balance minus what they already have
    /// pending.
    pub fn submit_transaction(
        &self,
        sender: &str,
        recipient: &str,
        amount: i64,
    ) -> Result<Transaction> {
        let tx = Transaction::new(sender, recipient, amount)?;

        let mut state = self.lock_state();
        if !tx.is_reward() {
            let balance = Ledger::balance_of(&state.chain, sender);
            let available = balance.saturating_sub(state.pool.pending_outgoing(sender));
            if available < amount {
                return Err(BlockchainError::InvalidTransaction(format!(
                    "insufficient balance for {sender}: required {amount}, available {available}"
                )));
            }
        }
        state.pool.add(tx.clone());
        info!("Accepted transaction {sender} -> {recipient} ({amount})");
        Ok(tx)
    }

    /// A transaction announced by a peer goes through the same checks as a
    /// local submission
    pub fn accept_transaction(&self, tx: &Transaction) -> Result<()> {
        self.submit_transaction(tx.get_sender(), tx.get_recipient(), tx.get_amount())
            .map(|_| ())
    }

    /// Mines the pending pool plus a reward for `miner` and appends the block.
    ///
    /// The search runs on a snapshot without holding the lock. If the chain
    /// advanced meanwhile the candidate is stale and the whole
    /// snapshot-and-search is retried, up to `max_mining_attempts` times.
    pub fn mine_block(&self, miner: &str) -> Result<Block> {
        self.mine_with(|tip, difficulty, pending| {
            self.miner.mine_on_tip(tip, difficulty, pending, miner)
        })
    }

    // Snapshot, search with `search`, append; the search never holds the lock
    fn mine_with<F>(&self, mut search: F) -> Result<Block>
    where
        F: FnMut(&Block, u32, Vec<Transaction>) -> Result<Block>,
    {
        let max_attempts = self.settings.max_mining_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            let (tip, difficulty, pending) = {
                let state = self.lock_state();
                (
                    state.chain.last().clone(),
                    state.chain.get_difficulty(),
                    state.pool.get_all(),
                )
            };

            let block = search(&tip, difficulty, pending.clone())?;

            let mut state = self.lock_state();
            let stale = state.chain.last().get_hash() != tip.get_hash();
            match state.chain.append_block(block.clone()) {
                Ok(()) => {
                    state.pool.remove_included(&pending);
                    info!(
                        "Appended mined block {} ({}), chain length {}",
                        block.get_index(),
                        block.get_hash(),
                        state.chain.len()
                    );
                    return Ok(block);
                }
                Err(e) if stale && attempt < max_attempts => {
                    warn!("Mined block {} went stale ({e}), retrying", block.get_index());
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Mines with this node's own identity as the reward recipient
    pub fn mine_for_self(&self) -> Result<Block> {
        self.mine_block(&self.settings.node_id)
    }

    /// A block announced by a peer. Accepted only if it directly extends the
    /// local tip; its transactions then leave the pool.
    pub fn receive_block(&self, block: Block) -> Result<()> {
        let mut state = self.lock_state();
        let included = block.get_transactions().to_vec();
        let (index, hash) = (block.get_index(), block.get_hash().to_string());
        state.chain.append_block(block)?;
        state.pool.remove_included(&included);
        info!("Accepted block {index} ({hash}) from peer");
        Ok(())
    }

    /// Swaps in `candidate` if it is still strictly longer than the local
    /// chain. `Chain` values are validated on construction, so only length
    /// and difficulty are rechecked here, under the lock.
    ///
    /// Pending transactions that the adopted blocks already contain are
    /// dropped; everything else stays pending.
    pub fn replace_chain(&self, candidate: Chain) -> bool {
        let mut state = self.lock_state();
        if candidate.get_difficulty() != state.chain.get_difficulty() {
            warn!(
                "Refusing chain validated at difficulty {}",
                candidate.get_difficulty()
            );
            return false;
        }
        if candidate.len() <= state.chain.len() {
            return false;
        }

        let shared = state.chain.common_prefix_len(&candidate);
        let adopted: Vec<Transaction> = candidate.blocks()[shared..]
            .iter()
            .flat_map(|block| block.get_transactions().iter().cloned())
            .collect();
        let removed = state.pool.remove_included(&adopted);

        info!(
            "Replacing chain of length {} with length {} ({} blocks adopted, {removed} pending transactions now mined)",
            state.chain.len(),
            candidate.len(),
            candidate.len() - shared
        );
        state.chain = candidate;
        true
    }

    pub fn get_chain(&self) -> Vec<Block> {
        self.lock_state().chain.blocks().to_vec()
    }

    pub fn chain_snapshot(&self) -> Chain {
        self.lock_state().chain.clone()
    }

    pub fn chain_len(&self) -> usize {
        self.lock_state().chain.len()
    }

    pub fn get_balance(&self, identity: &str) -> i64 {
        Ledger::balance_of(&self.lock_state().chain, identity)
    }

    pub fn ledger(&self) -> Ledger {
        Ledger::from_chain(&self.lock_state().chain)
    }

    pub fn pending_transactions(&self) -> Vec<Transaction> {
        self.lock_state().pool.get_all()
    }

    /// Refuses empty addresses, duplicates and this node's own address
    pub fn register_peer(&self, addr: &str) -> bool {
        if addr.trim() == self.settings.node_addr {
            return false;
        }
        self.peers.register(addr)
    }

    pub fn list_peers(&self) -> Vec<String> {
        self.peers.list()
    }

    pub fn peers(&self) -> &PeerRegistry {
        &self.peers
    }

    pub fn status(&self) -> NodeStatus {
        let state = self.lock_state();
        NodeStatus {
            node_id: self.settings.node_id.clone(),
            node_addr: self.settings.node_addr.clone(),
            chain_length: state.chain.len(),
            pending_transactions: state.pool.len(),
            peers: self.peers.list(),
            last_block_hash: state.chain.last().get_hash().to_string(),
            difficulty: state.chain.get_difficulty(),
            out_of_sync: false,
        }
    }

    /// `status` plus whether any peer is ahead. Peers are asked without
    /// holding the lock; unreachable ones are ignored.
    pub fn status_against(&self, client: &dyn PeerClient) -> NodeStatus {
        let mut status = self.status();
        let out_of_sync = status.peers.iter().any(|peer| match client.fetch_chain(peer) {
            Ok(blocks) => blocks.len() > status.chain_length,
            Err(e) => {
                debug!("Status check skipped peer {peer}: {e}");
                false
            }
        });
        status.out_of_sync = out_of_sync;
        status
    }
}
