use crate::core::Chain;
use crate::network::PeerClient;
use crate::node::Node;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};
use std::thread;

/// What the engine is doing right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    /// Fetching and validating peer chains
    Syncing,
    /// Swapping in a winning chain
    Replacing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusOutcome {
    pub replaced: bool,
    pub new_length: usize,
}

/// Serializes consensus passes. On-demand and scheduled passes share one
/// engine, so they queue behind each other instead of racing to replace the
/// chain.
pub struct ConsensusEngine {
    state: Mutex<SyncState>,
    pass: Mutex<()>,
}

impl Default for ConsensusEngine {
    fn default() -> Self {
        Self::new()
    }
}

// Puts the engine back to Idle however the pass ends
struct IdleOnDrop<'a>(&'a ConsensusEngine);

impl Drop for IdleOnDrop<'_> {
    fn drop(&mut self) {
        self.0.set_state(SyncState::Idle);
    }
}

impl ConsensusEngine {
    pub fn new() -> ConsensusEngine {
        ConsensusEngine {
            state: Mutex::new(SyncState::Idle),
            pass: Mutex::new(()),
        }
    }

    pub fn state(&self) -> SyncState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: SyncState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// One pass: adopt the longest valid peer chain if it beats the local one
    pub fn run(&self, node: &Node, client: &dyn PeerClient) -> ConsensusOutcome {
        self.run_including(node, client, None)
    }

    /// A pass that also asks `extra`, an address not (yet) registered, after
    /// the registered peers
    pub fn run_including(
        &self,
        node: &Node,
        client: &dyn PeerClient,
        extra: Option<&str>,
    ) -> ConsensusOutcome {
        let _pass = self.pass.lock().unwrap_or_else(PoisonError::into_inner);
        let _idle = IdleOnDrop(self);
        self.set_state(SyncState::Syncing);

        let local_len = node.chain_len();
        let mut peers = node.list_peers();
        if let Some(extra) = extra {
            if !peers.iter().any(|peer| peer == extra) {
                peers.push(extra.to_string());
            }
        }
        debug!("Consensus pass over {} peers (local length {local_len})", peers.len());

        let candidate = match Self::select_candidate(node, client, &peers, local_len) {
            Some(candidate) => candidate,
            None => {
                return ConsensusOutcome {
                    replaced: false,
                    new_length: node.chain_len(),
                }
            }
        };

        self.set_state(SyncState::Replacing);
        let replaced = node.replace_chain(candidate);
        let new_length = node.chain_len();
        if replaced {
            info!("Consensus adopted a chain of length {new_length}");
        }
        ConsensusOutcome {
            replaced,
            new_length,
        }
    }

    /// Fetches every peer's chain in parallel, then walks the results in
    /// registration order keeping the first strictly longest valid one.
    fn select_candidate(
        node: &Node,
        client: &dyn PeerClient,
        peers: &[String],
        local_len: usize,
    ) -> Option<Chain> {
        let difficulty = node.settings().difficulty;

        let fetched: Vec<_> = thread::scope(|scope| {
            let handles: Vec<_> = peers
                .iter()
                .map(|peer| scope.spawn(move || client.fetch_chain(peer)))
                .collect();
            handles.into_iter().map(|h| h.join()).collect()
        });

        let mut best: Option<Chain> = None;
        for (peer, result) in peers.iter().zip(fetched) {
            let blocks = match result {
                Ok(Ok(blocks)) => blocks,
                Ok(Err(e)) => {
                    warn!("Skipping peer {peer}: {e}");
                    continue;
                }
                Err(_) => {
                    warn!("Skipping peer {peer}: fetch panicked");
                    continue;
                }
            };

            let best_len = best.as_ref().map_or(local_len, Chain::len);
            if blocks.len() <= best_len {
                debug!("Peer {peer} offers length {}, not longer than {best_len}", blocks.len());
                continue;
            }
            match Chain::from_blocks(blocks, difficulty) {
                Ok(chain) => best = Some(chain),
                Err(e) => warn!("Skipping peer {peer}: {e}"),
            }
        }
        best
    }
}
