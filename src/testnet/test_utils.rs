//! Test utilities for node and consensus testing

use crate::config::{node_id_from_addr, Settings};
use crate::core::{Block, Transaction};
use crate::error::{BlockchainError, Result};
use crate::network::PeerClient;
use crate::node::Node;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Easy difficulty for fast tests
pub const TEST_DIFFICULTY: u32 = 4;

/// Settings for a node at `addr` with a low difficulty and no peers
pub fn test_settings(addr: &str) -> Settings {
    Settings {
        node_addr: addr.to_string(),
        node_id: node_id_from_addr(addr),
        difficulty: TEST_DIFFICULTY,
        mining_reward: 10,
        sync_interval_secs: 1,
        peer_timeout_ms: 500,
        max_mining_attempts: 5,
        peers: Vec::new(),
    }
}

pub fn test_node(addr: &str) -> Arc<Node> {
    Arc::new(Node::new(test_settings(addr)))
}

enum Peer {
    Live(Arc<Node>),
    /// Answers every chain request with a fixed block list
    Scripted(Vec<Block>),
    Unreachable,
}

/// A [`PeerClient`] that routes requests to nodes in the same process
#[derive(Default)]
pub struct LocalNetwork {
    peers: RwLock<HashMap<String, Peer>>,
}

impl LocalNetwork {
    pub fn new() -> LocalNetwork {
        LocalNetwork::default()
    }

    fn insert(&self, addr: &str, peer: Peer) {
        self.peers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(addr.to_string(), peer);
    }

    /// Makes `node` reachable at its configured address
    pub fn join(&self, node: &Arc<Node>) {
        self.insert(&node.settings().node_addr, Peer::Live(Arc::clone(node)));
    }

    pub fn add_scripted(&self, addr: &str, blocks: Vec<Block>) {
        self.insert(addr, Peer::Scripted(blocks));
    }

    pub fn add_unreachable(&self, addr: &str) {
        self.insert(addr, Peer::Unreachable);
    }

    fn live_node(&self, addr: &str) -> Result<Arc<Node>> {
        match self
            .peers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(addr)
        {
            Some(Peer::Live(node)) => Ok(Arc::clone(node)),
            Some(Peer::Scripted(_)) => Err(BlockchainError::Network(format!(
                "{addr} only serves chains"
            ))),
            _ => Err(BlockchainError::PeerUnreachable(addr.to_string())),
        }
    }
}

impl PeerClient for LocalNetwork {
    fn fetch_chain(&self, addr: &str) -> Result<Vec<Block>> {
        match self
            .peers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(addr)
        {
            Some(Peer::Live(node)) => Ok(node.get_chain()),
            Some(Peer::Scripted(blocks)) => Ok(blocks.clone()),
            _ => Err(BlockchainError::PeerUnreachable(addr.to_string())),
        }
    }

    fn announce_block(&self, addr: &str, _addr_from: &str, block: &Block) -> Result<()> {
        self.live_node(addr)?.receive_block(block.clone())
    }

    fn announce_transaction(&self, addr: &str, _addr_from: &str, tx: &Transaction) -> Result<()> {
        self.live_node(addr)?.accept_transaction(tx)
    }

    fn register_with(&self, addr: &str, own_addr: &str) -> Result<()> {
        self.live_node(addr)?.register_peer(own_addr);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_network_routes_to_nodes() {
        let network = LocalNetwork::new();
        let node = test_node("127.0.0.1:3001");
        network.join(&node);
        node.mine_block("alice").unwrap();

        let chain = network.fetch_chain("127.0.0.1:3001").unwrap();
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn test_unknown_and_unreachable_peers() {
        let network = LocalNetwork::new();
        network.add_unreachable("127.0.0.1:3009");
        assert!(matches!(
            network.fetch_chain("127.0.0.1:3009"),
            Err(BlockchainError::PeerUnreachable(_))
        ));
        assert!(matches!(
            network.fetch_chain("127.0.0.1:3010"),
            Err(BlockchainError::PeerUnreachable(_))
        ));
    }

    #[test]
    fn test_register_with_adds_peer() {
        let network = LocalNetwork::new();
        let node = test_node("127.0.0.1:3001");
        network.join(&node);
        network.register_with("127.0.0.1:3001", "127.0.0.1:3002").unwrap();
        assert_eq!(node.list_peers(), vec!["127.0.0.1:3002".to_string()]);
    }
}
