use crate::core::{Block, Transaction};
use serde::{Deserialize, Serialize};

/// One request per connection, answered by one [`Response`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Request {
    GetChain,
    SubmitTransaction {
        sender: String,
        recipient: String,
        amount: i64,
    },
    Mine {
        miner: Option<String>,
    },
    GetBalance {
        identity: String,
    },
    RegisterPeer {
        addr: String,
    },
    ListPeers,
    RunConsensus,
    Status,
    /// Gossip: a block a peer just mined
    NewBlock {
        addr_from: String,
        block: Block,
    },
    /// Gossip: a transaction a peer just accepted
    NewTransaction {
        addr_from: String,
        transaction: Transaction,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Response {
    Chain { blocks: Vec<Block> },
    Accepted,
    Rejected { reason: String },
    Mined { block: Block },
    Balance { identity: String, balance: i64 },
    Peers { peers: Vec<String> },
    Consensus { replaced: bool, new_length: usize },
    Status(NodeStatus),
}

/// Snapshot of a node for operators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStatus {
    pub node_id: String,
    pub node_addr: String,
    pub chain_length: usize,
    pub pending_transactions: usize,
    pub peers: Vec<String>,
    pub last_block_hash: String,
    pub difficulty: u32,
    /// Some reachable peer holds a longer chain
    pub out_of_sync: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let request = Request::SubmitTransaction {
            sender: "alice".to_string(),
            recipient: "bob".to_string(),
            amount: -1,
        };
        let serialized = serde_json::to_string(&request).unwrap();
        let deserialized: Request = serde_json::from_str(&serialized).unwrap();
        assert_eq!(request, deserialized);
    }

    #[test]
    fn test_chain_response_is_block_array() {
        let response = Response::Chain {
            blocks: vec![Block::genesis()],
        };
        let value = serde_json::to_value(&response).unwrap();
        let blocks = value["Chain"]["blocks"].as_array().unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0]["index"], 0);
        assert_eq!(blocks[0]["previous_hash"], "0");
    }
}
