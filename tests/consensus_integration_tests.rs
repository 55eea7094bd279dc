//! Consensus integration tests
//!
//! Several nodes in one process, connected through an in-memory peer client.

use ledger_node::core::Block;
use ledger_node::{
    BlockchainError, ConsensusEngine, Node, PeerClient, Result, Settings, SyncScheduler,
    SyncState, Transaction,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

const DIFFICULTY: u32 = 4;

#[derive(Default)]
struct InMemoryPeers {
    nodes: Mutex<HashMap<String, Arc<Node>>>,
    scripted: Mutex<HashMap<String, Vec<Block>>>,
}

impl InMemoryPeers {
    fn add(&self, node: &Arc<Node>) {
        self.nodes
            .lock()
            .unwrap()
            .insert(node.settings().node_addr.clone(), Arc::clone(node));
    }

    fn script(&self, addr: &str, blocks: Vec<Block>) {
        self.scripted
            .lock()
            .unwrap()
            .insert(addr.to_string(), blocks);
    }

    fn node(&self, addr: &str) -> Result<Arc<Node>> {
        self.nodes
            .lock()
            .unwrap()
            .get(addr)
            .cloned()
            .ok_or_else(|| BlockchainError::PeerUnreachable(addr.to_string()))
    }
}

impl PeerClient for InMemoryPeers {
    fn fetch_chain(&self, addr: &str) -> Result<Vec<Block>> {
        if let Some(blocks) = self.scripted.lock().unwrap().get(addr) {
            return Ok(blocks.clone());
        }
        Ok(self.node(addr)?.get_chain())
    }

    fn announce_block(&self, addr: &str, _addr_from: &str, block: &Block) -> Result<()> {
        self.node(addr)?.receive_block(block.clone())
    }

    fn announce_transaction(&self, addr: &str, _addr_from: &str, tx: &Transaction) -> Result<()> {
        self.node(addr)?.accept_transaction(tx)
    }

    fn register_with(&self, addr: &str, own_addr: &str) -> Result<()> {
        self.node(addr)?.register_peer(own_addr);
        Ok(())
    }
}

fn node(port: u16) -> Arc<Node> {
    let addr = format!("127.0.0.1:{port}");
    Arc::new(Node::new(Settings {
        node_id: format!("node_{port}"),
        node_addr: addr,
        difficulty: DIFFICULTY,
        ..Settings::default()
    }))
}

#[test]
fn test_sync_adopts_transfer_scenario() {
    let peers = InMemoryPeers::default();
    let a = node(5001);
    let b = node(5002);
    peers.add(&a);
    b.register_peer("127.0.0.1:5001");

    // A credits S through a reward block, then mines S -> R 5
    a.mine_block("S").unwrap();
    a.submit_transaction("S", "R", 5).unwrap();
    a.mine_block("M").unwrap();

    let outcome = ConsensusEngine::new().run(&b, &peers);
    assert!(outcome.replaced);
    assert_eq!(outcome.new_length, a.chain_len());
    assert_eq!(b.get_chain(), a.get_chain());
    assert_eq!(b.get_balance("S"), 5);
    assert_eq!(b.get_balance("R"), 5);
}

#[test]
fn test_never_adopts_equal_or_shorter_chain() {
    let peers = InMemoryPeers::default();
    let local = node(5001);
    let equal = node(5002);
    let shorter = node(5003);
    peers.add(&equal);
    peers.add(&shorter);
    local.mine_block("local").unwrap();
    local.mine_block("local").unwrap();
    equal.mine_block("equal").unwrap();
    equal.mine_block("equal").unwrap();
    shorter.mine_block("shorter").unwrap();
    local.register_peer("127.0.0.1:5002");
    local.register_peer("127.0.0.1:5003");

    let before = local.get_chain();
    let engine = ConsensusEngine::new();
    let outcome = engine.run(&local, &peers);
    assert!(!outcome.replaced);
    assert_eq!(outcome.new_length, 3);
    assert_eq!(local.get_chain(), before);
    assert_eq!(engine.state(), SyncState::Idle);
}

#[test]
fn test_longest_peer_wins_and_ties_go_to_earliest() {
    let peers = InMemoryPeers::default();
    let local = node(5001);
    let short = node(5002);
    let long_first = node(5003);
    let long_second = node(5004);
    for n in [&short, &long_first, &long_second] {
        peers.add(n);
    }
    short.mine_block("short").unwrap();
    for _ in 0..2 {
        long_first.mine_block("first").unwrap();
        long_second.mine_block("second").unwrap();
    }
    for port in [5002, 5003, 5004] {
        local.register_peer(&format!("127.0.0.1:{port}"));
    }

    let outcome = ConsensusEngine::new().run(&local, &peers);
    assert!(outcome.replaced);
    assert_eq!(local.get_chain(), long_first.get_chain());
}

#[test]
fn test_unreachable_and_invalid_peers_are_skipped() {
    let peers = InMemoryPeers::default();
    let local = node(5001);
    let honest = node(5004);
    peers.add(&honest);
    honest.mine_block("honest").unwrap();

    // longer than anything else, but one reward was inflated after mining
    let liar = node(5099);
    for _ in 0..4 {
        liar.mine_block("liar").unwrap();
    }
    let mut forged = liar.get_chain();
    let tip = forged.pop().unwrap();
    forged.push(Block::from_parts(
        tip.get_index(),
        tip.get_timestamp(),
        vec![Transaction::reward("liar", 1_000_000).unwrap()],
        tip.get_previous_hash().to_string(),
        tip.get_nonce(),
        tip.get_hash().to_string(),
    ));
    peers.script("127.0.0.1:5002", forged);

    local.register_peer("127.0.0.1:5002");
    local.register_peer("127.0.0.1:5003"); // nobody there
    local.register_peer("127.0.0.1:5004");

    let outcome = ConsensusEngine::new().run(&local, &peers);
    assert!(outcome.replaced);
    assert_eq!(local.get_chain(), honest.get_chain());
    assert_eq!(local.get_balance("liar"), 0);
}

#[test]
fn test_competing_blocks_resolve_on_next_mine() {
    let peers = InMemoryPeers::default();
    let nodes: Vec<Arc<Node>> = (5001..=5003).map(node).collect();
    for n in &nodes {
        peers.add(n);
    }
    for n in &nodes {
        for other in &nodes {
            n.register_peer(&other.settings().node_addr);
        }
    }

    // A and B each mine a block at height 1; neither adopts the other
    nodes[0].mine_block("A").unwrap();
    nodes[1].mine_block("B").unwrap();
    let engine = ConsensusEngine::new();
    assert!(!engine.run(&nodes[0], &peers).replaced);
    assert!(!engine.run(&nodes[1], &peers).replaced);

    // A extends its branch; everyone converges on it
    nodes[0].mine_block("A").unwrap();
    for n in &nodes[1..] {
        assert!(engine.run(n, &peers).replaced);
    }

    let winner = serde_json::to_string(&nodes[0].get_chain()).unwrap();
    for n in &nodes[1..] {
        assert_eq!(serde_json::to_string(&n.get_chain()).unwrap(), winner);
    }
    assert_eq!(nodes[1].get_balance("B"), 0);
    assert_eq!(nodes[1].get_balance("A"), 20);
}

#[test]
fn test_replacement_keeps_unmined_pending_transactions() {
    let peers = InMemoryPeers::default();
    let local = node(5001);
    let remote = node(5002);
    peers.add(&remote);
    local.register_peer("127.0.0.1:5002");

    local.submit_transaction("system", "R", 3).unwrap();
    remote.mine_block("M").unwrap();

    assert!(ConsensusEngine::new().run(&local, &peers).replaced);
    assert_eq!(local.pending_transactions().len(), 1);
    local.mine_block("M").unwrap();
    assert_eq!(local.get_balance("R"), 3);
}

#[test]
fn test_concurrent_passes_are_serialized() {
    let peers = Arc::new(InMemoryPeers::default());
    let local = node(5001);
    let remote = node(5002);
    peers.add(&remote);
    for _ in 0..3 {
        remote.mine_block("M").unwrap();
    }
    local.register_peer("127.0.0.1:5002");

    let engine = Arc::new(ConsensusEngine::new());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let (engine, local, peers) =
                (Arc::clone(&engine), Arc::clone(&local), Arc::clone(&peers));
            thread::spawn(move || engine.run(&local, peers.as_ref()))
        })
        .collect();
    let replaced = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|outcome| outcome.replaced)
        .count();

    assert_eq!(replaced, 1);
    assert_eq!(local.get_chain(), remote.get_chain());
}

#[test]
fn test_scheduler_converges_nodes() {
    let peers = Arc::new(InMemoryPeers::default());
    let local = node(5001);
    let remote = node(5002);
    peers.add(&remote);
    local.register_peer("127.0.0.1:5002");

    let mut scheduler = SyncScheduler::start(
        Arc::new(ConsensusEngine::new()),
        Arc::clone(&local),
        peers,
        Duration::from_millis(25),
    )
    .unwrap();

    remote.mine_block("M").unwrap();
    remote.mine_block("M").unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while local.chain_len() < 3 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }
    scheduler.stop();
    assert_eq!(local.get_chain(), remote.get_chain());
}
