use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "ledger-node")]
pub struct Opt {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(name = "startnode", about = "Start a node and serve the protocol")]
    StartNode {
        #[arg(long = "config", help = "TOML settings file")]
        config: Option<PathBuf>,
        #[arg(long = "addr", help = "Address to listen on, e.g. 127.0.0.1:2001")]
        addr: Option<String>,
        #[arg(long = "peer", help = "Peer address to sync with (repeatable)")]
        peers: Vec<String>,
        #[arg(long = "difficulty", help = "Required leading zero bits per block hash")]
        difficulty: Option<u32>,
        #[arg(long = "miner", help = "Identity credited by mining rewards")]
        miner: Option<String>,
    },
    #[command(name = "send", about = "Submit a transaction to a node")]
    Send {
        #[arg(help = "Node address")]
        node: String,
        #[arg(help = "Sender identity")]
        sender: String,
        #[arg(help = "Recipient identity")]
        recipient: String,
        #[arg(help = "Amount to transfer", allow_negative_numbers = true)]
        amount: i64,
    },
    #[command(name = "mine", about = "Ask a node to mine its pending transactions")]
    Mine {
        #[arg(help = "Node address")]
        node: String,
        #[arg(long = "miner", help = "Reward recipient (defaults to the node id)")]
        miner: Option<String>,
    },
    #[command(name = "getbalance", about = "Get the balance of an identity")]
    GetBalance {
        #[arg(help = "Node address")]
        node: String,
        #[arg(help = "Identity to look up")]
        identity: String,
    },
    #[command(name = "printchain", about = "Print all blocks of a node's chain")]
    Printchain {
        #[arg(help = "Node address")]
        node: String,
    },
    #[command(name = "addpeer", about = "Register a peer with a node")]
    AddPeer {
        #[arg(help = "Node address")]
        node: String,
        #[arg(help = "Peer address to register")]
        peer: String,
    },
    #[command(name = "peers", about = "List a node's peers")]
    Peers {
        #[arg(help = "Node address")]
        node: String,
    },
    #[command(name = "consensus", about = "Run a consensus pass on a node")]
    Consensus {
        #[arg(help = "Node address")]
        node: String,
    },
    #[command(name = "status", about = "Show a node's status")]
    Status {
        #[arg(help = "Node address")]
        node: String,
    },
}
