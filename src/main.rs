// Entry point for the node binary: `startnode` runs a node in this process,
// every other subcommand is a one-shot request to a running node.
use clap::Parser;
use ledger_node::{
    BlockchainError, Command, ConsensusEngine, Node, Opt, PeerClient, Request, Response,
    Server, Settings, SyncScheduler, TcpPeerClient,
};
use ledger_node::config::{NODE_ADDRESS_KEY, NODE_DIFFICULTY_KEY, NODE_ID_KEY, NODE_PEERS_KEY};
use log::{error, LevelFilter};
use std::process;
use std::sync::Arc;
use std::time::Duration;

// Client commands talk to a local node; give it time to finish mining
const CLIENT_TIMEOUT: Duration = Duration::from_secs(120);

fn main() {
    // Info by default, RUST_LOG overrides
    env_logger::builder()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let opt = Opt::parse();

    if let Err(e) = run_command(opt.command) {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn run_command(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    let client = TcpPeerClient::new(CLIENT_TIMEOUT);
    match command {
        Command::StartNode {
            config,
            addr,
            peers,
            difficulty,
            miner,
        } => {
            // file and environment first, then whatever was given on the command line
            let settings = Settings::load(config.as_deref())?.with_overrides(|key| match key {
                NODE_ADDRESS_KEY => addr.clone(),
                NODE_ID_KEY => miner.clone(),
                NODE_DIFFICULTY_KEY => difficulty.map(|d| d.to_string()),
                NODE_PEERS_KEY if !peers.is_empty() => Some(peers.join(",")),
                _ => None,
            });
            settings.validate()?;
            start_node(settings)?;
        }
        Command::Send {
            node,
            sender,
            recipient,
            amount,
        } => {
            let request = Request::SubmitTransaction {
                sender,
                recipient,
                amount,
            };
            match client.request(&node, &request)? {
                Response::Accepted => println!("Success!"),
                other => return Err(unexpected(other)),
            }
        }
        Command::Mine { node, miner } => match client.request(&node, &Request::Mine { miner })? {
            Response::Mined { block } => {
                println!("Mined block {}: {}", block.get_index(), block.get_hash())
            }
            other => return Err(unexpected(other)),
        },
        Command::GetBalance { node, identity } => {
            match client.request(&node, &Request::GetBalance { identity })? {
                Response::Balance { identity, balance } => {
                    println!("Balance of {identity}: {balance}")
                }
                other => return Err(unexpected(other)),
            }
        }
        Command::Printchain { node } => {
            for block in client.fetch_chain(&node)? {
                println!("Index: {}", block.get_index());
                println!("Pre block hash: {}", block.get_previous_hash());
                println!("Cur block hash: {}", block.get_hash());
                println!("Timestamp: {}", block.get_timestamp());
                println!("Nonce: {}", block.get_nonce());
                for tx in block.get_transactions() {
                    println!(
                        "- {} -> {}: {}",
                        tx.get_sender(),
                        tx.get_recipient(),
                        tx.get_amount()
                    );
                }
                println!()
            }
        }
        Command::AddPeer { node, peer } => {
            client.register_with(&node, &peer)?;
            println!("Success!")
        }
        Command::Peers { node } => match client.request(&node, &Request::ListPeers)? {
            Response::Peers { peers } => {
                for peer in peers {
                    println!("{peer}")
                }
            }
            other => return Err(unexpected(other)),
        },
        Command::Consensus { node } => match client.request(&node, &Request::RunConsensus)? {
            Response::Consensus {
                replaced,
                new_length,
            } => {
                if replaced {
                    println!("Chain replaced, new length {new_length}");
                } else {
                    println!("Chain kept, length {new_length}");
                }
            }
            other => return Err(unexpected(other)),
        },
        Command::Status { node } => match client.request(&node, &Request::Status)? {
            Response::Status(status) => println!("{}", serde_json::to_string_pretty(&status)?),
            other => return Err(unexpected(other)),
        },
    }
    Ok(())
}

fn start_node(settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    let addr = settings.node_addr.clone();
    let sync_interval = settings.sync_interval();
    let client: Arc<dyn PeerClient> = Arc::new(TcpPeerClient::new(settings.peer_timeout()));

    println!(
        "Starting node {} on {addr} (difficulty {}, rewards to {})",
        settings.node_id, settings.difficulty, settings.node_id
    );
    let node = Arc::new(Node::new(settings));
    let engine = Arc::new(ConsensusEngine::new());

    let _scheduler = SyncScheduler::start(
        Arc::clone(&engine),
        Arc::clone(&node),
        Arc::clone(&client),
        sync_interval,
    )?;

    let server = Server::new(node, engine, client);
    server
        .run(&addr)
        .map_err(|e| format!("Server error: {e}"))?;
    Ok(())
}

fn unexpected(response: Response) -> Box<dyn std::error::Error> {
    match response {
        Response::Rejected { reason } => Box::new(BlockchainError::Network(reason)),
        other => format!("Unexpected response: {other:?}").into(),
    }
}
