use crate::consensus::ConsensusEngine;
use crate::core::{Block, Transaction};
use crate::error::{BlockchainError, Result};
use crate::network::message::{Request, Response};
use crate::network::PeerClient;
use crate::node::Node;
use log::{debug, error, info, warn};
use serde_json::Deserializer;
use std::io::{BufReader, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const TCP_READ_TIMEOUT: Duration = Duration::from_secs(60);
// Matches the cap the client puts on responses
const MAX_REQUEST_BYTES: u64 = 64 * 1024 * 1024;

/// Serves the node protocol over TCP: one thread per connection, each request
/// answered with one response
#[derive(Clone)]
pub struct Server {
    node: Arc<Node>,
    engine: Arc<ConsensusEngine>,
    client: Arc<dyn PeerClient>,
}

impl Server {
    pub fn new(
        node: Arc<Node>,
        engine: Arc<ConsensusEngine>,
        client: Arc<dyn PeerClient>,
    ) -> Server {
        Server {
            node,
            engine,
            client,
        }
    }

    /// Binds `addr`, introduces this node to its configured peers and serves
    /// until the listener fails
    pub fn run(&self, addr: &str) -> Result<()> {
        let listener = TcpListener::bind(addr)
            .map_err(|e| BlockchainError::Network(format!("Failed to bind to {addr}: {e}")))?;
        info!("Server listening on {addr}");

        self.introduce_to_peers();
        self.serve(listener);
        Ok(())
    }

    /// Accepts connections on an already bound listener
    pub fn serve(&self, listener: TcpListener) {
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    let peer_addr = match stream.peer_addr() {
                        Ok(addr) => addr,
                        Err(e) => {
                            error!("Failed to get peer address: {e}");
                            continue;
                        }
                    };

                    let server = self.clone();
                    thread::spawn(move || {
                        if let Err(e) = server.handle_connection(stream, peer_addr) {
                            error!("Error handling connection from {peer_addr}: {e}");
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {e}");
                }
            }
        }
    }

    /// Asks every configured peer to register this node, so they pull from it
    /// during their own consensus passes
    pub fn introduce_to_peers(&self) {
        let own_addr = &self.node.settings().node_addr;
        for peer in self.node.list_peers() {
            match self.client.register_with(&peer, own_addr) {
                Ok(()) => info!("Registered with peer {peer}"),
                Err(e) => warn!("Could not register with peer {peer}: {e}"),
            }
        }
    }

    fn handle_connection(&self, stream: TcpStream, peer_addr: SocketAddr) -> Result<()> {
        stream
            .set_read_timeout(Some(TCP_READ_TIMEOUT))
            .map_err(|e| BlockchainError::Network(format!("Failed to set read timeout: {e}")))?;

        self.answer_requests((&stream).take(MAX_REQUEST_BYTES), &stream, peer_addr)?;
        let _ = stream.shutdown(Shutdown::Both);
        Ok(())
    }

    /// Answers each JSON request read from `reader`, stopping at the first
    /// one that does not parse (including one cut off by a size cap)
    fn answer_requests<R: Read, W: Write>(
        &self,
        reader: R,
        mut writer: W,
        peer_addr: SocketAddr,
    ) -> Result<()> {
        let requests = Deserializer::from_reader(BufReader::new(reader)).into_iter::<Request>();

        for request in requests {
            let (response, malformed) = match request {
                Ok(request) => {
                    debug!("Received request from {peer_addr}: {request:?}");
                    (self.handle_request(request), false)
                }
                Err(e) => {
                    warn!("Malformed request from {peer_addr}: {e}");
                    let reason = format!("malformed request: {e}");
                    (Response::Rejected { reason }, true)
                }
            };

            serde_json::to_writer(&mut writer, &response)?;
            writer.flush()?;
            // the stream cannot be resynchronised after a parse error
            if malformed {
                break;
            }
        }
        Ok(())
    }

    /// Dispatches one request; errors become `Rejected`
    pub fn handle_request(&self, request: Request) -> Response {
        let result = match request {
            Request::GetChain => Ok(Response::Chain {
                blocks: self.node.get_chain(),
            }),
            Request::SubmitTransaction {
                sender,
                recipient,
                amount,
            } => self
                .node
                .submit_transaction(&sender, &recipient, amount)
                .map(|tx| {
                    self.broadcast_transaction(&tx);
                    Response::Accepted
                }),
            Request::Mine { miner } => {
                let miner = miner.unwrap_or_else(|| self.node.settings().node_id.clone());
                self.node.mine_block(&miner).map(|block| {
                    self.broadcast_block(&block);
                    Response::Mined { block }
                })
            }
            Request::GetBalance { identity } => Ok(Response::Balance {
                balance: self.node.get_balance(&identity),
                identity,
            }),
            Request::RegisterPeer { addr } => {
                self.node.register_peer(&addr);
                Ok(Response::Accepted)
            }
            Request::ListPeers => Ok(Response::Peers {
                peers: self.node.list_peers(),
            }),
            Request::RunConsensus => {
                let outcome = self.engine.run(&self.node, self.client.as_ref());
                Ok(Response::Consensus {
                    replaced: outcome.replaced,
                    new_length: outcome.new_length,
                })
            }
            Request::Status => Ok(Response::Status(
                self.node.status_against(self.client.as_ref()),
            )),
            Request::NewBlock { addr_from, block } => self.handle_new_block(&addr_from, block),
            Request::NewTransaction {
                addr_from,
                transaction,
            } => self
                .node
                .accept_transaction(&transaction)
                .map(|()| {
                    debug!("Accepted transaction gossip from {addr_from}");
                    Response::Accepted
                }),
        };

        result.unwrap_or_else(|e| Response::Rejected {
            reason: e.to_string(),
        })
    }

    /// A block that does not extend the tip but sits beyond it means the
    /// sender is ahead; a consensus pass catches up from all peers, the sender
    /// included. The sender becomes a peer only once something it sent was
    /// accepted.
    fn handle_new_block(&self, addr_from: &str, block: Block) -> Result<Response> {
        let index = block.get_index();
        match self.node.receive_block(block) {
            Ok(()) => {
                self.node.register_peer(addr_from);
                Ok(Response::Accepted)
            }
            Err(e) if index >= self.node.chain_len() as u64 => {
                info!("Block {index} from {addr_from} is ahead of the local chain, syncing");
                let outcome =
                    self.engine
                        .run_including(&self.node, self.client.as_ref(), Some(addr_from));
                if outcome.replaced {
                    self.node.register_peer(addr_from);
                    Ok(Response::Accepted)
                } else {
                    Err(e)
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Announces a locally mined block to every peer. Failures are logged
    /// and otherwise ignored.
    fn broadcast_block(&self, block: &Block) {
        let own_addr = &self.node.settings().node_addr;
        for peer in self.node.list_peers() {
            if let Err(e) = self.client.announce_block(&peer, own_addr, block) {
                warn!("Failed to announce block {} to {peer}: {e}", block.get_index());
            }
        }
    }

    fn broadcast_transaction(&self, tx: &Transaction) {
        let own_addr = &self.node.settings().node_addr;
        for peer in self.node.list_peers() {
            if let Err(e) = self.client.announce_transaction(&peer, own_addr, tx) {
                warn!("Failed to announce transaction to {peer}: {e}");
            }
        }
    }
}
