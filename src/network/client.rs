use crate::core::{Block, Transaction};
use crate::error::{BlockchainError, Result};
use crate::network::message::{Request, Response};
use log::debug;
use std::io::{self, BufReader, Read};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

// A full chain is a few hundred bytes per block; this is far beyond any chain
// a test or demo network produces and keeps a misbehaving peer from streaming
// forever.
const MAX_RESPONSE_BYTES: u64 = 64 * 1024 * 1024;

// Reads from a stream until `deadline`. Each read gets only the time left, so
// a peer trickling bytes cannot stretch a response past the deadline.
struct DeadlineReader<'a> {
    stream: &'a TcpStream,
    deadline: Instant,
}

impl Read for DeadlineReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(io::Error::new(
                io::ErrorKind::TimedOut,
                "response deadline passed",
            ));
        }
        self.stream.set_read_timeout(Some(remaining))?;
        let mut stream = self.stream;
        stream.read(buf)
    }
}

/// How a node talks to its peers. The consensus engine and the server only
/// see this trait, so tests can wire nodes together in memory.
pub trait PeerClient: Send + Sync {
    /// The peer's full chain, genesis first
    fn fetch_chain(&self, addr: &str) -> Result<Vec<Block>>;

    fn announce_block(&self, addr: &str, addr_from: &str, block: &Block) -> Result<()>;

    fn announce_transaction(&self, addr: &str, addr_from: &str, tx: &Transaction) -> Result<()>;

    /// Asks the peer at `addr` to add `own_addr` to its registry
    fn register_with(&self, addr: &str, own_addr: &str) -> Result<()>;
}

/// JSON over TCP, one request per connection. The whole exchange (connect,
/// send and the complete response) must finish within `timeout`.
#[derive(Debug, Clone)]
pub struct TcpPeerClient {
    timeout: Duration,
}

impl TcpPeerClient {
    pub fn new(timeout: Duration) -> TcpPeerClient {
        TcpPeerClient { timeout }
    }

    fn resolve(addr: &str) -> Result<SocketAddr> {
        addr.to_socket_addrs()
            .map_err(|e| BlockchainError::PeerUnreachable(format!("{addr}: {e}")))?
            .next()
            .ok_or_else(|| BlockchainError::PeerUnreachable(format!("{addr}: no address")))
    }

    /// Sends one request and waits for its response
    pub fn request(&self, addr: &str, request: &Request) -> Result<Response> {
        let deadline = Instant::now() + self.timeout;
        let socket_addr = Self::resolve(addr)?;
        let unreachable =
            |e: std::io::Error| BlockchainError::PeerUnreachable(format!("{addr}: {e}"));

        let stream =
            TcpStream::connect_timeout(&socket_addr, self.timeout).map_err(unreachable)?;
        stream
            .set_write_timeout(Some(self.timeout))
            .map_err(unreachable)?;

        debug!("Sending request to {addr}: {request:?}");
        serde_json::to_writer(&stream, request).map_err(|e| {
            BlockchainError::PeerUnreachable(format!("{addr}: failed to send request: {e}"))
        })?;
        stream.shutdown(Shutdown::Write).map_err(unreachable)?;

        let reader = DeadlineReader {
            stream: &stream,
            deadline,
        };
        let reader = BufReader::new(reader.take(MAX_RESPONSE_BYTES));
        serde_json::from_reader(reader).map_err(|e| {
            if e.is_io() || e.is_eof() {
                BlockchainError::PeerUnreachable(format!("{addr}: {e}"))
            } else {
                BlockchainError::Serialization(format!("{addr}: malformed response: {e}"))
            }
        })
    }

    fn expect_accepted(addr: &str, response: Response) -> Result<()> {
        match response {
            Response::Accepted => Ok(()),
            Response::Rejected { reason } => Err(BlockchainError::Network(format!(
                "{addr} rejected the announcement: {reason}"
            ))),
            other => Err(BlockchainError::Network(format!(
                "{addr} sent an unexpected response: {other:?}"
            ))),
        }
    }
}

impl PeerClient for TcpPeerClient {
    fn fetch_chain(&self, addr: &str) -> Result<Vec<Block>> {
        match self.request(addr, &Request::GetChain)? {
            Response::Chain { blocks } => Ok(blocks),
            other => Err(BlockchainError::Serialization(format!(
                "{addr} answered GetChain with {other:?}"
            ))),
        }
    }

    fn announce_block(&self, addr: &str, addr_from: &str, block: &Block) -> Result<()> {
        let request = Request::NewBlock {
            addr_from: addr_from.to_string(),
            block: block.clone(),
        };
        Self::expect_accepted(addr, self.request(addr, &request)?)
    }

    fn announce_transaction(&self, addr: &str, addr_from: &str, tx: &Transaction) -> Result<()> {
        let request = Request::NewTransaction {
            addr_from: addr_from.to_string(),
            transaction: tx.clone(),
        };
        Self::expect_accepted(addr, self.request(addr, &request)?)
    }

    fn register_with(&self, addr: &str, own_addr: &str) -> Result<()> {
        let request = Request::RegisterPeer {
            addr: own_addr.to_string(),
        };
        Self::expect_accepted(addr, self.request(addr, &request)?)
    }
}
