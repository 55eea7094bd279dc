//! Peer-to-peer networking
//!
//! The JSON request/response protocol, the TCP server and client that speak
//! it, and the registry of known peers.

pub mod client;
pub mod message;
pub mod peers;
pub mod server;

pub use client::{PeerClient, TcpPeerClient};
pub use message::{NodeStatus, Request, Response};
pub use peers::PeerRegistry;
pub use server::Server;
