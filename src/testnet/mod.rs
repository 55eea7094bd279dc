//! In-memory test network
//!
//! Nodes wired together through a [`LocalNetwork`] instead of sockets, so
//! consensus and gossip can be exercised deterministically and fast.

pub mod test_utils;

pub use test_utils::*;
