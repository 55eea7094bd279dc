//! Configuration management
//!
//! Node settings: listen address, mining identity and reward, difficulty,
//! consensus timing and the initial peer list.

pub mod settings;

pub use settings::{
    node_id_from_addr, Settings, NODE_ADDRESS_KEY, NODE_DIFFICULTY_KEY, NODE_ID_KEY,
    NODE_PEERS_KEY,
};
