use crate::core::MAX_DIFFICULTY;
use crate::error::{BlockchainError, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

static DEFAULT_NODE_ADDR: &str = "127.0.0.1:2001";

pub const NODE_ADDRESS_KEY: &str = "NODE_ADDRESS";
pub const NODE_ID_KEY: &str = "NODE_ID";
pub const NODE_DIFFICULTY_KEY: &str = "NODE_DIFFICULTY";
pub const NODE_PEERS_KEY: &str = "NODE_PEERS";

/// Node settings. Resolved once at startup (defaults, then an optional TOML
/// file, then environment, then command line) and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Address the node listens on and advertises to peers
    pub node_addr: String,
    /// Identity used for mining rewards when a request names none
    pub node_id: String,
    /// Required leading zero bits of every block hash
    pub difficulty: u32,
    pub mining_reward: i64,
    pub sync_interval_secs: u64,
    pub peer_timeout_ms: u64,
    /// How many times a miner restarts after its tip went stale
    pub max_mining_attempts: u32,
    pub peers: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        let node_addr = DEFAULT_NODE_ADDR.to_string();
        Settings {
            node_id: node_id_from_addr(&node_addr),
            node_addr,
            difficulty: 8,
            mining_reward: 10,
            sync_interval_secs: 10,
            peer_timeout_ms: 5_000,
            max_mining_attempts: 5,
            peers: Vec::new(),
        }
    }
}

impl Settings {
    /// Defaults, overlaid by `path` if given, then by the process environment
    pub fn load(path: Option<&Path>) -> Result<Settings> {
        let settings = match path {
            Some(path) => Self::from_file(path)?,
            None => Settings::default(),
        };
        Ok(settings.with_overrides(|key| env::var(key).ok()))
    }

    pub fn from_file(path: &Path) -> Result<Settings> {
        let contents = fs::read_to_string(path).map_err(|e| {
            BlockchainError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Settings> {
        let mut settings: Settings = toml::from_str(contents)?;
        // a file that moves the address without naming the node keeps the
        // derived id in step with the new port
        if settings.node_id == Settings::default().node_id {
            settings.node_id = node_id_from_addr(&settings.node_addr);
        }
        Ok(settings)
    }

    /// Applies environment-style overrides read through `lookup`
    pub fn with_overrides<F>(mut self, lookup: F) -> Settings
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup(NODE_ADDRESS_KEY) {
            if self.node_id == node_id_from_addr(&self.node_addr) {
                self.node_id = node_id_from_addr(&addr);
            }
            self.node_addr = addr;
        }
        if let Some(node_id) = lookup(NODE_ID_KEY) {
            self.node_id = node_id;
        }
        if let Some(difficulty) = lookup(NODE_DIFFICULTY_KEY).and_then(|d| d.parse().ok()) {
            self.difficulty = difficulty;
        }
        if let Some(peers) = lookup(NODE_PEERS_KEY) {
            self.peers = peers
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect();
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.difficulty > MAX_DIFFICULTY {
            return Err(BlockchainError::Config(format!(
                "difficulty {} exceeds maximum {MAX_DIFFICULTY}",
                self.difficulty
            )));
        }
        if self.mining_reward <= 0 {
            return Err(BlockchainError::Config(
                "mining_reward must be positive".to_string(),
            ));
        }
        if self.sync_interval_secs == 0 || self.peer_timeout_ms == 0 {
            return Err(BlockchainError::Config(
                "sync_interval_secs and peer_timeout_ms must be non-zero".to_string(),
            ));
        }
        if self.max_mining_attempts == 0 {
            return Err(BlockchainError::Config(
                "max_mining_attempts must be at least 1".to_string(),
            ));
        }
        if self.node_id.is_empty() || self.node_addr.is_empty() {
            return Err(BlockchainError::Config(
                "node_id and node_addr must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_secs)
    }

    pub fn peer_timeout(&self) -> Duration {
        Duration::from_millis(self.peer_timeout_ms)
    }
}

/// Extract node ID from address (e.g., "127.0.0.1:2001" -> "node_2001")
pub fn node_id_from_addr(addr: &str) -> String {
    match addr.rsplit(':').next() {
        Some(port) if !port.is_empty() => format!("node_{port}"),
        _ => "node_default".to_string(),
    }
}
