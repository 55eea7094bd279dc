//! Error handling for the node
//!
//! Every fallible operation in the crate returns [`Result`]. None of these
//! errors is fatal to a running node: rejections go back to the caller and
//! peer failures are skipped by the consensus pass.

use std::fmt;

/// Result type alias for node operations
pub type Result<T> = std::result::Result<T, BlockchainError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockchainError {
    /// Non-positive amount, malformed identities or insufficient balance
    InvalidTransaction(String),
    /// Hash, linkage or proof-of-work mismatch, including a stale tip
    InvalidBlock(String),
    /// A peer-supplied chain failed validation
    InvalidChain(String),
    /// A peer could not be reached or did not answer in time
    PeerUnreachable(String),
    /// Nonce space exhausted
    Mining(String),
    /// Local network errors (binding, protocol violations)
    Network(String),
    /// Serialization/deserialization errors
    Serialization(String),
    /// Configuration errors
    Config(String),
    /// File I/O errors
    Io(String),
    /// System clock errors
    Time(String),
}

impl fmt::Display for BlockchainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockchainError::InvalidTransaction(msg) => write!(f, "Invalid transaction: {msg}"),
            BlockchainError::InvalidBlock(msg) => write!(f, "Invalid block: {msg}"),
            BlockchainError::InvalidChain(msg) => write!(f, "Invalid chain: {msg}"),
            BlockchainError::PeerUnreachable(msg) => write!(f, "Peer unreachable: {msg}"),
            BlockchainError::Mining(msg) => write!(f, "Mining error: {msg}"),
            BlockchainError::Network(msg) => write!(f, "Network error: {msg}"),
            BlockchainError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            BlockchainError::Config(msg) => write!(f, "Configuration error: {msg}"),
            BlockchainError::Io(msg) => write!(f, "I/O error: {msg}"),
            BlockchainError::Time(msg) => write!(f, "Clock error: {msg}"),
        }
    }
}

impl std::error::Error for BlockchainError {}

impl From<std::io::Error> for BlockchainError {
    fn from(err: std::io::Error) -> Self {
        BlockchainError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for BlockchainError {
    fn from(err: serde_json::Error) -> Self {
        BlockchainError::Serialization(err.to_string())
    }
}

impl From<bincode::error::EncodeError> for BlockchainError {
    fn from(err: bincode::error::EncodeError) -> Self {
        BlockchainError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for BlockchainError {
    fn from(err: toml::de::Error) -> Self {
        BlockchainError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_category() {
        let err = BlockchainError::InvalidTransaction("amount must be positive".to_string());
        assert_eq!(err.to_string(), "Invalid transaction: amount must be positive");

        let err = BlockchainError::PeerUnreachable("127.0.0.1:9".to_string());
        assert!(err.to_string().starts_with("Peer unreachable"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        let err: BlockchainError = io.into();
        assert!(matches!(err, BlockchainError::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let parse = serde_json::from_str::<u64>("not json").unwrap_err();
        let err: BlockchainError = parse.into();
        assert!(matches!(err, BlockchainError::Serialization(_)));
    }
}
