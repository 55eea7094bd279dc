// Canonical byte encoding used for hashing (bincode 2, standard config).
// The wire format is JSON and goes straight through serde_json.
use crate::error::{BlockchainError, Result};

/// Encode a value with bincode 2.0 standard configuration
pub fn encode_canonical<T: bincode::Encode>(data: T) -> Result<Vec<u8>> {
    let config = bincode::config::standard();
    bincode::encode_to_vec(data, config)
        .map_err(|e| BlockchainError::Serialization(format!("Canonical encoding failed: {e}")))
}
