use ring::digest::{Context, SHA256};

use crate::error::{BlockchainError, Result};
use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the unix epoch
pub fn current_timestamp() -> Result<i64> {
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| BlockchainError::Time(format!("System time error: {e}")))?
        .as_millis();

    // Ensure the timestamp fits in i64
    if duration > i64::MAX as u128 {
        return Err(BlockchainError::Time("Timestamp overflow".to_string()));
    }

    Ok(duration as i64)
}

/// Digest `prefix || suffix` without concatenating them first
pub fn sha256_digest_parts(prefix: &[u8], suffix: &[u8]) -> Vec<u8> {
    let mut context = Context::new(&SHA256);
    context.update(prefix);
    context.update(suffix);
    context.finish().as_ref().to_vec()
}
