//! Utility functions and helpers
//!
//! Digest and clock helpers plus the canonical encoding blocks are hashed
//! over.

pub mod crypto;
pub mod serialization;

pub use crypto::{current_timestamp, sha256_digest_parts};

pub use serialization::encode_canonical;
