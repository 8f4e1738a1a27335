//! Utility functions and helpers
//!
//! Hashing, timestamps and the binary codec used by the sled backend.

pub mod crypto;
pub mod serialization;

pub use crypto::{current_timestamp, sha256_digest, sha256_hex};

pub use serialization::{deserialize, serialize};
