//! Configuration management
//!
//! Consensus parameters and node settings. Settings come from an optional
//! TOML file and environment overrides and are handed to the ledger at
//! construction; there is no global configuration.

pub mod settings;

pub use settings::{ChainParams, Settings, StorageBackend};
