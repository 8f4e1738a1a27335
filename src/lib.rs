//! # uclcoin - Single-Node Ledger Engine
//!
//! The ledger behind a minimal proof-of-work cryptocurrency. It keeps an
//! append-only chain of blocks, a pool of pending transactions, and the
//! rules that decide which blocks and transactions get in.
//!
//! ## What It Does
//! - **Blocks**: externally mined blocks are checked for index, linkage,
//!   proof-of-work, transactions and reward before they are committed
//! - **Transactions**: account-based transfers with a minimum amount and
//!   an optional fee paid to the miner
//! - **Difficulty**: adjusted one step at a time from recent block times
//! - **Persistence**: the committed chain is written after every block, to
//!   a JSON-lines file or a Sled tree
//!
//! ## How the Code Is Organized
//! - `core/`: blocks, transactions, proof-of-work, difficulty, the ledger
//! - `storage/`: pending pool, balance index, chain stores
//! - `service/`: the thread-safe node that request layers call into
//! - `config/`: consensus parameters and node settings
//! - `utils/`: hashing and binary encoding helpers
//! - `cli/`: command-line interface
//!
//! ## Where to Start
//! 1. `core/blockchain.rs` holds every admission rule
//! 2. `service/node.rs` shows the operations exposed to callers
//! 3. `main.rs` wires settings, the node and the CLI together

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod service;
pub mod storage;
pub mod utils;

#[cfg(test)]
pub mod testnet;

// Re-export commonly used types for convenience
pub use cli::{Command, Opt};
pub use config::{ChainParams, Settings, StorageBackend};
pub use core::{
    validate_address, Block, BlockRecord, BlockTimeStats, Blockchain, DifficultyEstimator,
    ProofOfWork, Transaction, TransactionRecord,
};
pub use error::{BlockchainError, LedgerError, Result};
pub use service::{BlockQuery, MinableBlock, Node};
pub use storage::{BalanceIndex, ChainStore, FileStore, SledStore, TransactionPool};
pub use utils::{current_timestamp, sha256_digest, sha256_hex};
