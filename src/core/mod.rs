//! Core ledger functionality
//!
//! Blocks, transactions, proof-of-work, difficulty and the ledger itself.

pub mod address;
pub mod block;
pub mod blockchain;
pub mod difficulty;
pub mod monetary;
pub mod proof_of_work;
pub mod stats;
pub mod transaction;

pub use address::{validate_address, ADDRESS_HEX_LEN};
pub use block::{Block, BlockRecord, GENESIS_PREVIOUS_HASH};
pub use blockchain::Blockchain;
pub use difficulty::DifficultyEstimator;
pub use monetary::{DEFAULT_BLOCK_REWARD, DEFAULT_MIN_AMOUNT, MAX_WIRE_UNITS, UNITS_PER_COIN};
pub use proof_of_work::{meets_difficulty, ProofOfWork};
pub use stats::BlockTimeStats;
pub use transaction::{Transaction, TransactionRecord};
