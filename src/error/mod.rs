//! Error handling for the ledger
//!
//! `BlockchainError` covers every rejected state transition (a block or a
//! transaction that the ledger refused). `LedgerError` is the crate-wide
//! error and wraps it together with input-format and persistence faults.

use std::fmt;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// A block or transaction was rejected. None of these leave the ledger
/// partially updated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockchainError {
    /// Block index does not extend the current tip
    InvalidIndex { expected: u64, found: u64 },
    /// Block does not link to the current tip
    InvalidPreviousHash { expected: String, found: String },
    /// Block is timestamped before the current tip
    InvalidTimestamp { tip: i64, found: i64 },
    /// Block hash does not carry enough leading zeros
    InvalidProofOfWork { difficulty: u32, hash: String },
    /// Transaction fields break a validity rule
    InvalidTransaction(String),
    /// Source cannot cover the spend
    InsufficientFunds {
        address: String,
        required: u64,
        available: u64,
    },
    /// Missing, misplaced or mis-valued reward transaction
    InvalidCoinbase(String),
    /// Transaction already pending or already committed
    DuplicateTransaction(String),
}

impl fmt::Display for BlockchainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockchainError::InvalidIndex { expected, found } => {
                write!(f, "Invalid index: expected {expected}, got {found}")
            }
            BlockchainError::InvalidPreviousHash { expected, found } => {
                write!(
                    f,
                    "Invalid previous hash: expected {expected}, got {found}"
                )
            }
            BlockchainError::InvalidTimestamp { tip, found } => {
                write!(
                    f,
                    "Invalid timestamp: {found} is earlier than the tip's {tip}"
                )
            }
            BlockchainError::InvalidProofOfWork { difficulty, hash } => {
                write!(
                    f,
                    "Invalid proof of work: hash {hash} does not meet difficulty {difficulty}"
                )
            }
            BlockchainError::InvalidTransaction(msg) => write!(f, "Invalid transaction: {msg}"),
            BlockchainError::InsufficientFunds {
                address,
                required,
                available,
            } => {
                write!(
                    f,
                    "Insufficient funds for {address}: required {required}, available {available}"
                )
            }
            BlockchainError::InvalidCoinbase(msg) => write!(f, "Invalid coinbase: {msg}"),
            BlockchainError::DuplicateTransaction(hash) => {
                write!(f, "Duplicate transaction: {hash}")
            }
        }
    }
}

impl std::error::Error for BlockchainError {}

/// Crate-wide error type
#[derive(Debug, Clone)]
pub enum LedgerError {
    /// Malformed or missing record fields
    InvalidFormat(String),
    /// The ledger refused a state transition
    Rejected(BlockchainError),
    /// I/O fault or corrupt chain data in the backing store
    Persistence(String),
    /// Binary encoding errors
    Serialization(String),
    /// Configuration errors
    Config(String),
    /// A thread panicked while holding the ledger lock
    LockPoisoned,
}

impl LedgerError {
    /// The rejection reason, when this error is a rejected state transition
    pub fn rejection(&self) -> Option<&BlockchainError> {
        match self {
            LedgerError::Rejected(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::InvalidFormat(msg) => write!(f, "Invalid format: {msg}"),
            LedgerError::Rejected(e) => write!(f, "Rejected: {e}"),
            LedgerError::Persistence(msg) => write!(f, "Persistence error: {msg}"),
            LedgerError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            LedgerError::Config(msg) => write!(f, "Configuration error: {msg}"),
            LedgerError::LockPoisoned => write!(f, "Ledger lock poisoned"),
        }
    }
}

impl std::error::Error for LedgerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LedgerError::Rejected(e) => Some(e),
            _ => None,
        }
    }
}

impl From<BlockchainError> for LedgerError {
    fn from(err: BlockchainError) -> Self {
        LedgerError::Rejected(err)
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::Persistence(err.to_string())
    }
}

impl From<sled::Error> for LedgerError {
    fn from(err: sled::Error) -> Self {
        LedgerError::Persistence(err.to_string())
    }
}

impl From<bincode::error::EncodeError> for LedgerError {
    fn from(err: bincode::error::EncodeError) -> Self {
        LedgerError::Serialization(err.to_string())
    }
}

impl From<bincode::error::DecodeError> for LedgerError {
    fn from(err: bincode::error::DecodeError) -> Self {
        LedgerError::Serialization(err.to_string())
    }
}
