use crate::core::proof_of_work::meets_difficulty;
use crate::core::transaction::{push_field, TransactionRecord};
use crate::core::Transaction;
use crate::error::{LedgerError, Result};
use crate::utils::sha256_hex;
use serde::{Deserialize, Serialize};

/// `previous_hash` of the genesis block
pub const GENESIS_PREVIOUS_HASH: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

// The wire and file shape of a block. `hash` is written for readers and
// checked on load, but a submitted block is always re-hashed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub index: u64,
    pub previous_hash: String,
    pub timestamp: i64,
    pub nonce: u64,
    pub transactions: Vec<TransactionRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
#[serde(into = "BlockRecord", try_from = "BlockRecord")]
pub struct Block {
    index: u64,
    previous_hash: String,
    timestamp: i64,
    transactions: Vec<Transaction>, // Coinbase last
    nonce: u64,
}

impl Block {
    /// An unmined block (nonce 0)
    pub fn new(
        index: u64,
        previous_hash: String,
        transactions: Vec<Transaction>,
        timestamp: i64,
    ) -> Block {
        Block {
            index,
            previous_hash,
            timestamp,
            transactions,
            nonce: 0,
        }
    }

    /// The fixed first block: no transactions, nothing to mine.
    pub fn genesis(timestamp: i64) -> Block {
        Block::new(0, GENESIS_PREVIOUS_HASH.to_string(), vec![], timestamp)
    }

    /// Parses an untyped record. The record's `hash`, if any, is ignored.
    pub fn from_value(value: &serde_json::Value) -> Result<Block> {
        let record: BlockRecord = serde_json::from_value(value.clone())
            .map_err(|e| LedgerError::InvalidFormat(format!("block: {e}")))?;
        Block::try_from(record)
    }

    pub fn to_value(&self) -> Result<serde_json::Value> {
        serde_json::to_value(BlockRecord::from(self.clone()))
            .map_err(|e| LedgerError::Serialization(e.to_string()))
    }

    pub fn hash(&self) -> String {
        Self::digest(&self.prepare_data(), self.nonce)
    }

    /// Proof-of-work predicate: the hex digest starts with at least
    /// `difficulty` zero characters.
    pub fn satisfies(&self, difficulty: u32) -> bool {
        meets_difficulty(&self.hash(), difficulty)
    }

    // Everything except the nonce, which goes last so a miner can reuse
    // this prefix across attempts.
    pub(crate) fn prepare_data(&self) -> Vec<u8> {
        let mut data = vec![];
        data.extend(self.index.to_be_bytes());
        push_field(&mut data, self.previous_hash.as_bytes());
        data.extend(self.timestamp.to_be_bytes());
        data.extend((self.transactions.len() as u64).to_be_bytes());
        for transaction in &self.transactions {
            data.extend(transaction.hash().as_bytes());
        }
        data
    }

    pub(crate) fn digest(prefix: &[u8], nonce: u64) -> String {
        let mut data = Vec::with_capacity(prefix.len() + 8);
        data.extend_from_slice(prefix);
        data.extend(nonce.to_be_bytes());
        sha256_hex(&data)
    }

    pub fn with_nonce(mut self, nonce: u64) -> Block {
        self.nonce = nonce;
        self
    }

    pub fn get_index(&self) -> u64 {
        self.index
    }

    pub fn get_previous_hash(&self) -> &str {
        self.previous_hash.as_str()
    }

    pub fn get_timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn get_transactions(&self) -> &[Transaction] {
        self.transactions.as_slice()
    }

    pub fn get_nonce(&self) -> u64 {
        self.nonce
    }

    /// The trailing transaction when it is a coinbase
    pub fn coinbase(&self) -> Option<&Transaction> {
        self.transactions.last().filter(|tx| tx.is_coinbase())
    }
}

impl From<Block> for BlockRecord {
    fn from(block: Block) -> Self {
        let hash = block.hash();
        BlockRecord {
            index: block.index,
            previous_hash: block.previous_hash,
            timestamp: block.timestamp,
            nonce: block.nonce,
            transactions: block
                .transactions
                .into_iter()
                .map(TransactionRecord::from)
                .collect(),
            hash: Some(hash),
        }
    }
}

impl TryFrom<BlockRecord> for Block {
    type Error = LedgerError;

    fn try_from(record: BlockRecord) -> Result<Self> {
        let transactions = record
            .transactions
            .into_iter()
            .map(Transaction::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok(Block {
            index: record.index,
            previous_hash: record.previous_hash,
            timestamp: record.timestamp,
            transactions,
            nonce: record.nonce,
        })
    }
}
