// A transaction moves `amount` units from `source` to `destination` and
// pays `fee` to whoever mines it. The coinbase transaction has no source
// and carries the block reward plus collected fees.

use crate::core::address::validate_address;
use crate::core::monetary::conversions::{coins_to_units, format_units, units_to_coins};
use crate::core::monetary::{DEFAULT_MIN_AMOUNT, MAX_WIRE_UNITS};
use crate::error::{BlockchainError, LedgerError, Result};
use crate::utils::{current_timestamp, sha256_hex};
use data_encoding::HEXLOWER;
use serde::{Deserialize, Serialize};

// The wire shape of a transaction: amounts as decimal coins, signature and
// hash as lowercase hex. `tx_hash` is informational only and never trusted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub source: Option<String>,
    pub destination: String,
    pub amount: f64,
    pub fee: f64,
    pub timestamp: i64,
    pub signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
#[serde(into = "TransactionRecord", try_from = "TransactionRecord")]
pub struct Transaction {
    source: Option<String>,    // None only for the coinbase
    destination: String,       // Who receives `amount`
    amount: u64,               // Units transferred
    fee: u64,                  // Units paid to the miner
    timestamp: i64,            // Seconds since the Unix epoch
    signature: Option<Vec<u8>>, // Opaque, carried through hashing and storage
}

impl Transaction {
    /// Builds a transaction without checking any rule.
    pub fn new(
        source: Option<String>,
        destination: String,
        amount: u64,
        fee: u64,
        timestamp: i64,
        signature: Option<Vec<u8>>,
    ) -> Transaction {
        Transaction {
            source,
            destination,
            amount,
            fee,
            timestamp,
            signature,
        }
    }

    /// Creates a regular transfer stamped with the current time, rejecting
    /// malformed addresses and amounts below the default minimum.
    pub fn create(
        source: &str,
        destination: &str,
        amount: u64,
        fee: u64,
        signature: Option<Vec<u8>>,
    ) -> Result<Transaction> {
        let tx = Transaction::new(
            Some(source.to_string()),
            destination.to_string(),
            amount,
            fee,
            current_timestamp()?,
            signature,
        );
        tx.validate(DEFAULT_MIN_AMOUNT)?;
        Ok(tx)
    }

    /// The reward transaction that closes every mined block
    pub fn new_coinbase(destination: &str, amount: u64, timestamp: i64) -> Transaction {
        Transaction::new(None, destination.to_string(), amount, 0, timestamp, None)
    }

    /// Parses an untyped record. Missing or mistyped fields are
    /// `InvalidFormat`; negative amounts are `InvalidTransaction`.
    pub fn from_value(value: &serde_json::Value) -> Result<Transaction> {
        let record: TransactionRecord = serde_json::from_value(value.clone())
            .map_err(|e| LedgerError::InvalidFormat(format!("transaction: {e}")))?;
        Transaction::try_from(record)
    }

    pub fn to_value(&self) -> Result<serde_json::Value> {
        serde_json::to_value(TransactionRecord::from(self.clone()))
            .map_err(|e| LedgerError::Serialization(e.to_string()))
    }

    /// Checks the stand-alone validity rules: well-formed addresses, amount
    /// at least `min_amount`, fee either zero or at least `min_amount`.
    pub fn validate(&self, min_amount: u64) -> std::result::Result<(), BlockchainError> {
        match &self.source {
            Some(source) if !validate_address(source) => {
                return Err(BlockchainError::InvalidTransaction(format!(
                    "invalid source address: {source}"
                )));
            }
            Some(_) => {}
            None => {
                return Err(BlockchainError::InvalidTransaction(
                    "transaction has no source".to_string(),
                ));
            }
        }
        if !validate_address(&self.destination) {
            return Err(BlockchainError::InvalidTransaction(format!(
                "invalid destination address: {}",
                self.destination
            )));
        }
        if self.amount < min_amount {
            return Err(BlockchainError::InvalidTransaction(format!(
                "amount {} is below the minimum of {}",
                format_units(self.amount),
                format_units(min_amount)
            )));
        }
        if self.fee != 0 && self.fee < min_amount {
            return Err(BlockchainError::InvalidTransaction(format!(
                "fee {} must be zero or at least {}",
                format_units(self.fee),
                format_units(min_amount)
            )));
        }
        if self.amount > MAX_WIRE_UNITS || self.fee > MAX_WIRE_UNITS {
            return Err(BlockchainError::InvalidTransaction(format!(
                "amount and fee are limited to {}",
                format_units(MAX_WIRE_UNITS)
            )));
        }
        Ok(())
    }

    /// Hex SHA-256 over every field, each length-prefixed so that no two
    /// distinct transactions share a preimage.
    pub fn hash(&self) -> String {
        sha256_hex(&self.prepare_data())
    }

    fn prepare_data(&self) -> Vec<u8> {
        let mut data = vec![];
        match &self.source {
            Some(source) => {
                data.push(1u8);
                push_field(&mut data, source.as_bytes());
            }
            None => data.push(0u8),
        }
        push_field(&mut data, self.destination.as_bytes());
        data.extend(self.amount.to_be_bytes());
        data.extend(self.fee.to_be_bytes());
        data.extend(self.timestamp.to_be_bytes());
        match &self.signature {
            Some(signature) => {
                data.push(1u8);
                push_field(&mut data, signature);
            }
            None => data.push(0u8),
        }
        data
    }

    pub fn is_coinbase(&self) -> bool {
        self.source.is_none()
    }

    pub fn get_source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn get_destination(&self) -> &str {
        self.destination.as_str()
    }

    pub fn get_amount(&self) -> u64 {
        self.amount
    }

    pub fn get_fee(&self) -> u64 {
        self.fee
    }

    /// What the source gives up: amount plus fee
    pub fn get_spend(&self) -> u64 {
        self.amount.saturating_add(self.fee)
    }

    pub fn get_timestamp(&self) -> i64 {
        self.timestamp
    }
}

pub(crate) fn push_field(data: &mut Vec<u8>, bytes: &[u8]) {
    data.extend((bytes.len() as u64).to_be_bytes());
    data.extend(bytes);
}

impl From<Transaction> for TransactionRecord {
    fn from(tx: Transaction) -> Self {
        let tx_hash = tx.hash();
        TransactionRecord {
            source: tx.source,
            destination: tx.destination,
            amount: units_to_coins(tx.amount),
            fee: units_to_coins(tx.fee),
            timestamp: tx.timestamp,
            signature: tx.signature.map(|s| HEXLOWER.encode(&s)),
            tx_hash: Some(tx_hash),
        }
    }
}

impl TryFrom<TransactionRecord> for Transaction {
    type Error = LedgerError;

    fn try_from(record: TransactionRecord) -> Result<Self> {
        let amount = coins_to_units(record.amount).ok_or_else(|| {
            BlockchainError::InvalidTransaction(format!(
                "invalid amount {}: must be a whole number of units, at most {}",
                record.amount,
                format_units(MAX_WIRE_UNITS)
            ))
        })?;
        let fee = coins_to_units(record.fee).ok_or_else(|| {
            BlockchainError::InvalidTransaction(format!(
                "invalid fee {}: must be a whole number of units, at most {}",
                record.fee,
                format_units(MAX_WIRE_UNITS)
            ))
        })?;
        let signature = record
            .signature
            .map(|s| {
                HEXLOWER
                    .decode(s.as_bytes())
                    .map_err(|e| LedgerError::InvalidFormat(format!("signature: {e}")))
            })
            .transpose()?;

        Ok(Transaction::new(
            record.source,
            record.destination,
            amount,
            fee,
            record.timestamp,
            signature,
        ))
    }
}
