use crate::config::Settings;
use crate::core::{validate_address, Block, BlockTimeStats, Blockchain, Transaction};
use crate::error::{LedgerError, Result};
use crate::storage::open_store;
use log::info;
use serde::Serialize;
use std::str::FromStr;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Which block a caller asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockQuery {
    Index(u64),
    Last,
}

impl FromStr for BlockQuery {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        if s == "last" {
            return Ok(BlockQuery::Last);
        }
        s.parse::<u64>()
            .map(BlockQuery::Index)
            .map_err(|_| LedgerError::InvalidFormat(format!("Invalid block index: {s}")))
    }
}

/// A block template together with the difficulty it must be mined to
#[derive(Debug, Clone, Serialize)]
pub struct MinableBlock {
    pub difficulty: u32,
    pub block: Block,
}

/// Shared handle on the ledger.
///
/// One reader/writer lock guards chain and pool together: submissions take
/// it exclusively (persistence included), queries share it.
pub struct Node {
    ledger: RwLock<Blockchain>,
}

impl Node {
    pub fn new(blockchain: Blockchain) -> Node {
        Node {
            ledger: RwLock::new(blockchain),
        }
    }

    /// Opens the configured store and replays the chain it holds.
    pub fn open(settings: &Settings) -> Result<Node> {
        let store = open_store(settings)?;
        let blockchain = Blockchain::open(settings.params.clone(), store)?;
        Ok(Node::new(blockchain))
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Blockchain>> {
        self.ledger.read().map_err(|_| LedgerError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Blockchain>> {
        self.ledger.write().map_err(|_| LedgerError::LockPoisoned)
    }

    fn check_address(address: &str) -> Result<()> {
        if validate_address(address) {
            Ok(())
        } else {
            Err(LedgerError::InvalidFormat(format!(
                "Invalid address: {address}"
            )))
        }
    }

    pub fn get_balance(&self, address: &str) -> Result<u64> {
        Self::check_address(address)?;
        Ok(self.read()?.get_balance(address))
    }

    pub fn get_unconfirmed_balance(&self, address: &str) -> Result<u64> {
        Self::check_address(address)?;
        Ok(self.read()?.get_balance_unconfirmed(address))
    }

    pub fn list_pending_transactions(&self) -> Result<Vec<Transaction>> {
        Ok(self.read()?.pending_transactions())
    }

    /// `None` when the index is past the tip
    pub fn get_block(&self, query: BlockQuery) -> Result<Option<Block>> {
        let ledger = self.read()?;
        let block = match query {
            BlockQuery::Index(index) => ledger.get_block_by_index(index).cloned(),
            BlockQuery::Last => Some(ledger.get_latest_block().clone()),
        };
        Ok(block)
    }

    pub fn get_minable_block(&self, address: &str) -> Result<MinableBlock> {
        let ledger = self.read()?;
        let block = ledger.get_minable_block(address)?;
        Ok(MinableBlock {
            difficulty: ledger.calculate_hash_difficulty(),
            block,
        })
    }

    /// Parses, validates, commits and persists a mined block. Returns its
    /// index.
    pub fn submit_block(&self, raw: &serde_json::Value) -> Result<u64> {
        let block = Block::from_value(raw)?;
        self.write()?.add_block(block)
    }

    /// Parses and admits a transaction to the pool. Returns its hash.
    pub fn submit_transaction(&self, raw: &serde_json::Value) -> Result<String> {
        let tx = Transaction::from_value(raw)?;
        self.write()?.add_transaction(tx)
    }

    pub fn ranking(&self) -> Result<Vec<(String, u64)>> {
        Ok(self.read()?.ranking())
    }

    pub fn block_time_stats(&self) -> Result<Option<BlockTimeStats>> {
        Ok(self.read()?.block_time_stats())
    }

    pub fn verify(&self) -> Result<()> {
        self.read()?.verify()
    }

    /// Final flush of the chain to its store.
    pub fn shutdown(&self) -> Result<()> {
        let mut ledger = self.write()?;
        ledger.persist()?;
        info!("Ledger flushed at block #{}", ledger.get_latest_block().get_index());
        Ok(())
    }
}
