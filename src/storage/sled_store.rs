use crate::core::Block;
use crate::error::{LedgerError, Result};
use crate::storage::ChainStore;
use crate::utils::{deserialize, serialize};
use log::info;
use sled::{Db, Tree};
use std::path::{Path, PathBuf};

const BLOCKS_TREE: &str = "blocks"; // Tree name for storing all blocks

/// Sled database holding one bincode record per block, keyed by the
/// big-endian block index so iteration follows the chain.
pub struct SledStore {
    db: Db,
    blocks: Tree,
    db_path: PathBuf,
}

impl SledStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<SledStore> {
        let path = path.as_ref().to_path_buf();
        let db = sled::open(&path)
            .map_err(|e| LedgerError::Persistence(format!("Failed to open database: {e}")))?;
        let blocks = db
            .open_tree(BLOCKS_TREE)
            .map_err(|e| LedgerError::Persistence(format!("Failed to open blocks tree: {e}")))?;
        Ok(SledStore {
            db,
            blocks,
            db_path: path,
        })
    }

    fn key(index: u64) -> [u8; 8] {
        index.to_be_bytes()
    }

    // The stored chain is a prefix of `blocks` iff its last record hashes
    // like the block at the same position.
    fn stored_prefix_len(&self, blocks: &[Block]) -> Result<usize> {
        let stored = self.blocks.len();
        if stored == 0 || stored > blocks.len() {
            return Ok(0);
        }
        let last = self
            .blocks
            .get(Self::key(stored as u64 - 1))?
            .ok_or_else(|| LedgerError::Persistence("Block records are not contiguous".to_string()))?;
        let last: Block = deserialize(last.as_ref())?;
        if last.hash() == blocks[stored - 1].hash() {
            Ok(stored)
        } else {
            Ok(0)
        }
    }
}

impl ChainStore for SledStore {
    fn load(&self) -> Result<Vec<Block>> {
        let mut blocks = vec![];
        for item in self.blocks.iter() {
            let (key, value) = item
                .map_err(|e| LedgerError::Persistence(format!("Failed to iterate blocks: {e}")))?;
            let block: Block = deserialize(value.as_ref()).map_err(|e| {
                LedgerError::Persistence(format!("Corrupt block record: {e}"))
            })?;
            if key.as_ref() != Self::key(block.get_index()) {
                return Err(LedgerError::Persistence(format!(
                    "Block {} stored under the wrong key",
                    block.get_index()
                )));
            }
            blocks.push(block);
        }
        info!(
            "Read {} block records from {}",
            blocks.len(),
            self.db_path.display()
        );
        Ok(blocks)
    }

    fn save(&mut self, blocks: &[Block]) -> Result<()> {
        let keep = self.stored_prefix_len(blocks)?;
        if keep == 0 && !self.blocks.is_empty() {
            self.blocks.clear()?;
        }

        let records = blocks[keep..]
            .iter()
            .map(|block| Ok((Self::key(block.get_index()), serialize(block)?)))
            .collect::<Result<Vec<_>>>()?;

        self.blocks
            .transaction(|tx_db| {
                for (key, value) in &records {
                    tx_db.insert(&key[..], value.as_slice())?;
                }
                Ok(())
            })
            .map_err(|e: sled::transaction::TransactionError| {
                LedgerError::Persistence(format!("Failed to save blocks: {e}"))
            })?;
        self.db.flush()?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("sled database {}", self.db_path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Transaction;
    use tempfile::tempdir;

    fn chain(len: u64) -> Vec<Block> {
        let miner = format!("02{}", "aa".repeat(32));
        let mut blocks = vec![Block::genesis(1_514_764_800)];
        for i in 1..len {
            let prev = blocks[i as usize - 1].hash();
            let ts = 1_600_000_000 + i as i64;
            blocks.push(Block::new(
                i,
                prev,
                vec![Transaction::new_coinbase(&miner, 1_000_000_000, ts)],
                ts,
            ));
        }
        blocks
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let mut store = SledStore::open(dir.path().join("db")).unwrap();
        let blocks = chain(3);

        store.save(&blocks).unwrap();
        assert_eq!(store.load().unwrap(), blocks);
    }

    #[test]
    fn test_save_appends_suffix() {
        let dir = tempdir().unwrap();
        let mut store = SledStore::open(dir.path().join("db")).unwrap();
        let blocks = chain(5);

        store.save(&blocks[..2]).unwrap();
        store.save(&blocks).unwrap();
        assert_eq!(store.load().unwrap(), blocks);
    }

    #[test]
    fn test_save_replaces_diverging_chain() {
        let dir = tempdir().unwrap();
        let mut store = SledStore::open(dir.path().join("db")).unwrap();
        store.save(&chain(4)).unwrap();

        let other = vec![Block::genesis(7)];
        store.save(&other).unwrap();
        assert_eq!(store.load().unwrap(), other);
    }
}
