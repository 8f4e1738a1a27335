use crate::core::{Block, BlockRecord};
use crate::error::{LedgerError, Result};
use crate::storage::ChainStore;
use log::{debug, info};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Chain file with one JSON block record per line.
///
/// Every save writes a sibling temporary file, syncs it and renames it over
/// the chain file, so a crash leaves either the old or the new chain.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> FileStore {
        FileStore {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn parse_line(line_no: usize, line: &str) -> Result<Block> {
        let record: BlockRecord = serde_json::from_str(line).map_err(|e| {
            LedgerError::Persistence(format!("line {line_no}: malformed block record: {e}"))
        })?;

        let stored_hashes: Vec<Option<String>> = record
            .transactions
            .iter()
            .map(|tx| tx.tx_hash.clone())
            .collect();
        let stored_hash = record.hash.clone();

        let block = Block::try_from(record)
            .map_err(|e| LedgerError::Persistence(format!("line {line_no}: {e}")))?;

        if let Some(stored) = stored_hash {
            let computed = block.hash();
            if stored != computed {
                return Err(LedgerError::Persistence(format!(
                    "line {line_no}: stored hash {stored} does not match computed {computed}"
                )));
            }
        }
        for (tx, stored) in block.get_transactions().iter().zip(stored_hashes) {
            if let Some(stored) = stored {
                if stored != tx.hash() {
                    return Err(LedgerError::Persistence(format!(
                        "line {line_no}: stored tx_hash {stored} does not match computed {}",
                        tx.hash()
                    )));
                }
            }
        }
        Ok(block)
    }
}

impl ChainStore for FileStore {
    fn load(&self) -> Result<Vec<Block>> {
        if !self.path.exists() {
            info!("Chain file {} does not exist yet", self.path.display());
            return Ok(vec![]);
        }

        let reader = BufReader::new(File::open(&self.path)?);
        let mut blocks = vec![];
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            blocks.push(Self::parse_line(i + 1, &line)?);
        }
        info!(
            "Read {} block records from {}",
            blocks.len(),
            self.path.display()
        );
        Ok(blocks)
    }

    fn save(&mut self, blocks: &[Block]) -> Result<()> {
        let temp_path = self.temp_path();
        {
            let file = File::create(&temp_path)?;
            let mut writer = BufWriter::new(file);
            for block in blocks {
                let record = BlockRecord::from(block.clone());
                let line = serde_json::to_string(&record)
                    .map_err(|e| LedgerError::Serialization(e.to_string()))?;
                writer.write_all(line.as_bytes())?;
                writer.write_all(b"\n")?;
            }
            let file = writer
                .into_inner()
                .map_err(|e| LedgerError::Persistence(e.to_string()))?;
            file.sync_all()?;
        }
        fs::rename(&temp_path, &self.path)?;
        debug!("Wrote {} blocks to {}", blocks.len(), self.path.display());
        Ok(())
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Transaction;
    use tempfile::tempdir;

    fn sample_chain() -> Vec<Block> {
        let genesis = Block::genesis(1_514_764_800);
        let miner = format!("02{}", "aa".repeat(32));
        let block = Block::new(
            1,
            genesis.hash(),
            vec![Transaction::new_coinbase(&miner, 1_000_000_000, 1_600_000_000)],
            1_600_000_000,
        )
        .with_nonce(42);
        vec![genesis, block]
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("chain.db"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("chain.db"));
        let chain = sample_chain();

        store.save(&chain).unwrap();
        let loaded = store.load().unwrap();

        assert_eq!(loaded, chain);
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn test_one_record_per_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chain.db");
        let mut store = FileStore::new(&path);
        store.save(&sample_chain()).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2);
        let first: serde_json::Value = serde_json::from_str(text.lines().next().unwrap()).unwrap();
        assert_eq!(first["index"], 0);
    }

    #[test]
    fn test_tampered_record_is_detected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chain.db");
        let mut store = FileStore::new(&path);
        store.save(&sample_chain()).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        fs::write(&path, text.replace("\"nonce\":42", "\"nonce\":43")).unwrap();

        let err = store.load().unwrap_err();
        assert!(matches!(err, LedgerError::Persistence(_)));
    }

    #[test]
    fn test_garbage_line_is_persistence_failure() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chain.db");
        fs::write(&path, "{not json\n").unwrap();

        let err = FileStore::new(&path).load().unwrap_err();
        assert!(matches!(err, LedgerError::Persistence(_)));
    }
}
