// The ledger: committed blocks, the pending pool, and every rule that
// decides whether a block or transaction may change them.
//
// All validation runs against `&self` before anything is mutated, so a
// rejected block or transaction leaves chain and pool exactly as they were.

use crate::config::ChainParams;
use crate::core::address::validate_address;
use crate::core::stats::{self, BlockTimeStats};
use crate::core::{Block, DifficultyEstimator, Transaction};
use crate::error::{BlockchainError, LedgerError, Result};
use crate::storage::{BalanceIndex, ChainStore, FileStore, TransactionPool};
use crate::utils::current_timestamp;
use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};
use std::path::Path;

pub struct Blockchain {
    params: ChainParams,
    estimator: DifficultyEstimator,
    blocks: Vec<Block>,             // Index 0 is genesis
    difficulties: Vec<u32>,         // Difficulty each block was admitted under
    next_difficulty: u32,           // Required for the block after the tip
    committed: HashSet<String>,     // Hashes of every committed non-coinbase transaction
    balances: BalanceIndex,         // Confirmed balances
    pool: TransactionPool,          // Pending transactions
    store: Option<Box<dyn ChainStore>>,
}

impl std::fmt::Debug for Blockchain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Blockchain")
            .field("params", &self.params)
            .field("estimator", &self.estimator)
            .field("blocks", &self.blocks)
            .field("difficulties", &self.difficulties)
            .field("next_difficulty", &self.next_difficulty)
            .field("committed", &self.committed)
            .field("balances", &self.balances)
            .field("pool", &self.pool)
            .field("store", &self.store.is_some())
            .finish()
    }
}

impl Blockchain {
    /// An in-memory chain holding only the genesis block.
    pub fn new(params: ChainParams) -> Result<Blockchain> {
        params.validate()?;
        let estimator = params.difficulty_estimator();
        let genesis = Block::genesis(params.genesis_timestamp);
        let next_difficulty = estimator.current(std::slice::from_ref(&genesis));

        Ok(Blockchain {
            params,
            estimator,
            blocks: vec![genesis],
            difficulties: vec![0],
            next_difficulty,
            committed: HashSet::new(),
            balances: BalanceIndex::new(),
            pool: TransactionPool::new(),
            store: None,
        })
    }

    /// Rebuilds the chain from `store`, re-validating every block exactly as
    /// `add_block` would. An empty store is initialized with genesis. Any
    /// broken invariant is a `Persistence` error.
    pub fn open(params: ChainParams, store: Box<dyn ChainStore>) -> Result<Blockchain> {
        let blocks = store.load()?;
        let fresh = blocks.is_empty();

        let mut blockchain = Self::replay(params, blocks)?;
        blockchain.store = Some(store);
        if fresh {
            blockchain.persist()?;
        }

        info!(
            "Loaded chain from {}: {} blocks, next difficulty {}",
            blockchain.describe_store(),
            blockchain.len(),
            blockchain.next_difficulty
        );
        Ok(blockchain)
    }

    /// Loads a JSON-lines chain file and keeps writing to it.
    pub fn load_from_file<P: AsRef<Path>>(params: ChainParams, path: P) -> Result<Blockchain> {
        Self::open(params, Box::new(FileStore::new(path)))
    }

    /// Writes the committed chain to `path` as a JSON-lines chain file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        FileStore::new(path).save(&self.blocks)
    }

    fn replay(params: ChainParams, blocks: Vec<Block>) -> Result<Blockchain> {
        let mut blockchain = Blockchain::new(params)?;
        let mut blocks = blocks.into_iter();

        if let Some(genesis) = blocks.next() {
            if genesis != blockchain.blocks[0] {
                return Err(LedgerError::Persistence(format!(
                    "genesis block {} does not match the configured genesis {}",
                    genesis.hash(),
                    blockchain.blocks[0].hash()
                )));
            }
        }

        for block in blocks {
            let index = block.get_index();
            blockchain
                .validate_block(&block)
                .map_err(|e| LedgerError::Persistence(format!("block {index}: {e}")))?;
            blockchain.commit(block, false)?;
        }
        Ok(blockchain)
    }

    /// Replays the whole chain from genesis and checks that it reproduces
    /// the same tip, difficulties and balances.
    pub fn verify(&self) -> Result<()> {
        let replayed = Self::replay(self.params.clone(), self.blocks.clone())?;
        if replayed.difficulties != self.difficulties
            || replayed.get_latest_block().hash() != self.get_latest_block().hash()
        {
            return Err(LedgerError::Persistence(
                "replayed chain diverges from the live chain".to_string(),
            ));
        }
        for (index, (block, difficulty)) in self.blocks.iter().zip(&self.difficulties).enumerate()
        {
            if index > 0 && !block.satisfies(*difficulty) {
                return Err(LedgerError::Persistence(format!(
                    "block {index} no longer satisfies difficulty {difficulty}"
                )));
            }
        }
        Ok(())
    }

    /// Writes the chain to the attached store, if any.
    pub fn persist(&mut self) -> Result<()> {
        if let Some(store) = self.store.as_mut() {
            store.save(&self.blocks)?;
        }
        Ok(())
    }

    fn describe_store(&self) -> String {
        self.store
            .as_ref()
            .map(|s| s.describe())
            .unwrap_or_else(|| "memory".to_string())
    }

    /// Template for the next block: every pending transaction in arrival
    /// order followed by a coinbase paying `miner_address` the reward plus
    /// fees. The nonce is 0; finding a valid one is the miner's job.
    pub fn get_minable_block(&self, miner_address: &str) -> Result<Block> {
        self.get_minable_block_at(miner_address, current_timestamp()?)
    }

    pub fn get_minable_block_at(&self, miner_address: &str, timestamp: i64) -> Result<Block> {
        if !validate_address(miner_address) {
            return Err(LedgerError::InvalidFormat(format!(
                "Invalid address: {miner_address}"
            )));
        }

        let mut transactions = self.pool.snapshot();
        let fees: u64 = transactions.iter().map(Transaction::get_fee).sum();
        let reward = self.params.block_reward.saturating_add(fees);
        transactions.push(Transaction::new_coinbase(miner_address, reward, timestamp));

        let tip = self.get_latest_block();
        debug!(
            "Built template for block #{} with {} transactions",
            tip.get_index() + 1,
            transactions.len()
        );
        Ok(Block::new(
            tip.get_index() + 1,
            tip.hash(),
            transactions,
            timestamp,
        ))
    }

    /// Validates and commits an externally mined block, then persists the
    /// chain. Returns the committed index.
    pub fn add_block(&mut self, block: Block) -> Result<u64> {
        if let Err(e) = self.validate_block(&block) {
            warn!("Block #{} rejected: {e}", block.get_index());
            return Err(e.into());
        }
        self.commit(block, true)
    }

    /// Every admission rule, checked in order without mutating anything.
    pub fn validate_block(&self, block: &Block) -> std::result::Result<(), BlockchainError> {
        let expected_index = self.blocks.len() as u64;
        if block.get_index() != expected_index {
            return Err(BlockchainError::InvalidIndex {
                expected: expected_index,
                found: block.get_index(),
            });
        }

        let tip_hash = self.get_latest_block().hash();
        if block.get_previous_hash() != tip_hash {
            return Err(BlockchainError::InvalidPreviousHash {
                expected: tip_hash,
                found: block.get_previous_hash().to_string(),
            });
        }

        let tip_timestamp = self.get_latest_block().get_timestamp();
        if block.get_timestamp() < tip_timestamp {
            return Err(BlockchainError::InvalidTimestamp {
                tip: tip_timestamp,
                found: block.get_timestamp(),
            });
        }

        if !block.satisfies(self.next_difficulty) {
            return Err(BlockchainError::InvalidProofOfWork {
                difficulty: self.next_difficulty,
                hash: block.hash(),
            });
        }

        let transactions = block.get_transactions();
        let transfers = match transactions.split_last() {
            Some((_, rest)) => rest,
            None => &[],
        };
        let fees = self.validate_transfers(transfers)?;

        let coinbase = block.coinbase().ok_or_else(|| {
            BlockchainError::InvalidCoinbase("last transaction must be a coinbase".to_string())
        })?;
        let expected_reward = self.params.block_reward.saturating_add(fees);
        if coinbase.get_amount() != expected_reward {
            return Err(BlockchainError::InvalidCoinbase(format!(
                "reward is {}, expected {expected_reward}",
                coinbase.get_amount()
            )));
        }
        if coinbase.get_fee() != 0 {
            return Err(BlockchainError::InvalidCoinbase(
                "coinbase cannot carry a fee".to_string(),
            ));
        }
        if !validate_address(coinbase.get_destination()) {
            return Err(BlockchainError::InvalidCoinbase(format!(
                "invalid destination address: {}",
                coinbase.get_destination()
            )));
        }
        Ok(())
    }

    // Checks each non-coinbase transaction and the cumulative spend per
    // source against confirmed balances. Returns the total fees.
    fn validate_transfers(
        &self,
        transfers: &[Transaction],
    ) -> std::result::Result<u64, BlockchainError> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut spent: HashMap<&str, u64> = HashMap::new();
        let mut fees: u64 = 0;

        for tx in transfers {
            if tx.is_coinbase() {
                return Err(BlockchainError::InvalidCoinbase(
                    "coinbase must be the last transaction".to_string(),
                ));
            }
            tx.validate(self.params.min_amount)?;

            let tx_hash = tx.hash();
            if self.committed.contains(&tx_hash) || !seen.insert(tx_hash.clone()) {
                return Err(BlockchainError::DuplicateTransaction(tx_hash));
            }

            let Some(source) = tx.get_source() else {
                continue;
            };
            let total = spent.entry(source).or_insert(0);
            *total = total.saturating_add(tx.get_spend());
            let available = self.balances.balance(source);
            if *total > available {
                return Err(BlockchainError::InsufficientFunds {
                    address: source.to_string(),
                    required: *total,
                    available,
                });
            }
            fees = fees.saturating_add(tx.get_fee());
        }
        Ok(fees)
    }

    // Appends a block that already passed `validate_block`. When persisting,
    // a failed save undoes the append before anything else changes.
    fn commit(&mut self, block: Block, persist: bool) -> Result<u64> {
        let difficulty = self.next_difficulty;
        self.blocks.push(block);

        if persist {
            if let Err(e) = self.persist() {
                self.blocks.pop();
                return Err(e);
            }
        }

        let block = &self.blocks[self.blocks.len() - 1];
        let index = block.get_index();
        let transaction_count = block.get_transactions().len();

        self.balances.apply_block(block);
        let confirmed: Vec<String> = block
            .get_transactions()
            .iter()
            .filter(|tx| !tx.is_coinbase())
            .map(Transaction::hash)
            .collect();
        self.pool.remove(confirmed.iter().map(String::as_str));
        self.committed.extend(confirmed);

        self.difficulties.push(difficulty);
        self.next_difficulty = self.estimator.next_difficulty(&self.blocks, difficulty);
        self.evict_unfunded();

        if persist {
            info!(
                "Block #{index} added to the chain ({transaction_count} transactions, difficulty {difficulty})"
            );
        }
        Ok(index)
    }

    // A committed block may have spent funds that pending transactions
    // relied on. Keeps the pool within confirmed balances, oldest first.
    fn evict_unfunded(&mut self) {
        let balances = &self.balances;
        let mut reserved: HashMap<String, u64> = HashMap::new();
        let dropped = self.pool.retain(|tx| {
            let Some(source) = tx.get_source() else {
                return false;
            };
            let total = reserved.entry(source.to_string()).or_insert(0);
            let next = total.saturating_add(tx.get_spend());
            if next <= balances.balance(source) {
                *total = next;
                true
            } else {
                false
            }
        });
        for tx_hash in dropped {
            warn!("Evicted pending transaction {tx_hash}: source can no longer cover it");
        }
    }

    /// Admits a transaction to the pool. The source's confirmed balance
    /// must cover this spend plus everything it already has pending.
    pub fn add_transaction(&mut self, tx: Transaction) -> Result<String> {
        if let Err(e) = self.validate_transaction(&tx) {
            warn!("Transaction {} rejected: {e}", tx.hash());
            return Err(e.into());
        }
        let tx_hash = self.pool.add(tx)?;
        info!("Pending transaction {tx_hash} added to the pool");
        Ok(tx_hash)
    }

    pub fn validate_transaction(&self, tx: &Transaction) -> std::result::Result<(), BlockchainError> {
        if tx.is_coinbase() {
            return Err(BlockchainError::InvalidTransaction(
                "coinbase transactions cannot be submitted".to_string(),
            ));
        }
        tx.validate(self.params.min_amount)?;

        let tx_hash = tx.hash();
        if self.committed.contains(&tx_hash) || self.pool.contains(&tx_hash) {
            return Err(BlockchainError::DuplicateTransaction(tx_hash));
        }

        if let Some(source) = tx.get_source() {
            let available = self.balances.balance(source);
            let required = self
                .pool
                .pending_spend(source)
                .saturating_add(tx.get_spend());
            if required > available {
                return Err(BlockchainError::InsufficientFunds {
                    address: source.to_string(),
                    required,
                    available,
                });
            }
        }
        Ok(())
    }

    /// Confirmed balance: committed incoming minus committed outgoing
    /// (amount plus fee).
    pub fn get_balance(&self, address: &str) -> u64 {
        self.balances.balance(address)
    }

    /// Confirmed balance minus pending outgoing spends. Pending incoming
    /// amounts are not counted.
    pub fn get_balance_unconfirmed(&self, address: &str) -> u64 {
        self.get_balance(address)
            .saturating_sub(self.pool.pending_spend(address))
    }

    pub fn get_block_by_index(&self, index: u64) -> Option<&Block> {
        usize::try_from(index).ok().and_then(|i| self.blocks.get(i))
    }

    /// The tip. The chain always holds at least genesis.
    pub fn get_latest_block(&self) -> &Block {
        &self.blocks[self.blocks.len() - 1]
    }

    /// Difficulty the next block must satisfy
    pub fn calculate_hash_difficulty(&self) -> u32 {
        self.next_difficulty
    }

    /// Difficulty the block at `index` was admitted under (0 for genesis)
    pub fn get_block_difficulty(&self, index: u64) -> Option<u32> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.difficulties.get(i))
            .copied()
    }

    pub fn pending_transactions(&self) -> Vec<Transaction> {
        self.pool.snapshot()
    }

    pub fn get_blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Never true: genesis is always present
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn ranking(&self) -> Vec<(String, u64)> {
        stats::ranking(&self.blocks)
    }

    pub fn block_time_stats(&self) -> Option<BlockTimeStats> {
        stats::block_time_stats(&self.blocks)
    }
}
