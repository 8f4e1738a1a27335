use crate::core::{Block, Transaction};
use std::collections::HashMap;

/// Confirmed balance per address, derived from the committed chain.
///
/// Rebuilt with `reindex` and kept current with `apply_block`, so it
/// always equals a full scan of the chain (`scan_balance`).
#[derive(Debug, Default, Clone)]
pub struct BalanceIndex {
    balances: HashMap<String, u64>,
}

impl BalanceIndex {
    pub fn new() -> BalanceIndex {
        BalanceIndex::default()
    }

    pub fn reindex(&mut self, blocks: &[Block]) {
        self.balances.clear();
        for block in blocks {
            self.apply_block(block);
        }
    }

    pub fn apply_block(&mut self, block: &Block) {
        for tx in block.get_transactions() {
            self.apply_transaction(tx);
        }
    }

    fn apply_transaction(&mut self, tx: &Transaction) {
        if let Some(source) = tx.get_source() {
            let balance = self.balances.entry(source.to_string()).or_insert(0);
            *balance = balance.saturating_sub(tx.get_spend());
        }
        let balance = self
            .balances
            .entry(tx.get_destination().to_string())
            .or_insert(0);
        *balance = balance.saturating_add(tx.get_amount());
    }

    pub fn balance(&self, address: &str) -> u64 {
        self.balances.get(address).copied().unwrap_or(0)
    }

    /// Incoming amounts minus outgoing amount plus fee, summed over every
    /// block. Used to cross-check the index.
    pub fn scan_balance(blocks: &[Block], address: &str) -> u64 {
        let mut incoming: u64 = 0;
        let mut outgoing: u64 = 0;
        for tx in blocks.iter().flat_map(|b| b.get_transactions()) {
            if tx.get_destination() == address {
                incoming = incoming.saturating_add(tx.get_amount());
            }
            if tx.get_source() == Some(address) {
                outgoing = outgoing.saturating_add(tx.get_spend());
            }
        }
        incoming.saturating_sub(outgoing)
    }

    /// Number of addresses that ever appeared in a transaction
    pub fn len(&self) -> usize {
        self.balances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: &str) -> String {
        format!("02{}", byte.repeat(32))
    }

    fn blocks() -> Vec<Block> {
        let miner = addr("aa");
        let friend = addr("bb");
        let b1 = Block::new(
            1,
            String::new(),
            vec![Transaction::new_coinbase(&miner, 1_000, 1)],
            1,
        );
        let b2 = Block::new(
            2,
            String::new(),
            vec![
                Transaction::new(Some(miner.clone()), friend.clone(), 300, 100, 2, None),
                Transaction::new_coinbase(&friend, 1_100, 2),
            ],
            2,
        );
        vec![Block::genesis(0), b1, b2]
    }

    #[test]
    fn test_empty_chain_has_zero_balances() {
        let mut index = BalanceIndex::new();
        index.reindex(&[Block::genesis(0)]);
        assert!(index.is_empty());
        assert_eq!(index.balance(&addr("aa")), 0);
    }

    #[test]
    fn test_index_matches_scan() {
        let blocks = blocks();
        let mut index = BalanceIndex::new();
        index.reindex(&blocks);

        assert_eq!(index.balance(&addr("aa")), 600);
        assert_eq!(index.balance(&addr("bb")), 1_400);
        for address in [addr("aa"), addr("bb"), addr("cc")] {
            assert_eq!(
                index.balance(&address),
                BalanceIndex::scan_balance(&blocks, &address)
            );
        }
    }

    #[test]
    fn test_apply_block_is_incremental() {
        let blocks = blocks();
        let mut incremental = BalanceIndex::new();
        for block in &blocks {
            incremental.apply_block(block);
        }
        let mut full = BalanceIndex::new();
        full.reindex(&blocks);

        assert_eq!(incremental.balance(&addr("aa")), full.balance(&addr("aa")));
        assert_eq!(incremental.balance(&addr("bb")), full.balance(&addr("bb")));
    }
}
