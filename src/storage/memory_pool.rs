use crate::core::Transaction;
use crate::error::BlockchainError;
use std::collections::{HashMap, HashSet};

/// Pending transactions in arrival order.
///
/// ( K -> tx_hash, V => Transaction ), with a separate FIFO order list.
/// The pool is owned by the ledger and guarded by the ledger's lock, so it
/// carries no lock of its own.
#[derive(Debug, Default, Clone)]
pub struct TransactionPool {
    order: Vec<String>,
    inner: HashMap<String, Transaction>,
}

impl TransactionPool {
    pub fn new() -> TransactionPool {
        TransactionPool::default()
    }

    /// Inserts `tx` at the back of the queue. Returns its hash.
    pub fn add(&mut self, tx: Transaction) -> Result<String, BlockchainError> {
        let tx_hash = tx.hash();
        if self.inner.contains_key(&tx_hash) {
            return Err(BlockchainError::DuplicateTransaction(tx_hash));
        }
        self.order.push(tx_hash.clone());
        self.inner.insert(tx_hash.clone(), tx);
        Ok(tx_hash)
    }

    pub fn contains(&self, tx_hash: &str) -> bool {
        self.inner.contains_key(tx_hash)
    }

    /// Drops every listed transaction; unknown hashes are ignored.
    pub fn remove<'a, I>(&mut self, tx_hashes: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let doomed: HashSet<&str> = tx_hashes
            .into_iter()
            .filter(|h| self.inner.contains_key(*h))
            .collect();
        if doomed.is_empty() {
            return;
        }
        for tx_hash in &doomed {
            self.inner.remove(*tx_hash);
        }
        self.order.retain(|h| !doomed.contains(h.as_str()));
    }

    /// Keeps the transactions for which `keep` returns true, visiting them
    /// in FIFO order. Returns the hashes of the dropped ones.
    pub fn retain<F>(&mut self, mut keep: F) -> Vec<String>
    where
        F: FnMut(&Transaction) -> bool,
    {
        let mut dropped = vec![];
        let inner = &mut self.inner;
        self.order.retain(|tx_hash| {
            let Some(tx) = inner.get(tx_hash) else {
                return false;
            };
            if keep(tx) {
                true
            } else {
                inner.remove(tx_hash);
                dropped.push(tx_hash.clone());
                false
            }
        });
        dropped
    }

    /// Pending transactions in arrival order
    pub fn snapshot(&self) -> Vec<Transaction> {
        self.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transaction> {
        self.order.iter().filter_map(|h| self.inner.get(h))
    }

    /// Total amount plus fee that `address` has pending as a source
    pub fn pending_spend(&self, address: &str) -> u64 {
        self.iter()
            .filter(|tx| tx.get_source() == Some(address))
            .map(Transaction::get_spend)
            .sum()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: &str) -> String {
        format!("02{}", byte.repeat(32))
    }

    fn tx(amount: u64, timestamp: i64) -> Transaction {
        Transaction::new(Some(addr("aa")), addr("bb"), amount, 0, timestamp, None)
    }

    #[test]
    fn test_add_preserves_order() {
        let mut pool = TransactionPool::new();
        let first = pool.add(tx(3_000, 3)).unwrap();
        let second = pool.add(tx(1_000, 1)).unwrap();
        let third = pool.add(tx(2_000, 2)).unwrap();

        let hashes: Vec<String> = pool.snapshot().iter().map(Transaction::hash).collect();
        assert_eq!(hashes, vec![first, second, third]);
    }

    #[test]
    fn test_duplicate_is_rejected() {
        let mut pool = TransactionPool::new();
        pool.add(tx(1_000, 1)).unwrap();
        let err = pool.add(tx(1_000, 1)).unwrap_err();
        assert!(matches!(err, BlockchainError::DuplicateTransaction(_)));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_remove_by_hash() {
        let mut pool = TransactionPool::new();
        let a = pool.add(tx(1_000, 1)).unwrap();
        let b = pool.add(tx(2_000, 2)).unwrap();
        let c = pool.add(tx(3_000, 3)).unwrap();

        pool.remove([a.as_str(), c.as_str(), "unknown"]);

        assert_eq!(pool.len(), 1);
        assert!(pool.contains(&b));
        assert!(!pool.contains(&a));
        assert_eq!(pool.snapshot()[0].hash(), b);
    }

    #[test]
    fn test_pending_spend_sums_amount_and_fee() {
        let mut pool = TransactionPool::new();
        pool.add(Transaction::new(Some(addr("aa")), addr("bb"), 5_000, 1_000, 1, None))
            .unwrap();
        pool.add(Transaction::new(Some(addr("aa")), addr("cc"), 2_000, 0, 2, None))
            .unwrap();
        pool.add(Transaction::new(Some(addr("cc")), addr("aa"), 9_000, 0, 3, None))
            .unwrap();

        assert_eq!(pool.pending_spend(&addr("aa")), 8_000);
        assert_eq!(pool.pending_spend(&addr("cc")), 9_000);
        assert_eq!(pool.pending_spend(&addr("bb")), 0);
    }

    #[test]
    fn test_retain_reports_dropped_in_order() {
        let mut pool = TransactionPool::new();
        let a = pool.add(tx(1_000, 1)).unwrap();
        let b = pool.add(tx(2_000, 2)).unwrap();
        let c = pool.add(tx(3_000, 3)).unwrap();

        let dropped = pool.retain(|tx| tx.get_amount() == 2_000);
        assert_eq!(dropped, vec![a, c]);
        assert_eq!(pool.len(), 1);
        assert!(pool.contains(&b));
    }
}
