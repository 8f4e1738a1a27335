//! Data storage and persistence
//!
//! The pending-transaction pool, the confirmed balance index, and the
//! backends that keep the committed chain on disk.

pub mod balance_index;
pub mod chain_store;
pub mod file_store;
pub mod memory_pool;
pub mod sled_store;

pub use balance_index::BalanceIndex;
pub use chain_store::ChainStore;
pub use file_store::FileStore;
pub use memory_pool::TransactionPool;
pub use sled_store::SledStore;

use crate::config::{Settings, StorageBackend};
use crate::error::Result;

/// Opens the backend selected in `settings` at `settings.chain_file`.
pub fn open_store(settings: &Settings) -> Result<Box<dyn ChainStore>> {
    let store: Box<dyn ChainStore> = match settings.storage {
        StorageBackend::File => Box::new(FileStore::new(&settings.chain_file)),
        StorageBackend::Sled => Box::new(SledStore::open(&settings.chain_file)?),
    };
    Ok(store)
}
