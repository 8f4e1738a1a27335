use crate::core::Block;
use crate::error::Result;

/// Durable home of the committed chain.
///
/// `save` receives the whole chain after every commit and must leave the
/// store holding either the previous chain or the new one, never a mix.
/// `load` returns the blocks in index order; it checks the encoding but
/// not the consensus rules, which the ledger replays itself.
pub trait ChainStore: Send + Sync {
    fn load(&self) -> Result<Vec<Block>>;

    fn save(&mut self, blocks: &[Block]) -> Result<()>;

    /// Human-readable location, for logs
    fn describe(&self) -> String;
}
