//! Node service
//!
//! The operations a request layer (HTTP, CLI) calls into. Raw records come
//! in as untyped JSON values; errors go out as `LedgerError`.

pub mod node;

pub use node::{BlockQuery, MinableBlock, Node};
