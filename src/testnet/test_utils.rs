//! Test utilities for ledger testing

use crate::config::ChainParams;
use crate::core::{Block, Blockchain, ProofOfWork, Transaction};

/// Parameters that keep mining instant: difficulty 1, and a window long
/// enough that short test chains never adjust it.
pub fn easy_params() -> ChainParams {
    ChainParams {
        min_difficulty: 1,
        max_difficulty: 4,
        difficulty_window: 10,
        ..ChainParams::default()
    }
}

/// Deterministic, well-formed address number `n`
pub fn address(n: u8) -> String {
    format!("02{n:02x}{}", "00".repeat(31))
}

/// A regular transfer with a dummy signature
pub fn signed_tx(from: &str, to: &str, amount: u64, fee: u64, timestamp: i64) -> Transaction {
    Transaction::new(
        Some(from.to_string()),
        to.to_string(),
        amount,
        fee,
        timestamp,
        Some(vec![0x30, timestamp as u8]),
    )
}

pub fn mine_template(template: Block, difficulty: u32) -> Block {
    ProofOfWork::mine(template, difficulty).expect("nonce space exhausted")
}

/// Mines the chain's current template for `miner`
pub fn mine_next(chain: &Blockchain, miner: &str) -> Block {
    let template = chain
        .get_minable_block(miner)
        .expect("failed to build template");
    mine_template(template, chain.calculate_hash_difficulty())
}
