use crate::core::Block;
use log::info;

const MAX_NONCE: u64 = u64::MAX;

/// True iff the hex `hash` begins with at least `difficulty` `'0'` characters.
pub fn meets_difficulty(hash: &str, difficulty: u32) -> bool {
    let difficulty = difficulty as usize;
    hash.len() >= difficulty && hash.bytes().take(difficulty).all(|b| b == b'0')
}

/// Nonce search for a block template. The ledger never runs this itself;
/// it serves the CLI `mine` command and tests.
pub struct ProofOfWork {
    block: Block,
    difficulty: u32,
}

impl ProofOfWork {
    pub fn new_proof_of_work(block: Block, difficulty: u32) -> ProofOfWork {
        ProofOfWork { block, difficulty }
    }

    /// Validate proof-of-work for a block
    pub fn validate(block: &Block, difficulty: u32) -> bool {
        block.satisfies(difficulty)
    }

    /// Returns the first nonce (counting up from the block's current nonce)
    /// and the matching hash, or `None` if the nonce space runs out.
    pub fn run(&self) -> Option<(u64, String)> {
        let prefix = self.block.prepare_data();
        let mut nonce = self.block.get_nonce();
        loop {
            let hash = Block::digest(&prefix, nonce);
            if meets_difficulty(&hash, self.difficulty) {
                return Some((nonce, hash));
            }
            if nonce == MAX_NONCE {
                return None;
            }
            nonce += 1;
        }
    }

    /// Mines `block` at `difficulty` and returns the solved block.
    pub fn mine(block: Block, difficulty: u32) -> Option<Block> {
        info!(
            "Starting proof-of-work for block {} with difficulty {difficulty}",
            block.get_index()
        );
        let pow = ProofOfWork::new_proof_of_work(block, difficulty);
        let (nonce, hash) = pow.run()?;
        info!("Proof-of-work completed: {hash} (nonce {nonce})");
        Some(pow.block.with_nonce(nonce))
    }
}
