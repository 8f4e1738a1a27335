use crate::core::Block;
use log::info;

/// Derives the proof-of-work target from recent block timestamps.
///
/// The first blocks are mined at `min_difficulty`. Once the chain holds
/// more than `window` blocks, each new block's difficulty is the previous
/// one moved by at most one step, depending on how the average interval of
/// the last `window` blocks compares to `target_block_time`.
#[derive(Debug, Clone)]
pub struct DifficultyEstimator {
    min_difficulty: u32,
    max_difficulty: u32,
    window: usize,
    target_block_time: u64, // seconds
}

impl DifficultyEstimator {
    pub fn new(
        min_difficulty: u32,
        max_difficulty: u32,
        window: usize,
        target_block_time: u64,
    ) -> DifficultyEstimator {
        DifficultyEstimator {
            min_difficulty,
            max_difficulty: max_difficulty.max(min_difficulty),
            window: window.max(1),
            target_block_time: target_block_time.max(1),
        }
    }

    /// Difficulty required for the block that would extend `chain`.
    pub fn current(&self, chain: &[Block]) -> u32 {
        let mut difficulty = self.min_difficulty;
        for len in 1..=chain.len() {
            difficulty = self.next_difficulty(&chain[..len], difficulty);
        }
        difficulty
    }

    /// One evaluation step: the difficulty for the block after `chain`,
    /// given that `previous` was required for the chain's last block.
    pub fn next_difficulty(&self, chain: &[Block], previous: u32) -> u32 {
        if chain.len() <= self.window {
            return self.min_difficulty;
        }

        let Some(average) = self.average_block_time(chain) else {
            return previous;
        };
        let target = self.target_block_time as f64;

        let next = if average < target * 0.75 {
            // Blocks are arriving too fast
            previous.saturating_add(1)
        } else if average > target * 1.5 {
            // Blocks are arriving too slowly
            previous.saturating_sub(1)
        } else {
            previous
        };
        let next = next.clamp(self.min_difficulty, self.max_difficulty);

        if next != previous {
            info!(
                "Difficulty adjustment at index {}: {previous} -> {next} (average {average:.1}s, target {}s)",
                chain.len(),
                self.target_block_time
            );
        }
        next
    }

    /// Average interval over the last `window` blocks, in seconds.
    fn average_block_time(&self, chain: &[Block]) -> Option<f64> {
        let last = chain.last()?;
        let first = chain.get(chain.len().checked_sub(self.window + 1)?)?;
        let span = last.get_timestamp().saturating_sub(first.get_timestamp());
        Some(span as f64 / self.window as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain_with_spacing(len: usize, spacing: i64) -> Vec<Block> {
        (0..len)
            .map(|i| Block::new(i as u64, String::new(), vec![], i as i64 * spacing))
            .collect()
    }

    fn estimator() -> DifficultyEstimator {
        DifficultyEstimator::new(2, 8, 10, 60)
    }

    #[test]
    fn test_short_chain_uses_minimum() {
        let chain = chain_with_spacing(10, 1);
        assert_eq!(estimator().current(&chain), 2);
        assert_eq!(estimator().current(&[]), 2);
    }

    #[test]
    fn test_fast_blocks_raise_difficulty_one_step_per_block() {
        // 11 blocks 1s apart: first block past the window steps up once
        let chain = chain_with_spacing(11, 1);
        assert_eq!(estimator().current(&chain), 3);

        let chain = chain_with_spacing(13, 1);
        assert_eq!(estimator().current(&chain), 5);
    }

    #[test]
    fn test_difficulty_is_capped() {
        let chain = chain_with_spacing(40, 1);
        assert_eq!(estimator().current(&chain), 8);
    }

    #[test]
    fn test_on_target_blocks_keep_difficulty() {
        let chain = chain_with_spacing(30, 60);
        assert_eq!(estimator().current(&chain), 2);
        assert_eq!(estimator().next_difficulty(&chain, 5), 5);
    }

    #[test]
    fn test_slow_blocks_lower_difficulty_but_not_below_minimum() {
        let chain = chain_with_spacing(30, 600);
        assert_eq!(estimator().next_difficulty(&chain, 6), 5);
        assert_eq!(estimator().next_difficulty(&chain, 2), 2);
        assert_eq!(estimator().current(&chain), 2);
    }
}
