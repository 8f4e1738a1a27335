use crate::core::monetary::RANKING_SCORE_PER_BLOCK;
use crate::core::Block;
use log::error;
use serde::Serialize;
use std::collections::HashMap;

/// Points per miner: every committed block after genesis credits the
/// destination of its coinbase. Highest score first, ties by address.
pub fn ranking(blocks: &[Block]) -> Vec<(String, u64)> {
    let mut scores: HashMap<&str, u64> = HashMap::new();
    for block in blocks.iter().skip(1) {
        // Admission guarantees a trailing coinbase
        let Some(coinbase) = block.coinbase() else {
            error!("Block #{} has no trailing coinbase", block.get_index());
            continue;
        };
        *scores.entry(coinbase.get_destination()).or_insert(0) += RANKING_SCORE_PER_BLOCK;
    }

    let mut ranking: Vec<(String, u64)> = scores
        .into_iter()
        .map(|(address, score)| (address.to_string(), score))
        .collect();
    ranking.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranking
}

/// Recent inter-block times in seconds
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockTimeStats {
    #[serde(rename = "last001")]
    pub last_001: i64,
    #[serde(rename = "last005")]
    pub last_005: f64,
    #[serde(rename = "last010")]
    pub last_010: f64,
    #[serde(rename = "last050")]
    pub last_050: f64,
    #[serde(rename = "last100")]
    pub last_100: f64,
    #[serde(rename = "lastIndex")]
    pub last_index: u64,
}

const STATS_INTERVALS: usize = 100;

/// Needs at least 101 blocks (100 intervals); `None` otherwise.
pub fn block_time_stats(blocks: &[Block]) -> Option<BlockTimeStats> {
    if blocks.len() < STATS_INTERVALS + 1 {
        return None;
    }
    let recent = &blocks[blocks.len() - STATS_INTERVALS - 1..];
    let intervals: Vec<i64> = recent
        .windows(2)
        .map(|pair| pair[1].get_timestamp().saturating_sub(pair[0].get_timestamp()))
        .collect();

    let average = |n: usize| {
        let tail = &intervals[intervals.len() - n..];
        tail.iter().map(|&t| t as f64).sum::<f64>() / n as f64
    };

    Some(BlockTimeStats {
        last_001: intervals[intervals.len() - 1],
        last_005: average(5),
        last_010: average(10),
        last_050: average(50),
        last_100: average(100),
        last_index: recent[recent.len() - 1].get_index(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Transaction;

    fn addr(n: u8) -> String {
        format!("02{n:02x}{}", "00".repeat(31))
    }

    fn block(index: u64, timestamp: i64, miner: &str) -> Block {
        Block::new(
            index,
            String::new(),
            vec![Transaction::new_coinbase(miner, 1_000, timestamp)],
            timestamp,
        )
    }

    #[test]
    fn test_ranking_counts_coinbase_destinations() {
        let blocks = vec![
            Block::genesis(0),
            block(1, 1, &addr(2)),
            block(2, 2, &addr(1)),
            block(3, 3, &addr(2)),
            block(4, 4, &addr(3)),
        ];

        let ranking = ranking(&blocks);
        assert_eq!(
            ranking,
            vec![(addr(2), 20), (addr(1), 10), (addr(3), 10)]
        );
    }

    #[test]
    fn test_ranking_of_genesis_only_chain_is_empty() {
        assert!(ranking(&[Block::genesis(0)]).is_empty());
    }

    #[test]
    fn test_stats_need_101_blocks() {
        let blocks: Vec<Block> = (0..100).map(|i| block(i, i as i64, &addr(1))).collect();
        assert!(block_time_stats(&blocks).is_none());
    }

    #[test]
    fn test_stats_survive_extreme_timestamps() {
        let mut blocks: Vec<Block> = (0..99).map(|i| block(i, i as i64, &addr(1))).collect();
        blocks.push(block(99, i64::MIN, &addr(1)));
        blocks.push(block(100, i64::MAX, &addr(1)));

        let stats = block_time_stats(&blocks).unwrap();
        assert_eq!(stats.last_001, i64::MAX);
        assert!(stats.last_100.is_finite());
    }

    #[test]
    fn test_stats_averages() {
        // Intervals of 2s, except the last five which take 12s each
        let mut timestamp = 0;
        let mut blocks = vec![];
        for i in 0..101u64 {
            if i > 0 {
                timestamp += if i > 95 { 12 } else { 2 };
            }
            blocks.push(block(i, timestamp, &addr(1)));
        }

        let stats = block_time_stats(&blocks).unwrap();
        assert_eq!(stats.last_001, 12);
        assert_eq!(stats.last_005, 12.0);
        assert_eq!(stats.last_010, 7.0);
        assert_eq!(stats.last_100, 2.5);
        assert_eq!(stats.last_index, 100);
    }
}
