/// Monetary units of the ledger
///
/// Amounts travel on the wire as decimal coins but are held internally as
/// integer base units, so fee sums and coinbase checks are exact.
///
/// ## Monetary Units
/// - **Unit**: the smallest amount, 0.00000001 coins
/// - **Coin**: 100,000,000 units
/// - **Block Reward**: 10 coins
/// - **Minimum Amount**: 1,000 units (0.00001 coins), applies to amounts and non-zero fees
///
/// Number of base units in one coin
pub const UNITS_PER_COIN: u64 = 100_000_000;

/// Default coinbase reward in units (10 coins)
pub const DEFAULT_BLOCK_REWARD: u64 = 10 * UNITS_PER_COIN;

/// Default minimum transfer amount and minimum non-zero fee (0.00001 coins)
pub const DEFAULT_MIN_AMOUNT: u64 = 1_000;

/// Largest amount, in units, that survives the decimal wire format exactly
/// (about 11.2 million coins)
pub const MAX_WIRE_UNITS: u64 = 1 << 50;

/// Score credited to a block's miner in the ranking
pub const RANKING_SCORE_PER_BLOCK: u64 = 10;

/// Utility functions for monetary conversions
pub mod conversions {
    use super::*;

    /// Convert a decimal coin amount to units. Returns `None` for negative
    /// or non-finite values, for values above `MAX_WIRE_UNITS`, and for
    /// values that are not a whole number of units (0.000000004 coins is
    /// not silently rounded to zero).
    pub fn coins_to_units(coins: f64) -> Option<u64> {
        if !coins.is_finite() || coins < 0.0 {
            return None;
        }
        let scaled = coins * UNITS_PER_COIN as f64;
        let units = scaled.round();
        // Allow for the error of the multiplication itself
        let tolerance = (scaled * 4.0 * f64::EPSILON).max(1e-9);
        if (scaled - units).abs() > tolerance || units > MAX_WIRE_UNITS as f64 {
            return None;
        }
        Some(units as u64)
    }

    /// Convert units to a decimal coin amount
    pub fn units_to_coins(units: u64) -> f64 {
        units as f64 / UNITS_PER_COIN as f64
    }

    /// Format units as a human-readable string
    pub fn format_units(units: u64) -> String {
        format!("{:.8} coins", units_to_coins(units))
    }
}

#[cfg(test)]
mod tests {
    use super::conversions::*;
    use super::*;

    #[test]
    fn test_monetary_constants() {
        assert_eq!(DEFAULT_BLOCK_REWARD, 1_000_000_000);
        assert_eq!(units_to_coins(DEFAULT_MIN_AMOUNT), 0.00001);
    }

    #[test]
    fn test_conversions() {
        assert_eq!(coins_to_units(1.0), Some(UNITS_PER_COIN));
        assert_eq!(coins_to_units(0.00001), Some(DEFAULT_MIN_AMOUNT));
        assert_eq!(coins_to_units(0.000005), Some(500));
        // 0.1 + 0.2 is not exactly 0.3 in binary floating point
        assert_eq!(coins_to_units(0.1 + 0.2), Some(30_000_000));
        assert_eq!(coins_to_units(12_345.678_901_23), Some(1_234_567_890_123));

        assert_eq!(coins_to_units(-0.5), None);
        assert_eq!(coins_to_units(f64::NAN), None);
        assert_eq!(coins_to_units(f64::INFINITY), None);

        let original = 1.23456789;
        let units = coins_to_units(original).unwrap();
        assert!((original - units_to_coins(units)).abs() < 0.00000001);
    }

    #[test]
    fn test_fractional_units_are_rejected() {
        // Would round to a zero fee
        assert_eq!(coins_to_units(0.000000004), None);
        // Would round up to the minimum amount
        assert_eq!(coins_to_units(0.000009996), None);
        assert_eq!(coins_to_units(0.000000015), None);
        assert_eq!(coins_to_units(0.00000001), Some(1));
    }

    #[test]
    fn test_wire_range_is_capped() {
        let max_coins = units_to_coins(MAX_WIRE_UNITS);
        assert_eq!(coins_to_units(max_coins), Some(MAX_WIRE_UNITS));
        assert_eq!(coins_to_units(max_coins * 2.0), None);
        assert_eq!(coins_to_units(1e300), None);
    }

    #[test]
    fn test_formatting() {
        assert_eq!(format_units(UNITS_PER_COIN), "1.00000000 coins");
        assert_eq!(format_units(1_000), "0.00001000 coins");
    }
}
