//! Test helpers shared by the unit tests
//!
//! Easy consensus parameters, deterministic addresses and a local miner.

pub mod test_utils;

pub use test_utils::*;
