//! Command-line interface
//!
//! Argument parsing for the `uclcoin` binary.

pub mod commands;

pub use commands::{Command, Opt};
