use crate::core::monetary::{DEFAULT_BLOCK_REWARD, DEFAULT_MIN_AMOUNT, MAX_WIRE_UNITS};
use crate::core::DifficultyEstimator;
use crate::error::{LedgerError, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const DEFAULT_CHAIN_FILE: &str = "./chain.db";

const CHAIN_FILE_KEY: &str = "UCLCOIN_CHAIN_FILE";
const STORAGE_KEY: &str = "UCLCOIN_STORAGE";
const MIN_DIFFICULTY_KEY: &str = "UCLCOIN_MIN_DIFFICULTY";
const BLOCK_REWARD_KEY: &str = "UCLCOIN_BLOCK_REWARD";

/// Consensus parameters, fixed at ledger construction. Amounts are in
/// base units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainParams {
    pub block_reward: u64,
    pub min_amount: u64,
    pub difficulty_window: usize,
    pub min_difficulty: u32,
    pub max_difficulty: u32,
    pub target_block_time: u64, // seconds
    pub genesis_timestamp: i64,
}

impl Default for ChainParams {
    fn default() -> Self {
        Self {
            block_reward: DEFAULT_BLOCK_REWARD,
            min_amount: DEFAULT_MIN_AMOUNT,
            difficulty_window: 100,
            min_difficulty: 5,
            max_difficulty: 64,
            target_block_time: 60,
            genesis_timestamp: 1_514_764_800, // 2018-01-01T00:00:00Z
        }
    }
}

impl ChainParams {
    pub fn difficulty_estimator(&self) -> DifficultyEstimator {
        DifficultyEstimator::new(
            self.min_difficulty,
            self.max_difficulty,
            self.difficulty_window,
            self.target_block_time,
        )
    }

    pub fn validate(&self) -> Result<()> {
        if self.block_reward == 0 {
            return Err(LedgerError::Config(
                "block_reward must be positive".to_string(),
            ));
        }
        if self.block_reward > MAX_WIRE_UNITS {
            return Err(LedgerError::Config(format!(
                "block_reward must not exceed {MAX_WIRE_UNITS} units"
            )));
        }
        if self.min_amount == 0 {
            return Err(LedgerError::Config(
                "min_amount must be positive".to_string(),
            ));
        }
        if self.difficulty_window == 0 {
            return Err(LedgerError::Config(
                "difficulty_window must be positive".to_string(),
            ));
        }
        // A SHA-256 hex digest has 64 characters
        if self.max_difficulty > 64 || self.min_difficulty > self.max_difficulty {
            return Err(LedgerError::Config(format!(
                "difficulty range [{}, {}] is invalid",
                self.min_difficulty, self.max_difficulty
            )));
        }
        if self.target_block_time == 0 {
            return Err(LedgerError::Config(
                "target_block_time must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Which backend holds the committed chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// One JSON record per line, rewritten atomically
    #[default]
    File,
    /// Sled tree keyed by block index
    Sled,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "file" => Ok(StorageBackend::File),
            "sled" => Ok(StorageBackend::Sled),
            _ => Err(format!("Invalid storage backend: {s}. Valid options: file, sled")),
        }
    }
}

/// Node settings: where the chain lives and the consensus parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub chain_file: PathBuf,
    pub storage: StorageBackend,
    pub params: ChainParams,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            chain_file: PathBuf::from(DEFAULT_CHAIN_FILE),
            storage: StorageBackend::default(),
            params: ChainParams::default(),
        }
    }
}

impl Settings {
    /// Defaults, then the TOML file if given, then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Settings> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => Settings::default(),
        };
        settings.apply_env()?;
        settings.params.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Settings> {
        let text = fs::read_to_string(path).map_err(|e| {
            LedgerError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        let settings = Self::from_toml(&text)?;
        info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn from_toml(text: &str) -> Result<Settings> {
        toml::from_str(text).map_err(|e| LedgerError::Config(format!("Invalid settings: {e}")))
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(path) = env::var(CHAIN_FILE_KEY) {
            self.chain_file = PathBuf::from(path);
        }
        if let Ok(backend) = env::var(STORAGE_KEY) {
            self.storage = backend.parse().map_err(LedgerError::Config)?;
        }
        if let Ok(value) = env::var(MIN_DIFFICULTY_KEY) {
            self.params.min_difficulty = value
                .parse()
                .map_err(|e| LedgerError::Config(format!("{MIN_DIFFICULTY_KEY}: {e}")))?;
        }
        if let Ok(value) = env::var(BLOCK_REWARD_KEY) {
            self.params.block_reward = value
                .parse()
                .map_err(|e| LedgerError::Config(format!("{BLOCK_REWARD_KEY}: {e}")))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params() {
        let params = ChainParams::default();
        assert_eq!(params.block_reward, 1_000_000_000);
        assert_eq!(params.min_amount, 1_000);
        assert_eq!(params.difficulty_window, 100);
        assert_eq!(params.min_difficulty, 5);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings = Settings::from_toml(
            r#"
            chain_file = "/tmp/other.db"
            storage = "sled"

            [params]
            min_difficulty = 2
            "#,
        )
        .unwrap();

        assert_eq!(settings.chain_file, PathBuf::from("/tmp/other.db"));
        assert_eq!(settings.storage, StorageBackend::Sled);
        assert_eq!(settings.params.min_difficulty, 2);
        assert_eq!(settings.params.difficulty_window, 100);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = Settings::from_toml("storage = 3").unwrap_err();
        assert!(matches!(err, LedgerError::Config(_)));
    }

    #[test]
    fn test_invalid_difficulty_range() {
        let params = ChainParams {
            min_difficulty: 10,
            max_difficulty: 4,
            ..ChainParams::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_storage_backend_from_str() {
        assert_eq!("SLED".parse::<StorageBackend>(), Ok(StorageBackend::Sled));
        assert!("redis".parse::<StorageBackend>().is_err());
    }
}
