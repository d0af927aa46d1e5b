//! Configuration management for a ledger node

use crate::error::{ChainError, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

const DEFAULT_CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub node: NodeConfig,
    #[serde(default)]
    pub miner: MinerConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeConfig {
    /// Recipient of mining rewards. A random identifier is generated when unset.
    #[serde(default)]
    pub identifier: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MinerConfig {
    #[serde(default = "default_threads")]
    pub threads: usize,
    #[serde(default = "default_reward_sender")]
    pub reward_sender: String,
    #[serde(default = "default_reward_amount")]
    pub reward_amount: f64,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            threads: default_threads(),
            reward_sender: default_reward_sender(),
            reward_amount: default_reward_amount(),
        }
    }
}

fn default_threads() -> usize {
    1
}

fn default_reward_sender() -> String {
    "0".to_string()
}

fn default_reward_amount() -> f64 {
    1.0
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.miner.threads == 0 {
            return Err(ChainError::ConfigError("miner.threads must be at least 1".to_string()));
        }
        if !self.miner.reward_amount.is_finite() || self.miner.reward_amount < 0.0 {
            return Err(ChainError::ConfigError(format!(
                "miner.reward_amount must be a finite, non-negative number, got {}",
                self.miner.reward_amount
            )));
        }
        if let Some(identifier) = &self.node.identifier {
            if identifier.is_empty() {
                return Err(ChainError::ConfigError("node.identifier must not be empty".to_string()));
            }
        }
        Ok(())
    }
}

/// Load `config.toml` from the working directory, falling back to defaults
/// when it is absent.
pub fn load_config() -> Result<Config> {
    let path = Path::new(DEFAULT_CONFIG_FILE);
    if !path.exists() {
        let config = Config::default();
        config.validate()?;
        return Ok(config);
    }
    load_config_from(path)
}

pub fn load_config_from(path: &Path) -> Result<Config> {
    let config_str = fs::read_to_string(path)
        .map_err(|e| ChainError::ConfigError(format!("Failed to read {}: {}", path.display(), e)))?;
    let config: Config = toml::from_str(&config_str)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.miner.threads, 1);
        assert_eq!(config.miner.reward_sender, "0");
        assert_eq!(config.miner.reward_amount, 1.0);
        assert!(config.node.identifier.is_none());
    }

    #[test]
    fn test_load_partial_file() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::TempDir::new()?;
        let path = dir.path().join("config.toml");
        fs::write(&path, "[node]\nidentifier = \"node-a\"\n\n[miner]\nthreads = 4\n")?;

        let config = load_config_from(&path)?;
        assert_eq!(config.node.identifier.as_deref(), Some("node-a"));
        assert_eq!(config.miner.threads, 4);
        assert_eq!(config.miner.reward_amount, 1.0);
        Ok(())
    }

    #[test]
    fn test_rejects_zero_threads() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::TempDir::new()?;
        let path = dir.path().join("config.toml");
        fs::write(&path, "[miner]\nthreads = 0\n")?;

        assert!(matches!(load_config_from(&path), Err(ChainError::ConfigError(_))));
        Ok(())
    }

    #[test]
    fn test_rejects_malformed_toml() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::TempDir::new()?;
        let path = dir.path().join("config.toml");
        fs::write(&path, "[miner\nthreads = ")?;

        assert!(matches!(load_config_from(&path), Err(ChainError::ConfigError(_))));
        Ok(())
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = load_config_from(Path::new("/nonexistent/trinityledger/config.toml"));
        assert!(matches!(result, Err(ChainError::ConfigError(_))));
    }
}
