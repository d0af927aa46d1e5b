//! Error types for the ledger core

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChainError {
    /// An operation that needs a tip ran against a chain without a genesis block.
    #[error("Chain is empty: genesis block was never initialized")]
    EmptyChain,
    #[error("Malformed candidate chain: {0}")]
    MalformedCandidate(String),
    #[error("Invalid block linkage: expected previous hash {expected}, got {found}")]
    InvalidBlockLinkage { expected: String, found: String },
    #[error("Invalid proof of work")]
    InvalidProofOfWork,
    #[error("Invalid block: {0}")]
    InvalidBlock(String),
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),
    #[error("Mining cancelled")]
    MiningCancelled,
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for ChainError {
    fn from(err: std::io::Error) -> Self {
        ChainError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for ChainError {
    fn from(err: serde_json::Error) -> Self {
        ChainError::SerializationError(err.to_string())
    }
}

impl From<toml::de::Error> for ChainError {
    fn from(err: toml::de::Error) -> Self {
        ChainError::ConfigError(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ChainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_conversion() {
        let err: ChainError = std::io::Error::new(std::io::ErrorKind::NotFound, "missing").into();
        assert!(matches!(err, ChainError::IoError(ref msg) if msg.contains("missing")));
    }

    #[test]
    fn test_display_includes_linkage_hashes() {
        let err = ChainError::InvalidBlockLinkage {
            expected: "aa".to_string(),
            found: "bb".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("aa"));
        assert!(msg.contains("bb"));
    }
}
