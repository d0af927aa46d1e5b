//! Candidate-chain sources for fork resolution
//!
//! The ledger never talks to peers itself. Whatever gathers peer chains (an
//! HTTP client, a test fixture, a directory of exported chains) implements
//! [`ChainSource`] and hands the undecoded candidates to the node, which
//! decodes and resolves them.

use crate::blockchain::Block;
use serde_json::Value;
use std::path::PathBuf;

/// Supplier of candidate chains collected from peers.
pub trait ChainSource: Send + Sync {
    /// Return every candidate currently available, in the order they should
    /// be considered. Sources that fail to reach a peer simply omit it.
    fn candidate_chains(&self) -> Vec<Value>;
}

/// Fixed set of candidates, mostly useful in tests.
#[derive(Debug, Clone, Default)]
pub struct StaticChainSource {
    candidates: Vec<Value>,
}

impl StaticChainSource {
    pub fn new(candidates: Vec<Value>) -> Self {
        Self { candidates }
    }

    /// Build from already-decoded chains.
    pub fn from_chains(chains: &[Vec<Block>]) -> Self {
        let candidates = chains
            .iter()
            .filter_map(|chain| match serde_json::to_value(chain) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::warn!("Failed to encode candidate chain: {}", e);
                    None
                }
            })
            .collect();
        Self { candidates }
    }

    pub fn push(&mut self, candidate: Value) {
        self.candidates.push(candidate);
    }
}

impl ChainSource for StaticChainSource {
    fn candidate_chains(&self) -> Vec<Value> {
        self.candidates.clone()
    }
}

/// Reads one exported chain per JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    paths: Vec<PathBuf>,
}

impl JsonFileSource {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }
}

impl ChainSource for JsonFileSource {
    fn candidate_chains(&self) -> Vec<Value> {
        let mut candidates = Vec::with_capacity(self.paths.len());
        for path in &self.paths {
            let contents = match std::fs::read_to_string(path) {
                Ok(contents) => contents,
                Err(e) => {
                    tracing::warn!("Skipping candidate file {}: {}", path.display(), e);
                    continue;
                }
            };
            match serde_json::from_str::<Value>(&contents) {
                Ok(value) => candidates.push(value),
                Err(e) => tracing::warn!("Skipping candidate file {}: invalid JSON: {}", path.display(), e),
            }
        }
        candidates
    }
}
