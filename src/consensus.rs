//! Fork resolution: longest valid chain wins.
//!
//! Length is the only criterion. Cumulative work is not compared and peers
//! are not scored, so any valid chain that is strictly longer replaces ours.

use crate::blockchain::{is_valid_chain, Block, Blockchain};
use crate::error::{ChainError, Result};
use serde::Deserialize;
use serde_json::Value;

/// Consensus engine for choosing the authoritative chain among candidates
pub struct Consensus;

impl Consensus {
    /// Decode a candidate chain received from a peer.
    pub fn parse_candidate(value: &Value) -> Result<Vec<Block>> {
        if !value.is_array() {
            return Err(ChainError::MalformedCandidate(format!(
                "expected an array of blocks, got {}",
                json_kind(value)
            )));
        }
        Vec::<Block>::deserialize(value).map_err(|e| ChainError::MalformedCandidate(e.to_string()))
    }

    /// Visit `candidates` in order, adopting each one that is longer than the
    /// current local chain and valid. Returns whether the local chain changed.
    ///
    /// Rejected candidates are skipped silently; a bad peer chain is not an
    /// error for the caller.
    pub fn resolve<I>(ledger: &mut Blockchain, candidates: I) -> bool
    where
        I: IntoIterator<Item = Vec<Block>>,
    {
        let mut replaced = false;

        for (position, candidate) in candidates.into_iter().enumerate() {
            if candidate.len() <= ledger.len() {
                tracing::debug!(
                    "Skipping candidate #{}: length {} does not exceed local length {}",
                    position,
                    candidate.len(),
                    ledger.len()
                );
                continue;
            }

            if !is_valid_chain(&candidate) {
                tracing::debug!("Skipping candidate #{}: chain is invalid", position);
                continue;
            }

            match ledger.replace_chain(candidate) {
                Ok(()) => replaced = true,
                Err(e) => tracing::warn!("Failed to adopt candidate #{}: {}", position, e),
            }
        }

        replaced
    }

    /// Like [`Consensus::resolve`], for candidates that have not been decoded
    /// yet. Malformed candidates are logged and skipped.
    pub fn resolve_raw(ledger: &mut Blockchain, candidates: &[Value]) -> bool {
        let parsed = candidates
            .iter()
            .enumerate()
            .filter_map(|(position, value)| match Self::parse_candidate(value) {
                Ok(chain) => Some(chain),
                Err(e) => {
                    tracing::warn!("Skipping candidate #{}: {}", position, e);
                    None
                }
            });
        Self::resolve(ledger, parsed)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
