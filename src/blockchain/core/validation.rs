use crate::error::ChainError;
use crate::miner::is_valid_proof;

use super::chain::{Block, GENESIS_PREVIOUS_HASH, GENESIS_PROOF};

/// The genesis block is accepted axiomatically as long as it carries the
/// agreed index, proof and predecessor marker. Its timestamp differs per node.
fn validate_genesis(genesis: &Block) -> Result<(), ChainError> {
    if genesis.index != 1 {
        return Err(ChainError::InvalidBlock(format!(
            "Genesis block must have index 1, got {}",
            genesis.index
        )));
    }
    if genesis.proof != GENESIS_PROOF {
        return Err(ChainError::InvalidBlock(format!(
            "Genesis block must have proof {}, got {}",
            GENESIS_PROOF, genesis.proof
        )));
    }
    if genesis.previous_hash != GENESIS_PREVIOUS_HASH {
        return Err(ChainError::InvalidBlock(
            "Genesis block does not carry the genesis predecessor marker".to_string(),
        ));
    }
    Ok(())
}

/// Check `block` against its immediate predecessor.
pub fn validate_link(previous: &Block, block: &Block) -> Result<(), ChainError> {
    // Indices must increase by exactly one.
    if previous.index.checked_add(1) != Some(block.index) {
        return Err(ChainError::InvalidBlock(format!(
            "Invalid block index. Expected {}, but got {}.",
            previous.index.saturating_add(1),
            block.index
        )));
    }

    let expected = previous.hash();
    if block.previous_hash != expected {
        return Err(ChainError::InvalidBlockLinkage {
            expected,
            found: block.previous_hash.clone(),
        });
    }

    if !is_valid_proof(previous.proof, block.proof) {
        return Err(ChainError::InvalidProofOfWork);
    }

    Ok(())
}

/// Walk `chain` from genesis and stop at the first failing block.
pub fn validate_chain(chain: &[Block]) -> Result<(), ChainError> {
    let genesis = chain
        .first()
        .ok_or_else(|| ChainError::InvalidBlock("Chain has no genesis block".to_string()))?;
    validate_genesis(genesis)?;

    for pair in chain.windows(2) {
        validate_link(&pair[0], &pair[1])?;
    }
    Ok(())
}

/// Boolean form of [`validate_chain`]; the reason for rejection is logged.
pub fn is_valid_chain(chain: &[Block]) -> bool {
    match validate_chain(chain) {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!("Rejected chain of {} block(s): {}", chain.len(), e);
            false
        }
    }
}
