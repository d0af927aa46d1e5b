//! Integration tests for the ledger core: assembly, validation and fork
//! resolution driven from genesis.

use trinityledger::blockchain::{
    is_valid_chain, validate_chain, Block, Blockchain, GENESIS_PREVIOUS_HASH,
};
use trinityledger::consensus::Consensus;
use trinityledger::error::ChainError;
use trinityledger::miner::{find_proof, is_valid_proof};
use trinityledger::transaction::Transaction;

/// Helper to mine the next block on `chain`
fn mine(chain: &mut Blockchain) -> Result<Block, ChainError> {
    let proof = find_proof(chain.tip()?.proof);
    let previous_hash = chain.tip()?.hash();
    chain.assemble_block(proof, Some(previous_hash))
}

/// Helper to build a valid chain of `length` blocks
fn build_chain(length: usize) -> Result<Vec<Block>, ChainError> {
    let mut chain = Blockchain::new();
    while chain.len() < length {
        chain.submit_transaction("0", format!("miner-{}", chain.len()), 1.0)?;
        mine(&mut chain)?;
    }
    Ok(chain.blocks().to_vec())
}

fn invalid_proof_after(previous_proof: u64, start: u64) -> u64 {
    (start..).find(|p| !is_valid_proof(previous_proof, *p)).unwrap_or(start)
}

#[test]
fn test_fresh_ledger_holds_only_genesis() -> Result<(), Box<dyn std::error::Error>> {
    let chain = Blockchain::new();
    assert_eq!(chain.len(), 1);

    let genesis = chain.tip()?;
    assert_eq!(genesis.index, 1);
    assert_eq!(genesis.proof, 0);
    assert_eq!(genesis.previous_hash, GENESIS_PREVIOUS_HASH);
    Ok(())
}

#[test]
fn test_submit_mine_submit_scenario() -> Result<(), Box<dyn std::error::Error>> {
    let mut chain = Blockchain::new();
    let genesis_hash = chain.tip()?.hash();

    assert_eq!(chain.submit_transaction("0", "alice", 1.0)?, 2);

    let block = mine(&mut chain)?;
    assert_eq!(block.index, 2);
    assert_eq!(block.transactions, vec![Transaction::new("0", "alice", 1.0)]);
    assert_eq!(block.previous_hash, genesis_hash);
    assert!(chain.pending().is_empty());

    assert_eq!(chain.submit_transaction("alice", "bob", 0.5)?, 3);
    Ok(())
}

#[test]
fn test_every_found_proof_is_valid() {
    for previous in [0u64, 1, 2, 100, 12_345, u64::MAX / 3] {
        assert!(is_valid_proof(previous, find_proof(previous)));
    }
}

#[test]
fn test_chain_built_from_genesis_is_valid() -> Result<(), Box<dyn std::error::Error>> {
    let chain = build_chain(5)?;
    assert_eq!(chain.len(), 5);
    assert!(is_valid_chain(&chain));
    for (position, block) in chain.iter().enumerate() {
        assert_eq!(block.index, position as u64 + 1);
    }
    Ok(())
}

#[test]
fn test_chain_is_valid_after_json_export() -> Result<(), Box<dyn std::error::Error>> {
    let chain = build_chain(3)?;
    let exported = serde_json::to_string(&chain)?;
    let imported: Vec<Block> = serde_json::from_str(&exported)?;
    assert!(is_valid_chain(&imported));
    Ok(())
}

#[test]
fn test_mutating_committed_blocks_invalidates_chain() -> Result<(), Box<dyn std::error::Error>> {
    let chain = build_chain(4)?;

    for position in 1..chain.len() {
        let mut tampered = chain.clone();
        tampered[position].proof = invalid_proof_after(tampered[position - 1].proof, tampered[position].proof + 1);
        assert!(!is_valid_chain(&tampered), "proof at {}", position);

        let mut tampered = chain.clone();
        tampered[position].previous_hash = "a".repeat(64);
        assert!(!is_valid_chain(&tampered), "previous_hash at {}", position);

        let mut tampered = chain.clone();
        tampered[position].index += 1;
        assert!(!is_valid_chain(&tampered), "index at {}", position);
    }
    Ok(())
}

/// The validator enforces `block.index == previous.index + 1`. A reversed
/// comparison (`previous.index > block.index`) would reject every chain longer
/// than genesis, so this direction is pinned down explicitly.
#[test]
fn test_index_check_requires_increase() -> Result<(), Box<dyn std::error::Error>> {
    let chain = build_chain(3)?;
    assert!(validate_chain(&chain).is_ok());

    let mut reversed = chain.clone();
    reversed[1].index = 0;
    reversed[2].previous_hash = reversed[1].hash();
    assert!(matches!(validate_chain(&reversed), Err(ChainError::InvalidBlock(_))));
    Ok(())
}

#[test]
fn test_resolve_never_shortens_local_chain() -> Result<(), Box<dyn std::error::Error>> {
    let mut local = Blockchain::new();
    local.replace_chain(build_chain(3)?)?;
    let before = local.blocks().to_vec();

    let replaced = Consensus::resolve(&mut local, vec![build_chain(2)?, build_chain(1)?]);
    assert!(!replaced);
    assert_eq!(local.blocks(), before.as_slice());
    Ok(())
}

#[test]
fn test_resolve_picks_longest_in_either_order() -> Result<(), Box<dyn std::error::Error>> {
    let len2 = build_chain(2)?;
    let len3 = build_chain(3)?;

    let mut local = Blockchain::new();
    assert!(Consensus::resolve(&mut local, vec![len2.clone(), len3.clone()]));
    assert_eq!(local.blocks(), len3.as_slice());

    let mut local = Blockchain::new();
    assert!(Consensus::resolve(&mut local, vec![len3.clone(), len2]));
    assert_eq!(local.blocks(), len3.as_slice());
    Ok(())
}

#[test]
fn test_resolve_rejects_chain_with_bad_proof_at_position_three() -> Result<(), Box<dyn std::error::Error>> {
    let mut candidate = build_chain(5)?;

    // Break the proof of the third block, then relink the blocks after it so
    // the proof is the only thing wrong with the chain.
    candidate[2].proof = invalid_proof_after(candidate[1].proof, candidate[2].proof + 1);
    for position in 3..candidate.len() {
        candidate[position].previous_hash = candidate[position - 1].hash();
    }
    assert_eq!(validate_chain(&candidate), Err(ChainError::InvalidProofOfWork));

    let mut local = Blockchain::new();
    let before = local.blocks().to_vec();
    assert!(!Consensus::resolve(&mut local, vec![candidate]));
    assert_eq!(local.blocks(), before.as_slice());
    Ok(())
}

#[test]
fn test_mining_continues_on_adopted_chain() -> Result<(), Box<dyn std::error::Error>> {
    let mut local = Blockchain::new();
    assert!(Consensus::resolve(&mut local, vec![build_chain(3)?]));

    local.submit_transaction("carol", "dave", 4.0)?;
    let block = mine(&mut local)?;
    assert_eq!(block.index, 4);
    assert!(is_valid_chain(local.blocks()));
    Ok(())
}
