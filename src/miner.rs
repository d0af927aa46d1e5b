//! Proof-of-work engine
//!
//! The puzzle binds a block to its predecessor through their proofs: find
//! `proof` such that `sha256("{previous_proof}{proof}")` starts with
//! [`DIFFICULTY`] zero hex characters. Difficulty is fixed.
//!
//! Every search walks candidates upward from zero and returns the smallest
//! valid proof, so the sequential, cancellable and parallel searches all agree.

use rayon::prelude::*;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicBool, Ordering};

/// Number of leading zero hex characters a proof digest must carry.
pub const DIFFICULTY: usize = 4;

/// Candidates handed to rayon per round of the parallel search.
const PARALLEL_BATCH: u64 = 16_384;

/// Digest of the concatenated decimal representations of both proofs.
pub fn proof_digest(previous_proof: u64, proof: u64) -> [u8; 32] {
    let guess = format!("{}{}", previous_proof, proof);
    Sha256::digest(guess.as_bytes()).into()
}

fn leading_zero_nibbles(digest: &[u8]) -> usize {
    let mut count = 0;
    for byte in digest {
        if *byte == 0 {
            count += 2;
            continue;
        }
        if byte >> 4 == 0 {
            count += 1;
        }
        break;
    }
    count
}

/// Check whether `proof` solves the puzzle posed by `previous_proof`.
pub fn is_valid_proof(previous_proof: u64, proof: u64) -> bool {
    leading_zero_nibbles(&proof_digest(previous_proof, proof)) >= DIFFICULTY
}

/// Brute-force the smallest valid proof for `previous_proof`.
///
/// Blocks the calling thread until a solution is found; there is no failure
/// path.
pub fn find_proof(previous_proof: u64) -> u64 {
    let mut proof = 0u64;
    while !is_valid_proof(previous_proof, proof) {
        proof = proof.wrapping_add(1);
    }
    proof
}

/// Like [`find_proof`], but gives up and returns `None` once `cancel` is set.
pub fn find_proof_cancellable(previous_proof: u64, cancel: &AtomicBool) -> Option<u64> {
    let mut proof = 0u64;
    loop {
        if cancel.load(Ordering::Relaxed) {
            tracing::debug!("Proof search for previous proof {} cancelled at {}", previous_proof, proof);
            return None;
        }
        if is_valid_proof(previous_proof, proof) {
            return Some(proof);
        }
        proof = proof.wrapping_add(1);
    }
}

/// Search on the rayon pool in fixed-size batches.
///
/// `find_first` keeps the lowest match within a batch and batches are scanned
/// in order, so the result equals the sequential search. Cancellation is
/// observed between batches.
pub fn find_proof_parallel(previous_proof: u64, cancel: &AtomicBool) -> Option<u64> {
    let mut start = 0u64;
    loop {
        if cancel.load(Ordering::Relaxed) {
            tracing::debug!("Parallel proof search for previous proof {} cancelled at {}", previous_proof, start);
            return None;
        }
        let end = start.saturating_add(PARALLEL_BATCH);
        let found = (start..end)
            .into_par_iter()
            .find_first(|candidate| is_valid_proof(previous_proof, *candidate));
        if found.is_some() {
            return found;
        }
        start = if end == u64::MAX { 0 } else { end };
    }
}
