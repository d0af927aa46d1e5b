use crate::error::{ChainError, Result};
use crate::miner::is_valid_proof;
use crate::transaction::Transaction;
use sha2::{Digest, Sha256};

use super::state::PendingPool;

/// Lowercase hex SHA-256 digest of a block.
pub type BlockHash = String;

/// Proof carried by every genesis block.
pub const GENESIS_PROOF: u64 = 0;

/// Predecessor marker of the genesis block. Not the hash of anything.
pub const GENESIS_PREVIOUS_HASH: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Block {
    /// 1-based position in the chain.
    pub index: u64,
    /// Milliseconds since the Unix epoch at assembly time.
    pub timestamp: u64,
    pub transactions: Vec<Transaction>,
    pub proof: u64,
    pub previous_hash: BlockHash,
}

impl Block {
    pub fn genesis() -> Self {
        Block {
            index: 1,
            timestamp: now_millis(),
            transactions: Vec::new(),
            proof: GENESIS_PROOF,
            previous_hash: GENESIS_PREVIOUS_HASH.to_string(),
        }
    }

    /// SHA-256 over the canonical encoding of every field, timestamp included.
    pub fn hash(&self) -> BlockHash {
        let mut hasher = Sha256::new();
        hasher.update(self.index.to_le_bytes());
        hasher.update(self.timestamp.to_le_bytes());
        hasher.update((self.transactions.len() as u64).to_le_bytes());
        for tx in &self.transactions {
            tx.update_hasher(&mut hasher);
        }
        hasher.update(self.proof.to_le_bytes());
        hasher.update((self.previous_hash.len() as u64).to_le_bytes());
        hasher.update(self.previous_hash.as_bytes());
        hex::encode(hasher.finalize())
    }
}

fn now_millis() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

/// The local ledger: the chain plus the pool of transactions waiting for the
/// next block.
///
/// A `Blockchain` always holds its genesis block from construction on.
/// Mutation goes through `&mut self`, so callers sharing one across tasks wrap
/// it in a lock (see [`crate::node::Node`]).
#[derive(Debug, Clone)]
pub struct Blockchain {
    blocks: Vec<Block>,
    pending: PendingPool,
}

impl Default for Blockchain {
    fn default() -> Self {
        Self::new()
    }
}

impl Blockchain {
    /// Create a ledger holding only a freshly stamped genesis block.
    pub fn new() -> Self {
        Blockchain {
            blocks: vec![Block::genesis()],
            pending: PendingPool::new(),
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn pending(&self) -> &PendingPool {
        &self.pending
    }

    /// Index the next assembled block will carry.
    pub fn next_index(&self) -> u64 {
        self.blocks.len() as u64 + 1
    }

    pub fn tip(&self) -> Result<&Block> {
        self.blocks.last().ok_or(ChainError::EmptyChain)
    }

    /// Queue a transaction for the next block and return that block's index.
    pub fn submit_transaction(
        &mut self,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: f64,
    ) -> Result<u64> {
        let tx = Transaction::new(sender, recipient, amount);
        tx.validate()?;
        self.pending.push(tx);
        Ok(self.next_index())
    }

    /// Seal the pending pool into a new block on top of the current tip.
    ///
    /// `proof` must solve the puzzle posed by the tip's proof. When
    /// `previous_hash` is given it must equal the tip's hash; otherwise the
    /// tip is hashed here.
    pub fn assemble_block(&mut self, proof: u64, previous_hash: Option<BlockHash>) -> Result<Block> {
        let tip = self.tip()?;
        let tip_hash = tip.hash();

        let previous_hash = match previous_hash {
            Some(given) if given != tip_hash => {
                return Err(ChainError::InvalidBlockLinkage {
                    expected: tip_hash,
                    found: given,
                });
            }
            Some(given) => given,
            None => tip_hash,
        };

        if !is_valid_proof(tip.proof, proof) {
            return Err(ChainError::InvalidProofOfWork);
        }

        let block = Block {
            index: self.next_index(),
            timestamp: now_millis(),
            transactions: self.pending.take(),
            proof,
            previous_hash,
        };

        self.blocks.push(block.clone());
        tracing::info!(
            "Assembled block #{} with {} transaction(s), proof {}",
            block.index,
            block.transactions.len(),
            block.proof
        );

        Ok(block)
    }

    /// Swap in `new_chain` wholesale. The pending pool is left untouched.
    ///
    /// No validation happens here; [`crate::consensus::Consensus::resolve`]
    /// only calls this with chains that passed the validator.
    pub fn replace_chain(&mut self, new_chain: Vec<Block>) -> Result<()> {
        if new_chain.is_empty() {
            return Err(ChainError::EmptyChain);
        }
        tracing::info!("Replacing local chain of {} block(s) with {} block(s)", self.blocks.len(), new_chain.len());
        self.blocks = new_chain;
        Ok(())
    }
}
