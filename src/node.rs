//! Node facade over the ledger core
//!
//! This is the surface a transport layer calls into. It owns the ledger behind
//! a single `RwLock`, which is the one mutation domain: transaction
//! submission, block assembly and chain replacement take it exclusively,
//! while chain reads take it shared and return owned snapshots.
//!
//! Proof-of-work search holds no lock. It runs on a blocking worker against
//! the tip proof read at the start; the write lock is only taken to seal the
//! block, and if the tip moved in the meantime the search starts over.

use crate::blockchain::{Block, Blockchain};
use crate::config::{Config, MinerConfig};
use crate::consensus::Consensus;
use crate::error::{ChainError, Result};
use crate::miner;
use crate::sync::ChainSource;
use crate::transaction::Transaction;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

type SearchRegistry = Arc<Mutex<Vec<Arc<AtomicBool>>>>;

#[derive(Clone)]
pub struct Node {
    identifier: String,
    miner: MinerConfig,
    blockchain: Arc<RwLock<Blockchain>>,
    searches: SearchRegistry,
    blocks_mined: Arc<AtomicU64>,
}

/// Registers a running proof search so `cancel_mining` can reach it.
///
/// Dropping the guard stops the search, which also covers a `mine` future
/// that is dropped before the worker finishes.
struct SearchGuard {
    registry: SearchRegistry,
    flag: Arc<AtomicBool>,
}

impl SearchGuard {
    fn register(registry: &SearchRegistry) -> Self {
        let flag = Arc::new(AtomicBool::new(false));
        registry.lock().push(flag.clone());
        Self {
            registry: registry.clone(),
            flag,
        }
    }
}

impl Drop for SearchGuard {
    fn drop(&mut self) {
        self.flag.store(true, Ordering::Relaxed);
        self.registry.lock().retain(|f| !Arc::ptr_eq(f, &self.flag));
    }
}

impl Node {
    /// Create a node with a fresh ledger.
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_blockchain(config, Blockchain::new())
    }

    /// Create a node around an existing ledger. The configuration is
    /// validated up front so the mining reward can always be sealed.
    pub fn with_blockchain(config: &Config, blockchain: Blockchain) -> Result<Self> {
        config.validate()?;

        let identifier = config
            .node
            .identifier
            .clone()
            .unwrap_or_else(|| hex::encode(rand::random::<[u8; 8]>()));
        info!("Node {} started with a chain of {} block(s)", identifier, blockchain.len());

        Ok(Self {
            identifier,
            miner: config.miner.clone(),
            blockchain: Arc::new(RwLock::new(blockchain)),
            searches: Arc::new(Mutex::new(Vec::new())),
            blocks_mined: Arc::new(AtomicU64::new(0)),
        })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Number of blocks this node has sealed itself.
    pub fn blocks_mined(&self) -> u64 {
        self.blocks_mined.load(Ordering::Relaxed)
    }

    pub fn is_mining(&self) -> bool {
        !self.searches.lock().is_empty()
    }

    pub async fn submit_transaction(
        &self,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: f64,
    ) -> Result<u64> {
        self.blockchain
            .write()
            .await
            .submit_transaction(sender, recipient, amount)
    }

    /// Snapshot of the full chain.
    pub async fn chain(&self) -> Vec<Block> {
        self.blockchain.read().await.blocks().to_vec()
    }

    pub async fn chain_len(&self) -> usize {
        self.blockchain.read().await.len()
    }

    pub async fn tip(&self) -> Result<Block> {
        self.blockchain.read().await.tip().cloned()
    }

    pub async fn pending_transactions(&self) -> Vec<Transaction> {
        self.blockchain.read().await.pending().transactions().to_vec()
    }

    /// Mine a block on top of the current tip and return it.
    ///
    /// The block carries everything pending at sealing time followed by the
    /// reward transaction for this node. Fails only with
    /// [`ChainError::MiningCancelled`] when [`Node::cancel_mining`] interrupts
    /// the search.
    pub async fn mine(&self) -> Result<Block> {
        let guard = SearchGuard::register(&self.searches);

        loop {
            let (previous_proof, previous_hash) = {
                let chain = self.blockchain.read().await;
                let tip = chain.tip()?;
                (tip.proof, tip.hash())
            };

            let proof = self.search(previous_proof, guard.flag.clone()).await?;

            let mut chain = self.blockchain.write().await;
            if chain.tip()?.hash() != previous_hash {
                debug!("Tip moved during proof search; restarting");
                continue;
            }

            chain.submit_transaction(
                self.miner.reward_sender.clone(),
                self.identifier.clone(),
                self.miner.reward_amount,
            )?;
            let block = chain.assemble_block(proof, Some(previous_hash))?;
            self.blocks_mined.fetch_add(1, Ordering::Relaxed);
            return Ok(block);
        }
    }

    async fn search(&self, previous_proof: u64, cancel: Arc<AtomicBool>) -> Result<u64> {
        let parallel = self.miner.threads > 1;
        let found = tokio::task::spawn_blocking(move || {
            if parallel {
                miner::find_proof_parallel(previous_proof, &cancel)
            } else {
                miner::find_proof_cancellable(previous_proof, &cancel)
            }
        })
        .await
        .map_err(|e| ChainError::Internal(format!("Proof search task failed: {}", e)))?;

        found.ok_or(ChainError::MiningCancelled)
    }

    /// Stop every proof search currently running on this node.
    pub fn cancel_mining(&self) {
        let searches = self.searches.lock();
        for flag in searches.iter() {
            flag.store(true, Ordering::Relaxed);
        }
        if !searches.is_empty() {
            info!("Cancelled {} running proof search(es)", searches.len());
        }
    }

    /// Run fork resolution over undecoded candidate chains. Returns whether
    /// the local chain was replaced.
    pub async fn resolve(&self, candidates: &[Value]) -> bool {
        let mut chain = self.blockchain.write().await;
        Consensus::resolve_raw(&mut chain, candidates)
    }

    pub async fn resolve_chains(&self, candidates: Vec<Vec<Block>>) -> bool {
        let mut chain = self.blockchain.write().await;
        Consensus::resolve(&mut chain, candidates)
    }

    /// Collect candidates from `source` without holding the ledger lock, then
    /// resolve them.
    pub async fn resolve_from(&self, source: Arc<dyn ChainSource>) -> Result<bool> {
        let candidates = tokio::task::spawn_blocking(move || source.candidate_chains())
            .await
            .map_err(|e| ChainError::Internal(format!("Chain source task failed: {}", e)))?;
        debug!("Collected {} candidate chain(s)", candidates.len());
        Ok(self.resolve(&candidates).await)
    }
}
