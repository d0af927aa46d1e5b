#![forbid(unsafe_code)]
//! Command-line driver for a local ledger node

use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use trinityledger::blockchain::{validate_chain, Block, Blockchain};
use trinityledger::config::{load_config, load_config_from, Config};
use trinityledger::consensus::Consensus;
use trinityledger::error::ChainError;
use trinityledger::node::Node;
use trinityledger::sync::JsonFileSource;

#[derive(Parser)]
#[command(name = "trinity-ledger", version, about = "Proof-of-work ledger node")]
struct Cli {
    /// Path to a TOML configuration file (defaults to ./config.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Mine blocks on a fresh ledger and print the resulting chain
    Mine {
        /// Number of blocks to mine
        #[arg(short = 'n', long, default_value_t = 1)]
        blocks: u32,
        /// Transaction to submit before mining, as sender:recipient:amount
        #[arg(long = "tx", value_parser = parse_transaction)]
        transactions: Vec<(String, String, f64)>,
    },
    /// Validate an exported chain
    Verify {
        /// JSON file holding an array of blocks
        chain: PathBuf,
    },
    /// Resolve a local chain against candidate chains from peers
    Resolve {
        /// JSON file holding the local chain
        #[arg(long)]
        local: PathBuf,
        /// JSON files holding candidate chains, considered in order
        candidates: Vec<PathBuf>,
    },
}

fn parse_transaction(raw: &str) -> Result<(String, String, f64), String> {
    let parts: Vec<&str> = raw.splitn(3, ':').collect();
    if parts.len() != 3 {
        return Err(format!("expected sender:recipient:amount, got '{}'", raw));
    }
    let amount = parts[2]
        .parse::<f64>()
        .map_err(|e| format!("invalid amount '{}': {}", parts[2], e))?;
    Ok((parts[0].to_string(), parts[1].to_string(), amount))
}

fn read_chain(path: &Path) -> Result<Vec<Block>, ChainError> {
    let contents = std::fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&contents)?;
    Consensus::parse_candidate(&value)
}

async fn mine(config: &Config, blocks: u32, transactions: Vec<(String, String, f64)>) -> Result<(), ChainError> {
    let node = Node::new(config)?;

    for (sender, recipient, amount) in transactions {
        let index = node.submit_transaction(sender, recipient, amount).await?;
        info!("Transaction will be added to block {}", index);
    }

    for _ in 0..blocks {
        let start_time = Instant::now();
        let block = node.mine().await?;
        info!(
            "Mined block #{} in {:.3}s (proof {})",
            block.index,
            start_time.elapsed().as_secs_f64(),
            block.proof
        );
    }

    println!("{}", serde_json::to_string_pretty(&node.chain().await)?);
    Ok(())
}

fn verify(path: &Path) -> Result<bool, ChainError> {
    let chain = read_chain(path)?;
    let outcome = validate_chain(&chain);
    let report = json!({
        "valid": outcome.is_ok(),
        "length": chain.len(),
        "error": outcome.as_ref().err().map(|e| e.to_string()),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(outcome.is_ok())
}

async fn resolve(config: &Config, local: &Path, candidates: Vec<PathBuf>) -> Result<(), ChainError> {
    let local_chain = read_chain(local)?;
    if let Err(e) = validate_chain(&local_chain) {
        warn!("Local chain in {} is not valid: {}", local.display(), e);
    }

    let mut blockchain = Blockchain::new();
    blockchain.replace_chain(local_chain)?;
    let node = Node::with_blockchain(config, blockchain)?;

    let replaced = node.resolve_from(Arc::new(JsonFileSource::new(candidates))).await?;
    let chain = node.chain().await;
    let report = json!({
        "replaced": replaced,
        "length": chain.len(),
        "chain": chain,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };

    if config.miner.threads > 1 {
        if let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(config.miner.threads)
            .build_global()
        {
            warn!("Failed to size the mining thread pool: {}", e);
        }
    }

    match cli.command {
        Command::Mine { blocks, transactions } => mine(&config, blocks, transactions).await?,
        Command::Verify { chain } => {
            if !verify(&chain)? {
                std::process::exit(1);
            }
        }
        Command::Resolve { local, candidates } => resolve(&config, &local, candidates).await?,
    }

    Ok(())
}
