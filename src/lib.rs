//! TrinityLedger - an append-only, hash-linked proof-of-work ledger
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Core Ledger
//! - [`blockchain`] - Blocks, hashing, the chain with its pending pool, and chain validation
//! - [`transaction`] - Transaction type and canonical encoding
//!
//! ## Consensus & Mining
//! - [`miner`] - Proof-of-work search and verification
//! - [`consensus`] - Longest-valid-chain fork resolution
//!
//! ## Node
//! - [`node`] - Concurrent facade used by transport layers
//! - [`sync`] - Sources of candidate chains gathered from peers
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types

#![forbid(unsafe_code)]

// ============================================================================
// Core Ledger
// ============================================================================
pub mod blockchain;
pub mod transaction;

// ============================================================================
// Consensus & Mining
// ============================================================================
pub mod consensus;
pub mod miner;

// ============================================================================
// Node
// ============================================================================
pub mod node;
pub mod sync;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;
