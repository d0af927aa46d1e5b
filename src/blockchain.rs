// Thin re-export module: implementation is in `blockchain/core.rs`, split into
// chain management, the pending pool and validation.

pub mod core;
pub use self::core::*;
