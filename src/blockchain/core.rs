// core.rs splits responsibilities into submodules: the chain and block
// assembly, the pending pool, and whole-chain validation.
pub mod chain;
pub mod state;
pub mod validation;

pub use chain::*;
pub use state::*;
pub use validation::*;
