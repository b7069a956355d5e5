// crates/atoll-core/src/lib.rs
//
// atoll-core: Core types, errors, protocol constraints, and collaborator
// traits for the Atoll delegated staking protocol.
//
// This is the leaf crate that the pool and registry crates depend on.
// All monetary values are tracked in microalgo (the smallest unit).
// 1 ALGO = 1,000,000 microalgo (10^6).

pub mod constraints;
pub mod error;
pub mod token;
pub mod traits;

// Re-export key types for ergonomic access from downstream crates.
// Usage: `use atoll_core::MicroAlgo;`

pub use constraints::{MbrParams, ProtocolConstraints};
pub use error::AtollError;
pub use token::{Algo, MicroAlgo, MICRO_ALGO_PER_ALGO, PCT_SCALE};
pub use traits::{AssetHoldingOracle, NameService, PoolFactory, ValueTransfer};

/// An opaque ledger address (ed25519 public key bytes on the host chain).
pub type Account = [u8; 32];
