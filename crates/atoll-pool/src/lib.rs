// crates/atoll-pool/src/lib.rs
//
// atoll-pool: The per-pool staking ledger and epoch reward engine for the
// Atoll delegated staking protocol.
//
// A pool is a bounded-capacity slot table of staker balances plus the
// epoch-driven computation that splits harvested yield between validator
// commission and stakers.

pub mod epoch;
pub mod ledger;

// Re-export key types for ergonomic access from the registry crate.
pub use epoch::{eligibility_pct, EpochOutcome, EpochPlan, ShareLine};
pub use ledger::{PoolLedger, StakedInfo};
