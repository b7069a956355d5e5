// crates/atoll-registry/src/lib.rs
//
// atoll-registry: The validator directory and stake orchestration layer of
// the Atoll delegated staking protocol.
//
// The registry owns the validator records and aggregate counters, routes
// deposits to pools through the allocator, tracks per-staker pool
// memberships, enforces entry gating, and drives epoch settlement. Every
// public operation is a single atomic state transition: all fallible checks
// run before the first write.

pub mod allocator;
pub mod gating;
pub mod mbr;
pub mod pool_set;
pub mod registry;
pub mod validator;

// Re-export key types for ergonomic access from downstream code.
pub use allocator::find_pool_for_staker;
pub use gating::{verify_entry_gating, GatingProof, GatingSpec};
pub use mbr::{mbr_amounts, MbrAmounts};
pub use pool_set::StakerPoolSet;
pub use registry::{Payment, StakingRegistry};
pub use validator::{
    NodePoolAssignment, PoolInfo, PoolTokenPayoutRatio, Validator, ValidatorConfig,
    ValidatorPoolKey, ValidatorState,
};
