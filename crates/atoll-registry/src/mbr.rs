// crates/atoll-registry/src/mbr.rs
//
// MBR (minimum balance requirement) estimation for growth operations.
//
// Pure functions, linear in record byte size:
//   cost = fixed_per_record + bytes * per_byte
// The rates are protocol parameters (`ProtocolConstraints.mbr`), not
// hardcoded business rules; the byte sizes below describe the persisted
// record layouts.

use serde::{Deserialize, Serialize};

use atoll_core::{MicroAlgo, ProtocolConstraints};

/// Serialized size of one staker slot (account 32 + balance 8 +
/// total_rewarded 8 + reward_token_balance 8 + entry_round 8).
pub const STAKED_INFO_BYTES: u64 = 64;

/// Serialized size of one pool membership key (validator id 8 + pool id 8 +
/// pool app id 8).
pub const VALIDATOR_POOL_KEY_BYTES: u64 = 24;

/// Serialized size of a validator directory record: owner/manager accounts,
/// config, state, and the fixed-capacity pool directory.
pub const VALIDATOR_RECORD_BYTES: u64 = 1_024;

/// Serialized size of a pool's own config record (identity, caps, totals).
pub const POOL_RECORD_BYTES: u64 = 96;

/// The MBR specific to each growth operation, in microalgo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MbrAmounts {
    /// Cost of one validator directory record.
    pub add_validator_mbr: MicroAlgo,
    /// Cost of a new pool: its account's base minimum balance plus the pool
    /// config record.
    pub add_pool_mbr: MicroAlgo,
    /// Cost of a pool's staker slot table.
    pub pool_init_mbr: MicroAlgo,
    /// Cost of one staker's membership record, withheld from the first
    /// deposit.
    pub add_staker_mbr: MicroAlgo,
}

fn record_cost(constraints: &ProtocolConstraints, bytes: u64) -> MicroAlgo {
    constraints.mbr.fixed_per_record + bytes * constraints.mbr.per_byte
}

/// Cost of one validator directory record.
pub fn add_validator_mbr(constraints: &ProtocolConstraints) -> MicroAlgo {
    record_cost(constraints, VALIDATOR_RECORD_BYTES)
}

/// Cost of creating a pool: account base minimum balance plus the pool
/// config record.
pub fn add_pool_mbr(constraints: &ProtocolConstraints) -> MicroAlgo {
    constraints.account_base_mbr + record_cost(constraints, POOL_RECORD_BYTES)
}

/// Cost of a pool's staker slot table.
pub fn pool_init_mbr(constraints: &ProtocolConstraints) -> MicroAlgo {
    record_cost(
        constraints,
        constraints.max_stakers_per_pool * STAKED_INFO_BYTES,
    )
}

/// Cost of one staker's pool membership record.
pub fn add_staker_mbr(constraints: &ProtocolConstraints) -> MicroAlgo {
    record_cost(
        constraints,
        constraints.max_pools_per_staker * VALIDATOR_POOL_KEY_BYTES,
    )
}

/// All four MBR amounts under the given constraints.
pub fn mbr_amounts(constraints: &ProtocolConstraints) -> MbrAmounts {
    MbrAmounts {
        add_validator_mbr: add_validator_mbr(constraints),
        add_pool_mbr: add_pool_mbr(constraints),
        pool_init_mbr: pool_init_mbr(constraints),
        add_staker_mbr: add_staker_mbr(constraints),
    }
}
