// crates/atoll-core/src/constraints.rs
//
// Protocol constraints for the Atoll staking protocol.
// Loaded from a TOML file or populated with protocol defaults.
//
// The fixed capacities here (pools per validator, stakers per pool, pool
// memberships per staker) are protocol-level economic limits, enforced as
// invariants by the registry and pool ledgers.

use serde::Deserialize;
use std::fs;

use crate::error::AtollError;
use crate::token::{MicroAlgo, MICRO_ALGO_PER_ALGO, PCT_SCALE};

/// Storage-cost rate parameters for MBR (minimum balance requirement)
/// estimation: `cost = fixed_per_record + bytes * per_byte`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MbrParams {
    /// Flat cost per stored record, in microalgo.
    #[serde(default = "default_fixed_per_record")]
    pub fixed_per_record: MicroAlgo,

    /// Cost per stored byte, in microalgo.
    #[serde(default = "default_per_byte")]
    pub per_byte: MicroAlgo,
}

/// Protocol-wide constraints and defaults.
///
/// Every field has a protocol default; deployments may override via TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct ProtocolConstraints {
    /// Maximum nodes a validator may assign pools to.
    #[serde(default = "default_max_nodes")]
    pub max_nodes: u64,

    /// Maximum pools a validator may run on a single node.
    #[serde(default = "default_max_pools_per_node")]
    pub max_pools_per_node: u64,

    /// Hard cap on a validator's pool directory, independent of node layout.
    #[serde(default = "default_max_pools_per_validator")]
    pub max_pools_per_validator: u64,

    /// Number of staker slots in each pool's slot table.
    #[serde(default = "default_max_stakers_per_pool")]
    pub max_stakers_per_pool: u64,

    /// Maximum concurrent pool memberships per staker, across all validators.
    #[serde(default = "default_max_pools_per_staker")]
    pub max_pools_per_staker: u64,

    /// Protocol floor for a validator's configured `min_entry_stake`.
    #[serde(default = "default_min_entry_stake_floor")]
    pub min_entry_stake_floor: MicroAlgo,

    /// Protocol ceiling for a validator's configured `max_algo_per_pool`.
    #[serde(default = "default_max_algo_per_pool_ceiling")]
    pub max_algo_per_pool_ceiling: MicroAlgo,

    /// Pool stake cap applied when a validator leaves `max_algo_per_pool` unset.
    #[serde(default = "default_default_max_algo_per_pool")]
    pub default_max_algo_per_pool: MicroAlgo,

    /// Lowest permitted `percent_to_validator` (4-decimal fixed point).
    #[serde(default)]
    pub min_pct_to_validator: u64,

    /// Highest permitted `percent_to_validator` (4-decimal fixed point;
    /// `PCT_SCALE` = 100%).
    #[serde(default = "default_max_pct_to_validator")]
    pub max_pct_to_validator: u64,

    /// Shortest permitted epoch, in rounds.
    #[serde(default = "default_min_epoch_round_length")]
    pub min_epoch_round_length: u64,

    /// Longest permitted epoch, in rounds.
    #[serde(default = "default_max_epoch_round_length")]
    pub max_epoch_round_length: u64,

    /// Maximum asset ids a validator may list in an asset-id gating rule.
    #[serde(default = "default_max_gating_assets")]
    pub max_gating_assets: usize,

    /// Base minimum balance of any account on the host ledger, in microalgo.
    #[serde(default = "default_account_base_mbr")]
    pub account_base_mbr: MicroAlgo,

    /// Storage-cost rates for MBR estimation.
    #[serde(default = "default_mbr_params")]
    pub mbr: MbrParams,
}

fn default_max_nodes() -> u64 {
    12
}

fn default_max_pools_per_node() -> u64 {
    6
}

fn default_max_pools_per_validator() -> u64 {
    24
}

fn default_max_stakers_per_pool() -> u64 {
    100
}

fn default_max_pools_per_staker() -> u64 {
    6
}

fn default_min_entry_stake_floor() -> MicroAlgo {
    MICRO_ALGO_PER_ALGO // 1 ALGO
}

fn default_max_algo_per_pool_ceiling() -> MicroAlgo {
    70_000_000 * MICRO_ALGO_PER_ALGO
}

fn default_default_max_algo_per_pool() -> MicroAlgo {
    70_000_000 * MICRO_ALGO_PER_ALGO
}

fn default_max_pct_to_validator() -> u64 {
    PCT_SCALE // 100%
}

fn default_min_epoch_round_length() -> u64 {
    1
}

fn default_max_epoch_round_length() -> u64 {
    1_000_000
}

fn default_max_gating_assets() -> usize {
    4
}

fn default_account_base_mbr() -> MicroAlgo {
    100_000
}

fn default_fixed_per_record() -> MicroAlgo {
    2_500
}

fn default_per_byte() -> MicroAlgo {
    400
}

fn default_mbr_params() -> MbrParams {
    MbrParams {
        fixed_per_record: default_fixed_per_record(),
        per_byte: default_per_byte(),
    }
}

impl Default for MbrParams {
    fn default() -> Self {
        default_mbr_params()
    }
}

impl Default for ProtocolConstraints {
    fn default() -> Self {
        Self {
            max_nodes: default_max_nodes(),
            max_pools_per_node: default_max_pools_per_node(),
            max_pools_per_validator: default_max_pools_per_validator(),
            max_stakers_per_pool: default_max_stakers_per_pool(),
            max_pools_per_staker: default_max_pools_per_staker(),
            min_entry_stake_floor: default_min_entry_stake_floor(),
            max_algo_per_pool_ceiling: default_max_algo_per_pool_ceiling(),
            default_max_algo_per_pool: default_default_max_algo_per_pool(),
            min_pct_to_validator: 0,
            max_pct_to_validator: default_max_pct_to_validator(),
            min_epoch_round_length: default_min_epoch_round_length(),
            max_epoch_round_length: default_max_epoch_round_length(),
            max_gating_assets: default_max_gating_assets(),
            account_base_mbr: default_account_base_mbr(),
            mbr: default_mbr_params(),
        }
    }
}

impl ProtocolConstraints {
    /// Load constraints from a TOML file at the given path.
    ///
    /// # Errors
    /// Returns `AtollError::Validation` if the file cannot be read or parsed.
    pub fn load(path: &str) -> Result<Self, AtollError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| AtollError::Validation(format!("Cannot read constraints file: {}", e)))?;
        toml::from_str(&contents)
            .map_err(|e| AtollError::Validation(format!("Cannot parse constraints file: {}", e)))
    }
}
