// crates/atoll-registry/src/validator.rs
//
// Validator directory records: configuration, aggregate state, pool
// directory, and node/pool placement.
//
// Validators are append-only (never deleted); sunsetting only disables new
// stake after a configured round. Aggregate counters are derived values but
// stored for O(1) reads; the registry keeps them in lockstep with the pool
// ledgers.

use serde::{Deserialize, Serialize};

use atoll_core::{Account, AtollError, MicroAlgo, ProtocolConstraints, PCT_SCALE};

use crate::gating::GatingSpec;

/// Compound identity of a pool: validator id, 1-based pool id, and the pool
/// account's app id on the host ledger. All three must agree with the
/// registry record or the operation is treated as possible spoofing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidatorPoolKey {
    pub validator_id: u64,
    /// 1-based pool id within the validator.
    pub pool_id: u64,
    pub pool_app_id: u64,
}

/// A validator's configuration.
///
/// Owner-only vs manager-editable fields differ per field; the registry's
/// `change_*` operations enforce the gating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Epoch length in rounds. Rewards are settled once per epoch per pool.
    pub epoch_round_length: u64,
    /// Validator commission, 4-decimal fixed point (10,000 = 1%).
    pub percent_to_validator: u64,
    /// Where commission is paid. Required whenever the commission is nonzero.
    pub validator_commission_address: Option<Account>,
    /// Minimum first-time deposit for a staker new to this validator.
    pub min_entry_stake: MicroAlgo,
    /// Stake cap per pool; `None` uses the protocol default.
    pub max_algo_per_pool: Option<MicroAlgo>,
    /// Pools the validator may run per node.
    pub pools_per_node: u64,
    /// Entry-gating rule stakers must satisfy.
    pub entry_gating: GatingSpec,
    /// Optional secondary reward token distributed each epoch.
    pub reward_token_id: Option<u64>,
    /// Reward-token units paid out per epoch across all pools.
    pub reward_per_payout: u64,
    /// Name-service app id for validator info, if any.
    pub nfd_app_id: Option<u64>,
    /// Round after which new stake is refused.
    pub sunsetting_on: Option<u64>,
    /// Validator id stakers are encouraged to migrate to, if any.
    pub sunsetting_to: Option<u64>,
}

impl ValidatorConfig {
    /// Validate this configuration against the protocol constraints.
    ///
    /// # Errors
    /// Returns `AtollError::Validation` naming the offending field.
    pub fn validate(&self, constraints: &ProtocolConstraints) -> Result<(), AtollError> {
        if self.epoch_round_length < constraints.min_epoch_round_length
            || self.epoch_round_length > constraints.max_epoch_round_length
        {
            return Err(AtollError::Validation(format!(
                "Epoch round length {} outside [{}, {}]",
                self.epoch_round_length,
                constraints.min_epoch_round_length,
                constraints.max_epoch_round_length
            )));
        }
        if self.percent_to_validator < constraints.min_pct_to_validator
            || self.percent_to_validator > constraints.max_pct_to_validator
        {
            return Err(AtollError::Validation(format!(
                "Commission {} outside [{}, {}] (fixed point, {} = 100%)",
                self.percent_to_validator,
                constraints.min_pct_to_validator,
                constraints.max_pct_to_validator,
                PCT_SCALE
            )));
        }
        if self.percent_to_validator > 0 && self.validator_commission_address.is_none() {
            return Err(AtollError::Validation(
                "Nonzero commission requires a commission address".to_string(),
            ));
        }
        if self.min_entry_stake < constraints.min_entry_stake_floor {
            return Err(AtollError::Validation(format!(
                "Minimum entry stake {} below the protocol floor of {}",
                self.min_entry_stake, constraints.min_entry_stake_floor
            )));
        }
        if let Some(cap) = self.max_algo_per_pool {
            if cap > constraints.max_algo_per_pool_ceiling {
                return Err(AtollError::Validation(format!(
                    "Pool cap {} above the protocol ceiling of {}",
                    cap, constraints.max_algo_per_pool_ceiling
                )));
            }
        }
        if self.pools_per_node == 0 || self.pools_per_node > constraints.max_pools_per_node {
            return Err(AtollError::Validation(format!(
                "Pools per node {} outside (0, {}]",
                self.pools_per_node, constraints.max_pools_per_node
            )));
        }
        if let GatingSpec::AssetId { asset_ids, .. } = &self.entry_gating {
            if asset_ids.is_empty() || asset_ids.len() > constraints.max_gating_assets {
                return Err(AtollError::Validation(format!(
                    "Gating asset list must hold 1..={} ids",
                    constraints.max_gating_assets
                )));
            }
        }
        if self.reward_per_payout > 0 && self.reward_token_id.is_none() {
            return Err(AtollError::Validation(
                "Reward payout configured without a reward token".to_string(),
            ));
        }
        Ok(())
    }

    /// The pool stake cap in effect: configured value or protocol default.
    pub fn pool_cap(&self, constraints: &ProtocolConstraints) -> MicroAlgo {
        self.max_algo_per_pool
            .unwrap_or(constraints.default_max_algo_per_pool)
    }

    /// Ceiling on this validator's pool count: node layout limit, clamped by
    /// the protocol's hard cap.
    pub fn max_pools(&self, constraints: &ProtocolConstraints) -> u64 {
        (constraints.max_nodes * self.pools_per_node).min(constraints.max_pools_per_validator)
    }
}

/// A validator's aggregate state. Derived from the pool ledgers but stored
/// for O(1) reads; conservation across the two is a protocol invariant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorState {
    /// Number of pools the validator runs.
    pub num_pools: u64,
    /// Distinct stakers with at least one live membership for this validator.
    pub total_stakers: u64,
    /// Sum of staked microalgo across all of the validator's pools.
    pub total_algo_staked: MicroAlgo,
    /// Reward-token units credited to stakers but not yet claimed.
    pub reward_token_held_back: u64,
}

/// Aggregate record for one pool; index in the validator's directory is
/// `pool_id - 1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolInfo {
    pub pool_app_id: u64,
    pub total_stakers: u64,
    pub total_algo_staked: MicroAlgo,
}

/// Each pool's 4-decimal share of the validator's whole stake, stamped with
/// the round of the epoch it was computed for. Computed once per epoch by
/// the designated pool (pool 1) and read by the others.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolTokenPayoutRatio {
    /// `pool_pct_of_whole[pool_id - 1]`, fixed point (`PCT_SCALE` = 100%).
    pub pool_pct_of_whole: Vec<u64>,
    /// Round at which the ratio was computed.
    pub updated_for_payout: u64,
}

/// Which node hosts which pools. A pool appears in exactly one node's list;
/// per-node capacity is the validator's `pools_per_node`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodePoolAssignment {
    /// `nodes[node - 1]` lists the pool app ids placed on that node.
    pub nodes: Vec<Vec<u64>>,
}

impl NodePoolAssignment {
    pub fn new(max_nodes: u64) -> Self {
        Self {
            nodes: vec![Vec::new(); max_nodes as usize],
        }
    }

    /// Place a pool on a 1-based node number.
    ///
    /// # Errors
    /// - `AtollError::Validation` for an out-of-range node number.
    /// - `AtollError::Capacity` when the node already hosts `pools_per_node`
    ///   pools.
    pub fn place_pool(
        &mut self,
        node_num: u64,
        pool_app_id: u64,
        pools_per_node: u64,
    ) -> Result<(), AtollError> {
        let node = self
            .nodes
            .get_mut(node_num.wrapping_sub(1) as usize)
            .ok_or_else(|| {
                AtollError::Validation(format!("Node number {} out of range", node_num))
            })?;
        if node.len() as u64 >= pools_per_node {
            return Err(AtollError::Capacity(format!(
                "Node {} already hosts {} pools",
                node_num, pools_per_node
            )));
        }
        node.push(pool_app_id);
        Ok(())
    }
}

/// One validator directory entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Validator {
    /// Sequential id, assigned from 1 by the registry. Append-only.
    pub id: u64,
    /// Owns the validator entry; gates the sensitive config changes.
    pub owner: Account,
    /// Day-to-day operator; may add pools and trigger epoch settlement.
    pub manager: Account,
    pub config: ValidatorConfig,
    pub state: ValidatorState,
    /// Pool directory, `pools[pool_id - 1]`.
    pub pools: Vec<PoolInfo>,
    pub node_assignment: NodePoolAssignment,
    /// Reward-token payout ratio for the epoch in flight, if computed.
    pub token_payout_ratio: Option<PoolTokenPayoutRatio>,
}

impl Validator {
    /// Resolve a claimed pool key against this record.
    ///
    /// # Errors
    /// - `AtollError::NotFound` for an out-of-range pool id.
    /// - `AtollError::Consistency` when the claimed app id does not match;
    ///   treated as possible spoofing.
    pub fn check_pool_key(&self, key: &ValidatorPoolKey) -> Result<(), AtollError> {
        if key.validator_id != self.id {
            return Err(AtollError::Consistency(format!(
                "Pool key names validator {} but record is {}",
                key.validator_id, self.id
            )));
        }
        let info = self
            .pools
            .get(key.pool_id.wrapping_sub(1) as usize)
            .ok_or_else(|| {
                AtollError::NotFound(format!(
                    "Validator {} has no pool {}",
                    self.id, key.pool_id
                ))
            })?;
        if info.pool_app_id != key.pool_app_id {
            return Err(AtollError::Consistency(format!(
                "Pool {} of validator {} is app {}, claimed {}",
                key.pool_id, self.id, info.pool_app_id, key.pool_app_id
            )));
        }
        Ok(())
    }
}
