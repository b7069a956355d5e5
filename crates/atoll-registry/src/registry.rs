// crates/atoll-registry/src/registry.rs
//
// The registry ledger: top-level validator directory and the orchestrator
// for stake flows and epoch settlement.
//
// Atomicity model: the host environment commits each public operation
// all-or-nothing, and execution is single-threaded and serializable. Every
// operation here is therefore written validate-then-commit: all fallible
// checks (authorization, gating, allocation, capacity, outbound transfers)
// run before the first state write, so an error can never leave the
// registry aggregates and the pool ledgers out of lockstep.
//
// Funds model: deposits are payments into the registry account; pool
// balances are sub-ledgers of that account, so withdrawals, commission,
// and token claims all pay out from the registry account.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use atoll_core::{
    Account, AssetHoldingOracle, AtollError, MicroAlgo, NameService, PoolFactory,
    ProtocolConstraints, ValueTransfer, PCT_SCALE,
};
use atoll_pool::{EpochOutcome, PoolLedger};

use crate::allocator::find_pool_for_staker;
use crate::gating::{verify_entry_gating, GatingProof};
use crate::mbr::{self, MbrAmounts};
use crate::pool_set::StakerPoolSet;
use crate::validator::{
    NodePoolAssignment, PoolInfo, PoolTokenPayoutRatio, Validator, ValidatorConfig,
    ValidatorPoolKey, ValidatorState,
};

/// A payment accompanying an operation, as observed on the host ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub sender: Account,
    pub receiver: Account,
    pub amount: MicroAlgo,
}

/// The registry ledger.
///
/// Owns the validator directory (ids sequential from 1, append-only), the
/// pool ledgers (keyed by pool app id), and the per-staker pool sets
/// (keyed by staker account).
pub struct StakingRegistry {
    constraints: ProtocolConstraints,
    registry_account: Account,
    /// Monotonic validator id counter; the next id is `next_validator_id + 1`.
    next_validator_id: u64,
    validators: BTreeMap<u64, Validator>,
    pools: BTreeMap<u64, PoolLedger>,
    pool_sets: HashMap<Account, StakerPoolSet>,
}

impl StakingRegistry {
    pub fn new(registry_account: Account, constraints: ProtocolConstraints) -> Self {
        Self {
            constraints,
            registry_account,
            next_validator_id: 0,
            validators: BTreeMap::new(),
            pools: BTreeMap::new(),
            pool_sets: HashMap::new(),
        }
    }

    // -----------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------

    fn validator(&self, id: u64) -> Result<&Validator, AtollError> {
        self.validators
            .get(&id)
            .ok_or_else(|| AtollError::NotFound(format!("No validator {}", id)))
    }

    fn validator_mut(&mut self, id: u64) -> Result<&mut Validator, AtollError> {
        self.validators
            .get_mut(&id)
            .ok_or_else(|| AtollError::NotFound(format!("No validator {}", id)))
    }

    fn require_owner(validator: &Validator, caller: &Account) -> Result<(), AtollError> {
        if validator.owner != *caller {
            return Err(AtollError::Authorization(format!(
                "Caller is not the owner of validator {}",
                validator.id
            )));
        }
        Ok(())
    }

    fn require_owner_or_manager(
        validator: &Validator,
        caller: &Account,
    ) -> Result<(), AtollError> {
        if validator.owner != *caller && validator.manager != *caller {
            return Err(AtollError::Authorization(format!(
                "Caller is neither owner nor manager of validator {}",
                validator.id
            )));
        }
        Ok(())
    }

    fn verify_payment(
        &self,
        caller: &Account,
        payment: &Payment,
        expected: MicroAlgo,
    ) -> Result<(), AtollError> {
        if payment.sender != *caller {
            return Err(AtollError::Validation(
                "Payment sender does not match the caller".to_string(),
            ));
        }
        if payment.receiver != self.registry_account {
            return Err(AtollError::Validation(
                "Payment receiver is not the registry account".to_string(),
            ));
        }
        if payment.amount != expected {
            return Err(AtollError::Validation(format!(
                "Payment of {} does not match the required MBR of {}",
                payment.amount, expected
            )));
        }
        Ok(())
    }

    fn pool_ledger_checked(&self, key: &ValidatorPoolKey) -> Result<&PoolLedger, AtollError> {
        self.pools.get(&key.pool_app_id).ok_or_else(|| {
            AtollError::Consistency(format!("No ledger for pool app {}", key.pool_app_id))
        })
    }

    // -----------------------------------------------------------------
    // Validator directory
    // -----------------------------------------------------------------

    /// Register a new validator. Assigns the next sequential id.
    ///
    /// Requires an exact `add_validator_mbr` payment into the registry
    /// account. When the config names an NFD, its owner must resolve to the
    /// validator's owner.
    pub fn add_validator(
        &mut self,
        caller: Account,
        mbr_payment: &Payment,
        owner: Account,
        manager: Account,
        config: ValidatorConfig,
        name_service: &dyn NameService,
    ) -> Result<u64, AtollError> {
        config.validate(&self.constraints)?;
        self.verify_payment(&caller, mbr_payment, mbr::add_validator_mbr(&self.constraints))?;
        if let Some(nfd_app_id) = config.nfd_app_id {
            if name_service.resolve(nfd_app_id)? != owner {
                return Err(AtollError::Validation(format!(
                    "NFD {} is not owned by the validator owner",
                    nfd_app_id
                )));
            }
        }

        self.next_validator_id += 1;
        let id = self.next_validator_id;
        self.validators.insert(
            id,
            Validator {
                id,
                owner,
                manager,
                config,
                state: ValidatorState::default(),
                pools: Vec::new(),
                node_assignment: NodePoolAssignment::new(self.constraints.max_nodes),
                token_payout_ratio: None,
            },
        );
        tracing::info!(validator_id = id, "Validator registered");
        Ok(id)
    }

    /// Owner-only: replace the validator's manager address.
    pub fn change_manager(
        &mut self,
        caller: Account,
        validator_id: u64,
        new_manager: Account,
    ) -> Result<(), AtollError> {
        let validator = self.validator_mut(validator_id)?;
        Self::require_owner(validator, &caller)?;
        validator.manager = new_manager;
        Ok(())
    }

    /// Owner or manager: point the validator at a different NFD. The NFD
    /// must resolve to the validator's owner.
    pub fn change_nfd(
        &mut self,
        caller: Account,
        validator_id: u64,
        nfd_app_id: u64,
        name_service: &dyn NameService,
    ) -> Result<(), AtollError> {
        let owner = {
            let validator = self.validator(validator_id)?;
            Self::require_owner_or_manager(validator, &caller)?;
            validator.owner
        };
        if name_service.resolve(nfd_app_id)? != owner {
            return Err(AtollError::Validation(format!(
                "NFD {} is not owned by the validator owner",
                nfd_app_id
            )));
        }
        self.validator_mut(validator_id)?.config.nfd_app_id = Some(nfd_app_id);
        Ok(())
    }

    /// Owner-only: replace the commission address.
    pub fn change_commission_address(
        &mut self,
        caller: Account,
        validator_id: u64,
        address: Account,
    ) -> Result<(), AtollError> {
        let validator = self.validator_mut(validator_id)?;
        Self::require_owner(validator, &caller)?;
        validator.config.validator_commission_address = Some(address);
        Ok(())
    }

    /// Owner-only: change reward-token settings. The token itself is
    /// economically committed once any pool exists; only the per-payout
    /// amount may change from then on.
    pub fn change_reward_info(
        &mut self,
        caller: Account,
        validator_id: u64,
        reward_token_id: Option<u64>,
        reward_per_payout: u64,
    ) -> Result<(), AtollError> {
        let validator = self.validator_mut(validator_id)?;
        Self::require_owner(validator, &caller)?;
        if validator.state.num_pools > 0 && reward_token_id != validator.config.reward_token_id {
            return Err(AtollError::Validation(
                "Reward token cannot change once pools exist".to_string(),
            ));
        }
        if reward_per_payout > 0 && reward_token_id.is_none() {
            return Err(AtollError::Validation(
                "Reward payout configured without a reward token".to_string(),
            ));
        }
        validator.config.reward_token_id = reward_token_id;
        validator.config.reward_per_payout = reward_per_payout;
        Ok(())
    }

    /// Owner-only: schedule (or clear) sunsetting. New stake is refused from
    /// round `sunsetting_on`; existing stake is unaffected.
    pub fn change_sunset_info(
        &mut self,
        caller: Account,
        validator_id: u64,
        sunsetting_on: Option<u64>,
        sunsetting_to: Option<u64>,
    ) -> Result<(), AtollError> {
        let validator = self.validator_mut(validator_id)?;
        Self::require_owner(validator, &caller)?;
        validator.config.sunsetting_on = sunsetting_on;
        validator.config.sunsetting_to = sunsetting_to;
        Ok(())
    }

    /// Owner or manager: create a new pool on a 1-based node number.
    ///
    /// Requires an exact `add_pool_mbr + pool_init_mbr` payment. The pool
    /// account itself is deployed by the factory collaborator.
    pub fn add_pool(
        &mut self,
        caller: Account,
        validator_id: u64,
        node_num: u64,
        mbr_payment: &Payment,
        factory: &mut dyn PoolFactory,
    ) -> Result<ValidatorPoolKey, AtollError> {
        let expected = mbr::add_pool_mbr(&self.constraints) + mbr::pool_init_mbr(&self.constraints);
        self.verify_payment(&caller, mbr_payment, expected)?;

        let (pool_id, min_entry_stake, pool_cap, pools_per_node) = {
            let validator = self.validator(validator_id)?;
            Self::require_owner_or_manager(validator, &caller)?;

            if validator.state.num_pools >= validator.config.max_pools(&self.constraints) {
                return Err(AtollError::Capacity(format!(
                    "Validator {} already runs its maximum of {} pools",
                    validator_id,
                    validator.config.max_pools(&self.constraints)
                )));
            }
            let node = validator
                .node_assignment
                .nodes
                .get(node_num.wrapping_sub(1) as usize)
                .ok_or_else(|| {
                    AtollError::Validation(format!("Node number {} out of range", node_num))
                })?;
            if node.len() as u64 >= validator.config.pools_per_node {
                return Err(AtollError::Capacity(format!(
                    "Node {} already hosts {} pools",
                    node_num, validator.config.pools_per_node
                )));
            }

            (
                validator.state.num_pools + 1,
                validator.config.min_entry_stake,
                validator.config.pool_cap(&self.constraints),
                validator.config.pools_per_node,
            )
        };

        // Last fallible step before commit.
        let pool_app_id =
            factory.create_pool(validator_id, pool_id, min_entry_stake, pool_cap)?;

        self.pools.insert(
            pool_app_id,
            PoolLedger::new(
                pool_app_id,
                validator_id,
                pool_id,
                min_entry_stake,
                pool_cap,
                self.constraints.max_stakers_per_pool as usize,
            ),
        );
        let validator = self.validator_mut(validator_id)?;
        validator
            .node_assignment
            .place_pool(node_num, pool_app_id, pools_per_node)?;
        validator.pools.push(PoolInfo {
            pool_app_id,
            total_stakers: 0,
            total_algo_staked: 0,
        });
        validator.state.num_pools += 1;

        tracing::info!(validator_id, pool_id, pool_app_id, "Pool added");
        Ok(ValidatorPoolKey {
            validator_id,
            pool_id,
            pool_app_id,
        })
    }

    // -----------------------------------------------------------------
    // Stake flows
    // -----------------------------------------------------------------

    /// Add stake for the caller with validator `validator_id`.
    ///
    /// The payment must come from the caller into the registry account. On a
    /// staker's very first deposit protocol-wide, `add_staker_mbr` is
    /// withheld from the deposit to cover their membership record. Returns
    /// the pool the deposit landed in and the net amount staked.
    ///
    /// # Errors
    /// - `AtollError::Validation`: bad payment, failed gating, sunsetted
    ///   validator, or first-time deposit below the minimum entry stake.
    /// - `AtollError::Capacity`: no pool can take the deposit, or the
    ///   staker's pool set is full.
    pub fn add_stake(
        &mut self,
        caller: Account,
        payment: &Payment,
        validator_id: u64,
        proof: &GatingProof,
        current_round: u64,
        oracle: &dyn AssetHoldingOracle,
        name_service: &dyn NameService,
    ) -> Result<(ValidatorPoolKey, MicroAlgo), AtollError> {
        // Phase 1: checks only, no state writes.
        if payment.sender != caller {
            return Err(AtollError::Validation(
                "Payment sender does not match the staker".to_string(),
            ));
        }
        if payment.receiver != self.registry_account {
            return Err(AtollError::Validation(
                "Payment receiver is not the registry account".to_string(),
            ));
        }
        if payment.amount == 0 {
            return Err(AtollError::Validation("Zero-amount deposit".to_string()));
        }

        let validator = self.validator(validator_id)?;
        if let Some(sunset) = validator.config.sunsetting_on {
            if current_round >= sunset {
                return Err(AtollError::Validation(format!(
                    "Validator {} is sunsetting; no new stake accepted",
                    validator_id
                )));
            }
        }
        verify_entry_gating(
            &validator.config.entry_gating,
            &caller,
            proof,
            oracle,
            name_service,
        )?;

        let existing_set = self.pool_sets.get(&caller);
        let withheld = if existing_set.is_none() {
            mbr::add_staker_mbr(&self.constraints)
        } else {
            0
        };
        let net = payment
            .amount
            .checked_sub(withheld)
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                AtollError::Validation(format!(
                    "Deposit of {} does not cover the one-time staker MBR of {}",
                    payment.amount, withheld
                ))
            })?;

        let (key, is_new_staker) =
            find_pool_for_staker(validator, &self.pools, existing_set, &caller, net)?
                .ok_or_else(|| {
                    AtollError::Capacity(format!(
                        "No pool of validator {} can take the deposit; add a pool",
                        validator_id
                    ))
                })?;
        if let Some(set) = existing_set {
            if !set.can_add(&key) {
                return Err(AtollError::Capacity(format!(
                    "Staker already holds {} concurrent pool memberships",
                    self.constraints.max_pools_per_staker
                )));
            }
        }

        // Phase 2: commit.
        let new_slot = self
            .pools
            .get_mut(&key.pool_app_id)
            .ok_or_else(|| {
                AtollError::Consistency(format!("No ledger for pool app {}", key.pool_app_id))
            })?
            .deposit(caller, net, current_round)?;

        let capacity = self.constraints.max_pools_per_staker as usize;
        self.pool_sets
            .entry(caller)
            .or_insert_with(|| StakerPoolSet::new(capacity))
            .add(key)?;

        let validator = self.validator_mut(validator_id)?;
        let info = &mut validator.pools[key.pool_id as usize - 1];
        info.total_algo_staked += net;
        if new_slot {
            info.total_stakers += 1;
        }
        validator.state.total_algo_staked += net;
        if is_new_staker {
            validator.state.total_stakers += 1;
        }

        tracing::info!(
            validator_id,
            pool_id = key.pool_id,
            amount = net,
            withheld,
            is_new_staker,
            "Stake added"
        );
        Ok((key, net))
    }

    /// Remove stake for the caller from the given pool; `amount == 0`
    /// withdraws the full balance. Returns `(amount_removed,
    /// staker_fully_exited_validator)`.
    ///
    /// The remaining balance must be zero or at least the validator's
    /// minimum entry stake. Funds move back to the caller before the ledger
    /// commits, keeping the operation atomic.
    pub fn remove_stake(
        &mut self,
        caller: Account,
        key: ValidatorPoolKey,
        amount: MicroAlgo,
        transfer: &mut dyn ValueTransfer,
    ) -> Result<(MicroAlgo, bool), AtollError> {
        // Phase 1: checks.
        self.validator(key.validator_id)?.check_pool_key(&key)?;
        let (removed, fully_removed) =
            self.pool_ledger_checked(&key)?.peek_withdraw(&caller, amount)?;
        let has_membership = self
            .pool_sets
            .get(&caller)
            .is_some_and(|set| set.contains(&key));
        if !has_membership {
            return Err(AtollError::Consistency(format!(
                "Pool {} holds a balance for the caller but no membership is recorded",
                key.pool_app_id
            )));
        }
        transfer.transfer(self.registry_account, caller, removed)?;

        // Phase 2: commit.
        let pool = self
            .pools
            .get_mut(&key.pool_app_id)
            .ok_or_else(|| {
                AtollError::Consistency(format!("No ledger for pool app {}", key.pool_app_id))
            })?;
        pool.withdraw(&caller, amount)?;

        let mut fully_exited = false;
        if fully_removed {
            if let Some(set) = self.pool_sets.get_mut(&caller) {
                fully_exited = set.remove(&key)?;
            }
        }

        let validator = self.validator_mut(key.validator_id)?;
        let info = &mut validator.pools[key.pool_id as usize - 1];
        info.total_algo_staked -= removed;
        if fully_removed {
            info.total_stakers -= 1;
        }
        validator.state.total_algo_staked -= removed;
        if fully_exited {
            validator.state.total_stakers -= 1;
        }

        tracing::info!(
            validator_id = key.validator_id,
            pool_id = key.pool_id,
            amount = removed,
            fully_exited,
            "Stake removed"
        );
        Ok((removed, fully_exited))
    }

    /// Pay out the caller's accrued reward tokens from the given pool.
    /// Returns the amount claimed (0 is a successful no-op).
    pub fn claim_tokens(
        &mut self,
        caller: Account,
        key: ValidatorPoolKey,
        transfer: &mut dyn ValueTransfer,
    ) -> Result<u64, AtollError> {
        // Phase 1: checks.
        let validator = self.validator(key.validator_id)?;
        validator.check_pool_key(&key)?;
        let token_id = validator.config.reward_token_id.ok_or_else(|| {
            AtollError::Validation(format!(
                "Validator {} has no reward token",
                key.validator_id
            ))
        })?;
        let amount = self
            .pool_ledger_checked(&key)?
            .staker_info(&caller)
            .ok_or_else(|| AtollError::NotFound("No staked balance in this pool".to_string()))?
            .reward_token_balance;
        if amount == 0 {
            return Ok(0);
        }
        transfer.transfer_asset(token_id, self.registry_account, caller, amount)?;

        // Phase 2: commit.
        self.pools
            .get_mut(&key.pool_app_id)
            .ok_or_else(|| {
                AtollError::Consistency(format!("No ledger for pool app {}", key.pool_app_id))
            })?
            .take_reward_tokens(&caller)?;
        self.validator_mut(key.validator_id)?
            .state
            .reward_token_held_back -= amount;

        tracing::info!(
            validator_id = key.validator_id,
            pool_id = key.pool_id,
            amount,
            "Reward tokens claimed"
        );
        Ok(amount)
    }

    // -----------------------------------------------------------------
    // Epoch settlement
    // -----------------------------------------------------------------

    /// Settle one pool's epoch: harvest yield, pay commission, distribute
    /// the remainder pro-rata, and credit reward tokens.
    ///
    /// Owner-or-manager gated. Re-invoking within the same epoch window is
    /// a no-op (`EpochOutcome::AlreadySettled`), so externally driven
    /// retries are safe. When the validator distributes a reward token, the
    /// designated pool (pool 1) computes the validator-wide payout ratio at
    /// most once per window; the other pools require it to be fresh.
    pub fn epoch_balance_update(
        &mut self,
        caller: Account,
        key: ValidatorPoolKey,
        current_round: u64,
        transfer: &mut dyn ValueTransfer,
    ) -> Result<EpochOutcome, AtollError> {
        // Phase 1: checks and pure computation.
        let validator = self.validator(key.validator_id)?;
        validator.check_pool_key(&key)?;
        Self::require_owner_or_manager(validator, &caller)?;

        let epoch_len = validator.config.epoch_round_length;
        let pct = validator.config.percent_to_validator;
        let commission_address = validator.config.validator_commission_address;

        let (new_ratio, token_budget) = Self::token_budget_for_pool(validator, &key, current_round)?;

        let mut plan = match self.pool_ledger_checked(&key)?.plan_epoch(
            pct,
            epoch_len,
            current_round,
            token_budget,
        )? {
            Some(plan) => plan,
            None => return Ok(EpochOutcome::AlreadySettled),
        };

        match commission_address {
            Some(dest) if plan.commission > 0 => {
                transfer.transfer(self.registry_account, dest, plan.commission)?;
            }
            None => {
                // Nowhere to pay commission: the swept remainder stays in the
                // pool balance and rolls into the next harvest.
                plan.commission = 0;
            }
            _ => {}
        }

        // Phase 2: commit.
        self.pools
            .get_mut(&key.pool_app_id)
            .ok_or_else(|| {
                AtollError::Consistency(format!("No ledger for pool app {}", key.pool_app_id))
            })?
            .apply_epoch(&plan);

        let validator = self.validator_mut(key.validator_id)?;
        if let Some(ratio) = new_ratio {
            validator.token_payout_ratio = Some(ratio);
        }
        validator.pools[key.pool_id as usize - 1].total_algo_staked += plan.distributed;
        validator.state.total_algo_staked += plan.distributed;
        validator.state.reward_token_held_back += plan.token_credited;

        tracing::info!(
            validator_id = key.validator_id,
            pool_id = key.pool_id,
            round = current_round,
            commission = plan.commission,
            distributed = plan.distributed,
            token_credited = plan.token_credited,
            "Epoch balance updated"
        );
        Ok(EpochOutcome::Settled {
            commission_paid: plan.commission,
            distributed: plan.distributed,
            token_credited: plan.token_credited,
        })
    }

    /// Compute the reward-token budget for a pool's epoch, and, for the
    /// designated pool, a freshly computed payout ratio to stamp on commit.
    fn token_budget_for_pool(
        validator: &Validator,
        key: &ValidatorPoolKey,
        current_round: u64,
    ) -> Result<(Option<PoolTokenPayoutRatio>, Option<u64>), AtollError> {
        if validator.config.reward_token_id.is_none() || validator.config.reward_per_payout == 0 {
            return Ok((None, None));
        }
        let epoch_len = validator.config.epoch_round_length;
        let fresh = |ratio: &PoolTokenPayoutRatio| {
            ratio.updated_for_payout / epoch_len == current_round / epoch_len
        };

        let new_ratio = if key.pool_id == 1 {
            match &validator.token_payout_ratio {
                Some(ratio) if fresh(ratio) => None,
                _ => {
                    let whole = validator.state.total_algo_staked;
                    let pool_pct_of_whole = validator
                        .pools
                        .iter()
                        .map(|info| {
                            if whole == 0 {
                                0
                            } else {
                                (info.total_algo_staked as u128 * PCT_SCALE as u128
                                    / whole as u128) as u64
                            }
                        })
                        .collect();
                    Some(PoolTokenPayoutRatio {
                        pool_pct_of_whole,
                        updated_for_payout: current_round,
                    })
                }
            }
        } else {
            None
        };

        let budget = {
            let ratio = new_ratio
                .as_ref()
                .or(validator.token_payout_ratio.as_ref())
                .filter(|r| fresh(r))
                .ok_or_else(|| {
                    AtollError::Validation(format!(
                        "Token payout ratio for validator {} is stale; settle pool 1 first",
                        validator.id
                    ))
                })?;
            let pct = ratio
                .pool_pct_of_whole
                .get(key.pool_id as usize - 1)
                .copied()
                .unwrap_or(0);
            (validator.config.reward_per_payout as u128 * pct as u128 / PCT_SCALE as u128) as u64
        };
        Ok((new_ratio, Some(budget)))
    }

    // -----------------------------------------------------------------
    // Host-ledger events
    // -----------------------------------------------------------------

    /// Record yield landing on a pool's account (e.g. consensus rewards paid
    /// by the host chain). The next epoch settlement harvests it.
    pub fn credit_pool_yield(
        &mut self,
        key: ValidatorPoolKey,
        amount: MicroAlgo,
    ) -> Result<(), AtollError> {
        self.validator(key.validator_id)?.check_pool_key(&key)?;
        self.pools
            .get_mut(&key.pool_app_id)
            .ok_or_else(|| {
                AtollError::Consistency(format!("No ledger for pool app {}", key.pool_app_id))
            })?
            .receive_yield(amount);
        Ok(())
    }

    // -----------------------------------------------------------------
    // Read surface
    // -----------------------------------------------------------------

    pub fn get_validator_config(&self, id: u64) -> Result<&ValidatorConfig, AtollError> {
        Ok(&self.validator(id)?.config)
    }

    pub fn get_validator_state(&self, id: u64) -> Result<&ValidatorState, AtollError> {
        Ok(&self.validator(id)?.state)
    }

    pub fn get_pool_info(&self, key: &ValidatorPoolKey) -> Result<&PoolInfo, AtollError> {
        let validator = self.validator(key.validator_id)?;
        validator.check_pool_key(key)?;
        Ok(&validator.pools[key.pool_id as usize - 1])
    }

    pub fn get_pools(&self, id: u64) -> Result<&[PoolInfo], AtollError> {
        Ok(&self.validator(id)?.pools)
    }

    /// Every pool the account currently holds a balance in.
    pub fn get_staked_pools_for_account(&self, account: &Account) -> Vec<ValidatorPoolKey> {
        self.pool_sets
            .get(account)
            .map(|set| set.memberships().copied().collect())
            .unwrap_or_default()
    }

    pub fn get_token_payout_ratio(
        &self,
        id: u64,
    ) -> Result<Option<&PoolTokenPayoutRatio>, AtollError> {
        Ok(self.validator(id)?.token_payout_ratio.as_ref())
    }

    pub fn get_mbr_amounts(&self) -> MbrAmounts {
        mbr::mbr_amounts(&self.constraints)
    }

    pub fn get_protocol_constraints(&self) -> &ProtocolConstraints {
        &self.constraints
    }

    /// Direct read access to a pool ledger, for inspection and settlement
    /// tooling.
    pub fn get_pool_ledger(&self, pool_app_id: u64) -> Option<&PoolLedger> {
        self.pools.get(&pool_app_id)
    }

    pub fn num_validators(&self) -> u64 {
        self.next_validator_id
    }
}
