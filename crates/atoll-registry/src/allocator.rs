// crates/atoll-registry/src/allocator.rs
//
// Pool allocation: choose the pool a deposit lands in.
//
// Priority order:
//   (a) a pool the staker already belongs to with this validator, if it has
//       headroom (lowest pool id wins);
//   (b) otherwise first-fit over the validator's pools in pool-id order,
//       which keeps placement deterministic;
//   (c) no candidate: the caller must add a pool or abort.
//
// The minimum-entry-stake floor applies only to stakers with no existing
// membership for the validator (the first-time-to-validator rule); an
// existing member spilling into a second pool is exempt.

use std::collections::BTreeMap;

use atoll_core::{Account, AtollError, MicroAlgo};
use atoll_pool::PoolLedger;

use crate::pool_set::StakerPoolSet;
use crate::validator::{Validator, ValidatorPoolKey};

/// Pick the target pool for a deposit of `amount` by `staker`.
///
/// Returns `Ok(None)` when no pool can take the deposit, and otherwise the
/// chosen key plus `is_new_staker`: `true` iff the staker currently has no
/// membership with this validator. Pools whose slot table cannot host the
/// staker are skipped even when they have Algo headroom.
///
/// # Errors
/// - `AtollError::Validation` when a first-time staker's deposit is below
///   the validator's minimum entry stake.
/// - `AtollError::Consistency` when a directory entry has no backing ledger.
pub fn find_pool_for_staker(
    validator: &Validator,
    pools: &BTreeMap<u64, PoolLedger>,
    pool_set: Option<&StakerPoolSet>,
    staker: &Account,
    amount: MicroAlgo,
) -> Result<Option<(ValidatorPoolKey, bool)>, AtollError> {
    let ledger_for = |pool_app_id: u64| -> Result<&PoolLedger, AtollError> {
        pools.get(&pool_app_id).ok_or_else(|| {
            AtollError::Consistency(format!(
                "Validator {} lists pool app {} but no ledger exists",
                validator.id, pool_app_id
            ))
        })
    };

    // (a) prefer a pool the staker is already in.
    let mut existing: Vec<&ValidatorPoolKey> = match pool_set {
        Some(set) => set.memberships_for(validator.id).collect(),
        None => Vec::new(),
    };
    existing.sort_by_key(|k| k.pool_id);
    for key in &existing {
        let ledger = ledger_for(key.pool_app_id)?;
        if ledger.has_headroom(amount) {
            tracing::debug!(
                validator_id = validator.id,
                pool_id = key.pool_id,
                "Allocator reusing existing membership"
            );
            return Ok(Some((**key, false)));
        }
    }

    let is_new_staker = existing.is_empty();
    if is_new_staker && amount < validator.config.min_entry_stake {
        return Err(AtollError::Validation(format!(
            "First-time deposit {} below validator minimum entry stake {}",
            amount, validator.config.min_entry_stake
        )));
    }

    // (b) first-fit over the pool directory, lowest pool id first.
    for (idx, info) in validator.pools.iter().enumerate() {
        let ledger = ledger_for(info.pool_app_id)?;
        if ledger.can_accept(staker, amount) {
            let key = ValidatorPoolKey {
                validator_id: validator.id,
                pool_id: idx as u64 + 1,
                pool_app_id: info.pool_app_id,
            };
            tracing::debug!(
                validator_id = validator.id,
                pool_id = key.pool_id,
                is_new_staker,
                "Allocator selected pool by first fit"
            );
            return Ok(Some((key, is_new_staker)));
        }
    }

    // (c) nothing fits.
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gating::GatingSpec;
    use crate::validator::{NodePoolAssignment, PoolInfo, ValidatorConfig, ValidatorState};
    use atoll_core::MICRO_ALGO_PER_ALGO;

    const MIN_ENTRY: MicroAlgo = MICRO_ALGO_PER_ALGO;
    const CAP: MicroAlgo = 10 * MICRO_ALGO_PER_ALGO;

    fn acct(b: u8) -> Account {
        [b; 32]
    }

    fn make_validator(num_pools: u64) -> (Validator, BTreeMap<u64, PoolLedger>) {
        let mut pools = BTreeMap::new();
        let mut infos = Vec::new();
        for pool_id in 1..=num_pools {
            let app_id = 1000 + pool_id;
            pools.insert(app_id, PoolLedger::new(app_id, 1, pool_id, MIN_ENTRY, CAP, 4));
            infos.push(PoolInfo {
                pool_app_id: app_id,
                total_stakers: 0,
                total_algo_staked: 0,
            });
        }
        let validator = Validator {
            id: 1,
            owner: acct(1),
            manager: acct(2),
            config: ValidatorConfig {
                epoch_round_length: 1_000,
                percent_to_validator: 0,
                validator_commission_address: None,
                min_entry_stake: MIN_ENTRY,
                max_algo_per_pool: Some(CAP),
                pools_per_node: 2,
                entry_gating: GatingSpec::None,
                reward_token_id: None,
                reward_per_payout: 0,
                nfd_app_id: None,
                sunsetting_on: None,
                sunsetting_to: None,
            },
            state: ValidatorState {
                num_pools,
                ..Default::default()
            },
            pools: infos,
            node_assignment: NodePoolAssignment::new(12),
            token_payout_ratio: None,
        };
        (validator, pools)
    }

    fn key(pool_id: u64) -> ValidatorPoolKey {
        ValidatorPoolKey {
            validator_id: 1,
            pool_id,
            pool_app_id: 1000 + pool_id,
        }
    }

    #[test]
    fn test_new_staker_first_fit() {
        let (v, pools) = make_validator(2);
        let (k, is_new) = find_pool_for_staker(&v, &pools, None, &acct(5), MIN_ENTRY)
            .unwrap()
            .unwrap();
        assert_eq!(k.pool_id, 1);
        assert!(is_new);
    }

    #[test]
    fn test_new_staker_below_minimum() {
        let (v, pools) = make_validator(1);
        let err =
            find_pool_for_staker(&v, &pools, None, &acct(5), MIN_ENTRY - 1).unwrap_err();
        assert!(matches!(err, AtollError::Validation(_)));
    }

    #[test]
    fn test_existing_member_prefers_own_pool() {
        let (v, mut pools) = make_validator(2);
        pools
            .get_mut(&1002)
            .unwrap()
            .deposit(acct(5), MIN_ENTRY, 0)
            .unwrap();
        let mut set = StakerPoolSet::new(6);
        set.add(key(2)).unwrap();

        let (k, is_new) =
            find_pool_for_staker(&v, &pools, Some(&set), &acct(5), MIN_ENTRY)
                .unwrap()
                .unwrap();
        assert_eq!(k.pool_id, 2);
        assert!(!is_new);
    }

    #[test]
    fn test_existing_member_exempt_from_minimum() {
        let (v, mut pools) = make_validator(1);
        pools
            .get_mut(&1001)
            .unwrap()
            .deposit(acct(5), MIN_ENTRY, 0)
            .unwrap();
        let mut set = StakerPoolSet::new(6);
        set.add(key(1)).unwrap();

        // below-minimum top-up is fine for an existing member
        let (k, is_new) = find_pool_for_staker(&v, &pools, Some(&set), &acct(5), 1)
            .unwrap()
            .unwrap();
        assert_eq!(k.pool_id, 1);
        assert!(!is_new);
    }

    #[test]
    fn test_member_spills_to_second_pool_without_new_flag() {
        let (v, mut pools) = make_validator(2);
        // fill pool 1 to its cap
        pools
            .get_mut(&1001)
            .unwrap()
            .deposit(acct(5), CAP, 0)
            .unwrap();
        let mut set = StakerPoolSet::new(6);
        set.add(key(1)).unwrap();

        let (k, is_new) =
            find_pool_for_staker(&v, &pools, Some(&set), &acct(5), MIN_ENTRY)
                .unwrap()
                .unwrap();
        assert_eq!(k.pool_id, 2);
        assert!(!is_new);
    }

    #[test]
    fn test_no_candidate_returns_none() {
        let (v, mut pools) = make_validator(1);
        pools
            .get_mut(&1001)
            .unwrap()
            .deposit(acct(9), CAP, 0)
            .unwrap();
        let got = find_pool_for_staker(&v, &pools, None, &acct(5), MIN_ENTRY).unwrap();
        assert!(got.is_none());
    }

    #[test]
    fn test_slot_full_pool_is_skipped() {
        let (v, mut pools) = make_validator(2);
        // pool 1 has Algo headroom but its 4 slots are taken
        let p1 = pools.get_mut(&1001).unwrap();
        for b in 10..14 {
            p1.deposit(acct(b), MIN_ENTRY, 0).unwrap();
        }
        let (k, _) = find_pool_for_staker(&v, &pools, None, &acct(5), MIN_ENTRY)
            .unwrap()
            .unwrap();
        assert_eq!(k.pool_id, 2);
    }
}
