// crates/atoll-pool/src/epoch.rs
//
// Epoch reward computation for a single pool.
//
// Each epoch the pool's harvested yield (account balance minus tracked
// staked total) is split into validator commission and staker payouts.
// Settlement is two-phase so the registry can keep the whole operation
// atomic: `plan_epoch` is a pure computation over the slot table, and
// `apply_epoch` commits an already-validated plan infallibly. Re-planning
// within the same epoch window is a no-op, which makes externally driven
// retries safe.
//
// Rounding rule: per-staker shares are floored (u128 intermediates); all
// integer-division dust plus the ineligible portion of partial-epoch
// entrants is swept into the commission payment, so
// `commission + distributed == harvested` exactly.

use serde::{Deserialize, Serialize};

use atoll_core::{AtollError, MicroAlgo, PCT_SCALE};

use crate::ledger::PoolLedger;

/// Eligibility percentage (0..=100) of a staker for the epoch being settled.
///
/// Given epoch length `E`, last payout round `L`, and the staker's entry
/// round `R`: the epoch window is `[L - L % E, L - L % E + E)`. A staker who
/// entered at or after the window's end earns nothing; otherwise eligibility
/// is the floored percentage of the window that follows the entry round,
/// clamped to 100 for entrants from before the window.
///
/// `epoch_round_length` must be nonzero; `plan_epoch` validates it before
/// calling in.
pub fn eligibility_pct(epoch_round_length: u64, last_payout_round: u64, entry_round: u64) -> u64 {
    debug_assert!(epoch_round_length > 0, "epoch length must be nonzero");
    let epoch_start = last_payout_round - (last_payout_round % epoch_round_length);
    let next = epoch_start + epoch_round_length;
    if entry_round >= next {
        return 0;
    }
    (((next - entry_round) * 100) / epoch_round_length).min(100)
}

/// One staker's computed payout within an epoch plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareLine {
    /// Index into the pool's slot table.
    pub slot: usize,
    /// Microalgo credited to the staker's balance.
    pub algo: MicroAlgo,
    /// Reward-token units credited to the staker's held-back balance.
    pub token: u64,
}

/// A fully computed, not yet committed epoch settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochPlan {
    /// Round at which the plan was computed; stamped on commit.
    pub current_round: u64,
    /// Yield harvested this epoch: pool balance minus tracked staked total.
    pub harvested: MicroAlgo,
    /// Commission owed to the validator, including swept remainders.
    pub commission: MicroAlgo,
    /// Total microalgo credited to stakers. `commission + distributed ==
    /// harvested` always.
    pub distributed: MicroAlgo,
    /// Total reward-token units credited to stakers.
    pub token_credited: u64,
    /// Per-slot payouts.
    pub shares: Vec<ShareLine>,
}

/// Summary of an epoch settlement, as reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EpochOutcome {
    /// This epoch window was already settled; nothing was mutated.
    AlreadySettled,
    /// The epoch was settled.
    Settled {
        /// Microalgo paid to the validator's commission address.
        commission_paid: MicroAlgo,
        /// Microalgo distributed across staker balances.
        distributed: MicroAlgo,
        /// Reward-token units credited (held back until claimed).
        token_credited: u64,
    },
}

impl PoolLedger {
    /// Compute this pool's epoch settlement without mutating anything.
    ///
    /// Returns `None` when the current round falls in the same epoch window
    /// as the last settlement (the safe-retry gate).
    ///
    /// `token_budget` is the pool's reward-token allotment for this epoch
    /// (already scaled by the pool's share of the validator total), or `None`
    /// when the validator has no reward token.
    ///
    /// # Errors
    /// Returns `AtollError::Validation` if `epoch_round_length` is zero.
    pub fn plan_epoch(
        &self,
        percent_to_validator: u64,
        epoch_round_length: u64,
        current_round: u64,
        token_budget: Option<u64>,
    ) -> Result<Option<EpochPlan>, AtollError> {
        if epoch_round_length == 0 {
            return Err(AtollError::Validation(
                "Epoch round length must be nonzero".to_string(),
            ));
        }

        if let Some(last) = self.last_payout_round() {
            if last / epoch_round_length == current_round / epoch_round_length {
                tracing::debug!(
                    pool_app_id = self.pool_app_id(),
                    current_round,
                    "Epoch window already settled; retry is a no-op"
                );
                return Ok(None);
            }
        }

        let harvested = self.balance() - self.total_algo_staked();
        let pool_total = self.total_algo_staked();

        if pool_total == 0 {
            // Nothing staked: stamp the window, roll any balance forward.
            return Ok(Some(EpochPlan {
                current_round,
                harvested,
                commission: 0,
                distributed: 0,
                token_credited: 0,
                shares: Vec::new(),
            }));
        }

        let commission_base =
            (harvested as u128 * percent_to_validator as u128 / PCT_SCALE as u128) as u64;
        let remainder = harvested - commission_base;
        let last = self.last_payout_round().unwrap_or(current_round);

        let mut shares = Vec::new();
        let mut distributed: MicroAlgo = 0;
        let mut token_credited: u64 = 0;

        for (slot, info) in self.slots().iter().enumerate() {
            let info = match info {
                Some(info) => info,
                None => continue,
            };
            let elig = eligibility_pct(epoch_round_length, last, info.entry_round);
            let algo = (remainder as u128 * info.balance as u128 * elig as u128
                / (pool_total as u128 * 100)) as u64;
            let token = match token_budget {
                Some(budget) => (budget as u128 * info.balance as u128 * elig as u128
                    / (pool_total as u128 * 100)) as u64,
                None => 0,
            };
            if algo > 0 || token > 0 {
                shares.push(ShareLine { slot, algo, token });
            }
            distributed += algo;
            token_credited += token;
        }

        // Dust and ineligible portions sweep to commission; conservation is
        // exact by construction.
        let commission = harvested - distributed;

        Ok(Some(EpochPlan {
            current_round,
            harvested,
            commission,
            distributed,
            token_credited,
            shares,
        }))
    }

    /// Commit a plan produced by `plan_epoch` against the same pool state.
    ///
    /// Infallible: all validation happened at planning time, so the
    /// registry can sequence the fallible commission transfer between plan
    /// and commit without risking a partial mutation.
    pub fn apply_epoch(&mut self, plan: &EpochPlan) {
        for line in &plan.shares {
            if let Some(info) = &mut self.slots_mut()[line.slot] {
                info.balance += line.algo;
                info.total_rewarded += line.algo;
                info.reward_token_balance += line.token;
            }
        }
        self.add_distributed(plan.distributed, plan.commission);
        self.set_last_payout_round(plan.current_round);
        tracing::debug!(
            pool_app_id = self.pool_app_id(),
            round = plan.current_round,
            harvested = plan.harvested,
            commission = plan.commission,
            distributed = plan.distributed,
            "Epoch settled"
        );
    }
}
