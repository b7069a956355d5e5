// crates/atoll-pool/src/ledger.rs
//
// The pool ledger: a fixed-capacity staker slot table.
//
// Slots are located only by linear scan. O(N) per call is intentional:
// N is a small protocol constant and the whole table must be walkable in
// one pass during epoch payouts. An empty slot is `None`; the explicit
// variant replaces the zero-address sentinel so an all-zero account can
// never collide with "empty".

use serde::{Deserialize, Serialize};

use atoll_core::{Account, AtollError, MicroAlgo};

/// One staker's position within a pool.
///
/// Every occupied slot has `balance > 0`; a slot whose balance reaches zero
/// is cleared (set to `None`) and becomes reusable by a later staker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakedInfo {
    /// The staker's account.
    pub account: Account,
    /// Currently staked microalgo.
    pub balance: MicroAlgo,
    /// Cumulative microalgo credited to this staker by epoch payouts.
    pub total_rewarded: MicroAlgo,
    /// Reward-token units earned but not yet claimed.
    pub reward_token_balance: u64,
    /// Round at which the staker entered this pool. Drives partial-epoch
    /// eligibility proration.
    pub entry_round: u64,
}

/// A single staking pool's ledger.
///
/// Tracks the pool account's full balance alongside the staked total so the
/// epoch engine can compute harvested yield as `balance - total_algo_staked`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolLedger {
    /// App id of the pool account on the host ledger.
    pool_app_id: u64,
    /// Owning validator id.
    validator_id: u64,
    /// 1-based pool id within the validator.
    pool_id: u64,
    /// Minimum remaining balance after a partial withdrawal.
    min_entry_stake: MicroAlgo,
    /// Cap on total staked microalgo in this pool.
    max_algo_per_pool: MicroAlgo,
    /// Fixed-capacity staker slot table.
    slots: Vec<Option<StakedInfo>>,
    /// Pool account balance: staked funds plus harvested-but-undistributed
    /// yield.
    balance: MicroAlgo,
    /// Sum of all occupied slot balances.
    total_algo_staked: MicroAlgo,
    /// Round of the last epoch settlement, if any.
    last_payout_round: Option<u64>,
}

impl PoolLedger {
    /// Create an empty pool ledger with `capacity` staker slots.
    pub fn new(
        pool_app_id: u64,
        validator_id: u64,
        pool_id: u64,
        min_entry_stake: MicroAlgo,
        max_algo_per_pool: MicroAlgo,
        capacity: usize,
    ) -> Self {
        Self {
            pool_app_id,
            validator_id,
            pool_id,
            min_entry_stake,
            max_algo_per_pool,
            slots: vec![None; capacity],
            balance: 0,
            total_algo_staked: 0,
            last_payout_round: None,
        }
    }

    pub fn pool_app_id(&self) -> u64 {
        self.pool_app_id
    }

    pub fn validator_id(&self) -> u64 {
        self.validator_id
    }

    pub fn pool_id(&self) -> u64 {
        self.pool_id
    }

    /// Pool account balance (staked funds plus undistributed yield).
    pub fn balance(&self) -> MicroAlgo {
        self.balance
    }

    /// Sum of all occupied slot balances.
    pub fn total_algo_staked(&self) -> MicroAlgo {
        self.total_algo_staked
    }

    /// Number of occupied slots.
    pub fn total_stakers(&self) -> u64 {
        self.slots.iter().filter(|s| s.is_some()).count() as u64
    }

    /// Round of the last epoch settlement, if any.
    pub fn last_payout_round(&self) -> Option<u64> {
        self.last_payout_round
    }

    pub(crate) fn set_last_payout_round(&mut self, round: u64) {
        self.last_payout_round = Some(round);
    }

    /// The occupied slots, in table order.
    pub fn stakers(&self) -> impl Iterator<Item = &StakedInfo> {
        self.slots.iter().flatten()
    }

    pub(crate) fn slots(&self) -> &[Option<StakedInfo>] {
        &self.slots
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [Option<StakedInfo>] {
        &mut self.slots
    }

    pub(crate) fn add_distributed(&mut self, distributed: MicroAlgo, commission: MicroAlgo) {
        self.total_algo_staked += distributed;
        self.balance = self.balance.saturating_sub(commission);
    }

    /// Look up a staker's slot.
    pub fn staker_info(&self, account: &Account) -> Option<&StakedInfo> {
        self.stakers().find(|s| s.account == *account)
    }

    /// Whether this pool has Algo headroom for `amount`.
    pub fn has_headroom(&self, amount: MicroAlgo) -> bool {
        self.total_algo_staked + amount <= self.max_algo_per_pool
    }

    /// Whether `deposit(account, amount)` would succeed, without mutating.
    ///
    /// True when the pool has Algo headroom and either the account already
    /// holds a slot or an empty slot is free.
    pub fn can_accept(&self, account: &Account, amount: MicroAlgo) -> bool {
        if !self.has_headroom(amount) {
            return false;
        }
        self.staker_info(account).is_some() || self.slots.iter().any(|s| s.is_none())
    }

    /// Credit yield landing on the pool account (e.g. consensus rewards).
    /// Increases the pool balance without touching any staked balance; the
    /// next epoch settlement harvests it.
    pub fn receive_yield(&mut self, amount: MicroAlgo) {
        self.balance += amount;
    }

    /// Deposit `amount` for `account`, creating a slot on first deposit.
    /// Returns `true` when a new slot was created for the account.
    ///
    /// Linear scan: an existing slot for the account is topped up; otherwise
    /// the first empty slot is taken.
    ///
    /// # Errors
    /// - `AtollError::Capacity` if the deposit would exceed the pool's stake
    ///   cap, or if the account is new and no empty slot remains.
    pub fn deposit(
        &mut self,
        account: Account,
        amount: MicroAlgo,
        entry_round: u64,
    ) -> Result<bool, AtollError> {
        if !self.has_headroom(amount) {
            return Err(AtollError::Capacity(format!(
                "Pool {}/{} cap {} cannot absorb {} on top of {}",
                self.validator_id, self.pool_id, self.max_algo_per_pool, amount,
                self.total_algo_staked
            )));
        }

        let mut empty_idx = None;
        for (i, slot) in self.slots.iter_mut().enumerate() {
            match slot {
                Some(info) if info.account == account => {
                    info.balance += amount;
                    self.balance += amount;
                    self.total_algo_staked += amount;
                    return Ok(false);
                }
                None if empty_idx.is_none() => empty_idx = Some(i),
                _ => {}
            }
        }

        let idx = empty_idx.ok_or_else(|| {
            AtollError::Capacity(format!(
                "Pool {}/{} slot table is full",
                self.validator_id, self.pool_id
            ))
        })?;
        self.slots[idx] = Some(StakedInfo {
            account,
            balance: amount,
            total_rewarded: 0,
            reward_token_balance: 0,
            entry_round,
        });
        self.balance += amount;
        self.total_algo_staked += amount;
        Ok(true)
    }

    /// Validate a withdrawal without mutating. Returns what `withdraw` would
    /// return: `(amount_removed, fully_removed)`.
    ///
    /// Lets the registry sequence a fallible outbound transfer between
    /// validation and commit, keeping the whole operation atomic.
    ///
    /// # Errors
    /// - `AtollError::NotFound` if the account holds no slot.
    /// - `AtollError::InsufficientBalance` if `amount` exceeds the balance.
    /// - `AtollError::Validation` if the remainder would fall below minimum
    ///   (all-or-nothing-below-minimum rule).
    pub fn peek_withdraw(
        &self,
        account: &Account,
        amount: MicroAlgo,
    ) -> Result<(MicroAlgo, bool), AtollError> {
        let info = self
            .staker_info(account)
            .ok_or_else(|| AtollError::NotFound("No staked balance in this pool".to_string()))?;

        let requested = if amount == 0 { info.balance } else { amount };
        if requested > info.balance {
            return Err(AtollError::InsufficientBalance(format!(
                "Requested {} but only {} staked",
                requested, info.balance
            )));
        }

        let remaining = info.balance - requested;
        if remaining > 0 && remaining < self.min_entry_stake {
            return Err(AtollError::Validation(format!(
                "Remaining stake {} would fall below the minimum of {}; withdraw all or less",
                remaining, self.min_entry_stake
            )));
        }
        Ok((requested, remaining == 0))
    }

    /// Withdraw `amount` for `account`; `amount == 0` withdraws the full
    /// balance. Returns `(amount_removed, fully_removed)`.
    ///
    /// A slot whose balance reaches zero is cleared and becomes reusable.
    ///
    /// # Errors
    /// See [`PoolLedger::peek_withdraw`].
    pub fn withdraw(
        &mut self,
        account: &Account,
        amount: MicroAlgo,
    ) -> Result<(MicroAlgo, bool), AtollError> {
        let (requested, fully_removed) = self.peek_withdraw(account, amount)?;

        let slot = self
            .slots
            .iter_mut()
            .find(|s| matches!(s, Some(info) if info.account == *account))
            .ok_or_else(|| AtollError::NotFound("No staked balance in this pool".to_string()))?;
        // peek_withdraw found the slot, so this unwrap-by-match is safe.
        if let Some(info) = slot.as_mut() {
            info.balance -= requested;
        }
        if fully_removed {
            *slot = None;
        }
        self.balance -= requested;
        self.total_algo_staked -= requested;
        Ok((requested, fully_removed))
    }

    /// Take (zero out) the staker's accrued reward-token balance.
    /// Returns the amount taken; `NotFound` if the account holds no slot.
    pub fn take_reward_tokens(&mut self, account: &Account) -> Result<u64, AtollError> {
        let info = self
            .slots
            .iter_mut()
            .flatten()
            .find(|info| info.account == *account)
            .ok_or_else(|| AtollError::NotFound("No staked balance in this pool".to_string()))?;
        let amount = info.reward_token_balance;
        info.reward_token_balance = 0;
        Ok(amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atoll_core::MICRO_ALGO_PER_ALGO;

    const MIN_ENTRY: MicroAlgo = MICRO_ALGO_PER_ALGO;
    const CAP: MicroAlgo = 1_000_000_000_000;

    fn acct(b: u8) -> Account {
        [b; 32]
    }

    fn make_pool(capacity: usize) -> PoolLedger {
        PoolLedger::new(1001, 1, 1, MIN_ENTRY, CAP, capacity)
    }

    #[test]
    fn test_first_deposit_takes_first_empty_slot() {
        let mut pool = make_pool(4);
        pool.deposit(acct(1), 5 * MIN_ENTRY, 100).unwrap();
        assert_eq!(pool.total_stakers(), 1);
        assert_eq!(pool.total_algo_staked(), 5 * MIN_ENTRY);
        assert_eq!(pool.balance(), 5 * MIN_ENTRY);
        assert_eq!(pool.staker_info(&acct(1)).unwrap().entry_round, 100);
    }

    #[test]
    fn test_second_deposit_tops_up_existing_slot() {
        let mut pool = make_pool(4);
        pool.deposit(acct(1), 5 * MIN_ENTRY, 100).unwrap();
        pool.deposit(acct(1), 3 * MIN_ENTRY, 200).unwrap();
        assert_eq!(pool.total_stakers(), 1);
        assert_eq!(pool.staker_info(&acct(1)).unwrap().balance, 8 * MIN_ENTRY);
        // entry round is set at first deposit only
        assert_eq!(pool.staker_info(&acct(1)).unwrap().entry_round, 100);
    }

    #[test]
    fn test_deposit_over_cap_rejected() {
        let mut pool = PoolLedger::new(1001, 1, 1, MIN_ENTRY, 10 * MIN_ENTRY, 4);
        pool.deposit(acct(1), 9 * MIN_ENTRY, 100).unwrap();
        let err = pool.deposit(acct(2), 2 * MIN_ENTRY, 100).unwrap_err();
        assert!(matches!(err, AtollError::Capacity(_)));
        // exactly at cap is fine
        pool.deposit(acct(2), MIN_ENTRY, 100).unwrap();
        assert_eq!(pool.total_algo_staked(), 10 * MIN_ENTRY);
    }

    #[test]
    fn test_pool_full() {
        let mut pool = make_pool(2);
        pool.deposit(acct(1), MIN_ENTRY, 100).unwrap();
        pool.deposit(acct(2), MIN_ENTRY, 100).unwrap();
        let err = pool.deposit(acct(3), MIN_ENTRY, 100).unwrap_err();
        assert!(matches!(err, AtollError::Capacity(_)));
        // an existing staker can still top up
        pool.deposit(acct(1), MIN_ENTRY, 100).unwrap();
    }

    #[test]
    fn test_cleared_slot_is_reusable() {
        let mut pool = make_pool(2);
        pool.deposit(acct(1), MIN_ENTRY, 100).unwrap();
        pool.deposit(acct(2), MIN_ENTRY, 100).unwrap();
        pool.withdraw(&acct(1), 0).unwrap();
        assert_eq!(pool.total_stakers(), 1);
        pool.deposit(acct(3), MIN_ENTRY, 200).unwrap();
        assert_eq!(pool.total_stakers(), 2);
    }

    #[test]
    fn test_withdraw_full_clears_slot() {
        let mut pool = make_pool(4);
        pool.deposit(acct(1), 5 * MIN_ENTRY, 100).unwrap();
        let (removed, fully) = pool.withdraw(&acct(1), 0).unwrap();
        assert_eq!(removed, 5 * MIN_ENTRY);
        assert!(fully);
        assert!(pool.staker_info(&acct(1)).is_none());
        assert_eq!(pool.total_algo_staked(), 0);
        assert_eq!(pool.balance(), 0);
    }

    #[test]
    fn test_withdraw_below_minimum_rejected() {
        let mut pool = make_pool(4);
        pool.deposit(acct(1), 2 * MIN_ENTRY, 100).unwrap();
        // would leave half a minimum behind
        let err = pool
            .withdraw(&acct(1), 2 * MIN_ENTRY - MIN_ENTRY / 2)
            .unwrap_err();
        assert!(matches!(err, AtollError::Validation(_)));
        // leaving exactly the minimum is fine
        let (removed, fully) = pool.withdraw(&acct(1), MIN_ENTRY).unwrap();
        assert_eq!(removed, MIN_ENTRY);
        assert!(!fully);
    }

    #[test]
    fn test_withdraw_more_than_balance() {
        let mut pool = make_pool(4);
        pool.deposit(acct(1), MIN_ENTRY, 100).unwrap();
        let err = pool.withdraw(&acct(1), 2 * MIN_ENTRY).unwrap_err();
        assert!(matches!(err, AtollError::InsufficientBalance(_)));
    }

    #[test]
    fn test_withdraw_unknown_account() {
        let mut pool = make_pool(4);
        let err = pool.withdraw(&acct(9), 0).unwrap_err();
        assert!(matches!(err, AtollError::NotFound(_)));
    }

    #[test]
    fn test_can_accept() {
        let mut pool = PoolLedger::new(1001, 1, 1, MIN_ENTRY, 10 * MIN_ENTRY, 1);
        assert!(pool.can_accept(&acct(1), MIN_ENTRY));
        pool.deposit(acct(1), MIN_ENTRY, 100).unwrap();
        // table full for new accounts, but the incumbent can top up
        assert!(!pool.can_accept(&acct(2), MIN_ENTRY));
        assert!(pool.can_accept(&acct(1), MIN_ENTRY));
        // no headroom for anyone past the cap
        assert!(!pool.can_accept(&acct(1), 10 * MIN_ENTRY));
    }

    #[test]
    fn test_peek_withdraw_does_not_mutate() {
        let mut pool = make_pool(4);
        pool.deposit(acct(1), 5 * MIN_ENTRY, 100).unwrap();
        let (removed, fully) = pool.peek_withdraw(&acct(1), 0).unwrap();
        assert_eq!(removed, 5 * MIN_ENTRY);
        assert!(fully);
        assert_eq!(pool.total_algo_staked(), 5 * MIN_ENTRY);
        assert_eq!(pool.total_stakers(), 1);
    }

    #[test]
    fn test_take_reward_tokens() {
        let mut pool = make_pool(4);
        pool.deposit(acct(1), MIN_ENTRY, 100).unwrap();
        assert_eq!(pool.take_reward_tokens(&acct(1)).unwrap(), 0);
        assert!(matches!(
            pool.take_reward_tokens(&acct(2)),
            Err(AtollError::NotFound(_))
        ));
    }

    #[test]
    fn test_yield_increases_balance_not_stake() {
        let mut pool = make_pool(4);
        pool.deposit(acct(1), 10 * MIN_ENTRY, 100).unwrap();
        pool.receive_yield(MIN_ENTRY);
        assert_eq!(pool.balance(), 11 * MIN_ENTRY);
        assert_eq!(pool.total_algo_staked(), 10 * MIN_ENTRY);
    }
}
