// crates/atoll-core/src/traits.rs

use crate::error::AtollError;
use crate::token::MicroAlgo;
use crate::Account;

/// Trait for moving value on the host ledger.
///
/// Implemented by the host-chain adapter; test code uses an in-memory ledger.
/// Transfers are atomic with the triggering call.
pub trait ValueTransfer {
    /// Move `amount` microalgo from `from` to `to`.
    ///
    /// # Errors
    /// Returns `AtollError::InsufficientBalance` if `from` cannot cover the
    /// amount, or `AtollError::ExternalDependency` on ledger failure.
    fn transfer(&mut self, from: Account, to: Account, amount: MicroAlgo)
        -> Result<(), AtollError>;

    /// Move `amount` units of asset `asset_id` from `from` to `to`.
    /// Used for reward-token payouts.
    fn transfer_asset(
        &mut self,
        asset_id: u64,
        from: Account,
        to: Account,
        amount: u64,
    ) -> Result<(), AtollError>;
}

/// Trait for deploying a new pool instance on the host ledger.
///
/// The registry never constructs pool accounts itself; the factory returns
/// the app id of the freshly created pool, which the registry then records.
pub trait PoolFactory {
    /// Create a pool for `(validator_id, pool_id)` and return its app id.
    fn create_pool(
        &mut self,
        validator_id: u64,
        pool_id: u64,
        min_entry_stake: MicroAlgo,
        max_algo_per_pool: MicroAlgo,
    ) -> Result<u64, AtollError>;
}

/// Trait for querying asset holdings and metadata on the host ledger.
///
/// Used by the gating validator to confirm a staker actually holds the
/// qualifying asset.
pub trait AssetHoldingOracle {
    /// Balance of `asset_id` held by `account`. Zero if not opted in.
    fn holds_asset(&self, account: Account, asset_id: u64) -> Result<u64, AtollError>;

    /// The account that created `asset_id`.
    fn asset_creator(&self, asset_id: u64) -> Result<Account, AtollError>;
}

/// Trait for name-service (NFD) lookups.
pub trait NameService {
    /// Resolve a name-service app id to its owner account.
    fn resolve(&self, nfd_app_id: u64) -> Result<Account, AtollError>;

    /// Whether `nfd_app_id` is a segment of `parent_app_id`.
    fn is_segment_of(&self, nfd_app_id: u64, parent_app_id: u64) -> Result<bool, AtollError>;
}
