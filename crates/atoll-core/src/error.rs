// crates/atoll-core/src/error.rs

use thiserror::Error;

/// Protocol-wide error types for the Atoll staking protocol.
///
/// Every public operation either fully succeeds or fails with one of these
/// and no partial mutation; callers may assume fail-closed semantics.
#[derive(Debug, Error)]
pub enum AtollError {
    /// Invalid input: bad validator config, bad gating proof, malformed key.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A fixed-capacity structure is full: pool slot table, staker pool set,
    /// or the validator's pool count. The caller must add capacity and retry.
    #[error("Capacity error: {0}")]
    Capacity(String),

    /// Sender is not the owner, manager, or account required by the operation.
    /// Never auto-retried.
    #[error("Authorization error: {0}")]
    Authorization(String),

    /// A claimed pool identity does not match the registry record.
    /// Treated as possible spoofing; callers should alert.
    #[error("Consistency error: {0}")]
    Consistency(String),

    /// A name-service or asset lookup failed. The caller may retry once the
    /// dependency recovers.
    #[error("External dependency error: {0}")]
    ExternalDependency(String),

    /// Resource not found: unknown validator, pool, or staker membership.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A balance is too small for the requested movement of funds.
    #[error("Insufficient balance: {0}")]
    InsufficientBalance(String),
}

impl From<serde_json::Error> for AtollError {
    fn from(e: serde_json::Error) -> Self {
        AtollError::Validation(e.to_string())
    }
}
