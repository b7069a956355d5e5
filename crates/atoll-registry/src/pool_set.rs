// crates/atoll-registry/src/pool_set.rs
//
// Per-staker pool membership set: a fixed-capacity list of the pools a
// staker currently holds a balance in, across all validators.
//
// Capacity (6 by default) is a protocol-level economic limit. An empty slot
// is `None` rather than a zero key, so a membership can never be confused
// with "empty".

use serde::{Deserialize, Serialize};

use atoll_core::AtollError;

use crate::validator::ValidatorPoolKey;

/// A staker's concurrent pool memberships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakerPoolSet {
    entries: Vec<Option<ValidatorPoolKey>>,
}

impl StakerPoolSet {
    /// Create an empty set with `capacity` membership slots.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: vec![None; capacity],
        }
    }

    /// The live memberships, in slot order.
    pub fn memberships(&self) -> impl Iterator<Item = &ValidatorPoolKey> {
        self.entries.iter().flatten()
    }

    /// Number of live memberships.
    pub fn len(&self) -> usize {
        self.memberships().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &ValidatorPoolKey) -> bool {
        self.memberships().any(|k| k == key)
    }

    /// The staker's memberships with one validator, in slot order.
    pub fn memberships_for(&self, validator_id: u64) -> impl Iterator<Item = &ValidatorPoolKey> {
        self.memberships()
            .filter(move |k| k.validator_id == validator_id)
    }

    /// Whether `add` would succeed: the key is already present or a slot is
    /// free.
    pub fn can_add(&self, key: &ValidatorPoolKey) -> bool {
        self.contains(key) || self.entries.iter().any(|e| e.is_none())
    }

    /// Record a membership. Idempotent: a key already present is a no-op.
    ///
    /// # Errors
    /// Returns `AtollError::Capacity` when the key is absent and every slot
    /// is taken.
    pub fn add(&mut self, key: ValidatorPoolKey) -> Result<(), AtollError> {
        if self.contains(&key) {
            return Ok(());
        }
        let capacity = self.entries.len();
        let slot = self
            .entries
            .iter_mut()
            .find(|e| e.is_none())
            .ok_or_else(|| {
                AtollError::Capacity(format!(
                    "Staker already holds {} concurrent pool memberships",
                    capacity
                ))
            })?;
        *slot = Some(key);
        Ok(())
    }

    /// Remove a membership. Returns `true` when the staker no longer holds
    /// any membership with that key's validator, the signal the registry
    /// uses to decrement the validator's staker count.
    ///
    /// # Errors
    /// Returns `AtollError::NotFound` when the exact key is not present.
    pub fn remove(&mut self, key: &ValidatorPoolKey) -> Result<bool, AtollError> {
        let slot = self
            .entries
            .iter_mut()
            .find(|e| e.as_ref() == Some(key))
            .ok_or_else(|| {
                AtollError::NotFound(format!(
                    "No membership for validator {} pool {}",
                    key.validator_id, key.pool_id
                ))
            })?;
        *slot = None;
        Ok(self.memberships_for(key.validator_id).next().is_none())
    }
}
