// crates/atoll-registry/src/gating.rs
//
// Entry gating: the rule a staker must satisfy before a validator accepts
// their first deposit, checked against a staker-supplied proof.
//
// Asset-balance and name-service lookups go through the collaborator
// traits; any mismatch aborts the enclosing addStake before funds move.

use serde::{Deserialize, Serialize};

use atoll_core::{Account, AssetHoldingOracle, AtollError, NameService};

/// A validator's configured entry-gating rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GatingSpec {
    /// No gating; anyone may stake.
    None,
    /// The staker must hold an asset created by `creator`.
    CreatorAccount {
        creator: Account,
        /// Minimum held balance of the qualifying asset; 0 is treated as 1.
        min_balance: u64,
    },
    /// The staker must hold one of the listed assets (at most 4).
    AssetId {
        asset_ids: Vec<u64>,
        min_balance: u64,
    },
    /// The staker must hold an asset whose creator is the owner of the
    /// configured name-service entry.
    CreatorNfd {
        nfd_app_id: u64,
        min_balance: u64,
    },
    /// The staker must own a name-service segment of the configured parent.
    SegmentNfd { parent_app_id: u64 },
}

/// The staker-supplied evidence for a gating check. Which field is required
/// depends on the validator's rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatingProof {
    /// Candidate asset id, for the asset-based rules.
    pub asset_id: Option<u64>,
    /// Candidate name-service app id, for the segment rule.
    pub nfd_app_id: Option<u64>,
}

fn require_asset(proof: &GatingProof) -> Result<u64, AtollError> {
    proof.asset_id.ok_or_else(|| {
        AtollError::Validation("Gating rule requires an asset id in the proof".to_string())
    })
}

fn check_held_balance(
    oracle: &dyn AssetHoldingOracle,
    staker: &Account,
    asset_id: u64,
    min_balance: u64,
) -> Result<(), AtollError> {
    let held = oracle.holds_asset(*staker, asset_id)?;
    let required = min_balance.max(1);
    if held < required {
        return Err(AtollError::Validation(format!(
            "Staker holds {} of asset {}, gating requires {}",
            held, asset_id, required
        )));
    }
    Ok(())
}

/// Check a staker's proof against a validator's gating rule.
///
/// # Errors
/// - `AtollError::Validation` when the proof does not satisfy the rule.
/// - `AtollError::ExternalDependency` when a lookup fails; the caller may
///   retry once the dependency recovers.
pub fn verify_entry_gating(
    spec: &GatingSpec,
    staker: &Account,
    proof: &GatingProof,
    oracle: &dyn AssetHoldingOracle,
    name_service: &dyn NameService,
) -> Result<(), AtollError> {
    match spec {
        GatingSpec::None => Ok(()),

        GatingSpec::CreatorAccount {
            creator,
            min_balance,
        } => {
            let asset_id = require_asset(proof)?;
            if oracle.asset_creator(asset_id)? != *creator {
                return Err(AtollError::Validation(format!(
                    "Asset {} was not created by the gating creator account",
                    asset_id
                )));
            }
            check_held_balance(oracle, staker, asset_id, *min_balance)
        }

        GatingSpec::AssetId {
            asset_ids,
            min_balance,
        } => {
            let asset_id = require_asset(proof)?;
            if !asset_ids.contains(&asset_id) {
                return Err(AtollError::Validation(format!(
                    "Asset {} is not in the gating asset list",
                    asset_id
                )));
            }
            check_held_balance(oracle, staker, asset_id, *min_balance)
        }

        GatingSpec::CreatorNfd {
            nfd_app_id,
            min_balance,
        } => {
            let asset_id = require_asset(proof)?;
            let nfd_owner = name_service.resolve(*nfd_app_id)?;
            if oracle.asset_creator(asset_id)? != nfd_owner {
                return Err(AtollError::Validation(format!(
                    "Asset {} creator does not match the owner of NFD {}",
                    asset_id, nfd_app_id
                )));
            }
            check_held_balance(oracle, staker, asset_id, *min_balance)
        }

        GatingSpec::SegmentNfd { parent_app_id } => {
            let nfd_app_id = proof.nfd_app_id.ok_or_else(|| {
                AtollError::Validation(
                    "Gating rule requires a name-service app id in the proof".to_string(),
                )
            })?;
            if !name_service.is_segment_of(nfd_app_id, *parent_app_id)? {
                return Err(AtollError::Validation(format!(
                    "NFD {} is not a segment of parent {}",
                    nfd_app_id, parent_app_id
                )));
            }
            if name_service.resolve(nfd_app_id)? != *staker {
                return Err(AtollError::Validation(format!(
                    "NFD {} is not owned by the staker",
                    nfd_app_id
                )));
            }
            Ok(())
        }
    }
}
