//! Initial state for a newly onboarded user.

use chrono::{DateTime, Utc};

use questline_ledger::transaction;
use questline_types::{Attributes, LedgerEntry, ProgressionState, UserId};

use crate::attributes::normalize;
use crate::config::ProgressionConfig;
use crate::error::ProgressionError;

/// The records created when a user finishes onboarding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Onboarding {
    /// Level 1, no experience, starting currency.
    pub progression: ProgressionState,
    /// The starting attribute profile, clamped.
    pub attributes: Attributes,
    /// Grant entry for the starting currency, absent when it is zero.
    pub ledger_entry: Option<LedgerEntry>,
}

/// Progression state at onboarding.
pub const fn starting_state(config: &ProgressionConfig) -> ProgressionState {
    ProgressionState {
        level: 1,
        experience: 0,
        currency: config.starting_currency,
    }
}

/// Build the onboarding records for `user`.
///
/// # Errors
///
/// Returns [`ProgressionError::Ledger`] if the grant entry is rejected.
pub fn onboard(
    user: UserId,
    config: &ProgressionConfig,
    now: DateTime<Utc>,
) -> Result<Onboarding, ProgressionError> {
    let progression = starting_state(config);
    let ledger_entry = if progression.currency > 0 {
        Some(transaction::onboarding_grant(
            user.into_inner(),
            progression.currency,
            now,
        )?)
    } else {
        None
    };
    Ok(Onboarding {
        progression,
        attributes: normalize(config.starting_attributes),
        ledger_entry,
    })
}
