//! Balance derivation and reconciliation for the currency ledger.
//!
//! A user's balance is the sum of every entry crediting them minus the sum
//! of every entry debiting them. Reconciliation compares that derived
//! balance with the `currency` field of their stored progression state.
//! Because the completion transaction writes both in a single commit, a
//! mismatch means a write bypassed the engine or data was corrupted.

use tracing::warn;
use uuid::Uuid;

use questline_types::{EntityType, LedgerEntry};

use crate::{BalanceAnomaly, LedgerError};

/// The result of reconciling one user's balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconciliationResult {
    /// Stored currency equals the derived balance.
    Balanced,
    /// Stored currency disagrees with the ledger.
    Anomaly(BalanceAnomaly),
}

/// Derive a user's balance from a slice of entries.
///
/// # Errors
///
/// Returns [`LedgerError::Overflow`] if credits or debits overflow `u64`
/// and [`LedgerError::NegativeBalance`] if debits exceed credits.
pub fn derive_balance(user: Uuid, entries: &[LedgerEntry]) -> Result<u64, LedgerError> {
    let mut credits: u64 = 0;
    let mut debits: u64 = 0;

    for entry in entries {
        if entry.to_entity_type == EntityType::User && entry.to_entity == Some(user) {
            credits = credits
                .checked_add(entry.amount)
                .ok_or(LedgerError::Overflow { user })?;
        }
        if entry.from_entity_type == EntityType::User && entry.from_entity == Some(user) {
            debits = debits
                .checked_add(entry.amount)
                .ok_or(LedgerError::Overflow { user })?;
        }
    }

    credits
        .checked_sub(debits)
        .ok_or(LedgerError::NegativeBalance {
            user,
            credits,
            debits,
        })
}

/// Reconcile a user's stored currency against the ledger.
pub fn reconcile(user: Uuid, recorded: u64, entries: &[LedgerEntry]) -> ReconciliationResult {
    match derive_balance(user, entries) {
        Ok(derived) if derived == recorded => ReconciliationResult::Balanced,
        Ok(derived) => {
            warn!(%user, recorded, derived, "currency does not match ledger balance");
            ReconciliationResult::Anomaly(BalanceAnomaly {
                user,
                recorded,
                derived: Some(derived),
                message: format!(
                    "BALANCE_ANOMALY for {user}: stored currency {recorded}, ledger balance {derived}",
                ),
            })
        }
        Err(e) => {
            warn!(%user, recorded, error = %e, "ledger balance could not be derived");
            ReconciliationResult::Anomaly(BalanceAnomaly {
                user,
                recorded,
                derived: None,
                message: format!("BALANCE_ANOMALY for {user}: {e}"),
            })
        }
    }
}
