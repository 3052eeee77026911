//! The currency ledger: an append-only log of every currency movement.
//!
//! The [`Ledger`] struct holds all [`LedgerEntry`] values and provides
//! methods for appending movements, deriving balances, and reconciling
//! them against stored progression state.
//!
//! # Design
//!
//! - **Append-only**: entries are never modified or deleted.
//! - **Double-entry**: every movement has a debit (from) and credit (to).
//! - **Reconciliation**: a user's stored currency must equal their derived balance.

use uuid::Uuid;

use questline_types::{EntityType, LedgerEntry};

use crate::reconciliation::{ReconciliationResult, derive_balance, reconcile};
use crate::LedgerError;

/// The append-only ledger of currency movements.
#[derive(Debug, Default, Clone)]
pub struct Ledger {
    /// All entries, in insertion order.
    entries: Vec<LedgerEntry>,
}

impl Ledger {
    /// Create a new empty ledger.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Return the number of entries in the ledger.
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return whether the ledger has no entries.
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append pre-built entries in order.
    ///
    /// Entries are constructed ahead of a commit (the completion
    /// transaction builds them before persistence accepts the changeset),
    /// so the ledger only ever receives validated, timestamped entries.
    pub fn extend(&mut self, entries: impl IntoIterator<Item = LedgerEntry>) {
        self.entries.extend(entries);
    }

    /// Return all entries.
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Return every entry that credits or debits the given user.
    pub fn entries_for(&self, user: Uuid) -> Vec<&LedgerEntry> {
        self.entries
            .iter()
            .filter(|e| touches_user(e, user))
            .collect()
    }

    /// Derive a user's balance from the ledger (credits minus debits).
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Overflow`] if the sums overflow and
    /// [`LedgerError::NegativeBalance`] if debits exceed credits.
    pub fn balance_of(&self, user: Uuid) -> Result<u64, LedgerError> {
        derive_balance(user, &self.entries)
    }

    /// Compare a user's stored currency against the ledger.
    pub fn reconcile(&self, user: Uuid, recorded_currency: u64) -> ReconciliationResult {
        reconcile(user, recorded_currency, &self.entries)
    }
}

/// Whether an entry names the user on either side.
pub(crate) fn touches_user(entry: &LedgerEntry, user: Uuid) -> bool {
    (entry.to_entity_type == EntityType::User && entry.to_entity == Some(user))
        || (entry.from_entity_type == EntityType::User && entry.from_entity == Some(user))
}
