//! Append-only currency ledger for the Questline progression engine.
//!
//! Every currency movement a user experiences is recorded here: the
//! onboarding grant, base quest rewards, variable-ratio bonuses, and store
//! purchases. A user's stored `currency` must always equal the balance the
//! ledger derives for them. A mismatch is a [`BalanceAnomaly`], the
//! engine's most important integrity alert.
//!
//! # Modules
//!
//! - [`ledger`] -- The [`Ledger`] struct: append-only log, balances and reconciliation.
//! - [`transaction`] -- The [`TransactionBuilder`] for validated entry construction.
//! - [`reconciliation`] -- Balance derivation and anomaly detection.
//!
//! # Entry types
//!
//! | Type | From (debit) | To (credit) |
//! |------|-------------|-------------|
//! | `OnboardingGrant` | System | User |
//! | `QuestReward` | Quest | User |
//! | `VariableBonus` | System | User |
//! | `Purchase` | User | Store |
//!
//! # Usage
//!
//! ```
//! use chrono::Utc;
//! use questline_ledger::{Ledger, ReconciliationResult, transaction};
//! use uuid::Uuid;
//!
//! let mut ledger = Ledger::new();
//! let user = Uuid::now_v7();
//! let quest = Uuid::now_v7();
//! let now = Utc::now();
//!
//! ledger.extend(transaction::onboarding_grant(user, 100, now).ok());
//! ledger.extend(transaction::quest_reward(quest, user, 15, now).ok());
//!
//! assert_eq!(ledger.balance_of(user), Ok(115));
//! assert_eq!(ledger.reconcile(user, 115), ReconciliationResult::Balanced);
//! ```

pub mod ledger;
pub mod reconciliation;
pub mod transaction;

// Re-export primary types at crate root.
pub use ledger::Ledger;
pub use reconciliation::ReconciliationResult;
pub use transaction::TransactionBuilder;

use questline_types::LedgerEntryType;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur when recording ledger entries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// Amount must be strictly positive.
    #[error("ledger entry amount must be non-zero")]
    ZeroAmount,

    /// A required field was not set on the builder.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// The from/to party types do not match the contract for the entry type.
    #[error("invalid party for {entry_type:?} {side}: expected {expected}, got {actual}")]
    InvalidEntityType {
        /// The entry type being validated.
        entry_type: LedgerEntryType,
        /// Which side of the entry ("from" or "to").
        side: &'static str,
        /// The expected party type.
        expected: String,
        /// The actual party type.
        actual: String,
    },

    /// A system party carried an ID, or a non-system party lacked one.
    #[error("party ID mismatch on {side} side of {entry_type:?}")]
    PartyIdMismatch {
        /// The entry type being validated.
        entry_type: LedgerEntryType,
        /// Which side of the entry ("from" or "to").
        side: &'static str,
    },

    /// Summing entries overflowed `u64`.
    #[error("arithmetic overflow while computing balance for {user}")]
    Overflow {
        /// The user whose balance was being computed.
        user: Uuid,
    },

    /// Debits exceed credits for a user.
    #[error("negative balance for {user}: credits {credits}, debits {debits}")]
    NegativeBalance {
        /// The user whose balance went negative.
        user: Uuid,
        /// Total credited.
        credits: u64,
        /// Total debited.
        debits: u64,
    },
}

// ---------------------------------------------------------------------------
// Anomaly type
// ---------------------------------------------------------------------------

/// A disagreement between a user's stored currency and their ledger balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceAnomaly {
    /// The user whose balance disagrees.
    pub user: Uuid,
    /// Currency according to the stored progression state.
    pub recorded: u64,
    /// Balance derived from the ledger, `None` if it could not be derived.
    pub derived: Option<u64>,
    /// Human-readable description of the anomaly.
    pub message: String,
}

impl core::fmt::Display for BalanceAnomaly {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.message)
    }
}
