//! Error types for the questline-progression crate.
//!
//! The pure engine raises a small set of typed errors. Ownership and
//! already-completed checks are enforced by the completion transaction;
//! malformed quest definitions are rejected by the reward resolver rather
//! than silently clamped.

use questline_ledger::LedgerError;
use questline_types::{QuestId, UserId};

/// Errors that can occur during progression computations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProgressionError {
    /// The quest has already been completed; rewards were granted once.
    #[error("quest {quest_id} is already completed")]
    AlreadyCompleted {
        /// The quest that was re-submitted.
        quest_id: QuestId,
    },

    /// The quest belongs to a different user.
    #[error("quest {quest_id} belongs to {owner}, not {user_id}")]
    NotOwner {
        /// The quest being completed.
        quest_id: QuestId,
        /// The user attempting the completion.
        user_id: UserId,
        /// The actual owner of the quest.
        owner: UserId,
    },

    /// Input data is malformed (negative reward, level zero, bad config).
    #[error("validation failed: {reason}")]
    Validation {
        /// Description of what was wrong.
        reason: String,
    },

    /// The user cannot afford a store item.
    #[error("insufficient funds: price {price}, balance {balance}")]
    InsufficientFunds {
        /// Price of the item.
        price: u64,
        /// Currency the user holds.
        balance: u64,
    },

    /// An arithmetic overflow occurred.
    #[error("arithmetic overflow: {context}")]
    ArithmeticOverflow {
        /// Description of what was being computed.
        context: String,
    },

    /// A ledger entry could not be built for a currency movement.
    #[error("ledger entry rejected: {0}")]
    Ledger(#[from] LedgerError),
}

impl ProgressionError {
    /// Shorthand for a [`ProgressionError::Validation`].
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    /// Shorthand for a [`ProgressionError::ArithmeticOverflow`].
    pub fn overflow(context: impl Into<String>) -> Self {
        Self::ArithmeticOverflow {
            context: context.into(),
        }
    }
}
