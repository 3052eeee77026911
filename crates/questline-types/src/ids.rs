//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Users, quests, store items, status effects and ledger entries each get a
//! distinct ID type so that a quest ID can never be passed where a user ID
//! is expected. All IDs use UUID v7 (time-ordered).
//!
//! The persistence collaborator usually assigns IDs itself. The `new()`
//! constructors exist for app-side generation (tests, seed data, onboarding).

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a user (the owner of progression and attributes).
    UserId
}

define_id! {
    /// Unique identifier for a single quest instance.
    QuestId
}

define_id! {
    /// Unique identifier for an item in the store catalog.
    ItemId
}

define_id! {
    /// Unique identifier for an active status effect (buff or debuff).
    EffectId
}

define_id! {
    /// Unique identifier for a currency ledger entry.
    LedgerEntryId
}
