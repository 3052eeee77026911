//! The persistence collaborator and its in-memory implementation.
//!
//! The engine computes; a [`ProgressionStore`] owns the authoritative
//! state. Every read of user state comes with a per-user version, and
//! [`ProgressionStore::commit`] writes a whole [`Changeset`] only if that
//! version is still current. One version covers progression, attributes
//! and effects, so a drift tick and a quest completion racing on the same
//! user always conflict instead of losing an update.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use questline_ledger::{Ledger, ReconciliationResult};
use questline_progression::UserSnapshot;
use questline_types::{
    Attributes, LedgerEntry, ProgressionState, Quest, QuestId, StatusEffect, UserId,
};

/// Errors reported by a [`ProgressionStore`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No state exists for the user.
    #[error("user not found: {0}")]
    UserNotFound(UserId),

    /// The user has already been onboarded.
    #[error("user already exists: {0}")]
    UserExists(UserId),

    /// No quest with the given ID exists.
    #[error("quest not found: {0}")]
    QuestNotFound(QuestId),

    /// The user's state changed since it was read.
    #[error("version conflict for {user}: expected {expected}, found {actual}")]
    Conflict {
        /// The user whose state changed.
        user: UserId,
        /// The version the writer read.
        expected: u64,
        /// The version currently stored.
        actual: u64,
    },

    /// The backing storage cannot serve the request.
    #[error("store unavailable: {reason}")]
    Unavailable {
        /// Description of the failure.
        reason: String,
    },
}

/// A value paired with the user version it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned<T> {
    /// The loaded value.
    pub value: T,
    /// The user's version at read time.
    pub version: u64,
}

/// All writes of one operation, applied together or not at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Changeset {
    /// The user whose state is written.
    pub user: UserId,
    /// The version the computation was based on.
    pub expected_version: u64,
    /// New progression state, if changed.
    pub progression: Option<ProgressionState>,
    /// New attributes, if changed.
    pub attributes: Option<Attributes>,
    /// Quest to overwrite (completion flag and timestamp).
    pub quest: Option<Quest>,
    /// Full replacement of the user's status effects, if changed.
    pub effects: Option<Vec<StatusEffect>>,
    /// Ledger entries to append.
    pub ledger_entries: Vec<LedgerEntry>,
}

impl Changeset {
    /// Start an empty changeset based on `expected_version`.
    pub const fn new(user: UserId, expected_version: u64) -> Self {
        Self {
            user,
            expected_version,
            progression: None,
            attributes: None,
            quest: None,
            effects: None,
            ledger_entries: Vec::new(),
        }
    }

    /// Write a new progression state.
    #[must_use]
    pub const fn with_progression(mut self, progression: ProgressionState) -> Self {
        self.progression = Some(progression);
        self
    }

    /// Write new attributes.
    #[must_use]
    pub const fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = Some(attributes);
        self
    }

    /// Overwrite a quest.
    #[must_use]
    pub fn with_quest(mut self, quest: Quest) -> Self {
        self.quest = Some(quest);
        self
    }

    /// Replace the user's status effects.
    #[must_use]
    pub fn with_effects(mut self, effects: Vec<StatusEffect>) -> Self {
        self.effects = Some(effects);
        self
    }

    /// Append ledger entries.
    #[must_use]
    pub fn with_ledger_entries(mut self, entries: impl IntoIterator<Item = LedgerEntry>) -> Self {
        self.ledger_entries.extend(entries);
        self
    }
}

/// Storage for user progression, quests and the currency ledger.
///
/// All methods take `&self`; implementations provide their own
/// synchronization so one store can serve concurrent callers.
pub trait ProgressionStore {
    /// Create the records of a newly onboarded user at version 1.
    fn create_user(
        &self,
        user: UserId,
        progression: ProgressionState,
        attributes: Attributes,
        ledger_entries: Vec<LedgerEntry>,
    ) -> Result<u64, StoreError>;

    /// Load a user's progression state.
    fn load_progression(&self, user: UserId) -> Result<Versioned<ProgressionState>, StoreError>;

    /// Load a user's stored attributes.
    fn load_attributes(&self, user: UserId) -> Result<Versioned<Attributes>, StoreError>;

    /// Load a user's status effects (covered by the same version).
    fn load_effects(&self, user: UserId) -> Result<Versioned<Vec<StatusEffect>>, StoreError>;

    /// Load a quest instance.
    fn load_quest(&self, quest: QuestId) -> Result<Quest, StoreError>;

    /// Add a quest instance supplied by the quest catalog.
    fn insert_quest(&self, quest: Quest) -> Result<(), StoreError>;

    /// Apply a changeset if the user is still at `expected_version`.
    ///
    /// Returns the new version. On [`StoreError::Conflict`] nothing is
    /// written.
    fn commit(&self, changeset: Changeset) -> Result<u64, StoreError>;

    /// Compare the user's stored currency with the ledger.
    fn reconcile(&self, user: UserId) -> Result<ReconciliationResult, StoreError>;

    /// Load progression and attributes at one consistent version.
    ///
    /// The default implementation performs two reads and reports a
    /// [`StoreError::Conflict`] if a write landed between them.
    fn load_snapshot(&self, user: UserId) -> Result<Versioned<UserSnapshot>, StoreError> {
        let progression = self.load_progression(user)?;
        let attributes = self.load_attributes(user)?;
        if progression.version != attributes.version {
            return Err(StoreError::Conflict {
                user,
                expected: progression.version,
                actual: attributes.version,
            });
        }
        Ok(Versioned {
            value: UserSnapshot {
                progression: progression.value,
                attributes: attributes.value,
            },
            version: progression.version,
        })
    }
}

// ---------------------------------------------------------------------------
// In-memory implementation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct UserRecord {
    progression: ProgressionState,
    attributes: Attributes,
    effects: Vec<StatusEffect>,
    version: u64,
}

#[derive(Debug, Default)]
struct MemoryState {
    users: BTreeMap<UserId, UserRecord>,
    quests: BTreeMap<QuestId, Quest>,
    ledger: Ledger,
}

/// A mutex-guarded in-memory [`ProgressionStore`].
///
/// Used by the simulation binary and the test suites.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of ledger entries recorded so far.
    pub fn ledger_len(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.ledger.len())
    }

    /// Copy of every ledger entry touching `user`.
    pub fn ledger_entries_for(&self, user: UserId) -> Result<Vec<LedgerEntry>, StoreError> {
        Ok(self
            .lock()?
            .ledger
            .entries_for(user.into_inner())
            .into_iter()
            .cloned()
            .collect())
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        self.state.lock().map_err(|e| StoreError::Unavailable {
            reason: format!("store lock poisoned: {e}"),
        })
    }
}

impl ProgressionStore for MemoryStore {
    fn create_user(
        &self,
        user: UserId,
        progression: ProgressionState,
        attributes: Attributes,
        ledger_entries: Vec<LedgerEntry>,
    ) -> Result<u64, StoreError> {
        let mut state = self.lock()?;
        if state.users.contains_key(&user) {
            return Err(StoreError::UserExists(user));
        }
        state.users.insert(
            user,
            UserRecord {
                progression,
                attributes,
                effects: Vec::new(),
                version: 1,
            },
        );
        state.ledger.extend(ledger_entries);
        Ok(1)
    }

    fn load_progression(&self, user: UserId) -> Result<Versioned<ProgressionState>, StoreError> {
        let state = self.lock()?;
        let record = state.users.get(&user).ok_or(StoreError::UserNotFound(user))?;
        Ok(Versioned {
            value: record.progression,
            version: record.version,
        })
    }

    fn load_attributes(&self, user: UserId) -> Result<Versioned<Attributes>, StoreError> {
        let state = self.lock()?;
        let record = state.users.get(&user).ok_or(StoreError::UserNotFound(user))?;
        Ok(Versioned {
            value: record.attributes,
            version: record.version,
        })
    }

    fn load_effects(&self, user: UserId) -> Result<Versioned<Vec<StatusEffect>>, StoreError> {
        let state = self.lock()?;
        let record = state.users.get(&user).ok_or(StoreError::UserNotFound(user))?;
        Ok(Versioned {
            value: record.effects.clone(),
            version: record.version,
        })
    }

    fn load_quest(&self, quest: QuestId) -> Result<Quest, StoreError> {
        let state = self.lock()?;
        state
            .quests
            .get(&quest)
            .cloned()
            .ok_or(StoreError::QuestNotFound(quest))
    }

    fn insert_quest(&self, quest: Quest) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        state.quests.insert(quest.id, quest);
        Ok(())
    }

    fn load_snapshot(&self, user: UserId) -> Result<Versioned<UserSnapshot>, StoreError> {
        let state = self.lock()?;
        let record = state.users.get(&user).ok_or(StoreError::UserNotFound(user))?;
        Ok(Versioned {
            value: UserSnapshot {
                progression: record.progression,
                attributes: record.attributes,
            },
            version: record.version,
        })
    }

    fn commit(&self, changeset: Changeset) -> Result<u64, StoreError> {
        let mut state = self.lock()?;
        let user = changeset.user;

        // Validate everything before the first write.
        let record = state.users.get(&user).ok_or(StoreError::UserNotFound(user))?;
        if record.version != changeset.expected_version {
            return Err(StoreError::Conflict {
                user,
                expected: changeset.expected_version,
                actual: record.version,
            });
        }
        let next_version = record
            .version
            .checked_add(1)
            .ok_or_else(|| StoreError::Unavailable {
                reason: format!("version counter exhausted for {user}"),
            })?;
        if let Some(quest) = changeset.quest.as_ref() {
            let stored = state
                .quests
                .get(&quest.id)
                .ok_or(StoreError::QuestNotFound(quest.id))?;
            // A completed quest is terminal: a second completion loses.
            if stored.completed {
                return Err(StoreError::Conflict {
                    user,
                    expected: changeset.expected_version,
                    actual: next_version,
                });
            }
        }

        let Changeset {
            progression,
            attributes,
            quest,
            effects,
            ledger_entries,
            ..
        } = changeset;

        if let Some(quest) = quest {
            state.quests.insert(quest.id, quest);
        }
        if let Some(record) = state.users.get_mut(&user) {
            if let Some(progression) = progression {
                record.progression = progression;
            }
            if let Some(attributes) = attributes {
                record.attributes = attributes;
            }
            if let Some(effects) = effects {
                record.effects = effects;
            }
            record.version = next_version;
        }
        state.ledger.extend(ledger_entries);
        Ok(next_version)
    }

    fn reconcile(&self, user: UserId) -> Result<ReconciliationResult, StoreError> {
        let state = self.lock()?;
        let record = state.users.get(&user).ok_or(StoreError::UserNotFound(user))?;
        Ok(state
            .ledger
            .reconcile(user.into_inner(), record.progression.currency))
    }
}
