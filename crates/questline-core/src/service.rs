//! The progression service: load, compute, commit, retry.
//!
//! Each operation reads an authoritative snapshot from the store, runs the
//! pure engine over it, and commits the result with the version it read.
//! If the store reports a concurrent modification the whole computation is
//! redone from fresh state; a previously computed outcome is never
//! replayed. Any other commit failure discards the local result and
//! returns the re-fetched authoritative state to the caller.

use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::{debug, info, warn};

use questline_ledger::ReconciliationResult;
use questline_progression::{
    CompletionRules, ProgressionError, UserSnapshot, apply_drift, complete_quest,
    effective_attributes, level_progress_pct, onboard, prune_expired, purchase, xp_to_next_level,
};
use questline_types::{
    Attributes, HealthReading, ProgressionState, QuestId, RewardOutcome, StatusEffect, StoreItem,
    UserId,
};

use crate::config::EngineConfig;
use crate::store::{Changeset, ProgressionStore, StoreError, Versioned};

/// Errors surfaced by the progression service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The engine rejected the operation (already completed, not owner,
    /// malformed quest, insufficient funds).
    #[error(transparent)]
    Progression(#[from] ProgressionError),

    /// A read from the store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Every commit attempt lost to a concurrent modification.
    #[error("persistence conflict for {user} after {attempts} attempts")]
    PersistenceConflict {
        /// The user whose state kept changing.
        user: UserId,
        /// Number of commit attempts made.
        attempts: u32,
    },

    /// The commit failed for a reason other than a conflict. The locally
    /// computed result was discarded.
    #[error("commit failed for {user}: {source}")]
    CommitFailed {
        /// The user being written.
        user: UserId,
        /// The store failure.
        source: StoreError,
        /// Authoritative state re-fetched after the failure, if reachable.
        authoritative: Option<Box<UserView>>,
    },
}

impl ServiceError {
    /// Whether the caller can retry the same request later.
    ///
    /// Conflicts and transient store failures are retryable; engine
    /// rejections are not.
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::PersistenceConflict { .. }
                | Self::CommitFailed { .. }
                | Self::Store(StoreError::Unavailable { .. })
        )
    }
}

/// Everything the presentation layer needs to render a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserView {
    /// The user.
    pub user: UserId,
    /// Stored progression state.
    pub progression: ProgressionState,
    /// Stored attributes, without effects.
    pub attributes: Attributes,
    /// Attributes with active effects applied.
    pub effective_attributes: Attributes,
    /// Effects still running.
    pub active_effects: Vec<StatusEffect>,
    /// XP still needed for the next level.
    pub xp_to_next_level: u64,
    /// Progress towards the next level in whole percent.
    pub level_progress_pct: u32,
    /// Version the view was read at.
    pub version: u64,
}

/// Result of a store purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseReceipt {
    /// Progression after the debit.
    pub progression: ProgressionState,
    /// Effects granted by the item.
    pub granted: Vec<StatusEffect>,
}

/// Orchestrates engine operations against a [`ProgressionStore`].
#[derive(Debug)]
pub struct ProgressionService<S> {
    store: S,
    config: EngineConfig,
}

impl<S: ProgressionStore> ProgressionService<S> {
    /// Create a service over `store` with the given rules.
    pub const fn new(store: S, config: EngineConfig) -> Self {
        Self { store, config }
    }

    /// The underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// The rules in force.
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Create the starting records of a new user.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Store`] if the user already exists.
    pub fn onboard(&self, user: UserId, now: DateTime<Utc>) -> Result<UserView, ServiceError> {
        let start = onboard(user, &self.config.progression, now)?;
        self.store.create_user(
            user,
            start.progression,
            start.attributes,
            start.ledger_entry.into_iter().collect(),
        )?;
        info!(
            %user,
            currency = start.progression.currency,
            "user onboarded"
        );
        self.snapshot(user, now)
    }

    /// Complete a quest for a user.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Progression`] for engine rejections
    /// (including [`ProgressionError::AlreadyCompleted`]),
    /// [`ServiceError::PersistenceConflict`] if retries run out, and
    /// [`ServiceError::CommitFailed`] for other commit failures.
    pub fn complete_quest<R: Rng + ?Sized>(
        &self,
        user: UserId,
        quest_id: QuestId,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<RewardOutcome, ServiceError> {
        let rules = CompletionRules {
            progression: &self.config.progression,
            bonus: &self.config.bonus,
        };
        let outcome = self.commit_with_retry(user, now, |snapshot| {
            let quest = self.store.load_quest(quest_id)?;
            let done = complete_quest(user, &quest, &snapshot.value, rules, rng, now)?;
            let changeset = Changeset::new(user, snapshot.version)
                .with_progression(done.progression)
                .with_attributes(done.attributes)
                .with_quest(done.quest)
                .with_ledger_entries(done.ledger_entries);
            Ok((changeset, done.outcome))
        })?;

        info!(
            %user,
            quest_id = %quest_id,
            xp = outcome.xp_granted,
            currency = outcome.currency_granted,
            bonus = outcome.bonus_currency,
            level = outcome.new_level,
            leveled_up = outcome.leveled_up,
            "quest completed"
        );
        Ok(outcome)
    }

    /// Apply one passive drift tick to a user's attributes.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::PersistenceConflict`] if retries run out and
    /// [`ServiceError::CommitFailed`] for other commit failures.
    pub fn apply_drift(
        &self,
        user: UserId,
        reading: &HealthReading,
    ) -> Result<Attributes, ServiceError> {
        // Drift is not time-stamped; the clock only matters for the view
        // returned after a failed commit.
        let attributes = self.commit_with_retry(user, Utc::now(), |snapshot| {
            let next = apply_drift(snapshot.value.attributes, reading, &self.config.drift);
            let changeset = Changeset::new(user, snapshot.version).with_attributes(next);
            Ok((changeset, next))
        })?;
        debug!(
            %user,
            vitality = attributes.vitality,
            energy = attributes.energy,
            focus = attributes.focus,
            mood = attributes.mood,
            "drift applied"
        );
        Ok(attributes)
    }

    /// Buy a store item.
    ///
    /// Expired effects are pruned in the same commit.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Progression`] with
    /// [`ProgressionError::InsufficientFunds`] if the user cannot pay, plus
    /// the commit failures of the other operations.
    pub fn purchase(
        &self,
        user: UserId,
        item: &StoreItem,
        now: DateTime<Utc>,
    ) -> Result<PurchaseReceipt, ServiceError> {
        let receipt = self.commit_with_retry(user, now, |snapshot| {
            let effects = self.store.load_effects(user)?;
            if effects.version != snapshot.version {
                return Err(StoreError::Conflict {
                    user,
                    expected: snapshot.version,
                    actual: effects.version,
                }
                .into());
            }
            let bought = purchase(user, &snapshot.value.progression, item, now)?;
            let mut kept = prune_expired(effects.value, now);
            kept.extend(bought.effects.iter().cloned());
            let changeset = Changeset::new(user, snapshot.version)
                .with_progression(bought.progression)
                .with_effects(kept)
                .with_ledger_entries(bought.ledger_entry);
            Ok((
                changeset,
                PurchaseReceipt {
                    progression: bought.progression,
                    granted: bought.effects,
                },
            ))
        })?;
        info!(
            %user,
            item = %item.name,
            price = item.price,
            currency = receipt.progression.currency,
            "item purchased"
        );
        Ok(receipt)
    }

    /// Read the authoritative view of a user.
    ///
    /// Progression, attributes and effects are read at one version; a
    /// write landing between the reads triggers a re-read.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Store`] if the user cannot be loaded and
    /// [`ServiceError::PersistenceConflict`] if no consistent read succeeds
    /// within the retry budget.
    pub fn snapshot(&self, user: UserId, now: DateTime<Utc>) -> Result<UserView, ServiceError> {
        let max_attempts = self.config.service.max_commit_retries.saturating_add(1);
        let mut attempts: u32 = 0;

        while attempts < max_attempts {
            attempts = attempts.saturating_add(1);

            let snapshot = match self.store.load_snapshot(user) {
                Ok(snapshot) => snapshot,
                Err(StoreError::Conflict { .. }) => continue,
                Err(e) => return Err(e.into()),
            };
            let effects = self.store.load_effects(user)?;
            if effects.version != snapshot.version {
                debug!(
                    %user,
                    snapshot_version = snapshot.version,
                    effects_version = effects.version,
                    "torn read, reloading view"
                );
                continue;
            }
            let active = prune_expired(effects.value, now);
            return Ok(build_view(user, &snapshot, active, now));
        }

        warn!(%user, attempts, "no consistent view after repeated reads");
        Err(ServiceError::PersistenceConflict { user, attempts })
    }

    /// Compare the user's stored currency with the ledger.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Store`] if the store cannot be read.
    pub fn reconcile(&self, user: UserId) -> Result<ReconciliationResult, ServiceError> {
        Ok(self.store.reconcile(user)?)
    }

    /// Run `compute` against fresh state until a commit succeeds.
    fn commit_with_retry<T, F>(
        &self,
        user: UserId,
        now: DateTime<Utc>,
        mut compute: F,
    ) -> Result<T, ServiceError>
    where
        F: FnMut(&Versioned<UserSnapshot>) -> Result<(Changeset, T), ServiceError>,
    {
        let max_attempts = self.config.service.max_commit_retries.saturating_add(1);
        let mut attempts: u32 = 0;

        while attempts < max_attempts {
            attempts = attempts.saturating_add(1);

            let snapshot = match self.store.load_snapshot(user) {
                Ok(snapshot) => snapshot,
                Err(StoreError::Conflict { .. }) => continue,
                Err(e) => return Err(e.into()),
            };

            let (changeset, result) = match compute(&snapshot) {
                Ok(pair) => pair,
                Err(ServiceError::Store(StoreError::Conflict { .. })) => continue,
                Err(e) => return Err(e),
            };

            match self.store.commit(changeset) {
                Ok(version) => {
                    debug!(%user, version, attempts, "changeset committed");
                    return Ok(result);
                }
                Err(StoreError::Conflict {
                    expected, actual, ..
                }) => {
                    warn!(
                        %user,
                        expected,
                        actual,
                        attempt = attempts,
                        "commit conflict, recomputing from fresh state"
                    );
                }
                Err(source) => return Err(self.commit_failed(user, source, now)),
            }
        }

        warn!(%user, attempts, "giving up after repeated commit conflicts");
        Err(ServiceError::PersistenceConflict { user, attempts })
    }

    /// Discard the local result and re-fetch what the store actually holds.
    fn commit_failed(
        &self,
        user: UserId,
        source: StoreError,
        now: DateTime<Utc>,
    ) -> ServiceError {
        warn!(%user, error = %source, "commit failed, re-fetching authoritative state");
        let authoritative = self.snapshot(user, now).ok().map(Box::new);
        ServiceError::CommitFailed {
            user,
            source,
            authoritative,
        }
    }
}

fn build_view(
    user: UserId,
    snapshot: &Versioned<UserSnapshot>,
    active_effects: Vec<StatusEffect>,
    now: DateTime<Utc>,
) -> UserView {
    let progression = snapshot.value.progression;
    let attributes = snapshot.value.attributes;
    UserView {
        user,
        progression,
        attributes,
        effective_attributes: effective_attributes(attributes, &active_effects, now),
        active_effects,
        xp_to_next_level: xp_to_next_level(&progression),
        level_progress_pct: level_progress_pct(&progression),
        version: snapshot.version,
    }
}
