//! Integration tests for the progression service over the in-memory store.
//!
//! Covers the transactional contract: one-shot completion, recomputation
//! on conflict, bounded retries, and re-fetch after a failed commit.

// Integration tests use expect/unwrap extensively for clarity -- panicking
// on failure is the correct behavior in test code.
#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]

use std::collections::BTreeMap;
use std::sync::{Arc, Barrier};
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::{TimeDelta, Utc};
use rand::SeedableRng;
use rand::rngs::SmallRng;

use questline_core::config::EngineConfig;
use questline_core::service::{ProgressionService, ServiceError};
use questline_core::store::{Changeset, MemoryStore, ProgressionStore, StoreError, Versioned};
use questline_ledger::ReconciliationResult;
use questline_progression::{BonusConfig, ProgressionError, UserSnapshot};
use questline_types::{
    Attribute, Attributes, EffectId, EffectTemplate, HealthReading, ItemId, ItemKind, LedgerEntry,
    LedgerEntryType, ProgressionState, Quest, QuestId, StatusEffect, StoreItem, UserId,
};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn config_without_bonus() -> EngineConfig {
    EngineConfig {
        bonus: BonusConfig {
            chance_pct: 0,
            ..BonusConfig::default()
        },
        ..EngineConfig::default()
    }
}

fn exercise_quest(owner: UserId) -> Quest {
    let mut rewards = BTreeMap::new();
    rewards.insert(Attribute::Vitality, 5);
    rewards.insert(Attribute::Energy, 3);
    Quest {
        id: QuestId::new(),
        owner,
        title: String::from("30 minutes of exercise"),
        xp_reward: 20,
        currency_reward: 15,
        attribute_rewards: rewards,
        recurring: false,
        recurring_type: None,
        completed: false,
        completed_at: None,
        created_at: Utc::now(),
    }
}

fn focus_potion() -> StoreItem {
    StoreItem {
        id: ItemId::new(),
        name: String::from("Focus Potion"),
        price: 30,
        kind: ItemKind::Consumable,
        effects: vec![EffectTemplate {
            name: String::from("Sharpened Mind"),
            affects: Attribute::Focus,
            modifier: 15,
            duration_secs: 7_200,
        }],
    }
}

fn good_day() -> HealthReading {
    HealthReading {
        steps: 900,
        heart_rate: 65,
        sleep_hours: 8.0,
        focus_minutes: 90,
    }
}

// ---------------------------------------------------------------------------
// Store wrappers for fault injection
// ---------------------------------------------------------------------------

/// Lands a drift write on the inner store right before the first
/// `interfere` commits, so those commits see a stale version.
struct InterferingStore {
    inner: MemoryStore,
    interfere: AtomicU32,
}

impl InterferingStore {
    fn new(interfere: u32) -> Self {
        Self {
            inner: MemoryStore::new(),
            interfere: AtomicU32::new(interfere),
        }
    }
}

impl ProgressionStore for InterferingStore {
    fn create_user(
        &self,
        user: UserId,
        progression: ProgressionState,
        attributes: Attributes,
        ledger_entries: Vec<LedgerEntry>,
    ) -> Result<u64, StoreError> {
        self.inner
            .create_user(user, progression, attributes, ledger_entries)
    }

    fn load_progression(&self, user: UserId) -> Result<Versioned<ProgressionState>, StoreError> {
        self.inner.load_progression(user)
    }

    fn load_attributes(&self, user: UserId) -> Result<Versioned<Attributes>, StoreError> {
        self.inner.load_attributes(user)
    }

    fn load_effects(&self, user: UserId) -> Result<Versioned<Vec<StatusEffect>>, StoreError> {
        self.inner.load_effects(user)
    }

    fn load_quest(&self, quest: QuestId) -> Result<Quest, StoreError> {
        self.inner.load_quest(quest)
    }

    fn insert_quest(&self, quest: Quest) -> Result<(), StoreError> {
        self.inner.insert_quest(quest)
    }

    fn commit(&self, changeset: Changeset) -> Result<u64, StoreError> {
        let remaining = self.interfere.load(Ordering::SeqCst);
        if remaining > 0 {
            self.interfere.store(remaining - 1, Ordering::SeqCst);
            let current = self.inner.load_attributes(changeset.user)?;
            let drifted = Attributes {
                mood: current.value.mood.saturating_sub(1).max(1),
                ..current.value
            };
            self.inner
                .commit(Changeset::new(changeset.user, current.version).with_attributes(drifted))?;
        }
        self.inner.commit(changeset)
    }

    fn reconcile(&self, user: UserId) -> Result<ReconciliationResult, StoreError> {
        self.inner.reconcile(user)
    }

    fn load_snapshot(&self, user: UserId) -> Result<Versioned<UserSnapshot>, StoreError> {
        self.inner.load_snapshot(user)
    }
}

/// Fails every commit with `Unavailable`, reads succeed.
struct BrokenWriteStore {
    inner: MemoryStore,
}

impl ProgressionStore for BrokenWriteStore {
    fn create_user(
        &self,
        user: UserId,
        progression: ProgressionState,
        attributes: Attributes,
        ledger_entries: Vec<LedgerEntry>,
    ) -> Result<u64, StoreError> {
        self.inner
            .create_user(user, progression, attributes, ledger_entries)
    }

    fn load_progression(&self, user: UserId) -> Result<Versioned<ProgressionState>, StoreError> {
        self.inner.load_progression(user)
    }

    fn load_attributes(&self, user: UserId) -> Result<Versioned<Attributes>, StoreError> {
        self.inner.load_attributes(user)
    }

    fn load_effects(&self, user: UserId) -> Result<Versioned<Vec<StatusEffect>>, StoreError> {
        self.inner.load_effects(user)
    }

    fn load_quest(&self, quest: QuestId) -> Result<Quest, StoreError> {
        self.inner.load_quest(quest)
    }

    fn insert_quest(&self, quest: Quest) -> Result<(), StoreError> {
        self.inner.insert_quest(quest)
    }

    fn commit(&self, _changeset: Changeset) -> Result<u64, StoreError> {
        Err(StoreError::Unavailable {
            reason: String::from("disk full"),
        })
    }

    fn reconcile(&self, user: UserId) -> Result<ReconciliationResult, StoreError> {
        self.inner.reconcile(user)
    }
}

/// Reports effects one version ahead for the first `skewed` reads, as if
/// a write landed between the snapshot and the effects read.
struct TornReadStore {
    inner: MemoryStore,
    skewed: AtomicU32,
}

impl ProgressionStore for TornReadStore {
    fn create_user(
        &self,
        user: UserId,
        progression: ProgressionState,
        attributes: Attributes,
        ledger_entries: Vec<LedgerEntry>,
    ) -> Result<u64, StoreError> {
        self.inner
            .create_user(user, progression, attributes, ledger_entries)
    }

    fn load_progression(&self, user: UserId) -> Result<Versioned<ProgressionState>, StoreError> {
        self.inner.load_progression(user)
    }

    fn load_attributes(&self, user: UserId) -> Result<Versioned<Attributes>, StoreError> {
        self.inner.load_attributes(user)
    }

    fn load_effects(&self, user: UserId) -> Result<Versioned<Vec<StatusEffect>>, StoreError> {
        let mut effects = self.inner.load_effects(user)?;
        let remaining = self.skewed.load(Ordering::SeqCst);
        if remaining > 0 {
            self.skewed.store(remaining - 1, Ordering::SeqCst);
            effects.version += 1;
        }
        Ok(effects)
    }

    fn load_quest(&self, quest: QuestId) -> Result<Quest, StoreError> {
        self.inner.load_quest(quest)
    }

    fn insert_quest(&self, quest: Quest) -> Result<(), StoreError> {
        self.inner.insert_quest(quest)
    }

    fn commit(&self, changeset: Changeset) -> Result<u64, StoreError> {
        self.inner.commit(changeset)
    }

    fn reconcile(&self, user: UserId) -> Result<ReconciliationResult, StoreError> {
        self.inner.reconcile(user)
    }

    fn load_snapshot(&self, user: UserId) -> Result<Versioned<UserSnapshot>, StoreError> {
        self.inner.load_snapshot(user)
    }
}

// ---------------------------------------------------------------------------
// Completion
// ---------------------------------------------------------------------------

#[test]
fn scenario_through_the_service() {
    let service = ProgressionService::new(MemoryStore::new(), config_without_bonus());
    let user = UserId::new();
    service.onboard(user, Utc::now()).unwrap();

    // Bring the user to the documented starting point: 90 XP, vitality 98.
    let prep = Changeset::new(user, 1)
        .with_progression(ProgressionState {
            level: 1,
            experience: 90,
            currency: 100,
        })
        .with_attributes(Attributes {
            vitality: 98,
            ..Attributes::default()
        });
    service.store().commit(prep).unwrap();

    let quest = exercise_quest(user);
    service.store().insert_quest(quest.clone()).unwrap();
    let mut rng = SmallRng::seed_from_u64(1);

    let outcome = service
        .complete_quest(user, quest.id, &mut rng, Utc::now())
        .unwrap();
    assert_eq!(outcome.new_level, 2);
    assert_eq!(outcome.new_experience, 10);
    assert_eq!(outcome.new_currency, 115);
    assert_eq!(outcome.new_attributes.vitality, 100);
    assert_eq!(outcome.new_attributes.energy, 63);

    let view = service.snapshot(user, Utc::now()).unwrap();
    assert_eq!(view.progression.level, 2);
    assert_eq!(view.xp_to_next_level, 190);
    assert!(service.store().load_quest(quest.id).unwrap().completed);
}

#[test]
fn second_completion_is_rejected_and_changes_nothing() {
    let service = ProgressionService::new(MemoryStore::new(), EngineConfig::default());
    let user = UserId::new();
    service.onboard(user, Utc::now()).unwrap();
    let quest = exercise_quest(user);
    service.store().insert_quest(quest.clone()).unwrap();
    let mut rng = SmallRng::seed_from_u64(2);

    service
        .complete_quest(user, quest.id, &mut rng, Utc::now())
        .unwrap();
    let after_first = service.snapshot(user, Utc::now()).unwrap();
    let ledger_after_first = service.store().ledger_len().unwrap();

    let second = service.complete_quest(user, quest.id, &mut rng, Utc::now());
    assert!(matches!(
        second,
        Err(ServiceError::Progression(
            ProgressionError::AlreadyCompleted { .. }
        ))
    ));

    let after_second = service.snapshot(user, Utc::now()).unwrap();
    assert_eq!(after_second, after_first);
    assert_eq!(service.store().ledger_len().unwrap(), ledger_after_first);
    assert_eq!(
        service.reconcile(user).unwrap(),
        ReconciliationResult::Balanced
    );
}

#[test]
fn foreign_quest_is_rejected() {
    let service = ProgressionService::new(MemoryStore::new(), EngineConfig::default());
    let owner = UserId::new();
    let intruder = UserId::new();
    service.onboard(owner, Utc::now()).unwrap();
    service.onboard(intruder, Utc::now()).unwrap();
    let quest = exercise_quest(owner);
    service.store().insert_quest(quest.clone()).unwrap();
    let mut rng = SmallRng::seed_from_u64(3);

    let result = service.complete_quest(intruder, quest.id, &mut rng, Utc::now());
    assert!(matches!(
        result,
        Err(ServiceError::Progression(ProgressionError::NotOwner { .. }))
    ));
    assert!(!service.store().load_quest(quest.id).unwrap().completed);
}

#[test]
fn missing_quest_is_a_store_error() {
    let service = ProgressionService::new(MemoryStore::new(), EngineConfig::default());
    let user = UserId::new();
    service.onboard(user, Utc::now()).unwrap();
    let mut rng = SmallRng::seed_from_u64(4);

    let result = service.complete_quest(user, QuestId::new(), &mut rng, Utc::now());
    assert!(matches!(
        result,
        Err(ServiceError::Store(StoreError::QuestNotFound(_)))
    ));
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[test]
fn conflict_is_recomputed_from_fresh_state() {
    let service = ProgressionService::new(InterferingStore::new(1), config_without_bonus());
    let user = UserId::new();
    service.onboard(user, Utc::now()).unwrap();
    let quest = exercise_quest(user);
    service.store().insert_quest(quest.clone()).unwrap();
    let mut rng = SmallRng::seed_from_u64(5);

    let outcome = service
        .complete_quest(user, quest.id, &mut rng, Utc::now())
        .unwrap();

    // The interfering drift lowered mood to 54 and the retry was computed
    // on top of it, so the drift is preserved.
    let view = service.snapshot(user, Utc::now()).unwrap();
    assert_eq!(view.attributes.mood, 54);
    assert_eq!(outcome.new_attributes.mood, 54);
    assert_eq!(view.progression.currency, 115);
    assert_eq!(view.version, 3);
}

#[test]
fn exhausted_retries_report_persistence_conflict() {
    let config = EngineConfig {
        service: questline_core::config::ServiceConfig {
            max_commit_retries: 2,
        },
        ..config_without_bonus()
    };
    let service = ProgressionService::new(InterferingStore::new(100), config);
    let user = UserId::new();
    service.onboard(user, Utc::now()).unwrap();
    let quest = exercise_quest(user);
    service.store().insert_quest(quest.clone()).unwrap();
    let mut rng = SmallRng::seed_from_u64(6);

    let result = service.complete_quest(user, quest.id, &mut rng, Utc::now());
    match result {
        Err(e @ ServiceError::PersistenceConflict { attempts: 3, .. }) => {
            assert!(e.is_retryable());
        }
        other => panic!("expected PersistenceConflict, got {other:?}"),
    }
    assert!(!service.store().load_quest(quest.id).unwrap().completed);
    assert_eq!(
        service.reconcile(user).unwrap(),
        ReconciliationResult::Balanced
    );
}

#[test]
fn failed_commit_returns_authoritative_state() {
    let service = ProgressionService::new(
        BrokenWriteStore {
            inner: MemoryStore::new(),
        },
        config_without_bonus(),
    );
    let user = UserId::new();
    service.onboard(user, Utc::now()).unwrap();
    let quest = exercise_quest(user);
    service.store().insert_quest(quest.clone()).unwrap();
    let mut rng = SmallRng::seed_from_u64(7);

    let result = service.complete_quest(user, quest.id, &mut rng, Utc::now());
    match result {
        Err(ServiceError::CommitFailed {
            source: StoreError::Unavailable { .. },
            authoritative: Some(view),
            ..
        }) => {
            // The locally computed reward was discarded.
            assert_eq!(view.progression, ProgressionState::default());
            assert_eq!(view.attributes, Attributes::default());
        }
        other => panic!("expected CommitFailed with state, got {other:?}"),
    }
}

#[test]
fn failed_commit_view_uses_the_operation_time() {
    let store = BrokenWriteStore {
        inner: MemoryStore::new(),
    };
    let user = UserId::new();
    let started = Utc::now() - TimeDelta::days(10);
    store
        .create_user(
            user,
            ProgressionState::default(),
            Attributes::default(),
            Vec::new(),
        )
        .unwrap();
    let buff = StatusEffect {
        id: EffectId::new(),
        name: String::from("Sharpened Mind"),
        affects: Attribute::Focus,
        modifier: 15,
        duration_secs: 3_600,
        started_at: started,
        source: String::from("Focus Potion"),
    };
    store
        .inner
        .commit(Changeset::new(user, 1).with_effects(vec![buff]))
        .unwrap();
    let quest = exercise_quest(user);
    store.insert_quest(quest.clone()).unwrap();
    let service = ProgressionService::new(store, config_without_bonus());
    let mut rng = SmallRng::seed_from_u64(9);

    // The buff expired long ago on the wall clock but is active at `now`.
    let now = started + TimeDelta::minutes(10);
    match service.complete_quest(user, quest.id, &mut rng, now) {
        Err(ServiceError::CommitFailed {
            authoritative: Some(view),
            ..
        }) => {
            assert_eq!(view.active_effects.len(), 1);
            assert_eq!(view.effective_attributes.focus, 55);
        }
        other => panic!("expected CommitFailed with state, got {other:?}"),
    }
}

#[test]
fn torn_view_is_reread() {
    let service = ProgressionService::new(
        TornReadStore {
            inner: MemoryStore::new(),
            skewed: AtomicU32::new(2),
        },
        EngineConfig::default(),
    );
    let user = UserId::new();
    service
        .store()
        .create_user(
            user,
            ProgressionState::default(),
            Attributes::default(),
            Vec::new(),
        )
        .unwrap();

    let view = service.snapshot(user, Utc::now()).unwrap();
    assert_eq!(view.version, 1);
    assert_eq!(service.store().skewed.load(Ordering::SeqCst), 0);
}

#[test]
fn persistently_torn_view_is_a_conflict() {
    let service = ProgressionService::new(
        TornReadStore {
            inner: MemoryStore::new(),
            skewed: AtomicU32::new(u32::MAX),
        },
        EngineConfig::default(),
    );
    let user = UserId::new();
    service
        .store()
        .create_user(
            user,
            ProgressionState::default(),
            Attributes::default(),
            Vec::new(),
        )
        .unwrap();

    assert!(matches!(
        service.snapshot(user, Utc::now()),
        Err(ServiceError::PersistenceConflict { attempts: 4, .. })
    ));
}

#[test]
fn concurrent_drift_and_completions_lose_no_updates() {
    let service = Arc::new(ProgressionService::new(
        MemoryStore::new(),
        EngineConfig {
            service: questline_core::config::ServiceConfig {
                max_commit_retries: 1_000,
            },
            ..EngineConfig::default()
        },
    ));
    let user = UserId::new();
    service.onboard(user, Utc::now()).unwrap();

    let quests: Vec<Quest> = (0..50).map(|_| exercise_quest(user)).collect();
    for q in &quests {
        service.store().insert_quest(q.clone()).unwrap();
    }

    let drifter = {
        let service = Arc::clone(&service);
        std::thread::spawn(move || {
            for _ in 0..200 {
                service.apply_drift(user, &good_day()).unwrap();
            }
        })
    };
    let completer = {
        let service = Arc::clone(&service);
        let ids: Vec<QuestId> = quests.iter().map(|q| q.id).collect();
        std::thread::spawn(move || {
            let mut rng = SmallRng::seed_from_u64(8);
            for id in ids {
                service.complete_quest(user, id, &mut rng, Utc::now()).unwrap();
            }
        })
    };
    drifter.join().unwrap();
    completer.join().unwrap();

    let view = service.snapshot(user, Utc::now()).unwrap();
    // onboarding + 200 drift ticks + 50 completions, each one version.
    assert_eq!(view.version, 1 + 200 + 50);
    // 50 * 20 XP = 1000 XP from level 1: 100+200+300+400 = 1000 -> level 5.
    assert_eq!(view.progression.level, 5);
    assert_eq!(view.progression.experience, 0);
    assert_eq!(
        service.reconcile(user).unwrap(),
        ReconciliationResult::Balanced
    );
}

#[test]
fn racing_completions_of_one_quest_pay_out_once() {
    for round in 0..20_u64 {
        let service = Arc::new(ProgressionService::new(
            MemoryStore::new(),
            config_without_bonus(),
        ));
        let user = UserId::new();
        service.onboard(user, Utc::now()).unwrap();
        let quest = exercise_quest(user);
        service.store().insert_quest(quest.clone()).unwrap();
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = (0..2_u64)
            .map(|i| {
                let service = Arc::clone(&service);
                let barrier = Arc::clone(&barrier);
                let quest_id = quest.id;
                std::thread::spawn(move || {
                    let mut rng = SmallRng::seed_from_u64(round * 2 + i);
                    barrier.wait();
                    service.complete_quest(user, quest_id, &mut rng, Utc::now())
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let successes = results.iter().filter(|r| r.is_ok()).count();
        let rejected = results
            .iter()
            .filter(|r| {
                matches!(
                    r,
                    Err(ServiceError::Progression(
                        ProgressionError::AlreadyCompleted { .. }
                    ))
                )
            })
            .count();
        assert_eq!(successes, 1, "round {round}: {results:?}");
        assert_eq!(rejected, 1, "round {round}: {results:?}");

        let rewards = service
            .store()
            .ledger_entries_for(user)
            .unwrap()
            .into_iter()
            .filter(|e| e.entry_type == LedgerEntryType::QuestReward)
            .count();
        assert_eq!(rewards, 1);

        let view = service.snapshot(user, Utc::now()).unwrap();
        assert_eq!(view.progression.currency, 115);
        assert_eq!(view.progression.experience, 20);
        assert_eq!(
            service.reconcile(user).unwrap(),
            ReconciliationResult::Balanced
        );
    }
}

// ---------------------------------------------------------------------------
// Drift, store, effects
// ---------------------------------------------------------------------------

#[test]
fn drift_through_service_only_touches_attributes() {
    let service = ProgressionService::new(MemoryStore::new(), EngineConfig::default());
    let user = UserId::new();
    service.onboard(user, Utc::now()).unwrap();
    let before = service.snapshot(user, Utc::now()).unwrap();

    let attributes = service.apply_drift(user, &good_day()).unwrap();
    let after = service.snapshot(user, Utc::now()).unwrap();

    assert_eq!(after.progression, before.progression);
    assert_eq!(after.attributes, attributes);
    assert_ne!(after.attributes, before.attributes);
}

#[test]
fn purchase_debits_and_effects_expire() {
    let service = ProgressionService::new(MemoryStore::new(), EngineConfig::default());
    let user = UserId::new();
    let now = Utc::now();
    service.onboard(user, now).unwrap();

    let receipt = service.purchase(user, &focus_potion(), now).unwrap();
    assert_eq!(receipt.progression.currency, 70);
    assert_eq!(receipt.granted.len(), 1);

    let view = service.snapshot(user, now).unwrap();
    assert_eq!(view.attributes.focus, 40);
    assert_eq!(view.effective_attributes.focus, 55);
    assert_eq!(view.active_effects.len(), 1);

    let later = now + TimeDelta::hours(3);
    let expired = service.snapshot(user, later).unwrap();
    assert_eq!(expired.effective_attributes.focus, 40);
    assert!(expired.active_effects.is_empty());

    assert_eq!(
        service.reconcile(user).unwrap(),
        ReconciliationResult::Balanced
    );
}

#[test]
fn purchase_without_funds_is_rejected() {
    let service = ProgressionService::new(MemoryStore::new(), EngineConfig::default());
    let user = UserId::new();
    service.onboard(user, Utc::now()).unwrap();
    let expensive = StoreItem {
        price: 1_000,
        ..focus_potion()
    };

    let result = service.purchase(user, &expensive, Utc::now());
    assert!(matches!(
        result,
        Err(ServiceError::Progression(
            ProgressionError::InsufficientFunds {
                price: 1_000,
                balance: 100,
            }
        ))
    ));
    assert_eq!(service.snapshot(user, Utc::now()).unwrap().version, 1);
}

#[test]
fn onboarding_twice_is_rejected() {
    let service = ProgressionService::new(MemoryStore::new(), EngineConfig::default());
    let user = UserId::new();
    service.onboard(user, Utc::now()).unwrap();
    assert!(matches!(
        service.onboard(user, Utc::now()),
        Err(ServiceError::Store(StoreError::UserExists(_)))
    ));
}
