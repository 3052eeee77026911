//! Simulation binary for the Questline progression engine.
//!
//! Wires the in-memory store, the progression service and the drift
//! scheduler together and walks one demo user through a session.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `questline-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Onboard the demo user and seed the quest catalog
//! 4. Start the drift loop in the background
//! 5. Complete the seeded quests and buy a store item
//! 6. Wait for the drift loop to end
//! 7. Reconcile the ledger and log the result

mod error;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use questline_core::config::{EngineConfig, LoggingConfig};
use questline_core::control::DriftControl;
use questline_core::runner::{self, DriftTickCallback, DriftTickReport};
use questline_core::service::ProgressionService;
use questline_core::signals::SimulatedSignalSource;
use questline_core::store::{MemoryStore, ProgressionStore};
use questline_ledger::ReconciliationResult;
use questline_types::{
    Attribute, EffectTemplate, ItemId, ItemKind, Quest, QuestId, RecurringType, StoreItem, UserId,
};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::SimError;

/// Path of the optional configuration file, relative to the working
/// directory.
const CONFIG_PATH: &str = "questline-config.yaml";

/// Application entry point for the simulation.
///
/// # Errors
///
/// Returns an error if configuration is invalid, an operation fails, or
/// the ledger does not reconcile at the end of the run.
#[tokio::main]
async fn main() -> Result<(), SimError> {
    // 1. Load configuration.
    let config = EngineConfig::load_or_default(Path::new(CONFIG_PATH))?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging);
    info!(
        seed = config.simulation.seed,
        max_ticks = config.simulation.max_ticks,
        tick_interval_ms = config.drift.tick_interval_ms,
        bonus_chance_pct = config.bonus.chance_pct,
        "questline-sim starting"
    );

    let seed = config.simulation.seed;
    let control = Arc::new(DriftControl::new(
        config.drift.tick_interval_ms,
        config.simulation.max_ticks,
    ));
    let service = Arc::new(ProgressionService::new(MemoryStore::new(), config));

    // 3. Onboard the demo user and seed quests.
    let user = UserId::new();
    let view = service.onboard(user, Utc::now())?;
    info!(
        %user,
        level = view.progression.level,
        currency = view.progression.currency,
        "demo user onboarded"
    );
    let quests = demo_quests(user, Utc::now());
    for quest in &quests {
        service.store().insert_quest(quest.clone())?;
    }
    info!(count = quests.len(), "quest catalog seeded");

    // 4. Start the drift loop.
    let drift = {
        let service = Arc::clone(&service);
        let control = Arc::clone(&control);
        tokio::spawn(async move {
            let mut source = SimulatedSignalSource::seeded(seed);
            let mut callback = LoggingCallback;
            runner::run_drift_loop(&service, &[user], &mut source, &control, &mut callback).await
        })
    };
    {
        let control = Arc::clone(&control);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received, stopping drift loop");
                control.request_stop();
            }
        });
    }

    // 5. Complete quests and shop.
    let mut rng = SmallRng::seed_from_u64(seed);
    for quest in &quests {
        let outcome = service.complete_quest(user, quest.id, &mut rng, Utc::now())?;
        if outcome.bonus_triggered() {
            info!(
                quest = %quest.title,
                bonus = outcome.bonus_currency,
                "surprise bonus"
            );
        }
        if outcome.leveled_up {
            info!(level = outcome.new_level, "level up");
        }
    }

    let potion = focus_potion();
    let receipt = service.purchase(user, &potion, Utc::now())?;
    info!(
        item = %potion.name,
        effects = receipt.granted.len(),
        currency = receipt.progression.currency,
        "store purchase complete"
    );

    // 6. Wait for the drift loop.
    let summary = drift.await.map_err(|e| SimError::DriftTask {
        message: e.to_string(),
    })?;
    runner::log_drift_end(&summary);

    // 7. Reconcile and report.
    let view = service.snapshot(user, Utc::now())?;
    info!(
        level = view.progression.level,
        experience = view.progression.experience,
        xp_to_next_level = view.xp_to_next_level,
        progress_pct = view.level_progress_pct,
        currency = view.progression.currency,
        vitality = view.effective_attributes.vitality,
        energy = view.effective_attributes.energy,
        focus = view.effective_attributes.focus,
        mood = view.effective_attributes.mood,
        active_effects = view.active_effects.len(),
        "final state"
    );

    match service.reconcile(user)? {
        ReconciliationResult::Balanced => {
            info!(ledger_entries = service.store().ledger_len()?, "ledger balanced");
        }
        ReconciliationResult::Anomaly(anomaly) => {
            return Err(SimError::Anomaly {
                message: anomaly.message,
            });
        }
    }

    info!("questline-sim shutdown complete");
    Ok(())
}

/// Install the global subscriber. `RUST_LOG` overrides the configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

/// Logs every drift tick at info level.
struct LoggingCallback;

impl DriftTickCallback for LoggingCallback {
    fn on_tick(&mut self, report: &DriftTickReport) {
        for (user, attributes) in &report.applied {
            info!(
                tick = report.tick,
                %user,
                vitality = attributes.vitality,
                energy = attributes.energy,
                focus = attributes.focus,
                mood = attributes.mood,
                "attributes drifted"
            );
        }
        if !report.conflicted.is_empty() || !report.failed.is_empty() {
            warn!(
                tick = report.tick,
                conflicted = report.conflicted.len(),
                failed = report.failed.len(),
                "drift tick incomplete"
            );
        }
    }
}

/// The daily quests every demo user starts with.
fn demo_quests(owner: UserId, now: DateTime<Utc>) -> Vec<Quest> {
    let quest = |title: &str, xp: i64, currency: i64, rewards: &[(Attribute, i32)]| Quest {
        id: QuestId::new(),
        owner,
        title: title.to_owned(),
        xp_reward: xp,
        currency_reward: currency,
        attribute_rewards: rewards.iter().copied().collect::<BTreeMap<_, _>>(),
        recurring: true,
        recurring_type: Some(RecurringType::Daily),
        completed: false,
        completed_at: None,
        created_at: now,
    };
    vec![
        quest(
            "30 minutes of exercise",
            20,
            15,
            &[(Attribute::Vitality, 5), (Attribute::Energy, 3)],
        ),
        quest(
            "Meditate for 15 minutes",
            15,
            10,
            &[(Attribute::Focus, 5), (Attribute::Mood, 4)],
        ),
        quest(
            "Finish the work project",
            100,
            50,
            &[(Attribute::Focus, 10), (Attribute::Mood, 5)],
        ),
        quest(
            "Sleep 8 hours",
            50,
            30,
            &[
                (Attribute::Vitality, 8),
                (Attribute::Energy, 10),
                (Attribute::Focus, 5),
            ],
        ),
    ]
}

/// Consumable granting a two-hour focus buff.
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
