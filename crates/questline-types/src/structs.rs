//! Core entity structs shared by every crate in the workspace.
//!
//! These are plain data: no clamping, no level arithmetic. The rules that
//! keep them valid live in `questline-progression`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::enums::{Attribute, EntityType, ItemKind, LedgerEntryType, QuestDifficulty, RecurringType};
use crate::ids::{EffectId, ItemId, LedgerEntryId, QuestId, UserId};

// ---------------------------------------------------------------------------
// Attributes
// ---------------------------------------------------------------------------

/// The four bounded well-being stats of a user.
///
/// Every value is expected to be in `1..=100`. One record exists per user
/// for the lifetime of the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Attributes {
    /// Physical health.
    pub vitality: u32,
    /// Sleep and nutrition.
    pub energy: u32,
    /// Productivity and concentration.
    pub focus: u32,
    /// Emotional state.
    pub mood: u32,
}

impl Attributes {
    /// Read a single attribute.
    pub const fn get(&self, attribute: Attribute) -> u32 {
        match attribute {
            Attribute::Vitality => self.vitality,
            Attribute::Energy => self.energy,
            Attribute::Focus => self.focus,
            Attribute::Mood => self.mood,
        }
    }

    /// Overwrite a single attribute without clamping.
    pub const fn set(&mut self, attribute: Attribute, value: u32) {
        match attribute {
            Attribute::Vitality => self.vitality = value,
            Attribute::Energy => self.energy = value,
            Attribute::Focus => self.focus = value,
            Attribute::Mood => self.mood = value,
        }
    }
}

impl Default for Attributes {
    /// The profile assigned at account creation.
    fn default() -> Self {
        Self {
            vitality: 50,
            energy: 60,
            focus: 40,
            mood: 55,
        }
    }
}

// ---------------------------------------------------------------------------
// Progression
// ---------------------------------------------------------------------------

/// Level, experience and currency of a user.
///
/// `experience` is always below the threshold of the current level; any
/// overflow is folded into level increments by the level ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ProgressionState {
    /// Current level, starting at 1.
    pub level: u32,
    /// Experience accumulated towards the next level.
    pub experience: u64,
    /// Spendable currency ("crystals").
    pub currency: u64,
}

impl Default for ProgressionState {
    /// The state created when onboarding completes.
    fn default() -> Self {
        Self {
            level: 1,
            experience: 0,
            currency: 100,
        }
    }
}

// ---------------------------------------------------------------------------
// Quests
// ---------------------------------------------------------------------------

/// A single quest instance owned by one user.
///
/// Only the reward fields matter to the engine. Reward amounts are signed
/// because they arrive from an external catalog; negative values are
/// rejected as malformed when the reward is resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Quest {
    /// Unique quest instance identifier.
    pub id: QuestId,
    /// The user this quest instance belongs to.
    pub owner: UserId,
    /// Display title.
    pub title: String,
    /// Declared experience reward.
    pub xp_reward: i64,
    /// Declared base currency reward.
    pub currency_reward: i64,
    /// Declared attribute deltas. Absent keys mean no change.
    pub attribute_rewards: BTreeMap<Attribute, i32>,
    /// Whether the catalog re-arms this quest after completion.
    pub recurring: bool,
    /// Re-arm cadence for recurring quests.
    pub recurring_type: Option<RecurringType>,
    /// Terminal flag. A completed quest can never be completed again.
    pub completed: bool,
    /// When the quest was completed.
    pub completed_at: Option<DateTime<Utc>>,
    /// When the quest instance was created.
    pub created_at: DateTime<Utc>,
}

impl Quest {
    /// Difficulty band derived from the XP reward.
    pub const fn difficulty(&self) -> QuestDifficulty {
        QuestDifficulty::from_xp_reward(self.xp_reward)
    }
}

/// Transient summary of one quest completion.
///
/// Produced by the completion transaction and handed to the caller for
/// persistence and display. Never stored as its own entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RewardOutcome {
    /// The quest that was completed.
    pub quest_id: QuestId,
    /// Experience granted by the quest.
    pub xp_granted: u64,
    /// Base currency granted by the quest (excludes the bonus).
    pub currency_granted: u64,
    /// Attribute deltas declared by the quest, before clamping.
    pub attribute_deltas: BTreeMap<Attribute, i32>,
    /// Surprise bonus currency, `0` when the draw failed.
    pub bonus_currency: u64,
    /// Whether at least one level was gained.
    pub leveled_up: bool,
    /// Number of levels gained.
    pub levels_gained: u32,
    /// Level after the completion.
    pub new_level: u32,
    /// Experience after the completion.
    pub new_experience: u64,
    /// Currency balance after the completion.
    pub new_currency: u64,
    /// Attributes after the completion, clamped.
    pub new_attributes: Attributes,
}

impl RewardOutcome {
    /// Whether the variable-ratio bonus fired.
    pub const fn bonus_triggered(&self) -> bool {
        self.bonus_currency > 0
    }

    /// Base reward plus bonus.
    pub const fn total_currency(&self) -> u64 {
        self.currency_granted.saturating_add(self.bonus_currency)
    }
}

// ---------------------------------------------------------------------------
// Health signals
// ---------------------------------------------------------------------------

/// One synthetic health-data sample driving passive attribute drift.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct HealthReading {
    /// Steps walked since the previous sample.
    pub steps: u32,
    /// Heart rate in beats per minute.
    pub heart_rate: u32,
    /// Hours slept.
    pub sleep_hours: f64,
    /// Minutes of focused work.
    pub focus_minutes: u32,
}

// ---------------------------------------------------------------------------
// Status effects
// ---------------------------------------------------------------------------

/// A timed buff or debuff modifying one attribute.
///
/// Effects never change the stored attributes; they are layered on top
/// when computing effective values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct StatusEffect {
    /// Unique effect identifier.
    pub id: EffectId,
    /// Display name.
    pub name: String,
    /// The attribute this effect modifies.
    pub affects: Attribute,
    /// Signed modifier. Positive is a buff, negative a debuff.
    pub modifier: i32,
    /// Lifetime in seconds from `started_at`.
    pub duration_secs: u64,
    /// When the effect was applied.
    pub started_at: DateTime<Utc>,
    /// Where the effect came from (item, quest, wearable).
    pub source: String,
}

/// Blueprint of a status effect granted by a store item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EffectTemplate {
    /// Display name of the granted effect.
    pub name: String,
    /// The attribute the effect modifies.
    pub affects: Attribute,
    /// Signed modifier.
    pub modifier: i32,
    /// Lifetime in seconds.
    pub duration_secs: u64,
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// An item that can be bought with currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct StoreItem {
    /// Unique item identifier.
    pub id: ItemId,
    /// Display name.
    pub name: String,
    /// Price in currency.
    pub price: u64,
    /// Item category.
    pub kind: ItemKind,
    /// Effects granted on purchase.
    pub effects: Vec<EffectTemplate>,
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// A single currency movement in the append-only ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LedgerEntry {
    /// Unique entry identifier.
    pub id: LedgerEntryId,
    /// The category of movement.
    pub entry_type: LedgerEntryType,
    /// Source party, `None` for the system.
    pub from_entity: Option<Uuid>,
    /// Type of the source party.
    pub from_entity_type: EntityType,
    /// Destination party, `None` for the system.
    pub to_entity: Option<Uuid>,
    /// Type of the destination party.
    pub to_entity_type: EntityType,
    /// Amount moved (always positive).
    pub amount: u64,
    /// Reason for the movement (e.g. `"QUEST_REWARD"`).
    pub reason: String,
    /// Related quest or item.
    pub reference_id: Option<Uuid>,
    /// Real-world timestamp.
    pub created_at: DateTime<Utc>,
}
