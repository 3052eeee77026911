//! Enumeration types for the progression engine.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Attributes
// ---------------------------------------------------------------------------

/// One of the four bounded well-being stats tracked per user.
///
/// Every attribute value lives in the inclusive range `1..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Attribute {
    /// Physical health.
    Vitality,
    /// Sleep and nutrition.
    Energy,
    /// Productivity and concentration.
    Focus,
    /// Emotional state.
    Mood,
}

impl Attribute {
    /// All attributes in canonical order.
    pub const ALL: [Self; 4] = [Self::Vitality, Self::Energy, Self::Focus, Self::Mood];

    /// Lowercase name used in logs and configuration.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Vitality => "vitality",
            Self::Energy => "energy",
            Self::Focus => "focus",
            Self::Mood => "mood",
        }
    }
}

impl core::fmt::Display for Attribute {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Quests
// ---------------------------------------------------------------------------

/// How often a recurring quest is re-armed by the quest catalog.
///
/// The engine only handles single completion events; re-arming happens
/// outside of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum RecurringType {
    /// Re-armed every day.
    Daily,
    /// Re-armed every week.
    Weekly,
    /// Re-armed every month.
    Monthly,
}

/// Difficulty band of a quest, derived from its XP reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum QuestDifficulty {
    /// Up to 20 XP.
    Easy,
    /// Up to 50 XP.
    Medium,
    /// Up to 100 XP.
    Hard,
    /// More than 100 XP.
    Boss,
}

impl QuestDifficulty {
    /// Classify a quest by its declared XP reward.
    ///
    /// Negative rewards are malformed but still classify as [`Self::Easy`];
    /// rejecting them is the reward resolver's job.
    pub const fn from_xp_reward(xp_reward: i64) -> Self {
        if xp_reward <= 20 {
            Self::Easy
        } else if xp_reward <= 50 {
            Self::Medium
        } else if xp_reward <= 100 {
            Self::Hard
        } else {
            Self::Boss
        }
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Category of a store item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ItemKind {
    /// Single-use item granting temporary effects.
    Consumable,
    /// Longer-lasting item.
    Equipment,
    /// Purely visual.
    Cosmetic,
    /// Redeemable for something in real life.
    RealReward,
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// The category of a currency ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum LedgerEntryType {
    /// Starting currency granted at onboarding (system to user).
    OnboardingGrant,
    /// Base currency reward of a completed quest (quest to user).
    QuestReward,
    /// Variable-ratio surprise bonus (system to user).
    VariableBonus,
    /// Currency spent on a store item (user to store).
    Purchase,
}

/// The kind of party on one side of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum EntityType {
    /// The engine itself (grants and bonuses).
    System,
    /// A user wallet.
    User,
    /// A quest paying out its reward.
    Quest,
    /// The store receiving a purchase.
    Store,
}

impl core::fmt::Display for EntityType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            Self::System => "System",
            Self::User => "User",
            Self::Quest => "Quest",
            Self::Store => "Store",
        };
        f.write_str(s)
    }
}
