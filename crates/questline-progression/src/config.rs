//! Tunable parameters for the progression engine.
//!
//! These structs mirror the `progression`, `bonus` and `drift` sections of
//! `questline-config.yaml`. Every field has a default equal to the
//! documented engine constant, so an empty or missing section behaves
//! exactly like the built-in rules.

use serde::{Deserialize, Serialize};

use questline_types::Attributes;

use crate::error::ProgressionError;

// ---------------------------------------------------------------------------
// Progression
// ---------------------------------------------------------------------------

/// Onboarding profile and level-up parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionConfig {
    /// Currency granted at onboarding (default: 100).
    #[serde(default = "default_starting_currency")]
    pub starting_currency: u64,

    /// Attributes assigned at onboarding (default: 50/60/40/55).
    #[serde(default)]
    pub starting_attributes: Attributes,

    /// Flat bonus added to all four attributes per level gained
    /// (default: 0, disabled).
    #[serde(default)]
    pub level_up_attribute_bonus: u32,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            starting_currency: default_starting_currency(),
            starting_attributes: Attributes::default(),
            level_up_attribute_bonus: 0,
        }
    }
}

const fn default_starting_currency() -> u64 {
    100
}

// ---------------------------------------------------------------------------
// Variable-ratio bonus
// ---------------------------------------------------------------------------

/// Parameters of the variable-ratio surprise bonus.
///
/// On every reward resolution the bonus fires with probability
/// `chance_pct / 100` and pays an amount drawn uniformly from
/// `min_amount..=max_amount`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BonusConfig {
    /// Trigger probability in whole percent, `0..=100` (default: 30).
    #[serde(default = "default_bonus_chance_pct")]
    pub chance_pct: u32,

    /// Smallest bonus amount, inclusive (default: 5).
    #[serde(default = "default_bonus_min")]
    pub min_amount: u64,

    /// Largest bonus amount, inclusive (default: 24).
    #[serde(default = "default_bonus_max")]
    pub max_amount: u64,
}

impl BonusConfig {
    /// Check that the configured range and probability are usable.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressionError::Validation`] if `chance_pct > 100` or
    /// `min_amount > max_amount`.
    pub fn validate(&self) -> Result<(), ProgressionError> {
        if self.chance_pct > 100 {
            return Err(ProgressionError::validation(format!(
                "bonus chance_pct {} exceeds 100",
                self.chance_pct
            )));
        }
        if self.min_amount > self.max_amount {
            return Err(ProgressionError::validation(format!(
                "bonus min_amount {} exceeds max_amount {}",
                self.min_amount, self.max_amount
            )));
        }
        Ok(())
    }
}

impl Default for BonusConfig {
    fn default() -> Self {
        Self {
            chance_pct: default_bonus_chance_pct(),
            min_amount: default_bonus_min(),
            max_amount: default_bonus_max(),
        }
    }
}

const fn default_bonus_chance_pct() -> u32 {
    30
}

const fn default_bonus_min() -> u64 {
    5
}

const fn default_bonus_max() -> u64 {
    24
}

// ---------------------------------------------------------------------------
// Passive drift
// ---------------------------------------------------------------------------

/// Thresholds and deltas for passive attribute drift.
///
/// Each rule compares one health signal against a threshold and applies
/// the `*_high` delta when the signal is strictly above it, otherwise the
/// `*_low` delta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftConfig {
    /// Real-time milliseconds between drift ticks (default: 5000).
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Step count above which vitality rises (default: 500).
    #[serde(default = "default_steps_threshold")]
    pub steps_threshold: u32,
    /// Vitality delta when steps exceed the threshold (default: +2).
    #[serde(default = "default_steps_high")]
    pub steps_high: i32,
    /// Vitality delta otherwise (default: -1).
    #[serde(default = "default_minus_one")]
    pub steps_low: i32,

    /// Heart rate above which vitality drops (default: 80).
    #[serde(default = "default_heart_rate_threshold")]
    pub heart_rate_threshold: u32,
    /// Vitality delta when heart rate exceeds the threshold (default: -1).
    #[serde(default = "default_minus_one")]
    pub heart_rate_high: i32,
    /// Vitality delta otherwise (default: +1).
    #[serde(default = "default_plus_one")]
    pub heart_rate_low: i32,

    /// Hours of sleep above which energy rises (default: 7.0).
    #[serde(default = "default_sleep_threshold")]
    pub sleep_hours_threshold: f64,
    /// Energy delta when sleep exceeds the threshold (default: +3).
    #[serde(default = "default_sleep_high")]
    pub sleep_high: i32,
    /// Energy delta otherwise (default: -2).
    #[serde(default = "default_sleep_low")]
    pub sleep_low: i32,

    /// Focus minutes above which focus rises (default: 60).
    #[serde(default = "default_focus_threshold")]
    pub focus_minutes_threshold: u32,
    /// Focus delta when focus minutes exceed the threshold (default: +5).
    #[serde(default = "default_focus_high")]
    pub focus_high: i32,
    /// Focus delta otherwise (default: -1).
    #[serde(default = "default_minus_one")]
    pub focus_low: i32,

    /// Mood delta when the mean of the updated physical attributes exceeds
    /// the previous mood (default: +2).
    #[serde(default = "default_mood_high")]
    pub mood_high: i32,
    /// Mood delta otherwise (default: -1).
    #[serde(default = "default_minus_one")]
    pub mood_low: i32,
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            steps_threshold: default_steps_threshold(),
            steps_high: default_steps_high(),
            steps_low: default_minus_one(),
            heart_rate_threshold: default_heart_rate_threshold(),
            heart_rate_high: default_minus_one(),
            heart_rate_low: default_plus_one(),
            sleep_hours_threshold: default_sleep_threshold(),
            sleep_high: default_sleep_high(),
            sleep_low: default_sleep_low(),
            focus_minutes_threshold: default_focus_threshold(),
            focus_high: default_focus_high(),
            focus_low: default_minus_one(),
            mood_high: default_mood_high(),
            mood_low: default_minus_one(),
        }
    }
}

const fn default_tick_interval_ms() -> u64 {
    5000
}

const fn default_steps_threshold() -> u32 {
    500
}

const fn default_steps_high() -> i32 {
    2
}

const fn default_heart_rate_threshold() -> u32 {
    80
}

const fn default_sleep_threshold() -> f64 {
    7.0
}

const fn default_sleep_high() -> i32 {
    3
}

const fn default_sleep_low() -> i32 {
    -2
}

const fn default_focus_threshold() -> u32 {
    60
}

const fn default_focus_high() -> i32 {
    5
}

const fn default_mood_high() -> i32 {
    2
}

const fn default_plus_one() -> i32 {
    1
}

const fn default_minus_one() -> i32 {
    -1
}
