//! Passive Attribute Drift.
//!
//! A periodic, quest-independent adjustment of the four attributes from a
//! health reading. Each rule compares one signal against a threshold:
//!
//! | Attribute | Signal | Above threshold | Otherwise |
//! |-----------|--------|-----------------|-----------|
//! | vitality | steps > 500 | +2 | -1 |
//! | vitality | heart rate > 80 | -1 | +1 |
//! | energy | sleep > 7 h | +3 | -2 |
//! | focus | focus minutes > 60 | +5 | -1 |
//! | mood | mean(updated vitality, energy, focus) > previous mood | +2 | -1 |
//!
//! The two vitality deltas are summed before clamping. Drift only ever
//! produces a new [`Attributes`]; it has no access to level, experience or
//! currency.

use questline_types::{Attribute, Attributes, HealthReading};

use crate::attributes::apply_delta;
use crate::config::DriftConfig;

/// Apply one drift tick to a set of attributes.
pub fn apply_drift(
    attributes: Attributes,
    reading: &HealthReading,
    config: &DriftConfig,
) -> Attributes {
    let steps_delta = if reading.steps > config.steps_threshold {
        config.steps_high
    } else {
        config.steps_low
    };
    let heart_delta = if reading.heart_rate > config.heart_rate_threshold {
        config.heart_rate_high
    } else {
        config.heart_rate_low
    };
    let energy_delta = if reading.sleep_hours > config.sleep_hours_threshold {
        config.sleep_high
    } else {
        config.sleep_low
    };
    let focus_delta = if reading.focus_minutes > config.focus_minutes_threshold {
        config.focus_high
    } else {
        config.focus_low
    };

    let previous_mood = attributes.mood;
    let mut next = apply_delta(
        attributes,
        Attribute::Vitality,
        steps_delta.saturating_add(heart_delta),
    );
    next = apply_delta(next, Attribute::Energy, energy_delta);
    next = apply_delta(next, Attribute::Focus, focus_delta);

    // mean > mood  <=>  sum > 3 * mood, without integer division.
    let sum = u64::from(next.vitality)
        .saturating_add(u64::from(next.energy))
        .saturating_add(u64::from(next.focus));
    let mood_delta = if sum > u64::from(previous_mood).saturating_mul(3) {
        config.mood_high
    } else {
        config.mood_low
    };
    apply_delta(next, Attribute::Mood, mood_delta)
}
