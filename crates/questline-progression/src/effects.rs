//! Timed status effects (buffs and debuffs).
//!
//! An effect is active while `now < started_at + duration_secs`. Effects
//! are layered on top of the stored attributes when computing effective
//! values; the stored attributes themselves are never modified.

use chrono::{DateTime, TimeDelta, Utc};

use questline_types::{Attributes, EffectId, EffectTemplate, StatusEffect};

use crate::attributes::apply_delta;

/// When an effect stops applying, or `None` if the end is unrepresentable
/// (treated as never expiring).
pub fn expires_at(effect: &StatusEffect) -> Option<DateTime<Utc>> {
    let secs = i64::try_from(effect.duration_secs).ok()?;
    let duration = TimeDelta::try_seconds(secs)?;
    effect.started_at.checked_add_signed(duration)
}

/// Whether an effect applies at `now`.
pub fn is_active(effect: &StatusEffect, now: DateTime<Utc>) -> bool {
    if now < effect.started_at {
        return false;
    }
    expires_at(effect).is_none_or(|end| now < end)
}

/// Base attributes plus the modifiers of every active effect, clamped.
pub fn effective_attributes(
    base: Attributes,
    effects: &[StatusEffect],
    now: DateTime<Utc>,
) -> Attributes {
    effects
        .iter()
        .filter(|e| is_active(e, now))
        .fold(base, |acc, e| apply_delta(acc, e.affects, e.modifier))
}

/// Drop effects that have expired by `now`.
///
/// Effects whose start lies in the future are kept.
pub fn prune_expired(effects: Vec<StatusEffect>, now: DateTime<Utc>) -> Vec<StatusEffect> {
    effects
        .into_iter()
        .filter(|e| expires_at(e).is_none_or(|end| now < end))
        .collect()
}

/// Instantiate an effect from a template, starting at `now`.
pub fn instantiate(template: &EffectTemplate, source: &str, now: DateTime<Utc>) -> StatusEffect {
    StatusEffect {
        id: EffectId::new(),
        name: template.name.clone(),
        affects: template.affects,
        modifier: template.modifier,
        duration_secs: template.duration_secs,
        started_at: now,
        source: source.to_owned(),
    }
}
