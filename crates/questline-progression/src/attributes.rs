//! The Attribute Model: clamping and delta application.
//!
//! Every attribute lives in `MIN_ATTRIBUTE..=MAX_ATTRIBUTE`. Out-of-range
//! results are silently clamped rather than rejected, so a reward near the
//! cap is partially or fully wasted instead of banked.

use questline_types::{Attribute, Attributes};

/// Lowest value any attribute can hold.
pub const MIN_ATTRIBUTE: u32 = 1;

/// Highest value any attribute can hold.
pub const MAX_ATTRIBUTE: u32 = 100;

/// Restrict an arbitrary integer to the attribute range.
pub fn clamp_attribute(value: i64) -> u32 {
    let clamped = value.clamp(i64::from(MIN_ATTRIBUTE), i64::from(MAX_ATTRIBUTE));
    u32::try_from(clamped).unwrap_or(MIN_ATTRIBUTE)
}

/// Return a copy of `attributes` with `delta` added to one attribute, clamped.
///
/// All other attributes are unchanged. The stored value is widened before
/// the addition, so even `i32::MIN`/`i32::MAX` deltas clamp correctly.
pub fn apply_delta(attributes: Attributes, attribute: Attribute, delta: i32) -> Attributes {
    let raw = i64::from(attributes.get(attribute)).saturating_add(i64::from(delta));
    let mut next = attributes;
    next.set(attribute, clamp_attribute(raw));
    next
}

/// Apply the same delta to all four attributes.
pub fn apply_uniform(attributes: Attributes, delta: i32) -> Attributes {
    Attribute::ALL
        .iter()
        .fold(attributes, |acc, attr| apply_delta(acc, *attr, delta))
}

/// Clamp every attribute of a record into range.
///
/// Useful when a record arrives from storage or configuration and its
/// values cannot be trusted.
pub fn normalize(attributes: Attributes) -> Attributes {
    apply_uniform(attributes, 0)
}
