//! The Experience/Level Ladder.
//!
//! Reaching the next level from level `n` costs `n * 100` XP, measured
//! from zero at that level: 100 XP for 1 -> 2, 200 XP for 2 -> 3, and so
//! on. Excess XP carries over, and a single grant may cross several
//! thresholds; the ladder loops until the remainder is below the current
//! threshold.
//!
//! The same level-scaled rule is used everywhere in the workspace.

use questline_types::ProgressionState;

use crate::error::ProgressionError;

/// XP cost per level step: level `n` needs `n * XP_PER_LEVEL_STEP`.
pub const XP_PER_LEVEL_STEP: u64 = 100;

/// Result of folding an XP grant into the ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelUp {
    /// Level after the grant.
    pub level: u32,
    /// Experience remaining towards the next level.
    pub experience: u64,
    /// Number of levels gained by this grant.
    pub levels_gained: u32,
}

impl LevelUp {
    /// Whether at least one level was gained.
    pub const fn leveled_up(&self) -> bool {
        self.levels_gained > 0
    }
}

/// XP required to advance from `level` to `level + 1`.
pub fn xp_for_level(level: u32) -> u64 {
    u64::from(level).saturating_mul(XP_PER_LEVEL_STEP)
}

/// Fold `xp_gained` into a progression state.
///
/// A zero grant is a no-op and reports no level-up. Currency is untouched.
///
/// # Errors
///
/// Returns [`ProgressionError::Validation`] if `state.level` is zero and
/// [`ProgressionError::ArithmeticOverflow`] if experience or level
/// overflows.
pub fn apply_xp(state: &ProgressionState, xp_gained: u64) -> Result<LevelUp, ProgressionError> {
    if state.level == 0 {
        return Err(ProgressionError::validation("level must be at least 1"));
    }

    let mut level = state.level;
    let mut experience = state
        .experience
        .checked_add(xp_gained)
        .ok_or_else(|| ProgressionError::overflow("experience addition"))?;
    let mut levels_gained: u32 = 0;

    // Loop, not a single subtraction: large grants cross several thresholds.
    let mut threshold = xp_for_level(level);
    while experience >= threshold {
        experience = experience
            .checked_sub(threshold)
            .ok_or_else(|| ProgressionError::overflow("experience carry-over"))?;
        level = level
            .checked_add(1)
            .ok_or_else(|| ProgressionError::overflow("level increment"))?;
        levels_gained = levels_gained
            .checked_add(1)
            .ok_or_else(|| ProgressionError::overflow("levels gained"))?;
        threshold = xp_for_level(level);
    }

    Ok(LevelUp {
        level,
        experience,
        levels_gained,
    })
}

/// XP still needed to reach the next level.
pub fn xp_to_next_level(state: &ProgressionState) -> u64 {
    xp_for_level(state.level).saturating_sub(state.experience)
}

/// Progress towards the next level in whole percent (`0..=100`).
pub fn level_progress_pct(state: &ProgressionState) -> u32 {
    let threshold = xp_for_level(state.level);
    let pct = state
        .experience
        .saturating_mul(100)
        .checked_div(threshold)
        .unwrap_or(0)
        .min(100);
    u32::try_from(pct).unwrap_or(100)
}
