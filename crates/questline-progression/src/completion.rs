//! The Quest Completion Transaction.
//!
//! Orchestrates one completion over a snapshot of user state:
//!
//! 1. Reject if the quest belongs to someone else or is already completed.
//! 2. Resolve the quest's rewards and draw the bonus.
//! 3. Fold the XP into the level ladder.
//! 4. Apply attribute deltas (and the optional level-up bonus), clamped.
//! 5. Mark the quest completed and stamp `completed_at`.
//! 6. Build the ledger entries for every currency movement.
//!
//! Nothing is mutated in place. The caller receives a [`Completion`] that
//! holds every new value, and either persists all of it in one commit or
//! discards it. A failure in any step returns an error before anything is
//! produced, so there is no partial result to leak.

use chrono::{DateTime, Utc};
use tracing::debug;

use questline_ledger::transaction;
use questline_types::{Attributes, LedgerEntry, ProgressionState, Quest, RewardOutcome, UserId};

use crate::attributes::{apply_delta, apply_uniform};
use crate::config::{BonusConfig, ProgressionConfig};
use crate::error::ProgressionError;
use crate::ladder::apply_xp;
use crate::reward::resolve;

/// The authoritative "before" state of one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserSnapshot {
    /// Level, experience and currency.
    pub progression: ProgressionState,
    /// The four stored attributes.
    pub attributes: Attributes,
}

/// Configuration consulted by a completion.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRules<'a> {
    /// Level-up parameters.
    pub progression: &'a ProgressionConfig,
    /// Variable-ratio bonus parameters.
    pub bonus: &'a BonusConfig,
}

/// Everything a successful completion changes, ready to commit together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Summary for the presentation layer.
    pub outcome: RewardOutcome,
    /// New progression state.
    pub progression: ProgressionState,
    /// New attributes, clamped.
    pub attributes: Attributes,
    /// The quest with `completed` set and `completed_at` stamped.
    pub quest: Quest,
    /// Ledger entries for the base reward and the bonus (if any).
    pub ledger_entries: Vec<LedgerEntry>,
}

/// Check that `user` may complete `quest`.
///
/// # Errors
///
/// Returns [`ProgressionError::NotOwner`] if the quest belongs to another
/// user and [`ProgressionError::AlreadyCompleted`] if it is terminal.
pub fn check_completable(user: UserId, quest: &Quest) -> Result<(), ProgressionError> {
    if quest.owner != user {
        return Err(ProgressionError::NotOwner {
            quest_id: quest.id,
            user_id: user,
            owner: quest.owner,
        });
    }
    if quest.completed {
        return Err(ProgressionError::AlreadyCompleted { quest_id: quest.id });
    }
    Ok(())
}

/// Complete a quest against a snapshot of user state.
///
/// # Errors
///
/// Returns the ownership and already-completed errors of
/// [`check_completable`], [`ProgressionError::Validation`] for malformed
/// rewards, and [`ProgressionError::ArithmeticOverflow`] if a total
/// overflows.
pub fn complete_quest<R: rand::Rng + ?Sized>(
    user: UserId,
    quest: &Quest,
    before: &UserSnapshot,
    rules: CompletionRules<'_>,
    rng: &mut R,
    now: DateTime<Utc>,
) -> Result<Completion, ProgressionError> {
    check_completable(user, quest)?;

    let reward = resolve(quest, rules.bonus, rng)?;
    let ladder = apply_xp(&before.progression, reward.xp)?;

    let mut attributes = reward
        .attribute_deltas
        .iter()
        .fold(before.attributes, |acc, (attr, delta)| {
            apply_delta(acc, *attr, *delta)
        });

    if ladder.leveled_up() && rules.progression.level_up_attribute_bonus > 0 {
        let per_level = i32::try_from(rules.progression.level_up_attribute_bonus)
            .unwrap_or(i32::MAX);
        let levels = i32::try_from(ladder.levels_gained).unwrap_or(i32::MAX);
        attributes = apply_uniform(attributes, per_level.saturating_mul(levels));
    }

    if ladder.leveled_up() {
        debug!(
            %user,
            quest_id = %quest.id,
            from = before.progression.level,
            to = ladder.level,
            "level up"
        );
    }

    let currency = before
        .progression
        .currency
        .checked_add(reward.currency)
        .and_then(|c| c.checked_add(reward.bonus_currency))
        .ok_or_else(|| ProgressionError::overflow("currency addition"))?;

    let progression = ProgressionState {
        level: ladder.level,
        experience: ladder.experience,
        currency,
    };

    let mut ledger_entries = Vec::with_capacity(2);
    if reward.currency > 0 {
        ledger_entries.push(transaction::quest_reward(
            quest.id.into_inner(),
            user.into_inner(),
            reward.currency,
            now,
        )?);
    }
    if reward.bonus_currency > 0 {
        ledger_entries.push(transaction::variable_bonus(
            quest.id.into_inner(),
            user.into_inner(),
            reward.bonus_currency,
            now,
        )?);
    }

    let mut completed = quest.clone();
    completed.completed = true;
    completed.completed_at = Some(now);

    let outcome = RewardOutcome {
        quest_id: quest.id,
        xp_granted: reward.xp,
        currency_granted: reward.currency,
        attribute_deltas: reward.attribute_deltas,
        bonus_currency: reward.bonus_currency,
        leveled_up: ladder.leveled_up(),
        levels_gained: ladder.levels_gained,
        new_level: progression.level,
        new_experience: progression.experience,
        new_currency: progression.currency,
        new_attributes: attributes,
    };

    Ok(Completion {
        outcome,
        progression,
        attributes,
        quest: completed,
        ledger_entries,
    })
}
