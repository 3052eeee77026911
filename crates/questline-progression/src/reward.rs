//! The Reward Resolver.
//!
//! Turns a quest's declared rewards into the deltas the completion
//! transaction applies, and draws the variable-ratio surprise bonus.
//!
//! The resolver is deterministic given its random source. The source is
//! always injected by the caller; nothing here touches a global RNG, and
//! the bonus is drawn independently on every call regardless of quest
//! identity.

use std::collections::BTreeMap;

use rand::Rng;
use tracing::debug;

use questline_types::{Attribute, Quest};

use crate::config::BonusConfig;
use crate::error::ProgressionError;

/// The deltas a quest completion will apply, before the ladder and clamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedReward {
    /// Experience to grant.
    pub xp: u64,
    /// Base currency to grant.
    pub currency: u64,
    /// Attribute deltas declared by the quest. Absent keys mean zero.
    pub attribute_deltas: BTreeMap<Attribute, i32>,
    /// Surprise bonus currency, `0` when the draw failed.
    pub bonus_currency: u64,
}

/// Validate a quest's declared rewards and convert them to unsigned amounts.
///
/// # Errors
///
/// Returns [`ProgressionError::Validation`] if the XP or currency reward is
/// negative. A malformed definition is an upstream data bug, so it is
/// surfaced instead of being clamped to zero.
pub fn validate_rewards(quest: &Quest) -> Result<(u64, u64), ProgressionError> {
    let xp = u64::try_from(quest.xp_reward).map_err(|e| {
        ProgressionError::validation(format!(
            "quest {} has invalid xp_reward {}: {e}",
            quest.id, quest.xp_reward
        ))
    })?;
    let currency = u64::try_from(quest.currency_reward).map_err(|e| {
        ProgressionError::validation(format!(
            "quest {} has invalid currency_reward {}: {e}",
            quest.id, quest.currency_reward
        ))
    })?;
    Ok((xp, currency))
}

/// Draw the variable-ratio bonus.
///
/// Fires with probability `chance_pct / 100`; on success returns an amount
/// uniform in `min_amount..=max_amount`, otherwise `0`.
///
/// # Errors
///
/// Returns [`ProgressionError::Validation`] if the configuration is invalid.
pub fn draw_bonus<R: Rng + ?Sized>(
    config: &BonusConfig,
    rng: &mut R,
) -> Result<u64, ProgressionError> {
    config.validate()?;
    let roll: u32 = rng.random_range(0..100);
    if roll >= config.chance_pct {
        return Ok(0);
    }
    Ok(rng.random_range(config.min_amount..=config.max_amount))
}

/// Resolve a quest into the deltas to apply.
///
/// # Errors
///
/// Returns [`ProgressionError::Validation`] for negative rewards or an
/// invalid bonus configuration.
pub fn resolve<R: Rng + ?Sized>(
    quest: &Quest,
    bonus: &BonusConfig,
    rng: &mut R,
) -> Result<ResolvedReward, ProgressionError> {
    let (xp, currency) = validate_rewards(quest)?;
    let bonus_currency = draw_bonus(bonus, rng)?;

    if bonus_currency > 0 {
        debug!(quest_id = %quest.id, bonus_currency, "variable-ratio bonus triggered");
    }

    Ok(ResolvedReward {
        xp,
        currency,
        attribute_deltas: quest.attribute_rewards.clone(),
        bonus_currency,
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use questline_types::{QuestId, UserId};

    use super::*;

    fn quest(xp: i64, currency: i64) -> Quest {
        let mut rewards = BTreeMap::new();
        rewards.insert(Attribute::Vitality, 5);
        rewards.insert(Attribute::Energy, 3);
        Quest {
            id: QuestId::new(),
            owner: UserId::new(),
            title: String::from("30 minutes of exercise"),
            xp_reward: xp,
            currency_reward: currency,
            attribute_rewards: rewards,
            recurring: false,
            recurring_type: None,
            completed: false,
            completed_at: None,
            created_at: Utc::now(),
        }
    }

    const NEVER: BonusConfig = BonusConfig {
        chance_pct: 0,
        min_amount: 5,
        max_amount: 24,
    };

    #[test]
    fn base_rewards_are_taken_verbatim() {
        let mut rng = SmallRng::seed_from_u64(7);
        let resolved = resolve(&quest(20, 15), &NEVER, &mut rng).ok();
        let resolved = resolved.as_ref();
        assert_eq!(resolved.map(|r| r.xp), Some(20));
        assert_eq!(resolved.map(|r| r.currency), Some(15));
        assert_eq!(resolved.map(|r| r.bonus_currency), Some(0));
        assert_eq!(
            resolved.and_then(|r| r.attribute_deltas.get(&Attribute::Vitality).copied()),
            Some(5)
        );
        assert_eq!(
            resolved.and_then(|r| r.attribute_deltas.get(&Attribute::Focus).copied()),
            None
        );
    }

    #[test]
    fn negative_rewards_are_rejected() {
        let mut rng = SmallRng::seed_from_u64(7);
        assert!(matches!(
            resolve(&quest(-1, 15), &NEVER, &mut rng),
            Err(ProgressionError::Validation { .. })
        ));
        assert!(matches!(
            resolve(&quest(20, -5), &NEVER, &mut rng),
            Err(ProgressionError::Validation { .. })
        ));
    }

    #[test]
    fn pinned_bonus_always_pays_fixed_amount() {
        let config = BonusConfig {
            chance_pct: 100,
            min_amount: 12,
            max_amount: 12,
        };
        let mut rng = SmallRng::seed_from_u64(1);
        for _ in 0..100 {
            assert_eq!(draw_bonus(&config, &mut rng).ok(), Some(12));
        }
    }

    #[test]
    fn invalid_bonus_config_is_rejected_not_panicking() {
        let config = BonusConfig {
            chance_pct: 100,
            min_amount: 24,
            max_amount: 5,
        };
        let mut rng = SmallRng::seed_from_u64(1);
        assert!(draw_bonus(&config, &mut rng).is_err());
    }

    #[test]
    fn bonus_frequency_and_distribution() {
        const DRAWS: u32 = 100_000;
        let config = BonusConfig::default();
        let mut rng = SmallRng::seed_from_u64(0x5eed);
        let mut triggered: u32 = 0;
        let mut counts = [0_u32; 20];

        for _ in 0..DRAWS {
            let amount = draw_bonus(&config, &mut rng).unwrap_or(0);
            if amount == 0 {
                continue;
            }
            triggered += 1;
            assert!((5..=24).contains(&amount), "bonus {amount} out of range");
            let slot = usize::try_from(amount - 5).unwrap_or(0);
            if let Some(count) = counts.get_mut(slot) {
                *count += 1;
            }
        }

        let fraction = f64::from(triggered) / f64::from(DRAWS);
        assert!(
            (0.29..=0.31).contains(&fraction),
            "bonus fraction {fraction} not near 0.30"
        );

        // ~30_000 triggers spread over 20 values: ~1_500 each.
        for (i, count) in counts.iter().enumerate() {
            assert!(
                (1_200..=1_800).contains(count),
                "bonus value {} drawn {count} times",
                i + 5
            );
        }
    }

    #[test]
    fn bonus_is_not_tied_to_quest_identity() {
        let config = BonusConfig::default();
        let mut rng = SmallRng::seed_from_u64(99);
        let q = quest(20, 15);
        let draws: Vec<u64> = (0..200)
            .filter_map(|_| resolve(&q, &config, &mut rng).ok())
            .map(|r| r.bonus_currency)
            .collect();
        assert!(draws.iter().any(|b| *b == 0));
        assert!(draws.iter().any(|b| *b > 0));
    }
}
