//! Store purchases: spend currency, receive timed effects.

use chrono::{DateTime, Utc};
use tracing::debug;

use questline_ledger::transaction;
use questline_types::{LedgerEntry, ProgressionState, StatusEffect, StoreItem, UserId};

use crate::effects::instantiate;
use crate::error::ProgressionError;

/// Everything a successful purchase changes, ready to commit together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Purchase {
    /// Progression state with the price debited.
    pub progression: ProgressionState,
    /// Effects granted by the item, started at the purchase time.
    pub effects: Vec<StatusEffect>,
    /// The `Purchase` ledger entry, absent for free items.
    pub ledger_entry: Option<LedgerEntry>,
}

/// Buy `item` for `user`.
///
/// # Errors
///
/// Returns [`ProgressionError::InsufficientFunds`] if the user holds less
/// currency than the price.
pub fn purchase(
    user: UserId,
    progression: &ProgressionState,
    item: &StoreItem,
    now: DateTime<Utc>,
) -> Result<Purchase, ProgressionError> {
    let currency = progression
        .currency
        .checked_sub(item.price)
        .ok_or(ProgressionError::InsufficientFunds {
            price: item.price,
            balance: progression.currency,
        })?;

    let ledger_entry = if item.price > 0 {
        Some(transaction::purchase(
            user.into_inner(),
            item.id.into_inner(),
            item.price,
            now,
        )?)
    } else {
        None
    };

    let effects = item
        .effects
        .iter()
        .map(|template| instantiate(template, &item.name, now))
        .collect();

    debug!(%user, item = %item.name, price = item.price, "store purchase");

    Ok(Purchase {
        progression: ProgressionState {
            currency,
            ..*progression
        },
        effects,
        ledger_entry,
    })
}
