//! Transaction builders and validation for the currency ledger.
//!
//! Provides a [`TransactionBuilder`] that enforces the double-entry
//! invariant: every currency movement names a source party (debit) and a
//! destination party (credit). Builders validate inputs before producing
//! a [`LedgerEntry`].

use chrono::{DateTime, Utc};
use uuid::Uuid;

use questline_types::{EntityType, LedgerEntry, LedgerEntryId, LedgerEntryType};

use crate::LedgerError;

// ---------------------------------------------------------------------------
// Transaction builder
// ---------------------------------------------------------------------------

/// Builder for constructing validated [`LedgerEntry`] values.
///
/// Enforces that every entry has a non-zero amount, the correct party types
/// for its [`LedgerEntryType`], and an ID on every non-system party.
///
/// # Examples
///
/// ```
/// use questline_ledger::TransactionBuilder;
/// use questline_types::{EntityType, LedgerEntryType};
/// use uuid::Uuid;
///
/// let entry = TransactionBuilder::new(LedgerEntryType::QuestReward)
///     .from(Uuid::now_v7(), EntityType::Quest)
///     .to(Uuid::now_v7(), EntityType::User)
///     .amount(15)
///     .reason("QUEST_REWARD".to_owned())
///     .build();
///
/// assert!(entry.is_ok());
/// ```
#[derive(Debug)]
pub struct TransactionBuilder {
    entry_type: LedgerEntryType,
    from_entity: Option<Uuid>,
    from_entity_type: Option<EntityType>,
    to_entity: Option<Uuid>,
    to_entity_type: Option<EntityType>,
    amount: Option<u64>,
    reason: Option<String>,
    reference_id: Option<Uuid>,
    created_at: Option<DateTime<Utc>>,
}

impl TransactionBuilder {
    /// Start building a ledger entry of the given type.
    pub const fn new(entry_type: LedgerEntryType) -> Self {
        Self {
            entry_type,
            from_entity: None,
            from_entity_type: None,
            to_entity: None,
            to_entity_type: None,
            amount: None,
            reason: None,
            reference_id: None,
            created_at: None,
        }
    }

    /// Set the source party (debit side).
    #[must_use]
    pub const fn from(mut self, entity: Uuid, entity_type: EntityType) -> Self {
        self.from_entity = Some(entity);
        self.from_entity_type = Some(entity_type);
        self
    }

    /// Set the system as the source party.
    #[must_use]
    pub const fn from_system(mut self) -> Self {
        self.from_entity = None;
        self.from_entity_type = Some(EntityType::System);
        self
    }

    /// Set the destination party (credit side).
    #[must_use]
    pub const fn to(mut self, entity: Uuid, entity_type: EntityType) -> Self {
        self.to_entity = Some(entity);
        self.to_entity_type = Some(entity_type);
        self
    }

    /// Set the amount of currency moved.
    #[must_use]
    pub const fn amount(mut self, amount: u64) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Set the human-readable reason for the movement.
    #[must_use]
    pub fn reason(mut self, reason: String) -> Self {
        self.reason = Some(reason);
        self
    }

    /// Set an optional reference to the quest or item involved.
    #[must_use]
    pub const fn reference_id(mut self, id: Uuid) -> Self {
        self.reference_id = Some(id);
        self
    }

    /// Stamp the entry with an explicit timestamp instead of the wall clock.
    #[must_use]
    pub const fn at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Validate inputs and produce a [`LedgerEntry`].
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::ZeroAmount`] if the amount is zero,
    /// [`LedgerError::MissingField`] if required fields are not set,
    /// [`LedgerError::InvalidEntityType`] if the party types break the
    /// contract for the entry type, and [`LedgerError::PartyIdMismatch`] if
    /// a system party carries an ID or another party lacks one.
    pub fn build(self) -> Result<LedgerEntry, LedgerError> {
        let amount = self.amount.ok_or(LedgerError::MissingField("amount"))?;
        let reason = self.reason.ok_or(LedgerError::MissingField("reason"))?;
        let from_type = self
            .from_entity_type
            .ok_or(LedgerError::MissingField("from"))?;
        let to_type = self.to_entity_type.ok_or(LedgerError::MissingField("to"))?;

        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }

        validate_entity_types(self.entry_type, from_type, to_type)?;
        validate_party_id(self.entry_type, "from", from_type, self.from_entity)?;
        validate_party_id(self.entry_type, "to", to_type, self.to_entity)?;

        Ok(LedgerEntry {
            id: LedgerEntryId::new(),
            entry_type: self.entry_type,
            from_entity: self.from_entity,
            from_entity_type: from_type,
            to_entity: self.to_entity,
            to_entity_type: to_type,
            amount,
            reason,
            reference_id: self.reference_id,
            created_at: self.created_at.unwrap_or_else(Utc::now),
        })
    }
}

// ---------------------------------------------------------------------------
// Entry constructors
// ---------------------------------------------------------------------------

/// Build an `OnboardingGrant` entry: system to user.
pub fn onboarding_grant(
    user: Uuid,
    amount: u64,
    at: DateTime<Utc>,
) -> Result<LedgerEntry, LedgerError> {
    TransactionBuilder::new(LedgerEntryType::OnboardingGrant)
        .from_system()
        .to(user, EntityType::User)
        .amount(amount)
        .reason("ONBOARDING_GRANT".to_owned())
        .at(at)
        .build()
}

/// Build a `QuestReward` entry: quest to user.
pub fn quest_reward(
    quest: Uuid,
    user: Uuid,
    amount: u64,
    at: DateTime<Utc>,
) -> Result<LedgerEntry, LedgerError> {
    TransactionBuilder::new(LedgerEntryType::QuestReward)
        .from(quest, EntityType::Quest)
        .to(user, EntityType::User)
        .amount(amount)
        .reason("QUEST_REWARD".to_owned())
        .reference_id(quest)
        .at(at)
        .build()
}

/// Build a `VariableBonus` entry: system to user, referencing the quest.
pub fn variable_bonus(
    quest: Uuid,
    user: Uuid,
    amount: u64,
    at: DateTime<Utc>,
) -> Result<LedgerEntry, LedgerError> {
    TransactionBuilder::new(LedgerEntryType::VariableBonus)
        .from_system()
        .to(user, EntityType::User)
        .amount(amount)
        .reason("VARIABLE_BONUS".to_owned())
        .reference_id(quest)
        .at(at)
        .build()
}

/// Build a `Purchase` entry: user to store, referencing the item.
pub fn purchase(
    user: Uuid,
    item: Uuid,
    price: u64,
    at: DateTime<Utc>,
) -> Result<LedgerEntry, LedgerError> {
    TransactionBuilder::new(LedgerEntryType::Purchase)
        .from(user, EntityType::User)
        .to(item, EntityType::Store)
        .amount(price)
        .reason("PURCHASE".to_owned())
        .reference_id(item)
        .at(at)
        .build()
}

/// Validate that the from/to party types match the contract for the
/// given [`LedgerEntryType`].
fn validate_entity_types(
    entry_type: LedgerEntryType,
    from_type: EntityType,
    to_type: EntityType,
) -> Result<(), LedgerError> {
    let (expected_from, expected_to) = expected_entity_types(entry_type);

    if from_type != expected_from {
        return Err(LedgerError::InvalidEntityType {
            entry_type,
            side: "from",
            expected: expected_from.to_string(),
            actual: from_type.to_string(),
        });
    }

    if to_type != expected_to {
        return Err(LedgerError::InvalidEntityType {
            entry_type,
            side: "to",
            expected: expected_to.to_string(),
            actual: to_type.to_string(),
        });
    }

    Ok(())
}

/// The system is the only party without an ID.
const fn validate_party_id(
    entry_type: LedgerEntryType,
    side: &'static str,
    entity_type: EntityType,
    entity: Option<Uuid>,
) -> Result<(), LedgerError> {
    let is_system = matches!(entity_type, EntityType::System);
    if is_system == entity.is_some() {
        return Err(LedgerError::PartyIdMismatch { entry_type, side });
    }
    Ok(())
}

/// Return the expected (from, to) party types for each [`LedgerEntryType`].
const fn expected_entity_types(entry_type: LedgerEntryType) -> (EntityType, EntityType) {
    match entry_type {
        LedgerEntryType::OnboardingGrant | LedgerEntryType::VariableBonus => {
            (EntityType::System, EntityType::User)
        }
        LedgerEntryType::QuestReward => (EntityType::Quest, EntityType::User),
        LedgerEntryType::Purchase => (EntityType::User, EntityType::Store),
    }
}
