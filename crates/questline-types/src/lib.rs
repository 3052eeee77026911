//! Shared type definitions for the Questline progression engine.
//!
//! This crate is the single source of truth for the data exchanged between
//! the engine, its persistence collaborator and the presentation layer.
//! Types flow downstream to `TypeScript` via `ts-rs` for the web client.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for all entity identifiers
//! - [`enums`] -- Attributes, quest cadence and difficulty, store and ledger enums
//! - [`structs`] -- Attributes, progression state, quests, outcomes, effects, ledger entries

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{Attribute, EntityType, ItemKind, LedgerEntryType, QuestDifficulty, RecurringType};
pub use ids::{EffectId, ItemId, LedgerEntryId, QuestId, UserId};
pub use structs::{
    Attributes, EffectTemplate, HealthReading, LedgerEntry, ProgressionState, Quest,
    RewardOutcome, StatusEffect, StoreItem,
};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation for the presentation layer.

    #[test]
    fn export_bindings() {
        // ts-rs writes the bindings when export_all is called. Files land in
        // `bindings/` relative to the crate root.
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::UserId::export_all();
        let _ = crate::ids::QuestId::export_all();
        let _ = crate::ids::ItemId::export_all();
        let _ = crate::ids::EffectId::export_all();
        let _ = crate::ids::LedgerEntryId::export_all();

        // Enums
        let _ = crate::enums::Attribute::export_all();
        let _ = crate::enums::RecurringType::export_all();
        let _ = crate::enums::QuestDifficulty::export_all();
        let _ = crate::enums::ItemKind::export_all();
        let _ = crate::enums::LedgerEntryType::export_all();
        let _ = crate::enums::EntityType::export_all();

        // Structs
        let _ = crate::structs::Attributes::export_all();
        let _ = crate::structs::ProgressionState::export_all();
        let _ = crate::structs::Quest::export_all();
        let _ = crate::structs::RewardOutcome::export_all();
        let _ = crate::structs::HealthReading::export_all();
        let _ = crate::structs::StatusEffect::export_all();
        let _ = crate::structs::EffectTemplate::export_all();
        let _ = crate::structs::StoreItem::export_all();
        let _ = crate::structs::LedgerEntry::export_all();
    }
}
