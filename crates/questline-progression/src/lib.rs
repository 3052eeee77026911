//! The pure Progression & Reward Engine for Questline.
//!
//! Everything in this crate is a function over a snapshot of user state.
//! Nothing here performs I/O, holds state between calls, or reads a clock
//! or global RNG: timestamps and random sources are passed in by the
//! caller. Persistence and scheduling live in `questline-core`.
//!
//! # Modules
//!
//! - [`attributes`] -- The Attribute Model: clamping to `1..=100` and delta application
//! - [`ladder`] -- The Experience/Level Ladder with multi-level carry-over
//! - [`reward`] -- The Reward Resolver and the variable-ratio bonus draw
//! - [`completion`] -- The Quest Completion Transaction ([`Completion`])
//! - [`drift`] -- Passive attribute drift from health readings
//! - [`effects`] -- Timed status effects and effective attributes
//! - [`purchase`](mod@purchase) -- Store purchases
//! - [`onboarding`] -- Starting state for new users
//! - [`config`] -- Tunable parameters ([`ProgressionConfig`], [`BonusConfig`], [`DriftConfig`])
//! - [`error`] -- Error types ([`ProgressionError`])

pub mod attributes;
pub mod completion;
pub mod config;
pub mod drift;
pub mod effects;
pub mod error;
pub mod ladder;
pub mod onboarding;
pub mod purchase;
pub mod reward;

// Re-export primary types at crate root for convenience.
pub use attributes::{MAX_ATTRIBUTE, MIN_ATTRIBUTE, apply_delta, clamp_attribute};
pub use completion::{Completion, CompletionRules, UserSnapshot, complete_quest};
pub use config::{BonusConfig, DriftConfig, ProgressionConfig};
pub use drift::apply_drift;
pub use effects::{effective_attributes, is_active, prune_expired};
pub use error::ProgressionError;
pub use ladder::{LevelUp, apply_xp, level_progress_pct, xp_for_level, xp_to_next_level};
pub use onboarding::{Onboarding, onboard, starting_state};
pub use purchase::{Purchase, purchase};
pub use reward::{ResolvedReward, resolve};
