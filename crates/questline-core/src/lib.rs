//! Configuration, persistence and scheduling around the Questline engine.
//!
//! `questline-progression` computes; this crate wires it to storage and
//! time. Every state change goes through [`ProgressionService`], which
//! loads a versioned snapshot, runs the pure engine, and commits the
//! result atomically with optimistic concurrency.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `questline-config.yaml` into
//!   strongly-typed structs.
//! - [`store`] -- [`ProgressionStore`] trait and the in-memory [`MemoryStore`].
//! - [`service`] -- [`ProgressionService`]: load, compute, commit, retry.
//! - [`signals`] -- [`HealthSignalSource`] trait with simulated and fixed sources.
//! - [`control`] -- Pause, stop and interval controls for the drift loop.
//! - [`runner`] -- The async drift scheduler.
//!
//! [`ProgressionService`]: service::ProgressionService
//! [`ProgressionStore`]: store::ProgressionStore
//! [`MemoryStore`]: store::MemoryStore
//! [`HealthSignalSource`]: signals::HealthSignalSource

pub mod config;
pub mod control;
pub mod runner;
pub mod service;
pub mod signals;
pub mod store;
