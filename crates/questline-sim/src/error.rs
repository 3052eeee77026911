//! Error types for the simulation binary.
//!
//! [`SimError`] wraps every failure mode of startup and the demo run so
//! `main` can propagate with `?`.

/// Top-level error for the simulation binary.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: questline_core::config::ConfigError,
    },

    /// A progression operation failed.
    #[error("service error: {source}")]
    Service {
        /// The underlying service error.
        #[from]
        source: questline_core::service::ServiceError,
    },

    /// Seeding the store failed.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: questline_core::store::StoreError,
    },

    /// The background drift task could not be joined.
    #[error("drift task failed: {message}")]
    DriftTask {
        /// Description of the join failure.
        message: String,
    },

    /// The ledger and the stored balance disagree.
    #[error("ledger anomaly: {message}")]
    Anomaly {
        /// The reconciliation message.
        message: String,
    },
}
