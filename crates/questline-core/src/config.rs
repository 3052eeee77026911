//! Configuration loading and typed config structures for Questline.
//!
//! The canonical configuration lives in `questline-config.yaml` at the
//! project root. Every section and field is optional; anything omitted
//! falls back to the engine defaults, so an empty file (or no file at all)
//! runs the standard rules.
//!
//! The `progression`, `bonus` and `drift` sections deserialize straight
//! into the engine's own config types from `questline-progression`.

use std::path::Path;

use serde::Deserialize;

use questline_progression::{BonusConfig, DriftConfig, ProgressionConfig, ProgressionError};

use crate::control::MIN_TICK_INTERVAL_MS;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The YAML parsed but describes unusable rules.
    #[error("invalid configuration: {source}")]
    Invalid {
        /// The validation failure.
        #[from]
        source: ProgressionError,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level engine configuration.
///
/// Mirrors the structure of `questline-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EngineConfig {
    /// Onboarding profile and level-up parameters.
    #[serde(default)]
    pub progression: ProgressionConfig,

    /// Variable-ratio bonus parameters.
    #[serde(default)]
    pub bonus: BonusConfig,

    /// Passive drift thresholds and tick interval.
    #[serde(default)]
    pub drift: DriftConfig,

    /// Persistence retry policy.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Parameters of the demo simulation binary.
    #[serde(default)]
    pub simulation: SimulationConfig,
}

impl EngineConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if the rules fail validation.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if the rules fail validation.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // serde_yml maps an empty document to unit, not to a struct.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise return the defaults.
    ///
    /// # Errors
    ///
    /// Same as [`EngineConfig::from_file`] when the file exists.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Check cross-field constraints that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressionError::Validation`] for an unusable bonus range
    /// or a drift interval below [`MIN_TICK_INTERVAL_MS`].
    pub fn validate(&self) -> Result<(), ProgressionError> {
        self.bonus.validate()?;
        if self.drift.tick_interval_ms < MIN_TICK_INTERVAL_MS {
            return Err(ProgressionError::validation(format!(
                "drift.tick_interval_ms must be at least {MIN_TICK_INTERVAL_MS}, got {}",
                self.drift.tick_interval_ms
            )));
        }
        Ok(())
    }
}

/// Persistence retry policy for the progression service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ServiceConfig {
    /// Commit attempts after the first one when the store reports a
    /// concurrent modification (default: 3).
    #[serde(default = "default_max_commit_retries")]
    pub max_commit_retries: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_commit_retries: default_max_commit_retries(),
        }
    }
}

const fn default_max_commit_retries() -> u32 {
    3
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    String::from("info")
}

/// Parameters of the demo simulation binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SimulationConfig {
    /// Seed for the signal source and bonus draws.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Number of drift ticks to run (0 = until stopped).
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            max_ticks: default_max_ticks(),
        }
    }
}

const fn default_seed() -> u64 {
    42
}

const fn default_max_ticks() -> u64 {
    12
}
