//! CLI configuration.
//!
//! Settings are layered: built-in defaults, then an optional file (YAML,
//! TOML or JSON, picked by extension), then `LOANER_*` environment
//! variables. Nested keys use a double underscore, so
//! `LOANER_POOL__MAX_SIZE=-1` makes the pool unbounded.

use loaner_core::PoolSettings;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "LOANER";

/// Errors raised while loading settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error(transparent)]
    Invalid(#[from] loaner_core::Error),
}

/// Effective CLI settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Pool configuration.
    pub pool: PoolSettings,
    /// Workload used by `simulate`.
    pub simulation: SimulationSettings,
}

/// Workload shape for the borrow/release simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Number of worker threads.
    pub threads: usize,
    /// Invocations per thread.
    pub iterations: usize,
    /// How long each invocation holds its target, in milliseconds.
    pub hold_ms: u64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            threads: 4,
            iterations: 100,
            hold_ms: 1,
        }
    }
}

impl SimulationSettings {
    /// Returns the hold time as a duration.
    pub fn hold(&self) -> Duration {
        Duration::from_millis(self.hold_ms)
    }
}

impl Settings {
    /// Loads settings from defaults, `path` and `LOANER_*` variables.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    /// Same as [`Settings::load`] with a custom environment prefix.
    pub fn load_with_prefix(path: Option<&Path>, prefix: &str) -> Result<Self, SettingsError> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Self::default())?);

        if let Some(path) = path {
            tracing::debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings: Self = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Checks the pool settings and the workload.
    pub fn validate(&self) -> loaner_core::Result<()> {
        self.pool.validate()?;
        if self.simulation.threads == 0 {
            return Err(loaner_core::Error::invalid_config(
                "simulation.threads",
                "at least one thread is required",
            ));
        }
        Ok(())
    }
}
