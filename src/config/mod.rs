//! Configuration management for the observation engine.
//!
//! Provides hierarchical configuration loading and validation with:
//! - Default values as code base
//! - Configuration file support (`CONFIG_PATH`)
//! - Environment variable overrides (`PREFS__SECTION__FIELD`)
//! - Component-wise validation
mod delivery;
mod filter;
pub use delivery::*;
pub use filter::*;


use std::env;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::Result;
use crate::CONFIG_ENV_PREFIX;

/// Root configuration of a [`PreferencesObserver`](crate::PreferencesObserver).
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct ObserverConfig {
    /// Namespace isolation
    #[serde(default)]
    pub filter: FilterConfig,
    /// Event delivery to sinks
    #[serde(default)]
    pub delivery: DeliveryConfig,
}

impl ObserverConfig {
    /// Creates a new configuration with hierarchical override support:
    ///
    /// Configuration sources are merged in the following order (later sources
    /// override earlier ones):
    /// 1. Type defaults (lowest priority)
    /// 2. Configuration file from `CONFIG_PATH` environment variable
    /// 3. Environment variables with `PREFS__` prefix (highest priority)
    ///
    /// Validation is deferred to [`ObserverConfig::validate`].
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var("CONFIG_PATH") {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(environment());

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Merge the file at `path` over this configuration. Environment
    /// variables still take precedence.
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(environment())
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    pub fn validate(self) -> Result<Self> {
        self.filter.validate()?;
        self.delivery.validate()?;
        Ok(self)
    }
}

fn environment() -> Environment {
    Environment::with_prefix(CONFIG_ENV_PREFIX)
        .separator("__")
        .ignore_empty(true)
        .try_parsing(true)
}
