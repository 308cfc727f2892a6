//! Crate configuration
//!
//! Configuration is an explicit value handed to the components that need
//! it. [`LcaConfig::load`] reads an optional file and then environment
//! variables with the `LCA_SCENARIOS` prefix, using `__` to separate nested
//! values. Embedded callers can start from [`LcaConfig::default`].
//!
//! # Example
//!
//! ```no_run
//! use lca_scenarios::config::LcaConfig;
//!
//! let config = LcaConfig::load(None).expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Parameters at {}", config.store.parameter_path().display());
//! ```

mod engine;
mod error;
mod scenarios;
mod store;

pub use engine::{EngineConfig, RecomputeMode};
pub use error::{ConfigError, ConfigValidationError};
pub use scenarios::ScenarioConfig;
pub use store::StoreConfig;

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "LCA_SCENARIOS";

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LcaConfig {
    /// Parameter document and package locations
    #[serde(default)]
    pub store: StoreConfig,

    /// Scenario engine behaviour
    #[serde(default)]
    pub engine: EngineConfig,

    /// Scenario table format
    #[serde(default)]
    pub scenarios: ScenarioConfig,
}

impl LcaConfig {
    /// Load configuration from an optional file and the environment
    ///
    /// This function:
    /// 1. Loads `.env` file if present
    /// 2. Reads `path` if given (format chosen by extension)
    /// 3. Overlays environment variables with the `LCA_SCENARIOS` prefix
    ///
    /// # Environment Variable Format
    ///
    /// - `LCA_SCENARIOS__STORE__DATA_DIR=/srv/lca` -> `store.data_dir`
    /// - `LCA_SCENARIOS__ENGINE__RECOMPUTE=full` -> `engine.recompute`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::LoadError` if the file cannot be read or a value
    /// has the wrong type.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        let config = builder
            .add_source(config::Environment::default().prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting found.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        self.store.validate()?;
        self.scenarios.validate()?;
        Ok(())
    }
}
