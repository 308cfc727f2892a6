//! Storage locations

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigValidationError;

/// Where parameters and scenario packages live on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base directory for the relative paths below
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// JSON parameter document, relative to `data_dir`
    #[serde(default = "default_parameter_file")]
    pub parameter_file: String,

    /// Directory of scenario packages, relative to `data_dir`
    #[serde(default = "default_package_dir")]
    pub package_dir: String,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_parameter_file() -> String {
    "parameters.json".to_string()
}

fn default_package_dir() -> String {
    "presamples".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            parameter_file: default_parameter_file(),
            package_dir: default_package_dir(),
        }
    }
}

impl StoreConfig {
    /// Full path of the parameter document.
    #[must_use]
    pub fn parameter_path(&self) -> PathBuf {
        self.data_dir.join(&self.parameter_file)
    }

    /// Full path of the package directory.
    #[must_use]
    pub fn package_path(&self) -> PathBuf {
        self.data_dir.join(&self.package_dir)
    }

    /// Validate storage settings
    ///
    /// # Errors
    ///
    /// Returns `MissingRequired` for an empty file or directory name.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.parameter_file.trim().is_empty() {
            return Err(ConfigValidationError::MissingRequired("store.parameter_file"));
        }
        if self.package_dir.trim().is_empty() {
            return Err(ConfigValidationError::MissingRequired("store.package_dir"));
        }
        Ok(())
    }
}
