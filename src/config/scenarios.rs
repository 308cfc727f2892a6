//! Scenario table settings

use serde::{Deserialize, Serialize};

use super::ConfigValidationError;

/// Scenario table file format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Field delimiter of scenario tables
    #[serde(default = "default_delimiter")]
    pub delimiter: String,

    /// Column name of a template built from persisted amounts
    #[serde(default = "default_column")]
    pub default_column: String,
}

fn default_delimiter() -> String {
    "\t".to_string()
}

fn default_column() -> String {
    "default".to_string()
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            default_column: default_column(),
        }
    }
}

impl ScenarioConfig {
    /// The delimiter as a byte, once validated.
    ///
    /// # Errors
    ///
    /// See [`ScenarioConfig::validate`].
    pub fn delimiter_byte(&self) -> Result<u8, ConfigValidationError> {
        let mut chars = self.delimiter.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii() && !matches!(c, '"' | '\n' | '\r') => Ok(c as u8),
            _ => Err(ConfigValidationError::InvalidDelimiter(self.delimiter.clone())),
        }
    }

    /// Validate scenario table settings
    ///
    /// # Errors
    ///
    /// Returns `InvalidDelimiter` unless the delimiter is one usable ASCII
    /// character, and `MissingRequired` for an empty default column.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        self.delimiter_byte()?;
        if self.default_column.trim().is_empty() {
            return Err(ConfigValidationError::MissingRequired("scenarios.default_column"));
        }
        Ok(())
    }
}
