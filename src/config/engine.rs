//! Scenario engine settings

use serde::{Deserialize, Serialize};

/// Which scenario columns a `calculate_scenario` call recomputes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecomputeMode {
    /// Compute only the columns reached by the requested transitions
    /// (or the current column when no transition is requested).
    #[default]
    AdvancedOnly,

    /// After the transitions, recompute every column once and return to the
    /// column the transitions reached.
    Full,
}

/// Scenario engine configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Recompute scope of a scenario pass
    #[serde(default)]
    pub recompute: RecomputeMode,
}

impl EngineConfig {
    /// Configuration with the given recompute mode.
    #[must_use]
    pub const fn with_recompute(recompute: RecomputeMode) -> Self {
        Self { recompute }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recompute_mode_deserialization() {
        let config: EngineConfig = serde_json::from_str(r#"{"recompute": "full"}"#).unwrap();
        assert_eq!(config.recompute, RecomputeMode::Full);
        let config: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.recompute, RecomputeMode::AdvancedOnly);
    }
}
