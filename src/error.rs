//! Error types for lca-scenarios.
//!
//! All errors are strongly typed using thiserror. Each layer (storage,
//! formula evaluation, LCA engine, configuration) owns its own error enum;
//! `LcaError` is the top-level type returned by the public operations.

use thiserror::Error;

use crate::config::ConfigValidationError;
use crate::formula::FormulaError;
use crate::lca::EngineError;
use crate::scope::ParameterScope;
use crate::storage::StorageError;

/// Precondition violations detected before any state is mutated.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Scenario has {actual} values, expected one per parameter ({expected})")]
    ScenarioValueCount {
        expected: usize,
        actual: usize,
    },

    #[error("Negative scenario index {index} is not allowed")]
    NegativeScenarioIndex {
        index: i64,
    },

    #[error("Scenario index {index} is out of range for {total} scenarios")]
    ScenarioIndexOutOfRange {
        index: i64,
        total: usize,
    },

    #[error("A scenario set must contain at least one scenario")]
    EmptyScenarioSet,

    #[error("Calculation setup '{name}' has no {missing}")]
    EmptyCalculationSetup {
        name: String,
        missing: &'static str,
    },

    #[error("Invalid parameter name '{name}'")]
    InvalidParameterName {
        name: String,
    },

    #[error("Invalid parameter scope '{value}'")]
    InvalidScope {
        value: String,
    },

    #[error("Invalid scenario table: {reason}")]
    InvalidScenarioTable {
        reason: String,
    },

    #[error("Unknown scenario column '{name}'")]
    UnknownScenarioColumn {
        name: String,
    },

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigValidationError),
}

/// Errors raised while executing a recalculation or a scenario pass.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Scenario resource with name '{name}' not found")]
    ScenarioResourceNotFound {
        name: String,
    },

    #[error("Calculation setup '{name}' not found")]
    CalculationSetupNotFound {
        name: String,
    },

    #[error("Parameter scope '{scope}' not found")]
    ScopeNotFound {
        scope: ParameterScope,
    },

    #[error("The following variables aren't defined:\n{}", .names.join("|"))]
    MissingDependency {
        names: Vec<String>,
    },

    #[error("Formula evaluation failed in scope '{scope}': {source}")]
    Evaluation {
        scope: ParameterScope,
        #[source]
        source: FormulaError,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("LCA engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Top-level error type for lca-scenarios.
#[derive(Debug, Error)]
pub enum LcaError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),
}

impl From<StorageError> for LcaError {
    fn from(err: StorageError) -> Self {
        Self::Execution(ExecutionError::Storage(err))
    }
}

impl From<EngineError> for LcaError {
    fn from(err: EngineError) -> Self {
        Self::Execution(ExecutionError::Engine(err))
    }
}

impl From<std::io::Error> for LcaError {
    fn from(err: std::io::Error) -> Self {
        Self::Execution(ExecutionError::Io(err))
    }
}

impl LcaError {
    /// Returns true if this is a precondition violation.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if a requested resource, setup or scope does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Execution(
                ExecutionError::ScenarioResourceNotFound { .. }
                    | ExecutionError::CalculationSetupNotFound { .. }
                    | ExecutionError::ScopeNotFound { .. }
            )
        )
    }

    /// Returns true if a formula referenced undefined names.
    #[must_use]
    pub const fn is_missing_dependency(&self) -> bool {
        matches!(self, Self::Execution(ExecutionError::MissingDependency { .. }))
    }

    /// Returns true if a formula failed to evaluate.
    #[must_use]
    pub const fn is_evaluation(&self) -> bool {
        matches!(self, Self::Execution(ExecutionError::Evaluation { .. }))
    }

    /// Returns true if the caller can fix the failure by supplying more input
    /// (for example missing global parameters) and calling again.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        self.is_missing_dependency()
    }

    /// Names reported by a `MissingDependency` error, if this is one.
    #[must_use]
    pub fn missing_names(&self) -> Option<&[String]> {
        match self {
            Self::Execution(ExecutionError::MissingDependency { names }) => Some(names),
            _ => None,
        }
    }
}

/// Result type alias for lca-scenarios operations.
pub type LcaResult<T> = Result<T, LcaError>;
