//! Abstract storage traits for lca-scenarios.
//!
//! These traits describe the collaborators the recalculation core reads
//! from: the backing parameter store, the scenario resource registry and the
//! calculation setup store. By using traits, we enable:
//! - In-memory backends for testing and embedded use
//! - File-backed backends for the command-line tool
//! - Adapters onto an external LCA framework

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::lca::CalculationSetup;
use crate::scenario::ScenarioResource;
use crate::scope::{ParameterScope, ScopeKind};

static PARAMETER_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap_or_else(|e| panic!("invalid name pattern: {e}"))
});

/// Returns true if `name` can be used as a parameter name inside formulas.
#[must_use]
pub fn is_valid_parameter_name(name: &str) -> bool {
    PARAMETER_NAME.is_match(name)
}

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Parameter not found in its scope.
    #[error("Parameter '{name}' not found in scope '{scope}'")]
    ParameterNotFound {
        name: String,
        scope: ParameterScope,
    },

    /// Key already exists.
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// Parameter name is not a valid formula symbol.
    #[error("Invalid parameter name: {0}")]
    InvalidName(String),

    /// Backend error.
    #[error("Storage backend error: {0}")]
    BackendError(String),

    /// Serialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One persisted parameter, as returned by a flat selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterRecord {
    /// Parameter name, unique within its scope.
    pub name: String,

    /// Scope the parameter belongs to.
    pub scope: ParameterScope,

    /// Persisted amount.
    pub amount: f64,

    /// Optional formula over other visible parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,

    /// For activity parameters: the database the group belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
}

impl ParameterRecord {
    /// Creates a record with a fixed amount.
    #[must_use]
    pub fn new(name: impl Into<String>, scope: ParameterScope, amount: f64) -> Self {
        Self {
            name: name.into(),
            scope,
            amount,
            formula: None,
            database: None,
        }
    }

    /// Sets the formula.
    #[must_use]
    pub fn with_formula(mut self, formula: impl Into<String>) -> Self {
        self.formula = Some(formula.into());
        self
    }

    /// Sets the database an activity group belongs to.
    #[must_use]
    pub fn in_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }
}

/// The per-scope view of a parameter: `{amount, formula, ...}` keyed by name.
///
/// Extra fields (uncertainty information, units, comments) are preserved
/// untouched; the recalculation core only ever rewrites `amount`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDefinition {
    /// Current amount.
    pub amount: f64,

    /// Optional formula.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,

    /// Any other stored fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ParameterDefinition {
    /// Creates a definition with a fixed amount.
    #[must_use]
    pub fn fixed(amount: f64) -> Self {
        Self {
            amount,
            formula: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Creates a definition computed from a formula.
    #[must_use]
    pub fn with_formula(amount: f64, formula: impl Into<String>) -> Self {
        Self {
            amount,
            formula: Some(formula.into()),
            extra: serde_json::Map::new(),
        }
    }
}

impl From<&ParameterRecord> for ParameterDefinition {
    fn from(record: &ParameterRecord) -> Self {
        Self {
            amount: record.amount,
            formula: record.formula.clone(),
            extra: serde_json::Map::new(),
        }
    }
}

/// Backing store for project, database and activity parameters.
///
/// The recalculation core never creates or deletes parameters through this
/// trait; it reads them and rewrites amounts.
pub trait ParameterStore: Send + Sync {
    /// All parameters of one class, in store order.
    fn select(&self, kind: ScopeKind) -> Result<Vec<ParameterRecord>, StorageError>;

    /// The parameter definitions of one scope, in store order.
    ///
    /// An unknown scope yields an empty map.
    fn load(&self, scope: &ParameterScope)
        -> Result<IndexMap<String, ParameterDefinition>, StorageError>;

    /// Overwrites the amounts of existing parameters in one scope.
    ///
    /// # Errors
    /// - `ParameterNotFound`: If a name does not exist in the scope. No
    ///   amount is written in that case.
    fn save_amounts(
        &self,
        scope: &ParameterScope,
        amounts: &IndexMap<String, f64>,
    ) -> Result<(), StorageError>;

    /// Overwrites amounts in several scopes as one update.
    ///
    /// # Errors
    /// - `ParameterNotFound`: If a name does not exist in its scope. No
    ///   amount in any scope is written in that case.
    fn save_scopes(
        &self,
        scopes: &IndexMap<ParameterScope, IndexMap<String, f64>>,
    ) -> Result<(), StorageError>;
}

/// Registry of scenario resources (presample packages).
pub trait ScenarioRegistry: Send + Sync {
    /// Resolve a resource by name.
    fn get_by_name(&self, name: &str) -> Result<Option<ScenarioResource>, StorageError>;

    /// Names of all registered resources, sorted.
    fn names(&self) -> Result<Vec<String>, StorageError>;
}

/// Store of named calculation setups.
pub trait SetupStore: Send + Sync {
    /// Get a calculation setup by name.
    fn get(&self, name: &str) -> Result<Option<CalculationSetup>, StorageError>;

    /// Names of all setups, sorted.
    fn names(&self) -> Result<Vec<String>, StorageError>;
}
