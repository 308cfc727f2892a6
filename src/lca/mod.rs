//! LCA vocabulary and the engine interface the scenario engine drives.
//!
//! The numerical LCA library is consumed through [`LcaEngine`] and
//! [`LcaEngineFactory`]. [`DenseLcaModel`] is a small dense implementation
//! used for tests, benchmarks and embedding.

mod dense;
mod engine;

pub use dense::{DenseLca, DenseLcaModel, MatrixKind, MatrixSubstitution};
pub use engine::{EngineError, LcaEngine, LcaEngineFactory};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Key of an activity: `(database, code)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActivityKey {
    /// Database the activity lives in.
    pub database: String,
    /// Activity code, unique within the database.
    pub code: String,
}

impl ActivityKey {
    /// Creates a key.
    #[must_use]
    pub fn new(database: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            code: code.into(),
        }
    }
}

impl fmt::Display for ActivityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "('{}', '{}')", self.database, self.code)
    }
}

/// Demand for one activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionalUnit {
    /// Demanded activity.
    pub activity: ActivityKey,
    /// Demanded amount.
    pub amount: f64,
}

impl FunctionalUnit {
    /// Creates a functional unit.
    #[must_use]
    pub const fn new(activity: ActivityKey, amount: f64) -> Self {
        Self { activity, amount }
    }
}

impl fmt::Display for FunctionalUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}: {}}}", self.activity, self.amount)
    }
}

/// Impact assessment method identifier, e.g. `("IPCC 2013", "climate change", "GWP 100a")`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MethodId(Vec<String>);

impl MethodId {
    /// Creates a method id from its name parts.
    #[must_use]
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(parts.into_iter().map(Into::into).collect())
    }

    /// Name parts.
    #[must_use]
    pub fn parts(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(", "))
    }
}

/// A named set of functional units and methods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationSetup {
    /// Setup name.
    pub name: String,
    /// Functional units, in result-row order.
    pub functional_units: Vec<FunctionalUnit>,
    /// Methods, in result-column order.
    pub methods: Vec<MethodId>,
}

impl CalculationSetup {
    /// Creates a setup.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        functional_units: Vec<FunctionalUnit>,
        methods: Vec<MethodId>,
    ) -> Self {
        Self {
            name: name.into(),
            functional_units,
            methods,
        }
    }

    /// Checks that the setup has at least one functional unit and method.
    ///
    /// # Errors
    /// `ValidationError::EmptyCalculationSetup` naming what is missing.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let missing = if self.functional_units.is_empty() {
            "functional units"
        } else if self.methods.is_empty() {
            "methods"
        } else {
            return Ok(());
        };
        Err(ValidationError::EmptyCalculationSetup {
            name: self.name.clone(),
            missing,
        })
    }
}
