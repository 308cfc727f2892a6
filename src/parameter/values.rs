//! Flat, ordered parameter values.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::scope::ParameterScope;

/// One `(name, scope, amount)` entry of the flat value list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterValue {
    /// Parameter name.
    pub name: String,
    /// Owning scope.
    pub scope: ParameterScope,
    /// Current amount.
    pub amount: f64,
}

impl ParameterValue {
    /// Creates a value.
    #[must_use]
    pub fn new(name: impl Into<String>, scope: ParameterScope, amount: f64) -> Self {
        Self {
            name: name.into(),
            scope,
            amount,
        }
    }
}

/// Ordered list of parameter values across every scope.
///
/// Order is project parameters, then database parameters, then activity
/// parameters; scenario vectors are matched against it by position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterValueStore {
    values: Vec<ParameterValue>,
}

impl ParameterValueStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole list.
    pub fn set_values(&mut self, values: Vec<ParameterValue>) {
        self.values = values;
    }

    /// The whole list, in order.
    #[must_use]
    pub fn values(&self) -> &[ParameterValue] {
        &self.values
    }

    /// Number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the store holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Name to amount for every value of `scope`, in list order.
    #[must_use]
    pub fn altered_values(&self, scope: &ParameterScope) -> IndexMap<String, f64> {
        self.values
            .iter()
            .filter(|v| &v.scope == scope)
            .map(|v| (v.name.clone(), v.amount))
            .collect()
    }

    /// Positional zip of `values` with `amounts`, keeping names and scopes.
    ///
    /// Stops at the shorter input; callers check lengths first.
    #[must_use]
    pub fn replace_amounts(values: &[ParameterValue], amounts: &[f64]) -> Vec<ParameterValue> {
        values
            .iter()
            .zip(amounts)
            .map(|(v, amount)| ParameterValue {
                amount: *amount,
                ..v.clone()
            })
            .collect()
    }
}
