//! Scope-by-scope parameter recalculation.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::error::{ExecutionError, LcaResult, ValidationError};
use crate::formula::FormulaSet;
use crate::parameter::values::{ParameterValue, ParameterValueStore};
use crate::scope::{ParameterScope, ScopeKind};
use crate::storage::ParameterStore;

/// Recalculates formula parameters, optionally with a scenario's amounts
/// substituted for the persisted ones.
///
/// Each `recalculate_*` call evaluates one scope; the caller is responsible
/// for ordering scopes (project, then databases, then activity groups) and
/// for passing the results of outer scopes as `globals`.
pub struct ParameterRecalculator {
    store: Arc<dyn ParameterStore>,
    values: ParameterValueStore,
}

impl std::fmt::Debug for ParameterRecalculator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParameterRecalculator")
            .field("values", &self.values)
            .finish_non_exhaustive()
    }
}

impl ParameterRecalculator {
    /// Reads every parameter from `store` into a flat value list.
    ///
    /// With `scenario_values` the amounts are replaced by position. An empty
    /// slice means no override.
    ///
    /// # Errors
    ///
    /// - `ValidationError::ScenarioValueCount` if the vector length differs
    ///   from the parameter count. Nothing is built in that case.
    /// - `ExecutionError::Storage` if the store cannot be read.
    pub fn build(
        store: Arc<dyn ParameterStore>,
        scenario_values: Option<&[f64]>,
    ) -> LcaResult<Self> {
        let mut params = Vec::new();
        for kind in ScopeKind::ALL {
            params.extend(
                store
                    .select(kind)?
                    .into_iter()
                    .map(|r| ParameterValue::new(r.name, r.scope, r.amount)),
            );
        }

        let params = match scenario_values.filter(|v| !v.is_empty()) {
            Some(scenario) => {
                if scenario.len() != params.len() {
                    return Err(ValidationError::ScenarioValueCount {
                        expected: params.len(),
                        actual: scenario.len(),
                    }
                    .into());
                }
                ParameterValueStore::replace_amounts(&params, scenario)
            }
            None => params,
        };

        debug!(
            parameters = params.len(),
            scenario = scenario_values.is_some(),
            "built parameter recalculator"
        );
        let mut values = ParameterValueStore::new();
        values.set_values(params);
        Ok(Self { store, values })
    }

    /// The flat value list.
    #[must_use]
    pub const fn values(&self) -> &ParameterValueStore {
        &self.values
    }

    /// The backing store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn ParameterStore> {
        &self.store
    }

    /// Recalculates project parameters.
    ///
    /// Returns `None` when the project has no parameters.
    ///
    /// # Errors
    ///
    /// See [`ParameterRecalculator::recalculate`].
    pub fn recalculate_project(&self) -> LcaResult<Option<IndexMap<String, f64>>> {
        self.recalculate(&ParameterScope::Project, None)
    }

    /// Recalculates the parameters of one database.
    ///
    /// # Errors
    ///
    /// See [`ParameterRecalculator::recalculate`].
    pub fn recalculate_database(
        &self,
        database: &str,
        globals: Option<&HashMap<String, f64>>,
    ) -> LcaResult<Option<IndexMap<String, f64>>> {
        self.recalculate(&ParameterScope::database(database), globals)
    }

    /// Recalculates the parameters of one activity group.
    ///
    /// # Errors
    ///
    /// See [`ParameterRecalculator::recalculate`].
    pub fn recalculate_activity(
        &self,
        group: &str,
        globals: Option<&HashMap<String, f64>>,
    ) -> LcaResult<Option<IndexMap<String, f64>>> {
        self.recalculate(&ParameterScope::activity(group), globals)
    }

    /// Recalculates any scope.
    ///
    /// # Errors
    ///
    /// - `ExecutionError::MissingDependency` naming every formula symbol that
    ///   is neither defined in the scope nor present in `globals`.
    /// - `ExecutionError::Evaluation` if a formula does not parse, forms a
    ///   cycle or fails to evaluate.
    /// - `ExecutionError::Storage` if the scope cannot be loaded.
    pub fn recalculate(
        &self,
        scope: &ParameterScope,
        globals: Option<&HashMap<String, f64>>,
    ) -> LcaResult<Option<IndexMap<String, f64>>> {
        let new_values = self.values.altered_values(scope);
        let mut data = self.store.load(scope)?;
        if data.is_empty() {
            debug!(%scope, "no parameters to recalculate");
            return Ok(None);
        }

        for (name, amount) in &new_values {
            match data.get_mut(name) {
                Some(definition) => definition.amount = *amount,
                None => warn!(%scope, %name, "scenario value for unknown parameter ignored"),
            }
        }

        let set = FormulaSet::new(
            data.iter()
                .map(|(name, def)| (name.as_str(), def.amount, def.formula.as_deref())),
            HashMap::new(),
        )
        .map_err(|source| ExecutionError::Evaluation {
            scope: scope.clone(),
            source,
        })?;

        let empty = HashMap::new();
        let globals = globals.unwrap_or(&empty);
        let missing = set.missing_symbols(globals);
        if !missing.is_empty() {
            return Err(ExecutionError::MissingDependency { names: missing }.into());
        }

        let restricted: HashMap<String, f64> = set
            .new_symbols()
            .into_iter()
            .filter_map(|name| globals.get(&name).map(|v| (name, *v)))
            .collect();
        let amounts = set
            .with_globals(restricted)
            .evaluate()
            .map_err(|source| ExecutionError::Evaluation {
                scope: scope.clone(),
                source,
            })?;

        for (name, amount) in &amounts {
            if let Some(definition) = data.get_mut(name) {
                definition.amount = *amount;
            }
        }
        debug!(%scope, parameters = data.len(), "recalculated scope");
        Ok(Some(
            data.into_iter()
                .map(|(name, def)| (name, def.amount))
                .collect(),
        ))
    }

    /// Writes resolved amounts back to the store.
    ///
    /// # Errors
    ///
    /// - `ExecutionError::ScopeNotFound` if the scope holds no parameters.
    /// - `ExecutionError::Storage` if a name does not exist in the scope.
    pub fn commit(&self, scope: &ParameterScope, amounts: &IndexMap<String, f64>) -> LcaResult<()> {
        if self.store.load(scope)?.is_empty() {
            return Err(ExecutionError::ScopeNotFound {
                scope: scope.clone(),
            }
            .into());
        }
        self.store.save_amounts(scope, amounts)?;
        debug!(%scope, count = amounts.len(), "committed recalculated amounts");
        Ok(())
    }
}
