//! Resolves every column of a scenario table.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, info};

use crate::error::{LcaResult, ValidationError};
use crate::parameter::ParameterRecalculator;
use crate::scenario::table::{ScenarioTable, TableRow};
use crate::scope::{ParameterScope, ScopeKind};
use crate::storage::ParameterStore;

/// Resolved amounts of one scenario, keyed by scope and then by name.
pub type ResolvedScopes = IndexMap<ParameterScope, IndexMap<String, f64>>;

/// Sequences the three recalculation scopes over the columns of a table.
pub struct ScenarioBatch {
    store: Arc<dyn ParameterStore>,
    layout: Vec<TableRow>,
    databases: IndexSet<String>,
    groups: IndexMap<String, Option<String>>,
}

impl std::fmt::Debug for ScenarioBatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenarioBatch")
            .field("databases", &self.databases)
            .field("groups", &self.groups)
            .finish_non_exhaustive()
    }
}

impl ScenarioBatch {
    /// Collects the parameter layout, databases and activity groups present
    /// in `store`.
    ///
    /// # Errors
    ///
    /// `ExecutionError::Storage` if the store cannot be read.
    pub fn new(store: Arc<dyn ParameterStore>) -> LcaResult<Self> {
        let mut layout = Vec::new();
        let mut databases = IndexSet::new();
        let mut groups = IndexMap::new();
        for kind in ScopeKind::ALL {
            for record in store.select(kind)? {
                let scope_name = record.scope.name().unwrap_or_default().to_string();
                match kind {
                    ScopeKind::Project => {}
                    ScopeKind::Database => {
                        databases.insert(scope_name);
                    }
                    ScopeKind::Activity => {
                        if let Some(db) = &record.database {
                            databases.insert(db.clone());
                        }
                        groups.entry(scope_name).or_insert(record.database);
                    }
                }
                layout.push(TableRow::new(record.name, record.scope));
            }
        }
        Ok(Self {
            store,
            layout,
            databases,
            groups,
        })
    }

    /// Parameter rows in the order scenario vectors are matched against.
    #[must_use]
    pub fn layout(&self) -> &[TableRow] {
        &self.layout
    }

    /// Checks that `rows` list the store's parameters in the store's order.
    ///
    /// # Errors
    ///
    /// `ValidationError::InvalidScenarioTable` naming the first row that
    /// differs, or the row count when the lengths differ.
    pub fn check_rows(&self, rows: &[TableRow]) -> Result<(), ValidationError> {
        let invalid = |reason: String| ValidationError::InvalidScenarioTable { reason };
        if rows.len() != self.layout.len() {
            return Err(invalid(format!(
                "table has {} rows, the parameter store has {} parameters",
                rows.len(),
                self.layout.len()
            )));
        }
        match rows.iter().zip(&self.layout).position(|(row, expected)| row != expected) {
            None => Ok(()),
            Some(i) => Err(invalid(format!(
                "row {} is '{}' ({}), the parameter store has '{}' ({}) there",
                i + 1,
                rows[i].name,
                rows[i].scope,
                self.layout[i].name,
                self.layout[i].scope
            ))),
        }
    }

    /// Resolves every column of `table`, returning a table with the same
    /// rows and columns holding the recalculated amounts.
    ///
    /// # Errors
    ///
    /// - `ValidationError::InvalidScenarioTable` if the rows do not match the
    ///   store's parameters in order; see [`ScenarioBatch::check_rows`].
    /// - The first error of any column; see [`ScenarioBatch::resolve_column`].
    pub fn resolve(store: Arc<dyn ParameterStore>, table: &ScenarioTable) -> LcaResult<ScenarioTable> {
        let batch = Self::new(store)?;
        batch.check_rows(table.rows())?;
        let mut resolved = ScenarioTable::new(table.rows().to_vec())?;
        for (name, values) in table.columns() {
            let scopes = batch.resolve_column(values)?;
            let column = table
                .rows()
                .iter()
                .zip(values)
                .map(|(row, original)| {
                    scopes
                        .get(&row.scope)
                        .and_then(|amounts| amounts.get(&row.name))
                        .copied()
                        .unwrap_or(*original)
                })
                .collect();
            resolved.add_column(name, column)?;
            debug!(column = name, "resolved scenario column");
        }
        info!(
            rows = resolved.len(),
            columns = resolved.column_names().count(),
            "resolved scenario table"
        );
        Ok(resolved)
    }

    /// Resolves one positional scenario vector.
    ///
    /// Project first, then each database with the project amounts visible,
    /// then each activity group with the project and its database's amounts
    /// visible. Scopes without parameters are left out.
    ///
    /// # Errors
    ///
    /// - `ValidationError::ScenarioValueCount` for a vector of the wrong length.
    /// - `ExecutionError::MissingDependency` / `Evaluation` from any scope.
    pub fn resolve_column(&self, values: &[f64]) -> LcaResult<ResolvedScopes> {
        let recalc = ParameterRecalculator::build(Arc::clone(&self.store), Some(values))?;
        let mut resolved = ResolvedScopes::new();

        let project: HashMap<String, f64> = match recalc.recalculate_project()? {
            Some(amounts) => {
                let globals = amounts.iter().map(|(k, v)| (k.clone(), *v)).collect();
                resolved.insert(ParameterScope::Project, amounts);
                globals
            }
            None => HashMap::new(),
        };

        let mut database_globals: HashMap<&str, HashMap<String, f64>> = HashMap::new();
        for db in &self.databases {
            if let Some(amounts) = recalc.recalculate_database(db, Some(&project))? {
                let mut globals = project.clone();
                globals.extend(amounts.iter().map(|(k, v)| (k.clone(), *v)));
                database_globals.insert(db.as_str(), globals);
                resolved.insert(ParameterScope::database(db.as_str()), amounts);
            }
        }

        for (group, db) in &self.groups {
            let globals = db
                .as_deref()
                .and_then(|db| database_globals.get(db))
                .unwrap_or(&project);
            if let Some(amounts) = recalc.recalculate_activity(group, Some(globals))? {
                resolved.insert(ParameterScope::activity(group.as_str()), amounts);
            }
        }
        Ok(resolved)
    }

    /// Resolves one vector and writes the amounts back to the store.
    ///
    /// Every scope is resolved before anything is written, and all scopes
    /// are written in one store update.
    ///
    /// # Errors
    ///
    /// As [`ScenarioBatch::resolve_column`], plus `ExecutionError::Storage`
    /// from the write.
    pub fn commit_column(&self, values: &[f64]) -> LcaResult<ResolvedScopes> {
        let resolved = self.resolve_column(values)?;
        self.store.save_scopes(&resolved)?;
        info!(scopes = resolved.len(), "committed scenario amounts");
        Ok(resolved)
    }

    /// Commits the column `name` of `table` after checking its rows.
    ///
    /// # Errors
    ///
    /// - `ValidationError::UnknownScenarioColumn` for an unknown column.
    /// - `ValidationError::InvalidScenarioTable` if the rows do not match
    ///   the store.
    /// - As [`ScenarioBatch::commit_column`].
    pub fn commit_table_column(&self, table: &ScenarioTable, name: &str) -> LcaResult<ResolvedScopes> {
        self.check_rows(table.rows())?;
        let values = table.column(name)?;
        self.commit_column(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::table::TableRow;
    use crate::storage::{InMemoryParameterStore, ParameterRecord};

    fn store() -> Arc<InMemoryParameterStore> {
        Arc::new(
            InMemoryParameterStore::from_records([
                ParameterRecord::new("p", ParameterScope::Project, 2.0),
                ParameterRecord::new("q", ParameterScope::Project, 0.0).with_formula("p * 3"),
                ParameterRecord::new("d", ParameterScope::database("db"), 0.0).with_formula("q + 1"),
                ParameterRecord::new("x", ParameterScope::activity("g"), 0.0)
                    .with_formula("d * p")
                    .in_database("db"),
                ParameterRecord::new("y", ParameterScope::activity("h"), 0.0)
                    .with_formula("q / 3")
                    .in_database("other"),
            ])
            .unwrap(),
        )
    }

    #[test]
    fn resolves_each_column_in_dependency_order() {
        let store = store();
        let mut table = ScenarioTable::from_store(store.as_ref(), "default").unwrap();
        table.add_column("five", vec![5.0, 0.0, 0.0, 0.0, 0.0]).unwrap();

        let resolved = ScenarioBatch::resolve(store, &table).unwrap();
        assert_eq!(resolved.rows(), table.rows());
        assert_eq!(resolved.column("default").unwrap(), &[2.0, 6.0, 7.0, 14.0, 2.0]);
        assert_eq!(resolved.column("five").unwrap(), &[5.0, 15.0, 16.0, 80.0, 5.0]);
    }

    #[test]
    fn column_with_extra_rows_is_rejected() {
        let store = store();
        let mut rows: Vec<TableRow> = ScenarioTable::from_store(store.as_ref(), "default")
            .unwrap()
            .rows()
            .to_vec();
        rows.push(TableRow::new("ghost", ParameterScope::Project));
        let mut table = ScenarioTable::new(rows).unwrap();
        table.add_column("s", vec![1.0, 0.0, 0.0, 0.0, 0.0, 9.0]).unwrap();

        let err = ScenarioBatch::resolve(store, &table).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn reordered_rows_are_rejected() {
        let store = Arc::new(
            InMemoryParameterStore::from_records([
                ParameterRecord::new("p", ParameterScope::Project, 2.0),
                ParameterRecord::new("q", ParameterScope::Project, 0.0).with_formula("p * 3"),
            ])
            .unwrap(),
        );
        let mut table = ScenarioTable::new(vec![
            TableRow::new("q", ParameterScope::Project),
            TableRow::new("p", ParameterScope::Project),
        ])
        .unwrap();
        table.add_column("s", vec![0.0, 5.0]).unwrap();

        let err = ScenarioBatch::resolve(store.clone(), &table).unwrap_err();
        assert!(matches!(
            err,
            crate::LcaError::Validation(ValidationError::InvalidScenarioTable { ref reason })
                if reason.contains("row 1 is 'q'")
        ));

        let batch = ScenarioBatch::new(store.clone()).unwrap();
        assert!(batch.commit_table_column(&table, "s").unwrap_err().is_validation());
        assert_eq!(store.load(&ParameterScope::Project).unwrap()["p"].amount, 2.0);
    }

    #[test]
    fn rows_in_another_scope_are_rejected() {
        let store = store();
        let mut rows = ScenarioTable::from_store(store.as_ref(), "default")
            .unwrap()
            .rows()
            .to_vec();
        rows[2] = TableRow::new("d", ParameterScope::database("elsewhere"));
        let batch = ScenarioBatch::new(store).unwrap();
        assert!(batch.check_rows(&rows).is_err());
        assert!(batch.check_rows(batch.layout()).is_ok());
    }

    #[test]
    fn commit_table_column_writes_named_column() {
        let store = store();
        let mut table = ScenarioTable::from_store(store.as_ref(), "default").unwrap();
        table.add_column("three", vec![3.0, 0.0, 0.0, 0.0, 0.0]).unwrap();
        let batch = ScenarioBatch::new(store.clone()).unwrap();
        batch.commit_table_column(&table, "three").unwrap();
        assert_eq!(store.load(&ParameterScope::Project).unwrap()["q"].amount, 9.0);
        assert!(batch.commit_table_column(&table, "four").unwrap_err().is_validation());
    }

    #[test]
    fn commit_writes_every_scope() {
        let store = store();
        let batch = ScenarioBatch::new(store.clone()).unwrap();
        batch.commit_column(&[1.0, 0.0, 0.0, 0.0, 0.0]).unwrap();
        let activity = store.load(&ParameterScope::activity("g")).unwrap();
        assert_eq!(activity["x"].amount, 4.0);
        let project = store.load(&ParameterScope::Project).unwrap();
        assert_eq!(project["q"].amount, 3.0);
    }
}
