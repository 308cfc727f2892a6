//! Delimited scenario tables.
//!
//! Layout: a header `Name, Group, <scenario>...` followed by one row per
//! parameter, in the order the recalculator reads parameters. `Group` holds
//! the textual scope (`project`, `database:<name>`, `activity:<group>`).

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{LcaError, LcaResult, ValidationError};
use crate::scope::{ParameterScope, ScopeKind};
use crate::storage::{is_valid_parameter_name, ParameterStore};

const NAME: &str = "Name";
const GROUP: &str = "Group";

/// One parameter row of a scenario table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRow {
    /// Parameter name.
    pub name: String,
    /// Parameter scope.
    pub scope: ParameterScope,
}

impl TableRow {
    /// Creates a row.
    #[must_use]
    pub fn new(name: impl Into<String>, scope: ParameterScope) -> Self {
        Self {
            name: name.into(),
            scope,
        }
    }
}

/// Parameters by row, scenarios by column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScenarioTable {
    rows: Vec<TableRow>,
    columns: IndexMap<String, Vec<f64>>,
}

fn invalid(reason: impl Into<String>) -> LcaError {
    ValidationError::InvalidScenarioTable {
        reason: reason.into(),
    }
    .into()
}

fn table_error(err: csv::Error) -> LcaError {
    let reason = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(io) => io.into(),
        _ => invalid(reason),
    }
}

impl ScenarioTable {
    /// Creates a table with the given rows and no scenario columns.
    ///
    /// # Errors
    /// `InvalidParameterName` for a bad name; `InvalidScenarioTable` for a
    /// repeated `(name, scope)` row.
    pub fn new(rows: Vec<TableRow>) -> LcaResult<Self> {
        for (i, row) in rows.iter().enumerate() {
            if !is_valid_parameter_name(&row.name) {
                return Err(ValidationError::InvalidParameterName {
                    name: row.name.clone(),
                }
                .into());
            }
            if rows[..i].contains(row) {
                return Err(invalid(format!(
                    "parameter '{}' in '{}' appears twice",
                    row.name, row.scope
                )));
            }
        }
        Ok(Self {
            rows,
            columns: IndexMap::new(),
        })
    }

    /// Template with one column of persisted amounts.
    ///
    /// # Errors
    /// `ExecutionError::Storage` if the store cannot be read.
    pub fn from_store(store: &dyn ParameterStore, column: &str) -> LcaResult<Self> {
        let mut rows = Vec::new();
        let mut amounts = Vec::new();
        for kind in ScopeKind::ALL {
            for record in store.select(kind)? {
                rows.push(TableRow::new(record.name, record.scope));
                amounts.push(record.amount);
            }
        }
        let mut table = Self::new(rows)?;
        table.add_column(column, amounts)?;
        Ok(table)
    }

    /// Appends a scenario column.
    ///
    /// # Errors
    /// `InvalidScenarioTable` if the name is taken or the length differs
    /// from the row count.
    pub fn add_column(&mut self, name: impl Into<String>, values: Vec<f64>) -> LcaResult<()> {
        let name = name.into();
        if name == NAME || name == GROUP || self.columns.contains_key(&name) {
            return Err(invalid(format!("duplicate column '{name}'")));
        }
        if values.len() != self.rows.len() {
            return Err(invalid(format!(
                "column '{name}' has {} values for {} rows",
                values.len(),
                self.rows.len()
            )));
        }
        self.columns.insert(name, values);
        Ok(())
    }

    /// The positional scenario vector of a column.
    ///
    /// # Errors
    /// `UnknownScenarioColumn` if there is no such column.
    pub fn column(&self, name: &str) -> Result<&[f64], ValidationError> {
        self.columns
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| ValidationError::UnknownScenarioColumn {
                name: name.to_string(),
            })
    }

    /// Scenario column names, in order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Columns with their values, in order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Parameter rows.
    #[must_use]
    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    /// Number of parameter rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Reads a table from a file.
    ///
    /// # Errors
    /// `InvalidScenarioTable` for a malformed header, row or value;
    /// `ExecutionError::Io` if the file cannot be read.
    pub fn load(path: &Path, delimiter: u8) -> LcaResult<Self> {
        let table = Self::read_from(File::open(path)?, delimiter)?;
        debug!(path = %path.display(), rows = table.len(), columns = table.columns.len(), "loaded scenario table");
        Ok(table)
    }

    /// Writes the table to a file, replacing it.
    ///
    /// # Errors
    /// `ExecutionError::Io` if the file cannot be written.
    pub fn save(&self, path: &Path, delimiter: u8) -> LcaResult<()> {
        self.write_to(File::create(path)?, delimiter)?;
        debug!(path = %path.display(), rows = self.len(), "saved scenario table");
        Ok(())
    }

    /// Reads a table from any reader.
    ///
    /// # Errors
    /// See [`ScenarioTable::load`].
    pub fn read_from<R: Read>(reader: R, delimiter: u8) -> LcaResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .from_reader(reader);

        let headers = reader.headers().map_err(table_error)?.clone();
        let header: Vec<&str> = headers.iter().map(str::trim).collect();
        if header.first() != Some(&NAME) || header.get(1) != Some(&GROUP) {
            return Err(invalid(format!(
                "header must start with '{NAME}' and '{GROUP}', got {header:?}"
            )));
        }

        let mut rows = Vec::new();
        let mut columns: Vec<Vec<f64>> = vec![Vec::new(); header.len() - 2];
        for (line, record) in reader.records().enumerate() {
            let record = record.map_err(table_error)?;
            let name = record.get(0).unwrap_or_default().trim();
            let scope: ParameterScope = record.get(1).unwrap_or_default().trim().parse()?;
            for (i, column) in columns.iter_mut().enumerate() {
                let raw = record.get(i + 2).unwrap_or_default().trim();
                let value = raw.parse::<f64>().map_err(|_| {
                    invalid(format!(
                        "row {} column '{}': '{raw}' is not a number",
                        line + 1,
                        header[i + 2]
                    ))
                })?;
                column.push(value);
            }
            rows.push(TableRow::new(name, scope));
        }

        let mut table = Self::new(rows)?;
        for (name, values) in header[2..].iter().zip(columns) {
            table.add_column(*name, values)?;
        }
        Ok(table)
    }

    /// Writes the table to any writer.
    ///
    /// # Errors
    /// See [`ScenarioTable::save`].
    pub fn write_to<W: Write>(&self, writer: W, delimiter: u8) -> LcaResult<()> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_writer(writer);

        let mut header = vec![NAME, GROUP];
        header.extend(self.column_names());
        writer.write_record(&header).map_err(table_error)?;

        for (i, row) in self.rows.iter().enumerate() {
            let mut record = vec![row.name.clone(), row.scope.to_string()];
            record.extend(self.columns.values().map(|values| values[i].to_string()));
            writer.write_record(&record).map_err(table_error)?;
        }
        writer.flush()?;
        Ok(())
    }
}
