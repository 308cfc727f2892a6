//! JSON-file-backed parameter store.
//!
//! The whole document lives in memory; every mutation rewrites the file by
//! writing a sibling temp file and renaming it over the original.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use indexmap::IndexMap;
use tracing::debug;

use crate::scope::{ParameterScope, ScopeKind};
use crate::storage::document::ParameterDocument;
use crate::storage::memory::lock_err;
use crate::storage::traits::{ParameterDefinition, ParameterRecord, ParameterStore, StorageError};

/// Parameter store persisted as a single JSON document.
#[derive(Debug)]
pub struct JsonParameterStore {
    path: PathBuf,
    state: RwLock<ParameterDocument>,
}

impl JsonParameterStore {
    /// Open the store at `path`, creating an empty document if the file
    /// does not exist.
    ///
    /// # Errors
    /// Fails when the file cannot be read or written, is not a valid
    /// document, or holds invalid or duplicate names.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let document = if path.exists() {
            let text = fs::read_to_string(&path)?;
            let document: ParameterDocument = serde_json::from_str(&text)
                .map_err(|e| StorageError::SerializationError(e.to_string()))?;
            document.validate()?;
            document
        } else {
            let document = ParameterDocument::default();
            write_atomic(&path, &document)?;
            document
        };
        debug!(path = %path.display(), scopes = document.scopes.len(), "opened parameter store");
        Ok(Self {
            path,
            state: RwLock::new(document),
        })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert a parameter and persist.
    ///
    /// # Errors
    /// - `InvalidName` / `DuplicateKey`: as for the in-memory store.
    /// - `Io` / `SerializationError`: If the document cannot be written.
    pub fn insert(&self, record: ParameterRecord) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("json.insert"))?;
        let mut next = state.clone();
        let definition = ParameterDefinition::from(&record);
        next.insert(record.scope, record.name, definition, record.database)?;
        write_atomic(&self.path, &next)?;
        *state = next;
        Ok(())
    }

    /// Activity groups belonging to a database.
    ///
    /// # Errors
    /// Fails only on a poisoned lock.
    pub fn activity_groups(&self, database: &str) -> Result<Vec<String>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("json.groups"))?;
        Ok(state.activity_groups(database))
    }
}

fn write_atomic(path: &Path, document: &ParameterDocument) -> Result<(), StorageError> {
    let bytes = serde_json::to_vec_pretty(document)
        .map_err(|e| StorageError::SerializationError(e.to_string()))?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);
    {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

impl ParameterStore for JsonParameterStore {
    fn select(&self, kind: ScopeKind) -> Result<Vec<ParameterRecord>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("json.select"))?;
        Ok(state.select(kind))
    }

    fn load(
        &self,
        scope: &ParameterScope,
    ) -> Result<IndexMap<String, ParameterDefinition>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("json.load"))?;
        Ok(state.load(scope))
    }

    fn save_amounts(
        &self,
        scope: &ParameterScope,
        amounts: &IndexMap<String, f64>,
    ) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("json.save"))?;
        let mut next = state.clone();
        next.save_amounts(scope, amounts)?;
        write_atomic(&self.path, &next)?;
        *state = next;
        debug!(scope = %scope, count = amounts.len(), "saved parameter amounts");
        Ok(())
    }

    fn save_scopes(
        &self,
        scopes: &IndexMap<ParameterScope, IndexMap<String, f64>>,
    ) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("json.save_scopes"))?;
        let mut next = state.clone();
        next.save_scopes(scopes)?;
        write_atomic(&self.path, &next)?;
        *state = next;
        debug!(scopes = scopes.len(), "saved parameter amounts");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_empty_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("params.json");
        let store = JsonParameterStore::open(&path).unwrap();
        assert!(path.exists());
        assert!(store.select(ScopeKind::Project).unwrap().is_empty());
    }

    #[test]
    fn mutations_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");
        {
            let store = JsonParameterStore::open(&path).unwrap();
            store
                .insert(ParameterRecord::new("a", ParameterScope::Project, 1.0))
                .unwrap();
            store
                .insert(
                    ParameterRecord::new("x", ParameterScope::activity("g"), 2.0)
                        .with_formula("a * 2")
                        .in_database("db"),
                )
                .unwrap();
            let mut amounts = IndexMap::new();
            amounts.insert("a".to_string(), 7.5);
            store.save_amounts(&ParameterScope::Project, &amounts).unwrap();
        }

        let reopened = JsonParameterStore::open(&path).unwrap();
        assert_eq!(reopened.load(&ParameterScope::Project).unwrap()["a"].amount, 7.5);
        let activity = reopened.select(ScopeKind::Activity).unwrap();
        assert_eq!(activity[0].formula.as_deref(), Some("a * 2"));
        assert_eq!(reopened.activity_groups("db").unwrap(), vec!["g".to_string()]);
        assert!(!dir.path().join("params.json.tmp").exists());
    }

    #[test]
    fn failed_save_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");
        let store = JsonParameterStore::open(&path).unwrap();
        store
            .insert(ParameterRecord::new("a", ParameterScope::Project, 1.0))
            .unwrap();
        let before = fs::read_to_string(&path).unwrap();

        let mut amounts = IndexMap::new();
        amounts.insert("missing".to_string(), 3.0);
        assert!(store.save_amounts(&ParameterScope::Project, &amounts).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn failed_multi_scope_save_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");
        let store = JsonParameterStore::open(&path).unwrap();
        store
            .insert(ParameterRecord::new("a", ParameterScope::Project, 1.0))
            .unwrap();
        store
            .insert(ParameterRecord::new("b", ParameterScope::database("db"), 2.0))
            .unwrap();
        let before = fs::read_to_string(&path).unwrap();

        let mut scopes = IndexMap::new();
        scopes.insert(ParameterScope::Project, IndexMap::from([("a".to_string(), 9.0)]));
        scopes.insert(
            ParameterScope::database("db"),
            IndexMap::from([("missing".to_string(), 3.0)]),
        );
        assert!(store.save_scopes(&scopes).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
        assert_eq!(store.load(&ParameterScope::Project).unwrap()["a"].amount, 1.0);
    }

    #[test]
    fn rejects_malformed_documents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            JsonParameterStore::open(&path),
            Err(StorageError::SerializationError(_))
        ));

        fs::write(
            &path,
            r#"{"scopes":[{"scope":{"kind":"project"},"parameters":{"1bad":{"amount":1.0}}}]}"#,
        )
        .unwrap();
        assert!(matches!(
            JsonParameterStore::open(&path),
            Err(StorageError::InvalidName(_))
        ));
    }
}
