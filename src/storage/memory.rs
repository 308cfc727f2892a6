//! In-memory storage backend.
//!
//! This module provides thread-safe in-memory implementations of the storage traits.
//! It is intended for embedded usage, tests, and as a reference implementation.

use std::collections::BTreeMap;
use std::sync::RwLock;

use indexmap::IndexMap;

use crate::lca::CalculationSetup;
use crate::scenario::ScenarioResource;
use crate::scope::{ParameterScope, ScopeKind};
use crate::storage::document::ParameterDocument;
use crate::storage::traits::{
    ParameterDefinition, ParameterRecord, ParameterStore, ScenarioRegistry, SetupStore,
    StorageError,
};

pub(crate) fn lock_err(context: &'static str) -> StorageError {
    StorageError::BackendError(format!("poisoned lock: {context}"))
}

/// In-memory parameter store.
///
/// Scopes and parameters keep insertion order, which is the order `select`
/// and `load` report them in.
#[derive(Debug, Default)]
pub struct InMemoryParameterStore {
    state: RwLock<ParameterDocument>,
}

impl InMemoryParameterStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store from flat records, in order.
    ///
    /// # Errors
    /// Fails on an invalid or duplicate parameter name.
    pub fn from_records(
        records: impl IntoIterator<Item = ParameterRecord>,
    ) -> Result<Self, StorageError> {
        let store = Self::new();
        for record in records {
            store.insert(record)?;
        }
        Ok(store)
    }

    /// Insert a parameter.
    ///
    /// # Errors
    /// - `InvalidName`: If the name is not a valid formula symbol.
    /// - `DuplicateKey`: If the scope already holds the name.
    pub fn insert(&self, record: ParameterRecord) -> Result<(), StorageError> {
        let definition = ParameterDefinition::from(&record);
        self.insert_definition(record.scope, record.name, definition, record.database)
    }

    /// Insert a parameter with extra stored fields.
    ///
    /// # Errors
    /// Same as [`InMemoryParameterStore::insert`].
    pub fn insert_definition(
        &self,
        scope: ParameterScope,
        name: impl Into<String>,
        definition: ParameterDefinition,
        database: Option<String>,
    ) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("parameter.insert"))?;
        state.insert(scope, name.into(), definition, database)
    }

    /// Activity groups belonging to a database.
    ///
    /// # Errors
    /// Fails only on a poisoned lock.
    pub fn activity_groups(&self, database: &str) -> Result<Vec<String>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("parameter.groups"))?;
        Ok(state.activity_groups(database))
    }
}

impl ParameterStore for InMemoryParameterStore {
    fn select(&self, kind: ScopeKind) -> Result<Vec<ParameterRecord>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("parameter.select"))?;
        Ok(state.select(kind))
    }

    fn load(
        &self,
        scope: &ParameterScope,
    ) -> Result<IndexMap<String, ParameterDefinition>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("parameter.load"))?;
        Ok(state.load(scope))
    }

    fn save_amounts(
        &self,
        scope: &ParameterScope,
        amounts: &IndexMap<String, f64>,
    ) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("parameter.save"))?;
        state.save_amounts(scope, amounts)
    }

    fn save_scopes(
        &self,
        scopes: &IndexMap<ParameterScope, IndexMap<String, f64>>,
    ) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("parameter.save_scopes"))?;
        state.save_scopes(scopes)
    }
}

/// In-memory scenario resource registry, keyed by resource name.
#[derive(Debug, Default)]
pub struct InMemoryScenarioRegistry {
    state: RwLock<BTreeMap<String, ScenarioResource>>,
}

impl InMemoryScenarioRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource.
    ///
    /// # Errors
    /// - `DuplicateKey`: If a resource with the same name is registered.
    pub fn register(&self, resource: ScenarioResource) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("registry.register"))?;
        if state.contains_key(&resource.name) {
            return Err(StorageError::DuplicateKey(resource.name));
        }
        state.insert(resource.name.clone(), resource);
        Ok(())
    }
}

impl ScenarioRegistry for InMemoryScenarioRegistry {
    fn get_by_name(&self, name: &str) -> Result<Option<ScenarioResource>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("registry.get"))?;
        Ok(state.get(name).cloned())
    }

    fn names(&self) -> Result<Vec<String>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("registry.names"))?;
        Ok(state.keys().cloned().collect())
    }
}

/// In-memory calculation setup store.
#[derive(Debug, Default)]
pub struct InMemorySetupStore {
    state: RwLock<BTreeMap<String, CalculationSetup>>,
}

impl InMemorySetupStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a setup.
    ///
    /// # Errors
    /// Fails only on a poisoned lock.
    pub fn insert(&self, setup: CalculationSetup) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("setup.insert"))?;
        state.insert(setup.name.clone(), setup);
        Ok(())
    }
}

impl SetupStore for InMemorySetupStore {
    fn get(&self, name: &str) -> Result<Option<CalculationSetup>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("setup.get"))?;
        Ok(state.get(name).cloned())
    }

    fn names(&self) -> Result<Vec<String>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("setup.names"))?;
        Ok(state.keys().cloned().collect())
    }
}
