//! Scope-ordered parameter document shared by the in-memory and JSON stores.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::scope::{ParameterScope, ScopeKind};
use crate::storage::traits::{
    is_valid_parameter_name, ParameterDefinition, ParameterRecord, StorageError,
};

/// All parameters of one scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct ScopeSection {
    pub scope: ParameterScope,

    /// Owning database of an activity group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

    #[serde(default)]
    pub parameters: IndexMap<String, ParameterDefinition>,
}

/// Parameters grouped by scope, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct ParameterDocument {
    #[serde(default)]
    pub scopes: Vec<ScopeSection>,
}

impl ParameterDocument {
    fn section(&self, scope: &ParameterScope) -> Option<&ScopeSection> {
        self.scopes.iter().find(|s| &s.scope == scope)
    }

    fn section_mut(&mut self, scope: &ParameterScope) -> Option<&mut ScopeSection> {
        self.scopes.iter_mut().find(|s| &s.scope == scope)
    }

    /// Checks names and uniqueness after deserialization.
    pub fn validate(&self) -> Result<(), StorageError> {
        for (i, section) in self.scopes.iter().enumerate() {
            if self.scopes[..i].iter().any(|s| s.scope == section.scope) {
                return Err(StorageError::DuplicateKey(section.scope.to_string()));
            }
            if let Some(name) = section.parameters.keys().find(|n| !is_valid_parameter_name(n)) {
                return Err(StorageError::InvalidName(name.clone()));
            }
        }
        Ok(())
    }

    pub fn insert(
        &mut self,
        scope: ParameterScope,
        name: String,
        definition: ParameterDefinition,
        database: Option<String>,
    ) -> Result<(), StorageError> {
        if !is_valid_parameter_name(&name) {
            return Err(StorageError::InvalidName(name));
        }
        if self.section(&scope).is_none() {
            self.scopes.push(ScopeSection {
                scope: scope.clone(),
                database: None,
                parameters: IndexMap::new(),
            });
        }
        let section = self
            .section_mut(&scope)
            .ok_or_else(|| StorageError::BackendError(format!("scope '{scope}' vanished")))?;
        if section.parameters.contains_key(&name) {
            return Err(StorageError::DuplicateKey(format!("{scope}/{name}")));
        }
        if database.is_some() {
            section.database = database;
        }
        section.parameters.insert(name, definition);
        Ok(())
    }

    pub fn select(&self, kind: ScopeKind) -> Vec<ParameterRecord> {
        self.scopes
            .iter()
            .filter(|s| s.scope.kind() == kind)
            .flat_map(|section| {
                section.parameters.iter().map(move |(name, def)| ParameterRecord {
                    name: name.clone(),
                    scope: section.scope.clone(),
                    amount: def.amount,
                    formula: def.formula.clone(),
                    database: section.database.clone(),
                })
            })
            .collect()
    }

    pub fn load(&self, scope: &ParameterScope) -> IndexMap<String, ParameterDefinition> {
        self.section(scope)
            .map(|s| s.parameters.clone())
            .unwrap_or_default()
    }

    /// Writes amounts; all names are checked before any write happens.
    pub fn save_amounts(
        &mut self,
        scope: &ParameterScope,
        amounts: &IndexMap<String, f64>,
    ) -> Result<(), StorageError> {
        if amounts.is_empty() {
            return Ok(());
        }
        let not_found = |name: &str| StorageError::ParameterNotFound {
            name: name.to_string(),
            scope: scope.clone(),
        };
        let Some(section) = self.section_mut(scope) else {
            let first = amounts.keys().next().map_or("", String::as_str);
            return Err(not_found(first));
        };
        if let Some(missing) = amounts.keys().find(|n| !section.parameters.contains_key(*n)) {
            return Err(not_found(missing.as_str()));
        }
        for (name, amount) in amounts {
            if let Some(def) = section.parameters.get_mut(name) {
                def.amount = *amount;
            }
        }
        Ok(())
    }

    /// Writes amounts of several scopes; nothing is written unless every
    /// scope accepts its amounts.
    pub fn save_scopes(
        &mut self,
        scopes: &IndexMap<ParameterScope, IndexMap<String, f64>>,
    ) -> Result<(), StorageError> {
        let mut next = self.clone();
        for (scope, amounts) in scopes {
            next.save_amounts(scope, amounts)?;
        }
        *self = next;
        Ok(())
    }

    /// Groups of one database, in insertion order.
    pub fn activity_groups(&self, database: &str) -> Vec<String> {
        self.scopes
            .iter()
            .filter(|s| s.scope.kind() == ScopeKind::Activity && s.database.as_deref() == Some(database))
            .filter_map(|s| s.scope.name().map(str::to_string))
            .collect()
    }
}
