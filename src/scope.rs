//! Parameter scopes.
//!
//! Every parameter lives in exactly one scope. Scopes form a visibility
//! hierarchy: project parameters are visible everywhere, database parameters
//! within their database and its activity groups, and activity parameters
//! only within their group.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// The visibility tier a parameter belongs to.
///
/// # Examples
///
/// ```
/// use lca_scenarios::ParameterScope;
///
/// let scope: ParameterScope = "database:ecoinvent".parse().unwrap();
/// assert_eq!(scope, ParameterScope::database("ecoinvent"));
/// assert_eq!(scope.to_string(), "database:ecoinvent");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum ParameterScope {
    /// Project-wide parameters.
    Project,
    /// Parameters of a single database.
    Database(String),
    /// Parameters of an activity group.
    ActivityGroup(String),
}

/// The three classes of parameters, without the scope name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind {
    Project,
    Database,
    Activity,
}

impl ScopeKind {
    /// All kinds in dependency order (project first).
    pub const ALL: [Self; 3] = [Self::Project, Self::Database, Self::Activity];
}

impl ParameterScope {
    /// Creates a database scope.
    #[must_use]
    pub fn database(name: impl Into<String>) -> Self {
        Self::Database(name.into())
    }

    /// Creates an activity group scope.
    #[must_use]
    pub fn activity(group: impl Into<String>) -> Self {
        Self::ActivityGroup(group.into())
    }

    /// Returns the class of this scope.
    #[must_use]
    pub const fn kind(&self) -> ScopeKind {
        match self {
            Self::Project => ScopeKind::Project,
            Self::Database(_) => ScopeKind::Database,
            Self::ActivityGroup(_) => ScopeKind::Activity,
        }
    }

    /// Returns the database or group name, `None` for the project scope.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Project => None,
            Self::Database(name) | Self::ActivityGroup(name) => Some(name),
        }
    }
}

impl fmt::Display for ParameterScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Project => write!(f, "project"),
            Self::Database(name) => write!(f, "database:{name}"),
            Self::ActivityGroup(group) => write!(f, "activity:{group}"),
        }
    }
}

impl FromStr for ParameterScope {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "project" {
            return Ok(Self::Project);
        }

        let invalid = || ValidationError::InvalidScope {
            value: s.to_string(),
        };
        let (kind, name) = s.split_once(':').ok_or_else(invalid)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(invalid());
        }
        match kind.trim() {
            "database" => Ok(Self::Database(name.to_string())),
            "activity" | "activity-group" => Ok(Self::ActivityGroup(name.to_string())),
            _ => Err(invalid()),
        }
    }
}
