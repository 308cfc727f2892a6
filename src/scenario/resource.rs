//! Scenario resources: packages of alternate matrix values.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Identifier of a registered scenario resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(uuid::Uuid);

impl ResourceId {
    /// Creates a new random resource ID.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Parses a package id in hyphenated or simple (32 hex digit) form.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        uuid::Uuid::parse_str(value).ok().map(Self)
    }
}

impl Default for ResourceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

const fn one() -> usize {
    1
}

/// Package metadata the engine reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceMetadata {
    /// Number of scenario columns.
    #[serde(default = "one")]
    pub ncols: usize,

    /// Free-text description; may hold a literal list of scenario names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Default for ResourceMetadata {
    fn default() -> Self {
        Self {
            ncols: 1,
            description: None,
        }
    }
}

/// A registered scenario package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioResource {
    /// Resource id.
    pub id: ResourceId,
    /// Unique resource name.
    pub name: String,
    /// Package directory handed to the engine factory.
    pub path: PathBuf,
    /// Column count and description.
    #[serde(default)]
    pub metadata: ResourceMetadata,
}

impl ScenarioResource {
    /// Creates a resource with `ncols` columns and no description.
    #[must_use]
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, ncols: usize) -> Self {
        Self {
            id: ResourceId::new(),
            name: name.into(),
            path: path.into(),
            metadata: ResourceMetadata {
                ncols,
                description: None,
            },
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.metadata.description = Some(description.into());
        self
    }

    /// Number of scenario columns.
    #[must_use]
    pub const fn ncols(&self) -> usize {
        self.metadata.ncols
    }

    /// The description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.metadata.description.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_defaults_to_one_column() {
        let meta: ResourceMetadata = serde_json::from_str("{}").unwrap();
        assert_eq!(meta, ResourceMetadata::default());
        let meta: ResourceMetadata =
            serde_json::from_str(r#"{"ncols": 4, "description": "['a','b']"}"#).unwrap();
        assert_eq!(meta.ncols, 4);
        assert_eq!(meta.description.as_deref(), Some("['a','b']"));
    }

    #[test]
    fn resource_id_accepts_simple_form() {
        let id = ResourceId::parse("0123456789abcdef0123456789abcdef").unwrap();
        assert_eq!(id.to_string(), "0123456789abcdef0123456789abcdef");
        assert!(ResourceId::parse("not-an-id").is_none());
    }
}
