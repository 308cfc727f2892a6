//! Scenario packages on disk: `<dir>/<package>/datapackage.json`.
//!
//! The directory is rescanned on every lookup so packages created or removed
//! by other tools are picked up.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::scenario::{ResourceId, ResourceMetadata, ScenarioResource};
use crate::storage::traits::{ScenarioRegistry, StorageError};

/// Name of the manifest file inside each package directory.
pub const MANIFEST: &str = "datapackage.json";

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(flatten)]
    metadata: ResourceMetadata,
}

struct Package {
    dir: PathBuf,
    manifest: Manifest,
}

/// Registry over a directory of scenario packages.
#[derive(Debug, Clone)]
pub struct PackageDirectory {
    root: PathBuf,
}

impl PackageDirectory {
    /// Registry over packages below `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The scanned directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Packages in directory-name order. Unreadable manifests are skipped
    /// with a warning; a missing root yields no packages.
    fn scan(&self) -> Result<Vec<Package>, StorageError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut dirs: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.join(MANIFEST).is_file())
            .collect();
        dirs.sort();

        let mut packages = Vec::with_capacity(dirs.len());
        for dir in dirs {
            let manifest_path = dir.join(MANIFEST);
            let parsed = fs::read_to_string(&manifest_path)
                .map_err(|e| e.to_string())
                .and_then(|text| serde_json::from_str::<Manifest>(&text).map_err(|e| e.to_string()));
            match parsed {
                Ok(manifest) => packages.push(Package { dir, manifest }),
                Err(error) => {
                    warn!(path = %manifest_path.display(), %error, "skipping unreadable package manifest");
                }
            }
        }
        Ok(packages)
    }

    /// Sorted package names; a name already taken by an earlier package is
    /// replaced by the package id.
    ///
    /// # Errors
    /// Fails when the root exists but cannot be read.
    pub fn package_names(&self) -> Result<Vec<String>, StorageError> {
        let mut names = BTreeSet::new();
        for package in self.scan()? {
            let label = match package.manifest.name {
                Some(name) if !name.is_empty() && !names.contains(&name) => Some(name),
                _ => package.manifest.id,
            };
            if let Some(label) = label {
                names.insert(label);
            }
        }
        Ok(names.into_iter().collect())
    }

    /// Directory of the first package whose name or id equals `name_or_id`.
    ///
    /// # Errors
    /// Fails when the root exists but cannot be read.
    pub fn package_path(&self, name_or_id: &str) -> Result<Option<PathBuf>, StorageError> {
        Ok(self
            .scan()?
            .into_iter()
            .find(|p| matches_name_or_id(&p.manifest, name_or_id))
            .map(|p| p.dir))
    }
}

fn matches_name_or_id(manifest: &Manifest, name_or_id: &str) -> bool {
    manifest.name.as_deref() == Some(name_or_id) || manifest.id.as_deref() == Some(name_or_id)
}

impl ScenarioRegistry for PackageDirectory {
    fn get_by_name(&self, name: &str) -> Result<Option<ScenarioResource>, StorageError> {
        let Some(package) = self
            .scan()?
            .into_iter()
            .find(|p| matches_name_or_id(&p.manifest, name))
        else {
            return Ok(None);
        };
        let id = package
            .manifest
            .id
            .as_deref()
            .and_then(ResourceId::parse)
            .unwrap_or_default();
        Ok(Some(ScenarioResource {
            id,
            name: package.manifest.name.unwrap_or_else(|| name.to_string()),
            path: package.dir,
            metadata: package.manifest.metadata,
        }))
    }

    fn names(&self) -> Result<Vec<String>, StorageError> {
        self.package_names()
    }
}
