//! Project manifest reading.
//!
//! Turns a host project's package declarations into the flat
//! name → version-constraint mapping the detector consumes. Supports
//! `package.json`, `Cargo.toml`, and a plain JSON object file.

use crate::{PrimerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// `package.json` dependency sections, highest precedence first.
const NPM_SECTIONS: &[&str] = &[
    "dependencies",
    "devDependencies",
    "peerDependencies",
    "optionalDependencies",
];

/// `Cargo.toml` dependency sections, highest precedence first.
const CARGO_SECTIONS: &[&str] = &["dependencies", "dev-dependencies", "build-dependencies"];

/// Declared dependencies of a project: package name → version constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    dependencies: BTreeMap<String, String>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a dependency unless one with the same name is already declared.
    pub fn declare(&mut self, name: impl Into<String>, version: impl Into<String>) {
        self.dependencies
            .entry(name.into())
            .or_insert_with(|| version.into());
    }

    pub fn dependencies(&self) -> &BTreeMap<String, String> {
        &self.dependencies
    }

    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    /// Reads the manifest of a project directory.
    ///
    /// Both `package.json` and `Cargo.toml` are read when present; on a name
    /// clash the `package.json` declaration wins. A directory with neither
    /// yields an empty manifest.
    ///
    /// ## Examples
    ///
    /// ```no_run
    /// use primer_lib::Manifest;
    /// use std::path::Path;
    ///
    /// let manifest = Manifest::from_project_dir(Path::new(".")).unwrap();
    /// println!("{} dependencies", manifest.len());
    /// ```
    pub fn from_project_dir(dir: &Path) -> Result<Self> {
        let mut manifest = Self::new();

        let package_json = dir.join("package.json");
        if package_json.is_file() {
            manifest.merge(Self::from_package_json(&package_json)?);
        }

        let cargo_toml = dir.join("Cargo.toml");
        if cargo_toml.is_file() {
            manifest.merge(Self::from_cargo_toml(&cargo_toml)?);
        }

        debug!("Read {} dependencies from {:?}", manifest.len(), dir);
        Ok(manifest)
    }

    /// Reads the dependency sections of a `package.json`.
    pub fn from_package_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| PrimerError::io(path, e))?;
        Self::parse_package_json(&content).map_err(|source| PrimerError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse_package_json(content: &str) -> std::result::Result<Self, serde_json::Error> {
        let parsed: serde_json::Value = serde_json::from_str(content)?;
        let mut manifest = Self::new();

        for section in NPM_SECTIONS {
            let Some(deps) = parsed.get(*section).and_then(|v| v.as_object()) else {
                continue;
            };
            for (name, version) in deps {
                if let Some(version) = version.as_str() {
                    manifest.declare(name, version);
                }
            }
        }

        Ok(manifest)
    }

    /// Reads the dependency sections of a `Cargo.toml`.
    pub fn from_cargo_toml(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| PrimerError::io(path, e))?;
        Self::parse_cargo_toml(&content).map_err(|source| PrimerError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse_cargo_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        let parsed: toml::Value = toml::from_str(content)?;
        let mut manifest = Self::new();

        for section in CARGO_SECTIONS {
            let Some(deps) = parsed.get(*section).and_then(|v| v.as_table()) else {
                continue;
            };
            for (name, spec) in deps {
                if let Some(version) = cargo_version(spec) {
                    manifest.declare(name, version);
                }
            }
        }

        Ok(manifest)
    }

    /// Reads a JSON file holding a flat `{ "name": "version" }` object.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| PrimerError::io(path, e))?;
        serde_json::from_str(&content).map_err(|source| PrimerError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    fn merge(&mut self, other: Manifest) {
        for (name, version) in other.dependencies {
            self.declare(name, version);
        }
    }
}

impl<K, V> FromIterator<(K, V)> for Manifest
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut manifest = Self::new();
        for (name, version) in iter {
            manifest.declare(name, version);
        }
        manifest
    }
}

fn cargo_version(spec: &toml::Value) -> Option<String> {
    match spec {
        toml::Value::String(version) => Some(version.clone()),
        toml::Value::Table(table) => {
            if let Some(version) = table.get("version").and_then(|v| v.as_str()) {
                Some(version.to_string())
            } else if table.get("workspace").and_then(|v| v.as_bool()) == Some(true) {
                Some("*".to_string())
            } else {
                None
            }
        }
        _ => None,
    }
}
