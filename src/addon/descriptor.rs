//! Addon Descriptors
//!
//! `RawManifest` is what a discoverer reads from storage; `AddonDescriptor` is
//! the validated, immutable form the registry keeps.

use std::sync::OnceLock;
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use crate::addon::error::{AddonError, AddonResult};
use crate::addon::version::{Version, VersionConstraint};

/// Unvalidated manifest data as read by a discoverer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawManifest {
    pub id: String,

    pub name: String,

    pub version: String,

    /// Dependency id -> constraint, in declaration order
    #[serde(default)]
    pub dependencies: IndexMap<String, String>,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub author: String,

    /// Free-form configuration schema, passed through untouched
    #[serde(default, alias = "configSchema")]
    pub config_schema: Option<serde_json::Value>,

    /// Hook implementation to bind; defaults to the id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_point: Option<String>,
}

impl RawManifest {
    /// Create a manifest with no dependencies
    pub fn new<S: Into<String>>(id: S, name: S, version: S) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            version: version.into(),
            ..Default::default()
        }
    }

    /// Add a dependency declaration
    pub fn with_dependency<S: Into<String>>(mut self, id: S, constraint: S) -> Self {
        self.dependencies.insert(id.into(), constraint.into());
        self
    }

    /// Set the hook entry point
    pub fn with_entry_point<S: Into<String>>(mut self, entry_point: S) -> Self {
        self.entry_point = Some(entry_point.into());
        self
    }
}

/// A declared dependency with its constraint parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub id: String,
    /// Constraint text as written in the manifest
    pub constraint: String,
    pub parsed: VersionConstraint,
}

/// Immutable metadata for one discovered addon
#[derive(Debug, Clone)]
pub struct AddonDescriptor {
    id: String,
    name: String,
    version: String,
    parsed_version: Version,
    dependencies: Vec<Dependency>,
    description: String,
    author: String,
    config_schema: Option<serde_json::Value>,
    entry_point: String,
}

fn id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").expect("addon id pattern is valid")
    })
}

impl AddonDescriptor {
    /// Validate a raw manifest into a descriptor
    pub fn from_manifest(raw: RawManifest) -> AddonResult<Self> {
        let id = raw.id.trim().to_string();
        if id.is_empty() {
            return Err(AddonError::manifest("addon id cannot be empty"));
        }
        if !id_pattern().is_match(&id) {
            return Err(AddonError::manifest(format!("invalid addon id '{}'", id)));
        }
        if raw.name.trim().is_empty() {
            return Err(AddonError::manifest(format!("addon '{}' has an empty name", id)));
        }

        let parsed_version = Version::parse(&raw.version)?;

        let mut dependencies = Vec::with_capacity(raw.dependencies.len());
        for (dep_id, constraint) in raw.dependencies {
            let dep_id = dep_id.trim().to_string();
            if dep_id == id {
                return Err(AddonError::Cycle { id: id.clone(), path: vec![id.clone(), id] });
            }
            if dependencies.iter().any(|d: &Dependency| d.id == dep_id) {
                return Err(AddonError::manifest(format!(
                    "addon '{}' declares dependency '{}' more than once",
                    id, dep_id
                )));
            }
            let parsed = VersionConstraint::parse(&constraint)?;
            dependencies.push(Dependency { id: dep_id, constraint, parsed });
        }

        let entry_point = raw
            .entry_point
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| id.clone());

        Ok(Self {
            id,
            name: raw.name,
            version: raw.version.trim().to_string(),
            parsed_version,
            dependencies,
            description: raw.description,
            author: raw.author,
            config_schema: raw.config_schema,
            entry_point,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Version string as declared
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn parsed_version(&self) -> &Version {
        &self.parsed_version
    }

    /// Declared dependencies in manifest order
    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    /// Check whether this addon declares a dependency on `id`
    pub fn depends_on(&self, id: &str) -> bool {
        self.dependencies.iter().any(|d| d.id == id)
    }

    /// The declared dependency on `id`, if any
    pub fn dependency(&self, id: &str) -> Option<&Dependency> {
        self.dependencies.iter().find(|d| d.id == id)
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn config_schema(&self) -> Option<&serde_json::Value> {
        self.config_schema.as_ref()
    }

    /// Name of the hook implementation bound to this addon
    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }
}
