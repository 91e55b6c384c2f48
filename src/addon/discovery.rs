//! Addon Discovery
//!
//! Discoverers enumerate candidate manifests from wherever addon packages
//! live. They only read; validation happens when the registry is built.

use std::fs;
use std::path::{Path, PathBuf};
use log::{debug, warn};
use crate::addon::descriptor::RawManifest;
use crate::addon::error::{AddonError, AddonResult};

/// Default manifest file names, in lookup order
pub const DEFAULT_MANIFEST_NAMES: &[&str] = &["addon.yaml", "addon.yml", "addon.json"];

/// Source of raw addon manifests
pub trait Discoverer: Send + Sync {
    /// Enumerate all candidate manifests
    fn scan(&self) -> AddonResult<Vec<RawManifest>>;

    /// Human-readable description of where manifests come from
    fn source(&self) -> String;
}

/// Discovers manifests by walking a directory tree
#[derive(Debug, Clone)]
pub struct FileBasedDiscovery {
    addon_directory: PathBuf,
    manifest_names: Vec<String>,
}

impl FileBasedDiscovery {
    /// Create a discovery for an existing directory
    pub fn new<P: AsRef<Path>>(addon_directory: P) -> AddonResult<Self> {
        let path = addon_directory.as_ref().to_path_buf();

        if !path.exists() {
            return Err(AddonError::discovery(format!(
                "Addon directory does not exist: {}",
                path.display()
            )));
        }

        if !path.is_dir() {
            return Err(AddonError::discovery(format!(
                "Addon path is not a directory: {}",
                path.display()
            )));
        }

        Ok(Self {
            addon_directory: path,
            manifest_names: DEFAULT_MANIFEST_NAMES.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Replace the manifest file names to look for
    pub fn with_manifest_names(mut self, names: Vec<String>) -> Self {
        if !names.is_empty() {
            self.manifest_names = names;
        }
        self
    }

    pub fn addon_directory(&self) -> &Path {
        &self.addon_directory
    }

    fn is_manifest(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .map(|name| self.manifest_names.iter().any(|m| m == name))
            .unwrap_or(false)
    }

    /// Collect manifest paths below the root, sorted for deterministic order
    fn manifest_paths(&self) -> AddonResult<Vec<PathBuf>> {
        let mut manifests = Vec::new();
        let mut directories_to_scan = vec![self.addon_directory.clone()];

        while let Some(current_dir) = directories_to_scan.pop() {
            let entries = fs::read_dir(&current_dir).map_err(|e| {
                AddonError::discovery(format!("Failed to read directory {}: {}", current_dir.display(), e))
            })?;

            for entry in entries {
                let entry = entry.map_err(|e| {
                    AddonError::discovery(format!("Failed to read directory entry: {}", e))
                })?;
                let path = entry.path();
                let file_type = entry.file_type().map_err(|e| {
                    AddonError::discovery(format!("Failed to inspect {}: {}", path.display(), e))
                })?;

                // Symlinked directories are not followed
                if file_type.is_dir() {
                    directories_to_scan.push(path);
                } else if self.is_manifest(&path) {
                    manifests.push(path);
                }
            }
        }

        manifests.sort();
        Ok(manifests)
    }

    /// Parse one manifest file, choosing the format by extension
    pub fn parse_manifest_file(path: &Path) -> AddonResult<RawManifest> {
        let content = fs::read_to_string(path).map_err(|e| {
            AddonError::discovery(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(serde_json::from_str(&content)?),
            _ => Ok(serde_yaml::from_str(&content)?),
        }
    }
}

impl Discoverer for FileBasedDiscovery {
    fn scan(&self) -> AddonResult<Vec<RawManifest>> {
        let mut manifests = Vec::new();

        for path in self.manifest_paths()? {
            match Self::parse_manifest_file(&path) {
                Ok(manifest) => {
                    debug!("Found addon manifest '{}' at {}", manifest.id, path.display());
                    manifests.push(manifest);
                }
                Err(e) => {
                    warn!("Skipping unreadable manifest {}: {}", path.display(), e);
                }
            }
        }

        debug!("Scanned {}: {} manifests", self.addon_directory.display(), manifests.len());
        Ok(manifests)
    }

    fn source(&self) -> String {
        self.addon_directory.display().to_string()
    }
}

/// Discovers a fixed, in-memory list of manifests
#[derive(Debug, Clone, Default)]
pub struct StaticDiscovery {
    manifests: Vec<RawManifest>,
}

impl StaticDiscovery {
    pub fn new(manifests: Vec<RawManifest>) -> Self {
        Self { manifests }
    }

    /// Append a manifest
    pub fn with(mut self, manifest: RawManifest) -> Self {
        self.manifests.push(manifest);
        self
    }
}

impl Discoverer for StaticDiscovery {
    fn scan(&self) -> AddonResult<Vec<RawManifest>> {
        Ok(self.manifests.clone())
    }

    fn source(&self) -> String {
        "static".to_string()
    }
}
