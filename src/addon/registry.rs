//! Addon Registry
//!
//! Catalog of every discovered addon, built once by a discovery pass and
//! read-only afterwards. Because it never changes after construction it can
//! be shared behind an `Arc` and read without locking.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use indexmap::IndexMap;
use log::{debug, info, warn};
use crate::addon::descriptor::AddonDescriptor;
use crate::addon::discovery::Discoverer;
use crate::addon::error::{AddonError, AddonResult};
use crate::addon::hooks::{AddonHooks, HookCatalog};
use crate::addon::resolver::detect_cycle;

/// A descriptor bound to its hook implementation
#[derive(Clone)]
pub struct RegisteredAddon {
    pub descriptor: AddonDescriptor,
    pub hooks: Arc<dyn AddonHooks>,
}

/// Immutable catalog of discovered addons
pub struct AddonRegistry {
    /// Addons by id, in discovery order
    addons: IndexMap<String, RegisteredAddon>,

    /// Entries refused during discovery
    rejections: Vec<AddonError>,
}

impl AddonRegistry {
    /// Run one discovery pass and build the registry
    ///
    /// Only a failure of the discoverer itself is fatal. Individual entries
    /// that are malformed, duplicated, cyclic, or lack hooks are logged,
    /// recorded in `rejections()`, and left out.
    pub fn discover(source: &dyn Discoverer, catalog: &HookCatalog) -> AddonResult<Self> {
        info!("Discovering addons from {}", source.source());
        let manifests = source.scan()?;

        let mut candidates: IndexMap<String, AddonDescriptor> = IndexMap::new();
        let mut rejections = Vec::new();

        for manifest in manifests {
            let descriptor = match AddonDescriptor::from_manifest(manifest) {
                Ok(descriptor) => descriptor,
                Err(e) => {
                    warn!("Rejecting addon manifest: {}", e);
                    rejections.push(e);
                    continue;
                }
            };

            if candidates.contains_key(descriptor.id()) {
                let e = AddonError::duplicate(descriptor.id());
                warn!("{}", e);
                rejections.push(e);
                continue;
            }
            candidates.insert(descriptor.id().to_string(), descriptor);
        }

        // Cycle checks run against the full candidate set so the outcome does
        // not depend on discovery order
        let graph: HashMap<String, AddonDescriptor> = candidates
            .iter()
            .map(|(id, d)| (id.clone(), d.clone()))
            .collect();

        let mut addons = IndexMap::new();
        for (id, descriptor) in candidates {
            if let Some(path) = detect_cycle(&id, &graph, &mut Vec::new(), &mut HashSet::new()) {
                let e = AddonError::Cycle { id: id.clone(), path };
                warn!("Rejecting addon: {}", e);
                rejections.push(e);
                continue;
            }

            let hooks = match catalog.resolve(&descriptor) {
                Some(hooks) => hooks,
                None => {
                    let e = AddonError::discovery(format!(
                        "addon '{}' has no hook implementation for entry point '{}'",
                        id,
                        descriptor.entry_point()
                    ));
                    warn!("Rejecting addon: {}", e);
                    rejections.push(e);
                    continue;
                }
            };

            addons.insert(id, RegisteredAddon { descriptor, hooks });
        }

        let registry = Self { addons, rejections };
        registry.warn_missing_dependencies();
        info!(
            "Discovered {} addons ({} rejected)",
            registry.len(),
            registry.rejections.len()
        );
        Ok(registry)
    }

    fn warn_missing_dependencies(&self) {
        for addon in self.addons.values() {
            for dep in addon.descriptor.dependencies() {
                if !self.addons.contains_key(&dep.id) {
                    warn!(
                        "Addon '{}' depends on '{}' which was not discovered; it cannot be installed",
                        addon.descriptor.id(),
                        dep.id
                    );
                }
            }
        }
    }

    /// Descriptor for `id`
    pub fn get(&self, id: &str) -> Option<&AddonDescriptor> {
        self.addons.get(id).map(|a| &a.descriptor)
    }

    /// Descriptor and hooks for `id`
    pub fn entry(&self, id: &str) -> Option<&RegisteredAddon> {
        self.addons.get(id)
    }

    /// Hooks bound to `id`
    pub fn hooks(&self, id: &str) -> Option<Arc<dyn AddonHooks>> {
        self.addons.get(id).map(|a| Arc::clone(&a.hooks))
    }

    /// All descriptors in discovery order
    pub fn all(&self) -> Vec<&AddonDescriptor> {
        self.addons.values().map(|a| &a.descriptor).collect()
    }

    /// Descriptors that declare a dependency on `id`
    pub fn dependents(&self, id: &str) -> Vec<&AddonDescriptor> {
        self.addons
            .values()
            .map(|a| &a.descriptor)
            .filter(|d| d.depends_on(id))
            .collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.addons.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.addons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addons.is_empty()
    }

    /// Errors for entries left out of the registry
    pub fn rejections(&self) -> &[AddonError] {
        &self.rejections
    }

    /// Ids whose operations must be serialized with an operation on `id`
    pub(crate) fn neighbourhood(&self, id: &str) -> Vec<String> {
        let mut ids: Vec<String> = vec![id.to_string()];
        if let Some(descriptor) = self.get(id) {
            ids.extend(descriptor.dependencies().iter().map(|d| d.id.clone()));
        }
        ids.extend(self.dependents(id).into_iter().map(|d| d.id().to_string()));
        ids.sort();
        ids.dedup();
        debug!("Lock set for '{}': {:?}", id, ids);
        ids
    }
}

impl std::fmt::Debug for AddonRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddonRegistry")
            .field("addons", &self.addons.keys().collect::<Vec<_>>())
            .field("rejections", &self.rejections.len())
            .finish()
    }
}
