//! Dependency Resolver
//!
//! Pure checks over the registry and a snapshot of the activation store.
//! Nothing here mutates state; the manager runs these before every
//! graph-affecting operation.

use std::collections::{HashMap, HashSet};
use crate::addon::descriptor::{AddonDescriptor, Dependency};
use crate::addon::error::{AddonError, AddonResult, Operation, UnsatisfiedReason};
use crate::addon::registry::AddonRegistry;
use crate::addon::store::StoreSnapshot;
use crate::addon::version::Version;

/// Answers dependency questions for one point in time
pub struct DependencyResolver<'a> {
    registry: &'a AddonRegistry,
    snapshot: &'a StoreSnapshot,
}

impl<'a> DependencyResolver<'a> {
    pub fn new(registry: &'a AddonRegistry, snapshot: &'a StoreSnapshot) -> Self {
        Self { registry, snapshot }
    }

    /// Every dependency must be discoverable; installed ones must match their constraint
    pub fn check_installable(&self, descriptor: &AddonDescriptor) -> AddonResult<()> {
        self.check_dependencies(Operation::Install, descriptor, false)
    }

    /// Every dependency must be installed, active, and version-satisfying
    pub fn check_activatable(&self, descriptor: &AddonDescriptor) -> AddonResult<()> {
        self.check_dependencies(Operation::Activate, descriptor, true)
    }

    /// Check the declared dependencies of `descriptor` on behalf of `operation`
    ///
    /// With `require_active` every dependency must be installed and active;
    /// otherwise it need only be discoverable, and is version-checked when installed.
    pub fn check_dependencies(
        &self,
        operation: Operation,
        descriptor: &AddonDescriptor,
        require_active: bool,
    ) -> AddonResult<()> {
        for dep in descriptor.dependencies() {
            if self.registry.get(&dep.id).is_none() {
                return Err(self.unsatisfied(operation, descriptor, dep, UnsatisfiedReason::Missing));
            }

            let record = match self.snapshot.get(&dep.id) {
                Some(record) => record,
                None if require_active => {
                    return Err(self.unsatisfied(operation, descriptor, dep, UnsatisfiedReason::NotInstalled));
                }
                None => continue,
            };

            if require_active && !record.is_active {
                return Err(self.unsatisfied(operation, descriptor, dep, UnsatisfiedReason::Inactive));
            }
            self.check_version(operation, descriptor, dep, &record.installed_version)?;
        }
        Ok(())
    }

    /// No discovered addon may depend on `id`
    pub fn check_uninstallable(&self, id: &str) -> AddonResult<()> {
        let blocking: Vec<String> = self
            .registry
            .dependents(id)
            .into_iter()
            .map(|d| d.id().to_string())
            .collect();

        if blocking.is_empty() {
            Ok(())
        } else {
            Err(AddonError::has_dependents(Operation::Uninstall, id, blocking))
        }
    }

    /// No active addon may depend on `id`
    pub fn check_deactivatable(&self, id: &str) -> AddonResult<()> {
        let blocking = self.active_dependents(id);
        if blocking.is_empty() {
            Ok(())
        } else {
            Err(AddonError::has_dependents(Operation::Deactivate, id, blocking))
        }
    }

    /// Installed dependents must still accept `new_version` of `id`
    pub fn check_updatable(&self, id: &str, new_version: &Version) -> AddonResult<()> {
        for dependent in self.registry.dependents(id) {
            if !self.snapshot.is_installed(dependent.id()) {
                continue;
            }
            if let Some(dep) = dependent.dependency(id) {
                if !dep.parsed.matches(new_version) {
                    return Err(self.unsatisfied(
                        Operation::Update,
                        dependent,
                        dep,
                        UnsatisfiedReason::VersionMismatch { installed: new_version.to_string() },
                    ));
                }
            }
        }
        Ok(())
    }

    /// Ids of currently active addons that declare a dependency on `id`
    pub fn active_dependents(&self, id: &str) -> Vec<String> {
        self.registry
            .dependents(id)
            .into_iter()
            .filter(|d| self.snapshot.is_active(d.id()))
            .map(|d| d.id().to_string())
            .collect()
    }

    /// Order `ids` so that each addon follows the dependencies it shares with the set
    pub fn dependency_order(&self, ids: &[String]) -> Vec<String> {
        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let mut placed: HashSet<String> = HashSet::new();
        let mut ordered = Vec::with_capacity(ids.len());

        for id in ids {
            self.place(id, &wanted, &mut placed, &mut ordered);
        }
        ordered
    }

    fn place(&self, id: &str, wanted: &HashSet<&str>, placed: &mut HashSet<String>, ordered: &mut Vec<String>) {
        if !placed.insert(id.to_string()) {
            return;
        }
        if let Some(descriptor) = self.registry.get(id) {
            for dep in descriptor.dependencies() {
                if wanted.contains(dep.id.as_str()) {
                    self.place(&dep.id, wanted, placed, ordered);
                }
            }
        }
        ordered.push(id.to_string());
    }

    fn check_version(
        &self,
        operation: Operation,
        descriptor: &AddonDescriptor,
        dep: &Dependency,
        installed_version: &str,
    ) -> AddonResult<()> {
        let installed = Version::parse(installed_version)?;
        if dep.parsed.matches(&installed) {
            Ok(())
        } else {
            Err(self.unsatisfied(
                operation,
                descriptor,
                dep,
                UnsatisfiedReason::VersionMismatch { installed: installed_version.to_string() },
            ))
        }
    }

    fn unsatisfied(
        &self,
        operation: Operation,
        descriptor: &AddonDescriptor,
        dep: &Dependency,
        reason: UnsatisfiedReason,
    ) -> AddonError {
        AddonError::unsatisfied(operation, descriptor.id(), dep.id.as_str(), dep.constraint.as_str(), reason)
    }
}

/// Depth-first search for a dependency cycle reachable from `id`
///
/// `path` holds the ids on the current walk and `finished` the ids already
/// known to be cycle-free. Returns the offending path, first and last ids
/// equal. Dependencies absent from `graph` are leaves.
pub fn detect_cycle(
    id: &str,
    graph: &HashMap<String, AddonDescriptor>,
    path: &mut Vec<String>,
    finished: &mut HashSet<String>,
) -> Option<Vec<String>> {
    if let Some(start) = path.iter().position(|p| p == id) {
        let mut cycle = path[start..].to_vec();
        cycle.push(id.to_string());
        return Some(cycle);
    }
    if finished.contains(id) {
        return None;
    }

    path.push(id.to_string());
    if let Some(descriptor) = graph.get(id) {
        for dep in descriptor.dependencies() {
            if let Some(cycle) = detect_cycle(&dep.id, graph, path, finished) {
                return Some(cycle);
            }
        }
    }
    path.pop();
    finished.insert(id.to_string());

    None
}
