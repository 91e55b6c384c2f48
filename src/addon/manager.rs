//! Addon Manager
//!
//! Central coordinator for the addon lifecycle. Owns references to the
//! registry (read-only) and the activation store (read/write), runs the
//! dependency checks, invokes addon hooks, and publishes lifecycle events.
//!
//! State machine per addon id:
//!
//! ```text
//! Discovered --install--> Installed --activate--> Active
//!     ^                    |    ^                    |
//!     +-----uninstall------+    +-----deactivate-----+
//! ```
//!
//! Every operation runs all of its checks before touching the store, and the
//! store is only written after the addon's own hooks have succeeded.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use dashmap::DashMap;
use log::{debug, info, warn};
use parking_lot::Mutex;
use serde::Serialize;
use crate::addon::descriptor::AddonDescriptor;
use crate::addon::error::{AddonError, AddonResult, HookKind, Operation};
use crate::addon::hooks::{AddonHooks, HookResult};
use crate::addon::registry::AddonRegistry;
use crate::addon::resolver::DependencyResolver;
use crate::addon::store::{ActivationRecord, ActivationStore, StoreSnapshot};
use crate::addon::version::Version;
use crate::notifications::{LifecycleEvent, LifecycleNotifier, LifecycleSubscriber, NotificationResult};

/// Lifecycle state of one addon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AddonState {
    /// In the registry with no activation record (also the uninstalled state)
    Discovered,
    /// Record present, inactive
    Installed,
    /// Record present, active
    Active,
}

impl AddonState {
    fn from_record(record: Option<&ActivationRecord>) -> Self {
        match record {
            None => AddonState::Discovered,
            Some(r) if r.is_active => AddonState::Active,
            Some(_) => AddonState::Installed,
        }
    }
}

impl fmt::Display for AddonState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddonState::Discovered => f.write_str("discovered"),
            AddonState::Installed => f.write_str("installed"),
            AddonState::Active => f.write_str("active"),
        }
    }
}

/// Whether an operation changed anything
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// Idempotent no-op (already installed, already active, up to date)
    Unchanged,
}

/// Registry and store view of one addon
#[derive(Debug, Clone, Serialize)]
pub struct AddonStatus {
    pub id: String,
    pub name: String,
    pub available_version: String,
    pub installed_version: Option<String>,
    pub state: AddonState,
}

fn log_rejection(e: AddonError) -> AddonError {
    warn!("{}", e);
    e
}

/// Orchestrates install, activate, deactivate, update and uninstall
pub struct AddonManager {
    registry: Arc<AddonRegistry>,
    store: Arc<dyn ActivationStore>,
    notifier: LifecycleNotifier,

    /// One mutex per addon id, created on first use
    locks: DashMap<String, Arc<Mutex<()>>>,

    started: AtomicBool,
}

impl AddonManager {
    /// Create a manager over a built registry and a store
    pub fn new(registry: Arc<AddonRegistry>, store: Arc<dyn ActivationStore>) -> Self {
        Self::with_notifier(registry, store, LifecycleNotifier::new())
    }

    /// Create a manager that publishes through an existing notifier
    pub fn with_notifier(
        registry: Arc<AddonRegistry>,
        store: Arc<dyn ActivationStore>,
        notifier: LifecycleNotifier,
    ) -> Self {
        Self {
            registry,
            store,
            notifier,
            locks: DashMap::new(),
            started: AtomicBool::new(false),
        }
    }

    pub fn registry(&self) -> &AddonRegistry {
        &self.registry
    }

    pub fn store(&self) -> &dyn ActivationStore {
        self.store.as_ref()
    }

    pub fn notifier(&self) -> &LifecycleNotifier {
        &self.notifier
    }

    /// Subscribe to lifecycle events
    pub fn subscribe(&self, subscriber: Arc<dyn LifecycleSubscriber>) -> NotificationResult<()> {
        self.notifier.subscribe(subscriber)
    }

    /// Install an addon. Installing an installed addon is a no-op
    pub fn install(&self, id: &str) -> AddonResult<Outcome> {
        let descriptor = self.descriptor(Operation::Install, id)?;
        let mutexes = self.lock_set(id);
        let _guards: Vec<_> = mutexes.iter().map(|m| m.lock()).collect();

        if self.store.exists(id)? {
            debug!("Addon '{}' is already installed", id);
            return Ok(Outcome::Unchanged);
        }

        let snapshot = StoreSnapshot::capture(self.store.as_ref())?;
        DependencyResolver::new(&self.registry, &snapshot)
            .check_installable(descriptor)
            .map_err(log_rejection)?;

        self.run_hook(Operation::Install, id, HookKind::Install, |h| h.install())?;
        self.store.create(ActivationRecord::installed(id, descriptor.version()))?;

        info!("Installed addon '{}' {}", id, descriptor.version());
        self.notifier.publish(LifecycleEvent::installed(id, descriptor.version()));
        Ok(Outcome::Applied)
    }

    /// Uninstall an inactive addon that nothing depends on
    pub fn uninstall(&self, id: &str) -> AddonResult<Outcome> {
        self.descriptor(Operation::Uninstall, id)?;
        let mutexes = self.lock_set(id);
        let _guards: Vec<_> = mutexes.iter().map(|m| m.lock()).collect();

        let record = self.record(Operation::Uninstall, id)?;
        if record.is_active {
            return Err(log_rejection(AddonError::invalid_state(
                Operation::Uninstall,
                id,
                "addon is active; deactivate it first",
            )));
        }

        let snapshot = StoreSnapshot::capture(self.store.as_ref())?;
        DependencyResolver::new(&self.registry, &snapshot)
            .check_uninstallable(id)
            .map_err(log_rejection)?;

        self.run_hook(Operation::Uninstall, id, HookKind::Uninstall, |h| h.uninstall())?;
        self.store.delete(id)?;

        info!("Uninstalled addon '{}'", id);
        self.notifier.publish(LifecycleEvent::uninstalled(id));
        Ok(Outcome::Applied)
    }

    /// Activate an installed addon. Activating an active addon is a no-op
    ///
    /// Runs the addon's `activate`, `register` and `boot` hooks in that order.
    pub fn activate(&self, id: &str) -> AddonResult<Outcome> {
        let descriptor = self.descriptor(Operation::Activate, id)?;
        let mutexes = self.lock_set(id);
        let _guards: Vec<_> = mutexes.iter().map(|m| m.lock()).collect();

        let record = self.record(Operation::Activate, id)?;
        if record.is_active {
            debug!("Addon '{}' is already active", id);
            return Ok(Outcome::Unchanged);
        }

        let snapshot = StoreSnapshot::capture(self.store.as_ref())?;
        DependencyResolver::new(&self.registry, &snapshot)
            .check_activatable(descriptor)
            .map_err(log_rejection)?;

        self.run_hook(Operation::Activate, id, HookKind::Activate, |h| h.activate())?;
        self.run_hook(Operation::Activate, id, HookKind::Register, |h| h.register())?;
        self.run_hook(Operation::Activate, id, HookKind::Boot, |h| h.boot())?;
        self.store.set_active(id, true)?;

        info!("Activated addon '{}'", id);
        self.notifier.publish(LifecycleEvent::activated(id));
        Ok(Outcome::Applied)
    }

    /// Deactivate an active addon that no active addon depends on
    pub fn deactivate(&self, id: &str) -> AddonResult<Outcome> {
        self.descriptor(Operation::Deactivate, id)?;
        let mutexes = self.lock_set(id);
        let _guards: Vec<_> = mutexes.iter().map(|m| m.lock()).collect();

        let record = self.record(Operation::Deactivate, id)?;
        if !record.is_active {
            return Err(log_rejection(AddonError::invalid_state(
                Operation::Deactivate,
                id,
                "addon is not active",
            )));
        }

        let snapshot = StoreSnapshot::capture(self.store.as_ref())?;
        DependencyResolver::new(&self.registry, &snapshot)
            .check_deactivatable(id)
            .map_err(log_rejection)?;

        self.run_hook(Operation::Deactivate, id, HookKind::Deactivate, |h| h.deactivate())?;
        self.store.set_active(id, false)?;

        info!("Deactivated addon '{}'", id);
        self.notifier.publish(LifecycleEvent::deactivated(id));
        Ok(Outcome::Applied)
    }

    /// Move an installed addon to the version the registry now offers
    ///
    /// Never downgrades: if the discovered version is not strictly newer than
    /// the installed one this is a no-op.
    pub fn update(&self, id: &str) -> AddonResult<Outcome> {
        let descriptor = self.descriptor(Operation::Update, id)?;
        let mutexes = self.lock_set(id);
        let _guards: Vec<_> = mutexes.iter().map(|m| m.lock()).collect();

        let record = self.record(Operation::Update, id)?;
        let installed = Version::parse(&record.installed_version)?;
        if *descriptor.parsed_version() <= installed {
            debug!(
                "Addon '{}' is up to date ({} installed, {} available)",
                id,
                record.installed_version,
                descriptor.version()
            );
            return Ok(Outcome::Unchanged);
        }

        let snapshot = StoreSnapshot::capture(self.store.as_ref())?;
        let resolver = DependencyResolver::new(&self.registry, &snapshot);
        resolver
            .check_dependencies(Operation::Update, descriptor, record.is_active)
            .and_then(|_| resolver.check_updatable(id, descriptor.parsed_version()))
            .map_err(log_rejection)?;

        let from = record.installed_version;
        self.run_hook(Operation::Update, id, HookKind::Update, |h| h.update(&from))?;
        self.store.set_version(id, descriptor.version())?;

        info!("Updated addon '{}' from {} to {}", id, from, descriptor.version());
        self.notifier.publish(LifecycleEvent::updated(id, from.as_str(), descriptor.version()));
        Ok(Outcome::Applied)
    }

    /// Current lifecycle state of `id`
    pub fn state(&self, id: &str) -> AddonResult<AddonState> {
        self.descriptor(Operation::Query, id)?;
        Ok(AddonState::from_record(self.store.get(id)?.as_ref()))
    }

    /// Status of every discovered addon, in discovery order
    pub fn statuses(&self) -> AddonResult<Vec<AddonStatus>> {
        let snapshot = StoreSnapshot::capture(self.store.as_ref())?;
        Ok(self
            .registry
            .all()
            .into_iter()
            .map(|d| {
                let record = snapshot.get(d.id());
                AddonStatus {
                    id: d.id().to_string(),
                    name: d.name().to_string(),
                    available_version: d.version().to_string(),
                    installed_version: record.map(|r| r.installed_version.clone()),
                    state: AddonState::from_record(record),
                }
            })
            .collect())
    }

    /// Invoke `register` on every active addon, dependencies first
    ///
    /// Startup only: must not run concurrently with other operations.
    pub fn register_active(&self) -> AddonResult<Vec<String>> {
        let order = self.active_in_dependency_order()?;
        for id in &order {
            self.run_hook(Operation::Boot, id, HookKind::Register, |h| h.register())?;
        }
        debug!("Registered {} active addons", order.len());
        Ok(order)
    }

    /// Invoke `boot` on every active addon, dependencies first
    ///
    /// Call after `register_active` so every service binding is visible.
    pub fn boot_active(&self) -> AddonResult<Vec<String>> {
        let order = self.active_in_dependency_order()?;
        for id in &order {
            self.run_hook(Operation::Boot, id, HookKind::Boot, |h| h.boot())?;
        }
        debug!("Booted {} active addons", order.len());
        Ok(order)
    }

    /// Register then boot the whole active set; allowed once per manager
    pub fn start(&self) -> AddonResult<Vec<String>> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(AddonError::invalid_state(Operation::Boot, "*", "active addons were already started"));
        }
        self.register_active()?;
        let booted = self.boot_active()?;
        info!("Started {} active addons", booted.len());
        Ok(booted)
    }

    fn active_in_dependency_order(&self) -> AddonResult<Vec<String>> {
        let snapshot = StoreSnapshot::capture(self.store.as_ref())?;
        let mut active = Vec::new();
        for record in self.store.all()?.into_iter().filter(|r| r.is_active) {
            if self.registry.contains(&record.id) {
                active.push(record.id);
            } else {
                warn!("Active addon '{}' is no longer discovered; skipping", record.id);
            }
        }
        Ok(DependencyResolver::new(&self.registry, &snapshot).dependency_order(&active))
    }

    fn descriptor(&self, operation: Operation, id: &str) -> AddonResult<&AddonDescriptor> {
        self.registry
            .get(id)
            .ok_or_else(|| log_rejection(AddonError::not_discovered(operation, id)))
    }

    fn record(&self, operation: Operation, id: &str) -> AddonResult<ActivationRecord> {
        self.store
            .get(id)?
            .ok_or_else(|| log_rejection(AddonError::not_installed(operation, id)))
    }

    fn run_hook<F>(&self, operation: Operation, id: &str, hook: HookKind, call: F) -> AddonResult<()>
    where
        F: FnOnce(&dyn AddonHooks) -> HookResult,
    {
        let hooks = self
            .registry
            .hooks(id)
            .ok_or_else(|| AddonError::not_discovered(operation, id))?;

        debug!("Running {} hook of '{}'", hook, id);
        call(hooks.as_ref()).map_err(|source| {
            let e = AddonError::hook_failed(operation, id, hook, source);
            warn!("{}", e);
            e
        })
    }

    /// Mutexes to hold for an operation on `id`, in acquisition order
    ///
    /// Covers `id`, its dependencies, and its dependents, sorted by id so that
    /// overlapping operations always acquire in the same order.
    fn lock_set(&self, id: &str) -> Vec<Arc<Mutex<()>>> {
        self.registry
            .neighbourhood(id)
            .into_iter()
            .map(|member| {
                self.locks
                    .entry(member)
                    .or_insert_with(|| Arc::new(Mutex::new(())))
                    .clone()
            })
            .collect()
    }
}

impl fmt::Debug for AddonManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AddonManager")
            .field("registry", &self.registry)
            .field("notifier", &self.notifier)
            .field("started", &self.started.load(Ordering::SeqCst))
            .finish()
    }
}
