//! Addon Lifecycle Hooks
//!
//! Every discovered addon is bound to an `AddonHooks` implementation at
//! discovery time. The manager invokes the hooks synchronously at fixed
//! transition points.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use log::info;
use crate::addon::descriptor::AddonDescriptor;
use crate::addon::error::HookError;

/// Result type for addon hooks
pub type HookResult = Result<(), HookError>;

/// Capability interface every addon implements
///
/// Hooks may have side effects outside this crate (migrations, asset
/// publishing, service bindings). They should be idempotent: the manager
/// does not roll back a hook that fails halfway.
pub trait AddonHooks: Send + Sync {
    /// Publish assets, run migrations, seed data
    fn install(&self) -> HookResult;

    /// Undo whatever `install` set up
    fn uninstall(&self) -> HookResult;

    /// Called when the addon transitions to active, before `register`
    fn activate(&self) -> HookResult;

    /// Called when the addon transitions back to installed
    fn deactivate(&self) -> HookResult;

    /// Bind services. Runs for every active addon before any `boot`
    fn register(&self) -> HookResult;

    /// Wire cross-addon integration; may rely on all services being registered
    fn boot(&self) -> HookResult;

    /// Migrate from a previously installed version
    fn update(&self, from_version: &str) -> HookResult;
}

/// Constructs hooks for a descriptor
pub type HookFactory = Arc<dyn Fn(&AddonDescriptor) -> Arc<dyn AddonHooks> + Send + Sync>;

/// Maps manifest entry points to hook implementations
#[derive(Clone, Default)]
pub struct HookCatalog {
    factories: HashMap<String, HookFactory>,
    fallback: Option<HookFactory>,
}

impl HookCatalog {
    /// Create an empty catalog; addons without a binding will be rejected
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog that binds unknown entry points to `LoggingHooks`
    pub fn with_logging_fallback() -> Self {
        let mut catalog = Self::new();
        catalog.fallback = Some(Arc::new(|descriptor: &AddonDescriptor| {
            Arc::new(LoggingHooks::new(descriptor.id())) as Arc<dyn AddonHooks>
        }));
        catalog
    }

    /// Bind an entry point to a factory
    pub fn register<S, F>(&mut self, entry_point: S, factory: F)
    where
        S: Into<String>,
        F: Fn(&AddonDescriptor) -> Arc<dyn AddonHooks> + Send + Sync + 'static,
    {
        self.factories.insert(entry_point.into(), Arc::new(factory));
    }

    /// Bind an entry point to one shared hooks instance
    pub fn register_instance<S: Into<String>>(&mut self, entry_point: S, hooks: Arc<dyn AddonHooks>) {
        self.register(entry_point, move |_| Arc::clone(&hooks));
    }

    /// Set the factory used when no entry point matches
    pub fn set_fallback<F>(&mut self, factory: F)
    where
        F: Fn(&AddonDescriptor) -> Arc<dyn AddonHooks> + Send + Sync + 'static,
    {
        self.fallback = Some(Arc::new(factory));
    }

    /// Resolve hooks for a descriptor
    pub fn resolve(&self, descriptor: &AddonDescriptor) -> Option<Arc<dyn AddonHooks>> {
        self.factories
            .get(descriptor.entry_point())
            .or(self.fallback.as_ref())
            .map(|factory| factory(descriptor))
    }

    /// Check if an entry point has an explicit binding
    pub fn contains(&self, entry_point: &str) -> bool {
        self.factories.contains_key(entry_point)
    }
}

impl fmt::Debug for HookCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entry_points: Vec<&String> = self.factories.keys().collect();
        entry_points.sort();
        f.debug_struct("HookCatalog")
            .field("entry_points", &entry_points)
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

/// Hooks for declarative addons that carry no native code
#[derive(Debug, Clone)]
pub struct LoggingHooks {
    id: String,
}

impl LoggingHooks {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self { id: id.into() }
    }
}

impl AddonHooks for LoggingHooks {
    fn install(&self) -> HookResult {
        info!("Addon '{}': install", self.id);
        Ok(())
    }

    fn uninstall(&self) -> HookResult {
        info!("Addon '{}': uninstall", self.id);
        Ok(())
    }

    fn activate(&self) -> HookResult {
        info!("Addon '{}': activate", self.id);
        Ok(())
    }

    fn deactivate(&self) -> HookResult {
        info!("Addon '{}': deactivate", self.id);
        Ok(())
    }

    fn register(&self) -> HookResult {
        info!("Addon '{}': register", self.id);
        Ok(())
    }

    fn boot(&self) -> HookResult {
        info!("Addon '{}': boot", self.id);
        Ok(())
    }

    fn update(&self, from_version: &str) -> HookResult {
        info!("Addon '{}': update from {}", self.id, from_version);
        Ok(())
    }
}
