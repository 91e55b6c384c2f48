//! Addon Lifecycle Core
//!
//! Discovers independently versioned addon packages, resolves their declared
//! dependencies, and drives each one through install, activate, deactivate,
//! update and uninstall while keeping the dependency graph consistent and the
//! activation record durable.
//!
//! # Example Usage
//!
//! ```
//! use std::sync::Arc;
//! use addonmgr::addon::{
//!     AddonManager, AddonRegistry, HookCatalog, MemoryActivationStore, RawManifest, StaticDiscovery,
//! };
//!
//! let discovery = StaticDiscovery::default()
//!     .with(RawManifest::new("core", "Core", "1.2.0"))
//!     .with(RawManifest::new("blog", "Blog", "1.0.0").with_dependency("core", ">=1.0.0"));
//!
//! let registry = AddonRegistry::discover(&discovery, &HookCatalog::with_logging_fallback())?;
//! let manager = AddonManager::new(Arc::new(registry), Arc::new(MemoryActivationStore::new()));
//!
//! manager.install("core")?;
//! manager.activate("core")?;
//! manager.install("blog")?;
//! manager.activate("blog")?;
//! # Ok::<(), addonmgr::addon::AddonError>(())
//! ```

pub mod version;
pub mod error;
pub mod descriptor;
pub mod discovery;
pub mod hooks;
pub mod registry;
pub mod store;
pub mod resolver;
pub mod manager;

#[cfg(test)]
pub mod tests;

// Re-export core types for easier access
pub use version::{satisfies, ConstraintError, Version, VersionConstraint};
pub use error::{AddonError, AddonResult, HookKind, Operation, UnsatisfiedReason};
pub use descriptor::{AddonDescriptor, Dependency, RawManifest};
pub use discovery::{Discoverer, FileBasedDiscovery, StaticDiscovery};
pub use hooks::{AddonHooks, HookCatalog, HookResult, LoggingHooks};
pub use registry::AddonRegistry;
pub use store::{ActivationRecord, ActivationStore, JsonFileActivationStore, MemoryActivationStore};
pub use resolver::DependencyResolver;
pub use manager::{AddonManager, AddonState, AddonStatus, Outcome};
