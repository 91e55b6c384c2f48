//! Addon Error Types
//!
//! Typed errors for every addon lifecycle failure, so callers can present
//! specific remediation for each case.

use std::fmt;
use thiserror::Error;
use crate::addon::version::ConstraintError;

/// Result type for addon operations
pub type AddonResult<T> = Result<T, AddonError>;

/// Error type returned by addon lifecycle hooks
pub type HookError = anyhow::Error;

/// Lifecycle operation an error was raised from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Discover,
    Install,
    Uninstall,
    Activate,
    Deactivate,
    Update,
    Boot,
    Query,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Discover => "discover",
            Operation::Install => "install",
            Operation::Uninstall => "uninstall",
            Operation::Activate => "activate",
            Operation::Deactivate => "deactivate",
            Operation::Update => "update",
            Operation::Boot => "boot",
            Operation::Query => "query",
        };
        f.write_str(name)
    }
}

/// Lifecycle hook that raised an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    Install,
    Uninstall,
    Activate,
    Deactivate,
    Register,
    Boot,
    Update,
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HookKind::Install => "install",
            HookKind::Uninstall => "uninstall",
            HookKind::Activate => "activate",
            HookKind::Deactivate => "deactivate",
            HookKind::Register => "register",
            HookKind::Boot => "boot",
            HookKind::Update => "update",
        };
        f.write_str(name)
    }
}

/// Why a declared dependency is not satisfied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnsatisfiedReason {
    /// The dependency was never discovered
    Missing,
    /// Discovered but has no activation record
    NotInstalled,
    /// Installed but not active
    Inactive,
    /// Installed version does not satisfy the constraint
    VersionMismatch { installed: String },
}

impl fmt::Display for UnsatisfiedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnsatisfiedReason::Missing => f.write_str("it is not available"),
            UnsatisfiedReason::NotInstalled => f.write_str("it is not installed"),
            UnsatisfiedReason::Inactive => f.write_str("it is not active"),
            UnsatisfiedReason::VersionMismatch { installed } => {
                write!(f, "installed version {} does not match", installed)
            }
        }
    }
}

/// Addon lifecycle errors
#[derive(Error, Debug)]
pub enum AddonError {
    /// Id absent from the registry, or absent from the store when installation is required
    #[error("Cannot {operation} '{id}': addon is not {scope}")]
    NotFound {
        operation: Operation,
        id: String,
        scope: NotFoundScope,
    },

    /// Discovery-time id collision
    #[error("Duplicate addon id '{id}' rejected during discovery")]
    Duplicate { id: String },

    /// Dependency cycle detected during discovery
    #[error("Dependency cycle detected for addon '{id}': {}", .path.join(" -> "))]
    Cycle { id: String, path: Vec<String> },

    /// Missing, inactive or version-mismatched dependency
    #[error("Cannot {operation} '{id}': dependency '{dependency}' ({constraint}) is unsatisfied because {reason}")]
    DependencyUnsatisfied {
        operation: Operation,
        id: String,
        dependency: String,
        constraint: String,
        reason: UnsatisfiedReason,
    },

    /// Uninstall or deactivate blocked by dependents
    #[error("Cannot {operation} '{id}': required by {}", .blocking.join(", "))]
    HasDependents {
        operation: Operation,
        id: String,
        blocking: Vec<String>,
    },

    /// Malformed version or constraint string
    #[error(transparent)]
    Constraint(#[from] ConstraintError),

    /// An addon's own lifecycle hook failed
    #[error("Cannot {operation} '{id}': {hook} hook failed: {source}")]
    HookFailed {
        operation: Operation,
        id: String,
        hook: HookKind,
        #[source]
        source: HookError,
    },

    /// Operation not permitted from the addon's current lifecycle state
    #[error("Cannot {operation} '{id}': {message}")]
    InvalidState {
        operation: Operation,
        id: String,
        message: String,
    },

    /// Manifest contents are invalid
    #[error("Invalid addon manifest: {message}")]
    Manifest { message: String },

    /// Discovery source could not be read
    #[error("Addon discovery error: {message}")]
    Discovery { message: String },

    /// Activation store failure
    #[error("Activation store error: {message}")]
    Store { message: String },
}

/// Where a missing addon was looked up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundScope {
    Discovered,
    Installed,
}

impl fmt::Display for NotFoundScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotFoundScope::Discovered => f.write_str("discovered"),
            NotFoundScope::Installed => f.write_str("installed"),
        }
    }
}

impl AddonError {
    /// Create an error for an id the registry does not know
    pub fn not_discovered<S: Into<String>>(operation: Operation, id: S) -> Self {
        Self::NotFound { operation, id: id.into(), scope: NotFoundScope::Discovered }
    }

    /// Create an error for an id with no activation record
    pub fn not_installed<S: Into<String>>(operation: Operation, id: S) -> Self {
        Self::NotFound { operation, id: id.into(), scope: NotFoundScope::Installed }
    }

    /// Create a duplicate id error
    pub fn duplicate<S: Into<String>>(id: S) -> Self {
        Self::Duplicate { id: id.into() }
    }

    /// Create an unsatisfied dependency error
    pub fn unsatisfied(
        operation: Operation,
        id: impl Into<String>,
        dependency: impl Into<String>,
        constraint: impl Into<String>,
        reason: UnsatisfiedReason,
    ) -> Self {
        Self::DependencyUnsatisfied {
            operation,
            id: id.into(),
            dependency: dependency.into(),
            constraint: constraint.into(),
            reason,
        }
    }

    /// Create a blocked-by-dependents error
    pub fn has_dependents<S: Into<String>>(operation: Operation, id: S, blocking: Vec<String>) -> Self {
        Self::HasDependents { operation, id: id.into(), blocking }
    }

    /// Wrap a failure raised by an addon hook
    pub fn hook_failed<S: Into<String>>(operation: Operation, id: S, hook: HookKind, source: HookError) -> Self {
        Self::HookFailed { operation, id: id.into(), hook, source }
    }

    /// Create an invalid state error
    pub fn invalid_state<S: Into<String>, M: Into<String>>(operation: Operation, id: S, message: M) -> Self {
        Self::InvalidState { operation, id: id.into(), message: message.into() }
    }

    /// Create a manifest error
    pub fn manifest<S: Into<String>>(message: S) -> Self {
        Self::Manifest { message: message.into() }
    }

    /// Create a discovery error
    pub fn discovery<S: Into<String>>(message: S) -> Self {
        Self::Discovery { message: message.into() }
    }

    /// Create a store error
    pub fn store<S: Into<String>>(message: S) -> Self {
        Self::Store { message: message.into() }
    }

    /// Id of the addon the error concerns, if any
    pub fn addon_id(&self) -> Option<&str> {
        match self {
            AddonError::NotFound { id, .. }
            | AddonError::Duplicate { id }
            | AddonError::Cycle { id, .. }
            | AddonError::DependencyUnsatisfied { id, .. }
            | AddonError::HasDependents { id, .. }
            | AddonError::HookFailed { id, .. }
            | AddonError::InvalidState { id, .. } => Some(id),
            _ => None,
        }
    }

    /// Check if error is a dependency graph issue
    pub fn is_dependency_error(&self) -> bool {
        matches!(self,
            AddonError::DependencyUnsatisfied { .. } |
            AddonError::HasDependents { .. } |
            AddonError::Cycle { .. }
        )
    }

    /// Check if error is raised by the lifecycle state machine
    pub fn is_lifecycle_error(&self) -> bool {
        matches!(self,
            AddonError::NotFound { .. } |
            AddonError::InvalidState { .. } |
            AddonError::HookFailed { .. }
        )
    }

    /// Check if error was raised while building the registry
    pub fn is_discovery_error(&self) -> bool {
        matches!(self,
            AddonError::Duplicate { .. } |
            AddonError::Cycle { .. } |
            AddonError::Manifest { .. } |
            AddonError::Discovery { .. }
        )
    }
}

impl From<std::io::Error> for AddonError {
    fn from(err: std::io::Error) -> Self {
        AddonError::store(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AddonError {
    fn from(err: serde_json::Error) -> Self {
        AddonError::manifest(format!("JSON error: {}", err))
    }
}

impl From<serde_yaml::Error> for AddonError {
    fn from(err: serde_yaml::Error) -> Self {
        AddonError::manifest(format!("YAML error: {}", err))
    }
}
