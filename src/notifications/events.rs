//! Lifecycle Event Types
//!
//! Events published after an addon lifecycle transition has been committed
//! to the activation store.

use std::fmt;
use serde::{Deserialize, Serialize};

/// Addon lifecycle events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleEvent {
    /// Record written, addon inactive
    AddonInstalled { id: String, version: String },

    /// Record deleted
    AddonUninstalled { id: String },

    /// Record flipped to active after register/boot succeeded
    AddonActivated { id: String },

    /// Record flipped back to inactive
    AddonDeactivated { id: String },

    /// Installed version moved forward
    AddonUpdated { id: String, from: String, to: String },
}

impl LifecycleEvent {
    /// Id of the addon the event concerns
    pub fn addon_id(&self) -> &str {
        match self {
            LifecycleEvent::AddonInstalled { id, .. }
            | LifecycleEvent::AddonUninstalled { id }
            | LifecycleEvent::AddonActivated { id }
            | LifecycleEvent::AddonDeactivated { id }
            | LifecycleEvent::AddonUpdated { id, .. } => id,
        }
    }

    /// Short event name
    pub fn kind(&self) -> &'static str {
        match self {
            LifecycleEvent::AddonInstalled { .. } => "AddonInstalled",
            LifecycleEvent::AddonUninstalled { .. } => "AddonUninstalled",
            LifecycleEvent::AddonActivated { .. } => "AddonActivated",
            LifecycleEvent::AddonDeactivated { .. } => "AddonDeactivated",
            LifecycleEvent::AddonUpdated { .. } => "AddonUpdated",
        }
    }

    /// Create an installed event
    pub fn installed<S: Into<String>>(id: S, version: S) -> Self {
        Self::AddonInstalled { id: id.into(), version: version.into() }
    }

    /// Create an uninstalled event
    pub fn uninstalled<S: Into<String>>(id: S) -> Self {
        Self::AddonUninstalled { id: id.into() }
    }

    /// Create an activated event
    pub fn activated<S: Into<String>>(id: S) -> Self {
        Self::AddonActivated { id: id.into() }
    }

    /// Create a deactivated event
    pub fn deactivated<S: Into<String>>(id: S) -> Self {
        Self::AddonDeactivated { id: id.into() }
    }

    /// Create an updated event
    pub fn updated<S: Into<String>>(id: S, from: S, to: S) -> Self {
        Self::AddonUpdated { id: id.into(), from: from.into(), to: to.into() }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleEvent::AddonUpdated { id, from, to } => {
                write!(f, "{}({}: {} -> {})", self.kind(), id, from, to)
            }
            LifecycleEvent::AddonInstalled { id, version } => {
                write!(f, "{}({} {})", self.kind(), id, version)
            }
            _ => write!(f, "{}({})", self.kind(), self.addon_id()),
        }
    }
}
