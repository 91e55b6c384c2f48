//! Subscriber Trait and Delivery Statistics

use std::time::SystemTime;
use crate::notifications::error::NotificationResult;
use crate::notifications::events::LifecycleEvent;

/// Component that handles lifecycle events
pub trait LifecycleSubscriber: Send + Sync {
    /// Handle one event
    ///
    /// Delivery is synchronous on the thread that performed the lifecycle
    /// operation, so handlers must return promptly.
    fn handle_event(&self, event: &LifecycleEvent) -> NotificationResult<()>;

    /// Subscriber identifier (must be unique)
    fn subscriber_id(&self) -> &str;

    /// Check if this subscriber wants the event
    fn should_receive(&self, _event: &LifecycleEvent) -> bool {
        true
    }
}

/// Statistics about notification delivery
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryStats {
    /// Total events published
    pub events_published: u64,

    /// Total events delivered successfully
    pub events_delivered: u64,

    /// Total delivery failures
    pub delivery_failures: u64,

    /// When the last event was published
    pub last_published_at: Option<SystemTime>,
}
