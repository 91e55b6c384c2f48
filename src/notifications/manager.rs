//! Lifecycle Notifier
//!
//! Fans lifecycle events out to subscribers. Events are published only after
//! the store mutation they describe has committed, so a failing subscriber is
//! logged and counted but never fails the operation that emitted the event.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;
use crossbeam_channel::{Receiver, Sender};
use log::{debug, warn};
use parking_lot::RwLock;
use crate::notifications::error::{NotificationError, NotificationResult};
use crate::notifications::events::LifecycleEvent;
use crate::notifications::traits::{DeliveryStats, LifecycleSubscriber};

/// Synchronous fan-out of lifecycle events
#[derive(Clone, Default)]
pub struct LifecycleNotifier {
    subscribers: Arc<RwLock<BTreeMap<String, Arc<dyn LifecycleSubscriber>>>>,
    stats: Arc<RwLock<DeliveryStats>>,
}

impl LifecycleNotifier {
    /// Create a notifier with no subscribers
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a component to receive events
    pub fn subscribe(&self, subscriber: Arc<dyn LifecycleSubscriber>) -> NotificationResult<()> {
        let id = subscriber.subscriber_id().to_string();
        let mut subscribers = self.subscribers.write();

        if subscribers.contains_key(&id) {
            return Err(NotificationError::subscriber_already_exists(id));
        }

        debug!("Lifecycle subscriber '{}' registered", id);
        subscribers.insert(id, subscriber);
        Ok(())
    }

    /// Unsubscribe a component
    pub fn unsubscribe(&self, subscriber_id: &str) -> NotificationResult<()> {
        self.subscribers
            .write()
            .remove(subscriber_id)
            .map(|_| ())
            .ok_or_else(|| NotificationError::subscriber_not_found(subscriber_id))
    }

    /// Get the number of subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Check if a subscriber exists
    pub fn has_subscriber(&self, subscriber_id: &str) -> bool {
        self.subscribers.read().contains_key(subscriber_id)
    }

    /// Deliver an event to every interested subscriber
    pub fn publish(&self, event: LifecycleEvent) {
        // Snapshot so handlers may subscribe or unsubscribe without deadlocking
        let subscribers: Vec<Arc<dyn LifecycleSubscriber>> =
            self.subscribers.read().values().cloned().collect();

        debug!("Publishing {} to {} subscribers", event, subscribers.len());

        let mut delivered = 0;
        let mut failures = 0;
        for subscriber in subscribers.iter().filter(|s| s.should_receive(&event)) {
            match subscriber.handle_event(&event) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    failures += 1;
                    warn!(
                        "Subscriber '{}' failed to handle {}: {}",
                        subscriber.subscriber_id(),
                        event,
                        e
                    );
                }
            }
        }

        let mut stats = self.stats.write();
        stats.events_published += 1;
        stats.events_delivered += delivered;
        stats.delivery_failures += failures;
        stats.last_published_at = Some(SystemTime::now());
    }

    /// Get delivery statistics
    pub fn stats(&self) -> DeliveryStats {
        self.stats.read().clone()
    }
}

impl fmt::Debug for LifecycleNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleNotifier")
            .field("subscribers", &self.subscribers.read().keys().collect::<Vec<_>>())
            .field("stats", &*self.stats.read())
            .finish()
    }
}

/// Forwards events into a channel for consumption on another thread
pub struct ChannelSubscriber {
    id: String,
    sender: Sender<LifecycleEvent>,
}

impl ChannelSubscriber {
    /// Create a subscriber and the receiving end of its unbounded channel
    pub fn new<S: Into<String>>(id: S) -> (Self, Receiver<LifecycleEvent>) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        (Self { id: id.into(), sender }, receiver)
    }
}

impl LifecycleSubscriber for ChannelSubscriber {
    fn handle_event(&self, event: &LifecycleEvent) -> NotificationResult<()> {
        self.sender
            .send(event.clone())
            .map_err(|_| NotificationError::delivery_failed(self.id.as_str(), "receiver disconnected"))
    }

    fn subscriber_id(&self) -> &str {
        &self.id
    }
}
