//! Lifecycle Notification System
//!
//! Publishes addon lifecycle events to subscribers that live outside the
//! addon core, such as cache invalidation or audit logging.
//!
//! # Example Usage
//!
//! ```
//! use std::sync::Arc;
//! use addonmgr::notifications::{ChannelSubscriber, LifecycleEvent, LifecycleNotifier};
//!
//! let notifier = LifecycleNotifier::new();
//! let (subscriber, events) = ChannelSubscriber::new("cache");
//! notifier.subscribe(Arc::new(subscriber)).unwrap();
//!
//! notifier.publish(LifecycleEvent::activated("blog"));
//! assert_eq!(events.try_recv().unwrap().addon_id(), "blog");
//! ```

pub mod traits;
pub mod manager;
pub mod events;
pub mod error;


pub use manager::{ChannelSubscriber, LifecycleNotifier};
pub use events::LifecycleEvent;
pub use traits::{DeliveryStats, LifecycleSubscriber};
pub use error::{NotificationError, NotificationResult};
