//! Progress hub - publish/subscribe between the agent and its observers
//!
//! Channels are dotted names. A subscription to `browser_use` also receives
//! messages published on `browser_use.agent`, and the empty name is the root
//! that receives everything. Delivery is synchronous and in publish order.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::core::ProgressMessage;

/// Receiver of progress messages
pub trait ProgressSink: Send + Sync {
    /// Handle one message. Must not panic and should return quickly.
    fn on_message(&self, message: &ProgressMessage);
}

/// Handle returned by `subscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscription {
    id: SubscriptionId,
    channels: Vec<String>,
    sink: Arc<dyn ProgressSink>,
}

impl Subscription {
    fn matches(&self, channel: &str) -> bool {
        self.channels
            .iter()
            .any(|prefix| channel_within(channel, prefix))
    }
}

/// Whether `channel` equals `prefix` or lies beneath it
fn channel_within(channel: &str, prefix: &str) -> bool {
    prefix.is_empty()
        || channel == prefix
        || (channel.starts_with(prefix) && channel[prefix.len()..].starts_with('.'))
}

/// Explicit message bus the agent publishes to
#[derive(Default)]
pub struct ProgressHub {
    subscriptions: RwLock<Vec<Arc<Subscription>>>,
    next_id: AtomicU64,
}

impl ProgressHub {
    /// Create an empty hub
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `sink` for every message on any of `channels`
    ///
    /// A message matching several of the channels is still delivered once.
    pub fn subscribe<S>(&self, channels: &[S], sink: Arc<dyn ProgressSink>) -> SubscriptionId
    where
        S: AsRef<str>,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let subscription = Subscription {
            id,
            channels: channels.iter().map(|c| c.as_ref().to_string()).collect(),
            sink,
        };

        match self.subscriptions.write() {
            Ok(mut subs) => subs.push(Arc::new(subscription)),
            Err(poisoned) => poisoned.into_inner().push(Arc::new(subscription)),
        }

        tracing::debug!(subscription = id.0, "subscribed to progress hub");
        id
    }

    /// Remove a subscription. Returns false if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subs = match self.subscriptions.write() {
            Ok(subs) => subs,
            Err(poisoned) => poisoned.into_inner(),
        };

        let before = subs.len();
        subs.retain(|s| s.id != id);
        let removed = subs.len() != before;

        if removed {
            tracing::debug!(subscription = id.0, "unsubscribed from progress hub");
        }
        removed
    }

    /// Deliver a message to every matching subscriber on the calling thread
    pub fn publish(&self, message: ProgressMessage) {
        // Snapshot first so sinks may unsubscribe while being called
        let targets: Vec<Arc<Subscription>> = {
            let subs = match self.subscriptions.read() {
                Ok(subs) => subs,
                Err(poisoned) => poisoned.into_inner(),
            };
            subs.iter()
                .filter(|s| s.matches(&message.channel))
                .cloned()
                .collect()
        };

        for subscription in targets {
            subscription.sink.on_message(&message);
        }
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        match self.subscriptions.read() {
            Ok(subs) => subs.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}
