//! Auth state-change publish/subscribe hub.
//!
//! Replaces an implicit global broadcast with an explicit channel: consumers
//! subscribe and receive an unsubscribe handle; the hub lives in `AuthState`
//! and travels by dependency injection, not as process-global state.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::warn;

/// Auth lifecycle events delivered to subscribers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

/// Handle returned at subscribe time; pass it back to drop the subscription.
#[derive(Debug)]
pub struct SubscriptionHandle {
    id: u64,
}

#[derive(Debug, Default)]
pub struct AuthEvents {
    subscribers: Mutex<HashMap<u64, UnboundedSender<AuthEvent>>>,
    next_id: AtomicU64,
}

impl AuthEvents {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber. The receiver yields every event published after
    /// this call until `unsubscribe` is invoked with the returned handle.
    pub fn subscribe(&self) -> (SubscriptionHandle, UnboundedReceiver<AuthEvent>) {
        let (tx, rx) = unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.insert(id, tx);
        }
        (SubscriptionHandle { id }, rx)
    }

    pub fn unsubscribe(&self, handle: SubscriptionHandle) {
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.remove(&handle.id);
        }
    }

    /// Deliver `event` to every live subscriber, pruning closed receivers.
    pub fn publish(&self, event: AuthEvent) {
        let Ok(mut subscribers) = self.subscribers.lock() else {
            warn!("auth event subscribers lock poisoned; dropping {event:?}");
            return;
        };
        subscribers.retain(|_, tx| tx.send(event).is_ok());
    }

    #[cfg(test)]
    fn subscriber_count(&self) -> usize {
        self.subscribers.lock().map(|s| s.len()).unwrap_or(0)
    }
}
