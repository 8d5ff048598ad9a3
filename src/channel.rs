// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process broadcast of location fixes.
//!
//! Each subscriber gets its own unbounded queue, so a slow consumer never
//! holds up the producer or the other consumers. Publishing and
//! (de)registration are serialized by one lock, which gives every subscriber
//! the same relative order of fixes and makes a completed unsubscribe visible
//! to every later publish.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::mpsc;

use crate::models::LocationFix;

/// Logical identifier of the location update channel.
pub const LOCATION_UPDATE_CHANNEL: &str = "devicetracker.location_update";

struct Registry {
    next_id: u64,
    subscribers: HashMap<u64, mpsc::UnboundedSender<LocationFix>>,
}

struct Inner {
    name: String,
    registry: Mutex<Registry>,
}

impl Inner {
    fn registry(&self) -> MutexGuard<'_, Registry> {
        // Nothing in the critical sections can panic half-way through a
        // mutation, so a poisoned lock still guards consistent data.
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Broadcast channel carrying fixes to every registered consumer.
#[derive(Clone)]
pub struct ReportingChannel {
    inner: Arc<Inner>,
}

impl Default for ReportingChannel {
    fn default() -> Self {
        Self::new(LOCATION_UPDATE_CHANNEL)
    }
}

impl ReportingChannel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                registry: Mutex::new(Registry {
                    next_id: 0,
                    subscribers: HashMap::new(),
                }),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Register a consumer. It receives every fix published after this
    /// call returns, until the returned handle is dropped.
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut registry = self.inner.registry();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.subscribers.insert(id, tx);
        drop(registry);

        tracing::debug!(channel = %self.inner.name, subscriber = id, "Subscriber registered");

        Subscription {
            id,
            rx,
            channel: Arc::downgrade(&self.inner),
        }
    }

    /// Deliver `fix` to every current subscriber. Returns how many received it.
    pub fn publish(&self, fix: LocationFix) -> usize {
        let mut registry = self.inner.registry();
        let mut delivered = 0;

        // A send only fails once the receiving half is gone; prune those.
        registry.subscribers.retain(|_, tx| {
            let ok = tx.send(fix).is_ok();
            delivered += usize::from(ok);
            ok
        });

        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.registry().subscribers.len()
    }
}

/// Registration on a [`ReportingChannel`]. Dropping it deregisters.
pub struct Subscription {
    id: u64,
    rx: mpsc::UnboundedReceiver<LocationFix>,
    channel: Weak<Inner>,
}

impl Subscription {
    /// Wait for the next fix. Returns `None` once the channel is gone.
    pub async fn recv(&mut self) -> Option<LocationFix> {
        self.rx.recv().await
    }

    /// Next fix if one is already queued.
    pub fn try_recv(&mut self) -> Option<LocationFix> {
        self.rx.try_recv().ok()
    }

    /// Deregister explicitly; equivalent to dropping the handle.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.channel.upgrade() {
            inner.registry().subscribers.remove(&self.id);
            tracing::debug!(channel = %inner.name, subscriber = self.id, "Subscriber deregistered");
        }
    }
}
