// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Uploader: labels each fix with the stored identity and overwrites the
//! current-state record in the remote datastore.
//!
//! Writes are best-effort. A failed write is logged and dropped; the next
//! fix supersedes it, so nothing is retried.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::channel::Subscription;
use crate::db::{paths, RecordStore};
use crate::identity::IdentityStore;
use crate::models::{LocationFix, RemoteRecord};

pub struct Uploader {
    identity: Arc<dyn IdentityStore>,
    store: Arc<dyn RecordStore>,
    path: String,
}

impl Uploader {
    pub fn new(identity: Arc<dyn IdentityStore>, store: Arc<dyn RecordStore>) -> Self {
        Self {
            identity,
            store,
            path: paths::MESSAGE.to_string(),
        }
    }

    /// Dispatch the write for `fix` and return without waiting for it.
    ///
    /// The handle is only for callers that want to observe completion;
    /// dropping it leaves the write running.
    pub fn on_fix(&self, fix: &LocationFix) -> JoinHandle<()> {
        let identity = self.identity.get().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to read identity, uploading as unknown");
            None
        });
        let record = RemoteRecord::labelled(identity.as_deref(), fix);
        let write = self.store.put(&self.path, &record);
        let path = self.path.clone();

        tokio::spawn(async move {
            match write.await {
                Ok(()) => tracing::debug!(
                    path = %path,
                    name = %record.name,
                    lat = record.lat,
                    lng = record.lng,
                    "Uploaded location"
                ),
                Err(e) => tracing::warn!(path = %path, error = %e, "Location upload dropped"),
            }
        })
    }

    /// Consume fixes from `subscription` until the channel goes away.
    pub fn spawn(self: Arc<Self>, mut subscription: Subscription) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(fix) = subscription.recv().await {
                self.on_fix(&fix);
            }
            tracing::debug!("Uploader subscription closed");
        })
    }
}
