// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process record store for offline runs and tests.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use futures_util::future::BoxFuture;

use super::RecordStore;
use crate::error::{AppError, Result};
use crate::models::RemoteRecord;

#[derive(Default)]
struct Inner {
    records: DashMap<String, RemoteRecord>,
    writes: AtomicU64,
    offline: AtomicBool,
}

/// Record store held in memory. Clones share the same records.
#[derive(Clone, Default)]
pub struct MemoryDb {
    inner: Arc<Inner>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current record at `path`.
    pub fn record(&self, path: &str) -> Option<RemoteRecord> {
        self.inner.records.get(path).map(|r| r.value().clone())
    }

    /// Number of successful writes since creation.
    pub fn write_count(&self) -> u64 {
        self.inner.writes.load(Ordering::SeqCst)
    }

    /// Make every subsequent write fail, as an unreachable backend would.
    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
    }
}

impl RecordStore for MemoryDb {
    fn put(&self, path: &str, record: &RemoteRecord) -> BoxFuture<'static, Result<()>> {
        let inner = self.inner.clone();
        let path = path.to_string();
        let record = record.clone();
        Box::pin(async move {
            if inner.offline.load(Ordering::SeqCst) {
                return Err(AppError::Database("Database not reachable".to_string()));
            }
            inner.records.insert(path, record);
            inner.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    fn get(&self, path: &str) -> BoxFuture<'static, Result<Option<RemoteRecord>>> {
        let record = self.record(path);
        Box::pin(async move { Ok(record) })
    }
}
