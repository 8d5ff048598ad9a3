// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Durable storage for the user-chosen identity label.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError, RwLock};

use crate::error::{AppError, Result};

/// Preference key under which the identity is stored.
pub const USER_NAME_KEY: &str = "userName";

/// Synchronous store for a single persisted user name.
pub trait IdentityStore: Send + Sync {
    /// The stored name, if any.
    fn get(&self) -> Result<Option<String>>;

    /// Store `name`, replacing any previous value.
    fn set(&self, name: &str) -> Result<()>;
}

/// Identity kept in a JSON preferences file.
///
/// The file holds a flat string map so other preferences can live beside
/// the user name without being clobbered. The name is read from disk once
/// and then served from memory; `set` keeps the cached copy current.
pub struct FileIdentityStore {
    path: PathBuf,
    write_lock: Mutex<()>,
    cached: RwLock<Option<Option<String>>>,
}

impl FileIdentityStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
            cached: RwLock::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => serde_json::from_str(&contents).map_err(|e| {
                AppError::Identity(format!("Corrupt preferences {}: {}", self.path.display(), e))
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(AppError::Identity(format!(
                "Failed to read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}

impl IdentityStore for FileIdentityStore {
    fn get(&self) -> Result<Option<String>> {
        if let Some(name) = self.cached.read().unwrap_or_else(PoisonError::into_inner).as_ref() {
            return Ok(name.clone());
        }

        let name = self.load()?.remove(USER_NAME_KEY);
        *self.cached.write().unwrap_or_else(PoisonError::into_inner) = Some(name.clone());
        Ok(name)
    }

    fn set(&self, name: &str) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut prefs = self.load()?;
        prefs.insert(USER_NAME_KEY.to_string(), name.to_string());

        let contents = serde_json::to_string_pretty(&prefs)
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;

        // Write beside the target and rename so a crash never leaves a
        // half-written preferences file.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, contents)
            .and_then(|()| fs::rename(&tmp, &self.path))
            .map_err(|e| {
                AppError::Identity(format!("Failed to write {}: {}", self.path.display(), e))
            })?;
        *self.cached.write().unwrap_or_else(PoisonError::into_inner) = Some(Some(name.to_string()));

        tracing::debug!(path = %self.path.display(), "Identity stored");
        Ok(())
    }
}

/// Identity held in memory only (tests, ephemeral sessions).
#[derive(Default)]
pub struct MemoryIdentityStore {
    name: RwLock<Option<String>>,
}

impl MemoryIdentityStore {
    pub fn with_name(name: &str) -> Self {
        Self {
            name: RwLock::new(Some(name.to_string())),
        }
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn get(&self) -> Result<Option<String>> {
        Ok(self
            .name
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn set(&self, name: &str) -> Result<()> {
        *self.name.write().unwrap_or_else(PoisonError::into_inner) = Some(name.to_string());
        Ok(())
    }
}
