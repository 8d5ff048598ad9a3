// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Storage error types shared by the identity store and the datastore.

/// Application error type for storage-backed operations.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Identity store error: {0}")]
    Identity(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Whether this error came from the remote datastore.
    pub fn is_database_error(&self) -> bool {
        matches!(self, AppError::Database(_))
    }
}

/// Result type alias for storage operations
pub type Result<T> = std::result::Result<T, AppError>;
