// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore-backed record store.
//!
//! Records live as documents of a single collection; the record path is the
//! document ID.

use futures_util::future::BoxFuture;

use super::RecordStore;
use crate::error::{AppError, Result};
use crate::models::RemoteRecord;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
    collection: String,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str, collection: &str) -> Result<Self> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id, collection).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, collection, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
            collection: collection.to_string(),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str, collection: &str) -> Result<Self> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            collection,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
            collection: collection.to_string(),
        })
    }

    /// Create a disconnected client (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self {
            client: None,
            collection: crate::config::DEFAULT_COLLECTION.to_string(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// Overwrite the document at `path` with `record`.
    pub async fn set_record(&self, path: &str, record: &RemoteRecord) -> Result<()> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(&self.collection)
            .document_id(path)
            .object(record)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Read the document at `path`.
    pub async fn get_record(&self, path: &str) -> Result<Option<RemoteRecord>> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(&self.collection)
            .obj()
            .one(path)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

impl RecordStore for FirestoreDb {
    fn put(&self, path: &str, record: &RemoteRecord) -> BoxFuture<'static, Result<()>> {
        let db = self.clone();
        let path = path.to_string();
        let record = record.clone();
        Box::pin(async move { db.set_record(&path, &record).await })
    }

    fn get(&self, path: &str) -> BoxFuture<'static, Result<Option<RemoteRecord>>> {
        let db = self.clone();
        let path = path.to_string();
        Box::pin(async move { db.get_record(&path).await })
    }
}
