// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Device Tracker
//!
//! Replays a recorded track as the device's location and reports each fix,
//! labelled with the user's name, to the shared datastore.
//!
//! Usage: `device-tracker [NAME]`. Without a name the stored one is used.
//! Ctrl-C stops reporting and ends the session.

use device_tracker::{
    channel::{ReportingChannel, Subscription},
    config::{Config, DatastoreKind, PermissionMode},
    db::{FirestoreDb, MemoryDb, RecordStore},
    gates::{
        Capability, PermissionAuthority, PermissionDecision, StaticPermission, TracingNotifier,
    },
    identity::FileIdentityStore,
    location::{LocationProvider, LocationSource, ProviderAvailability, RouteReplayProvider},
    services::{ActivationController, Uploader},
    time_utils::format_utc_rfc3339,
    AppState,
};
use futures_util::future::BoxFuture;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        route = %config.route_path.display(),
        datastore = ?config.datastore,
        "Starting Device Tracker"
    );

    // Remote datastore
    let store: Arc<dyn RecordStore> = match config.datastore {
        DatastoreKind::Firestore => {
            Arc::new(FirestoreDb::new(&config.gcp_project_id, &config.collection).await?)
        }
        DatastoreKind::Memory => {
            tracing::info!("Using in-memory datastore, nothing leaves this process");
            Arc::new(MemoryDb::new())
        }
    };

    // Location provider
    let provider: Arc<dyn LocationProvider> =
        Arc::new(RouteReplayProvider::load_from_file(&config.route_path)?);

    let permissions: Arc<dyn PermissionAuthority> = match config.permission {
        PermissionMode::Granted => Arc::new(StaticPermission(PermissionDecision::Granted)),
        PermissionMode::Denied => Arc::new(StaticPermission(PermissionDecision::Denied)),
        PermissionMode::Prompt => Arc::new(PromptPermission),
    };

    let identity = Arc::new(FileIdentityStore::new(&config.identity_path));
    let channel = ReportingChannel::default();
    let source = Arc::new(LocationSource::new(provider.clone(), channel.clone()));

    let controller = Arc::new(ActivationController::new(
        source,
        config.interval_policy,
        identity.clone(),
        permissions,
        Arc::new(ProviderAvailability(provider)),
        Arc::new(TracingNotifier),
    ));
    let uploader = Arc::new(Uploader::new(identity, store));

    let state = AppState {
        config,
        channel,
        controller,
        uploader,
    };

    // Consumers register before anything can be published.
    let display = spawn_display(state.channel.subscribe());
    let upload = state.uploader.clone().spawn(state.channel.subscribe());

    let started = match std::env::args().nth(1) {
        Some(name) => state.controller.start(&name).await,
        None => state.controller.resume().await,
    };

    match started {
        Ok(activation) => tracing::info!(state = %activation, "Start request handled"),
        Err(e) if e.is_fatal() => {
            tracing::error!(error = %e, "Location services unavailable, ending session");
            state.controller.stop().await;
            return Err(e.into());
        }
        Err(e) => tracing::warn!(error = %e, "Location reporting not started"),
    }

    tokio::signal::ctrl_c().await?;
    tracing::info!("Stop requested");

    let final_state = state.controller.stop().await;
    display.abort();
    upload.abort();

    tracing::info!(state = %final_state, "Session ended");
    Ok(())
}

/// Log each fix the way the app's location label shows it.
fn spawn_display(mut subscription: Subscription) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(fix) = subscription.recv().await {
            tracing::info!(
                observed_at = %format_utc_rfc3339(fix.observed_at),
                "Lat: {}, Lng: {}",
                fix.latitude,
                fix.longitude
            );
        }
    })
}

/// Asks the operator on stdin whether location access is allowed.
struct PromptPermission;

impl PermissionAuthority for PromptPermission {
    fn request(&self, capability: Capability) -> BoxFuture<'_, PermissionDecision> {
        Box::pin(async move {
            eprintln!("Allow {:?} access? [y/N]", capability);
            let mut line = String::new();
            let mut stdin = BufReader::new(tokio::io::stdin());
            match stdin.read_line(&mut line).await {
                Ok(_) if matches!(line.trim(), "y" | "Y" | "yes") => PermissionDecision::Granted,
                Ok(_) => PermissionDecision::Denied,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to read permission answer");
                    PermissionDecision::Denied
                }
            }
        })
    }
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("device_tracker=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
