// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Location source: runs a provider in a background task and pushes its
//! fixes onto the reporting channel.

use std::sync::Arc;

use futures_util::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use super::{FixStream, IntervalPolicy, LocationProvider, SourceError};
use crate::channel::ReportingChannel;
use crate::time_utils::to_chrono;

/// Drives a [`LocationProvider`] and publishes its fixes.
pub struct LocationSource {
    provider: Arc<dyn LocationProvider>,
    channel: ReportingChannel,
    producer: Mutex<Option<JoinHandle<()>>>,
}

impl LocationSource {
    pub fn new(provider: Arc<dyn LocationProvider>, channel: ReportingChannel) -> Self {
        Self {
            provider,
            channel,
            producer: Mutex::new(None),
        }
    }

    pub fn channel(&self) -> &ReportingChannel {
        &self.channel
    }

    /// Start producing fixes. A no-op if already producing.
    pub async fn activate(&self, policy: &IntervalPolicy) -> Result<(), SourceError> {
        let mut producer = self.producer.lock().await;

        if let Some(handle) = producer.as_ref() {
            if !handle.is_finished() {
                tracing::debug!("Location source already active");
                return Ok(());
            }
            // The provider's sequence ended on its own; clean up before reopening.
            producer.take();
            self.provider.release();
        }

        if !self.provider.is_available() {
            return Err(SourceError::Unavailable(
                "provider reports no location service".to_string(),
            ));
        }

        let stream = self.provider.open(policy)?;
        let channel = self.channel.clone();
        let fastest = to_chrono(policy.fastest_interval);
        *producer = Some(tokio::spawn(produce(stream, channel, fastest)));

        tracing::info!(
            interval_ms = policy.interval.as_millis() as u64,
            priority = ?policy.priority,
            "Location source activated"
        );
        Ok(())
    }

    /// Stop producing fixes. Once this returns no further fix is published.
    /// Returns whether the source was running.
    pub async fn deactivate(&self) -> bool {
        let Some(handle) = self.producer.lock().await.take() else {
            return false;
        };

        handle.abort();
        // Joining guarantees the task is no longer inside `publish`.
        if let Err(e) = handle.await {
            if !e.is_cancelled() {
                tracing::warn!(error = %e, "Location producer task failed");
            }
        }
        self.provider.release();

        tracing::info!("Location source deactivated");
        true
    }

    pub async fn is_active(&self) -> bool {
        self.producer
            .lock()
            .await
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }
}

async fn produce(mut stream: FixStream, channel: ReportingChannel, fastest: chrono::Duration) {
    let mut last_observed = None;

    while let Some(fix) = stream.next().await {
        if let Some(last) = last_observed {
            if fix.observed_at - last < fastest {
                tracing::trace!("Dropping fix faster than fastest interval");
                continue;
            }
        }
        last_observed = Some(fix.observed_at);

        let delivered = channel.publish(fix);
        tracing::debug!(
            lat = fix.latitude,
            lng = fix.longitude,
            subscribers = delivered,
            "Published fix"
        );
    }

    tracing::info!("Location provider sequence ended");
}
