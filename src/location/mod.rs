// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Location acquisition: providers and the source that drives them.

pub mod route;
pub mod source;

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::BoxStream;

use crate::gates::{Availability, ServiceAvailability};
use crate::models::LocationFix;

pub use route::{RouteError, RouteReplayProvider};
pub use source::LocationSource;

/// Lazy, infinite sequence of fixes from a provider.
pub type FixStream = BoxStream<'static, LocationFix>;

/// Requested accuracy/power trade-off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    HighAccuracy,
    Balanced,
    LowPower,
}

/// How often, and how precisely, fixes are requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalPolicy {
    /// Desired spacing between fixes
    pub interval: Duration,
    /// Fixes arriving closer together than this are dropped
    pub fastest_interval: Duration,
    /// Lower priorities report coarser coordinates
    pub priority: Priority,
}

impl Default for IntervalPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            fastest_interval: Duration::from_secs(5),
            priority: Priority::HighAccuracy,
        }
    }
}

/// A platform (or simulated) location provider.
pub trait LocationProvider: Send + Sync {
    fn is_available(&self) -> bool {
        true
    }

    /// Start producing fixes. Each call starts a fresh sequence.
    fn open(&self, policy: &IntervalPolicy) -> Result<FixStream, SourceError>;

    /// Release provider resources after the stream has been dropped.
    fn release(&self) {}
}

/// Availability check backed by a provider's own report.
pub struct ProviderAvailability(pub Arc<dyn LocationProvider>);

impl ServiceAvailability for ProviderAvailability {
    fn check(&self) -> Availability {
        if self.0.is_available() {
            Availability::Available
        } else {
            Availability::Unavailable("no usable location provider".to_string())
        }
    }
}

/// Errors from the location source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Location provider unavailable: {0}")]
    Unavailable(String),
}
