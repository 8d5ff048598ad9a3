// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! External gates consulted before location reporting starts, and the
//! notice sink used to tell the user about the outcome.

use futures_util::future::BoxFuture;

/// Capabilities the pipeline asks the permission authority for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    FineLocation,
}

/// Answer from the permission authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionDecision {
    Granted,
    Denied,
}

/// Grants or denies access to location data.
///
/// `request` may wait indefinitely; the controller applies no timeout.
pub trait PermissionAuthority: Send + Sync {
    fn request(&self, capability: Capability) -> BoxFuture<'_, PermissionDecision>;
}

/// Permission authority with a fixed answer.
#[derive(Debug, Clone, Copy)]
pub struct StaticPermission(pub PermissionDecision);

impl PermissionAuthority for StaticPermission {
    fn request(&self, capability: Capability) -> BoxFuture<'_, PermissionDecision> {
        let decision = self.0;
        tracing::debug!(?capability, ?decision, "Static permission answer");
        Box::pin(async move { decision })
    }
}

/// Result of the location-services availability check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    Available,
    /// Unusable, but the user can fix it (e.g. enable location services).
    Resolvable(String),
    /// Unusable and not fixable from here.
    Unavailable(String),
}

/// Checks whether the location subsystem is usable.
pub trait ServiceAvailability: Send + Sync {
    fn check(&self) -> Availability;
}

/// User-visible notices raised by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Start was requested with a blank name.
    InvalidIdentity,
    PermissionDenied,
    /// Location services are unusable but the user can remedy it.
    ServiceResolvable(String),
    /// Location services are unusable; the session ends.
    ServiceUnavailable(String),
    /// The provider refused to start after permission was granted.
    SourceUnavailable(String),
}

impl Notice {
    /// Whether this notice ends the session.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Notice::ServiceUnavailable(_))
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notice::InvalidIdentity => f.write_str("Please enter a valid name"),
            Notice::PermissionDenied => f.write_str("Location permission not granted"),
            Notice::ServiceResolvable(reason) => {
                write!(f, "Location services need attention: {}", reason)
            }
            Notice::ServiceUnavailable(reason) => {
                write!(f, "Location services not available: {}", reason)
            }
            Notice::SourceUnavailable(reason) => {
                write!(f, "Location provider unavailable: {}", reason)
            }
        }
    }
}

/// Surface that shows notices to the user.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Notifier that writes notices to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        if notice.is_fatal() {
            tracing::error!(notice = %notice, "Fatal notice");
        } else {
            tracing::warn!(notice = %notice, "Notice");
        }
    }
}
