// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activation controller: the state machine deciding whether location
//! reporting runs.
//!
//! Start walks the gates in a fixed order:
//! 1. Reject a blank identity
//! 2. Store the identity
//! 3. Check that location services are usable
//! 4. Ask for permission (unbounded wait)
//! 5. Activate the location source
//!
//! Stop tears the source down and ends the session.

use std::sync::Arc;

use tokio::sync::{watch, Mutex};

use crate::error::AppError;
use crate::gates::{
    Availability, Capability, Notice, Notifier, PermissionAuthority, PermissionDecision,
    ServiceAvailability,
};
use crate::identity::IdentityStore;
use crate::location::{IntervalPolicy, LocationSource, SourceError};
use crate::models::ActivationState;

/// Why a start request did not reach [`ActivationState::Active`].
#[derive(Debug, thiserror::Error)]
pub enum ActivationError {
    #[error("Identity is blank")]
    BlankIdentity,

    #[error("Location services unavailable (resolvable: {resolvable}): {reason}")]
    ServiceUnavailable { resolvable: bool, reason: String },

    #[error("Location permission denied")]
    PermissionDenied,

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Identity(#[from] AppError),

    #[error("Session has ended")]
    SessionEnded,
}

impl ActivationError {
    /// Whether the session must end because of this error.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ActivationError::ServiceUnavailable {
                resolvable: false,
                ..
            }
        )
    }
}

pub struct ActivationController {
    source: Arc<LocationSource>,
    policy: IntervalPolicy,
    identity: Arc<dyn IdentityStore>,
    permissions: Arc<dyn PermissionAuthority>,
    availability: Arc<dyn ServiceAvailability>,
    notifier: Arc<dyn Notifier>,
    state: watch::Sender<ActivationState>,
    /// Held from the started check until the start claims `AwaitingPermission`.
    start_lock: Mutex<()>,
    /// Serializes source activation against teardown.
    source_lock: Mutex<()>,
}

impl ActivationController {
    pub fn new(
        source: Arc<LocationSource>,
        policy: IntervalPolicy,
        identity: Arc<dyn IdentityStore>,
        permissions: Arc<dyn PermissionAuthority>,
        availability: Arc<dyn ServiceAvailability>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (state, _) = watch::channel(ActivationState::Idle);
        Self {
            source,
            policy,
            identity,
            permissions,
            availability,
            notifier,
            state,
            start_lock: Mutex::new(()),
            source_lock: Mutex::new(()),
        }
    }

    pub fn state(&self) -> ActivationState {
        *self.state.borrow()
    }

    /// Observe state changes.
    pub fn watch_state(&self) -> watch::Receiver<ActivationState> {
        self.state.subscribe()
    }

    /// Move `from` -> `to` atomically. Returns false if the state was not `from`.
    fn transition(&self, from: ActivationState, to: ActivationState) -> bool {
        let moved = self.state.send_if_modified(|s| {
            if *s == from {
                *s = to;
                true
            } else {
                false
            }
        });
        if moved {
            tracing::info!(from = %from, to = %to, "Activation state changed");
        }
        moved
    }

    /// Start location reporting under `identity`.
    ///
    /// A start while already awaiting permission or active is a no-op that
    /// returns the current state.
    pub async fn start(&self, identity: &str) -> Result<ActivationState, ActivationError> {
        if identity.trim().is_empty() {
            self.notifier.notify(Notice::InvalidIdentity);
            return Err(ActivationError::BlankIdentity);
        }

        {
            // A concurrent start must not overwrite the identity of one that
            // is already past this point.
            let _guard = self.start_lock.lock().await;

            let current = self.state();
            if current.is_started() {
                tracing::debug!(state = %current, "Start ignored, already started");
                return Ok(current);
            }
            if current == ActivationState::Stopped {
                return Err(ActivationError::SessionEnded);
            }

            self.identity.set(identity)?;

            match self.availability.check() {
                Availability::Available => {}
                Availability::Resolvable(reason) => {
                    self.notifier.notify(Notice::ServiceResolvable(reason.clone()));
                    return Err(ActivationError::ServiceUnavailable {
                        resolvable: true,
                        reason,
                    });
                }
                Availability::Unavailable(reason) => {
                    self.notifier.notify(Notice::ServiceUnavailable(reason.clone()));
                    return Err(ActivationError::ServiceUnavailable {
                        resolvable: false,
                        reason,
                    });
                }
            }

            if !self.transition(ActivationState::Idle, ActivationState::AwaitingPermission) {
                // State moved while the gates were checked.
                return match self.state() {
                    ActivationState::Stopped => Err(ActivationError::SessionEnded),
                    state => Ok(state),
                };
            }
        }

        let decision = self.permissions.request(Capability::FineLocation).await;
        tracing::info!(?decision, "Permission answer received");

        match decision {
            PermissionDecision::Denied => {
                if self.transition(ActivationState::AwaitingPermission, ActivationState::Idle) {
                    self.notifier.notify(Notice::PermissionDenied);
                }
                Err(ActivationError::PermissionDenied)
            }
            PermissionDecision::Granted => self.activate_source().await,
        }
    }

    async fn activate_source(&self) -> Result<ActivationState, ActivationError> {
        let _guard = self.source_lock.lock().await;

        let current = self.state();
        if current != ActivationState::AwaitingPermission {
            tracing::info!(state = %current, "Permission granted after stop, ignoring");
            return match current {
                ActivationState::Stopped => Err(ActivationError::SessionEnded),
                state => Ok(state),
            };
        }

        match self.source.activate(&self.policy).await {
            Ok(()) => {
                self.transition(ActivationState::AwaitingPermission, ActivationState::Active);
                Ok(ActivationState::Active)
            }
            Err(e) => {
                self.transition(ActivationState::AwaitingPermission, ActivationState::Idle);
                self.notifier.notify(Notice::SourceUnavailable(e.to_string()));
                Err(e.into())
            }
        }
    }

    /// Re-enter the start path with the stored identity, if there is one.
    pub async fn resume(&self) -> Result<ActivationState, ActivationError> {
        match self.identity.get()? {
            Some(name) if !name.trim().is_empty() => self.start(&name).await,
            _ => {
                tracing::debug!("No stored identity, staying idle");
                Ok(self.state())
            }
        }
    }

    /// Stop location reporting and end the session. Safe in any state.
    pub async fn stop(&self) -> ActivationState {
        let _guard = self.source_lock.lock().await;

        self.source.deactivate().await;

        let current = self.state();
        match current {
            ActivationState::Active | ActivationState::AwaitingPermission => {
                self.transition(current, ActivationState::Stopped);
                ActivationState::Stopped
            }
            ActivationState::Idle | ActivationState::Stopped => {
                tracing::debug!(state = %current, "Stop with nothing running");
                current
            }
        }
    }
}
