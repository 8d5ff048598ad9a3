// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Activation state of the reporting pipeline.

use serde::Serialize;

/// Whether location reporting is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationState {
    /// Nothing running; start may be requested.
    #[default]
    Idle,
    /// Waiting on the permission authority.
    AwaitingPermission,
    /// Location source running and fixes flowing.
    Active,
    /// Session ended by the user.
    Stopped,
}

impl ActivationState {
    /// A start request in this state is a no-op.
    pub fn is_started(self) -> bool {
        matches!(self, Self::AwaitingPermission | Self::Active)
    }
}

impl std::fmt::Display for ActivationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::AwaitingPermission => "awaiting_permission",
            Self::Active => "active",
            Self::Stopped => "stopped",
        };
        f.write_str(s)
    }
}
