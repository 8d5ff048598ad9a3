// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the reporting pipeline.

pub mod fix;
pub mod record;
pub mod state;

pub use fix::LocationFix;
pub use record::RemoteRecord;
pub use state::ActivationState;
