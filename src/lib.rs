// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Device tracker: report a device's location, labelled with a user-chosen
//! name, to a shared remote datastore.
//!
//! The pipeline is a location source publishing fixes on a reporting
//! channel, consumed by an uploader that overwrites a single current-state
//! record. An activation controller gates the whole thing on identity,
//! service availability and permission.

pub mod channel;
pub mod config;
pub mod db;
pub mod error;
pub mod gates;
pub mod identity;
pub mod location;
pub mod models;
pub mod services;
pub mod time_utils;

use std::sync::Arc;

use channel::ReportingChannel;
use config::Config;
use services::{ActivationController, Uploader};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub channel: ReportingChannel,
    pub controller: Arc<ActivationController>,
    pub uploader: Arc<Uploader>,
}
