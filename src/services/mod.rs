// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - pipeline control and upload.

pub mod controller;
pub mod uploader;

pub use controller::{ActivationController, ActivationError};
pub use uploader::Uploader;
