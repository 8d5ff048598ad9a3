// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Location fix produced by the location source.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single timestamped position observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    /// Latitude in degrees (WGS84)
    pub latitude: f64,
    /// Longitude in degrees (WGS84)
    pub longitude: f64,
    /// When the provider observed this position
    pub observed_at: DateTime<Utc>,
}

impl LocationFix {
    pub fn new(latitude: f64, longitude: f64, observed_at: DateTime<Utc>) -> Self {
        Self {
            latitude,
            longitude,
            observed_at,
        }
    }

    /// Fix observed now.
    pub fn now(latitude: f64, longitude: f64) -> Self {
        Self::new(latitude, longitude, Utc::now())
    }
}

/// Geo coordinates carry longitude in `x` and latitude in `y`.
impl From<(geo::Coord<f64>, DateTime<Utc>)> for LocationFix {
    fn from((coord, observed_at): (geo::Coord<f64>, DateTime<Utc>)) -> Self {
        Self::new(coord.y, coord.x, observed_at)
    }
}
