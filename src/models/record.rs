// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Current-state record stored in the remote datastore.

use serde::{Deserialize, Serialize};

use super::LocationFix;

/// Label used when no identity has been stored.
pub const UNKNOWN_NAME: &str = "Unknown";

/// The single record overwritten on every upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteRecord {
    #[serde(rename = "Name")]
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

impl RemoteRecord {
    /// Build a record for `fix`, falling back to [`UNKNOWN_NAME`] for a
    /// missing or blank identity.
    pub fn labelled(identity: Option<&str>, fix: &LocationFix) -> Self {
        let name = identity
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(UNKNOWN_NAME);

        Self {
            name: name.to_string(),
            lat: fix.latitude,
            lng: fix.longitude,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_with_capitalized_name() {
        let record = RemoteRecord {
            name: "Alice".to_string(),
            lat: 10.0,
            lng: 20.0,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["Name"], "Alice");
        assert_eq!(json["lat"], 10.0);
        assert_eq!(json["lng"], 20.0);
        assert!(json.get("name").is_none());
    }

    #[test]
    fn test_labelled_falls_back_to_unknown() {
        let fix = LocationFix::now(1.0, 2.0);
        assert_eq!(RemoteRecord::labelled(None, &fix).name, UNKNOWN_NAME);
        assert_eq!(RemoteRecord::labelled(Some("  "), &fix).name, UNKNOWN_NAME);
        assert_eq!(RemoteRecord::labelled(Some("Bob"), &fix).name, "Bob");
    }
}
