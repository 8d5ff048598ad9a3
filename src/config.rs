//! Application configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is honoured for local runs.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::location::{IntervalPolicy, Priority};

/// Default Firestore collection holding the current-state record.
pub const DEFAULT_COLLECTION: &str = "tracker";

/// Which remote datastore receives uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatastoreKind {
    Firestore,
    /// In-process store, nothing leaves the machine.
    Memory,
}

/// How the binary answers permission requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionMode {
    Granted,
    Denied,
    /// Ask on stdin and wait for an answer.
    Prompt,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// GCP project ID
    pub gcp_project_id: String,
    /// Firestore collection holding the `message` document
    pub collection: String,
    pub datastore: DatastoreKind,
    /// Preferences file holding the stored user name
    pub identity_path: PathBuf,
    /// Recorded track replayed by the location provider
    pub route_path: PathBuf,
    pub interval_policy: IntervalPolicy,
    pub permission: PermissionMode,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            gcp_project_id: "test-project".to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            datastore: DatastoreKind::Memory,
            identity_path: PathBuf::from("device_tracker_prefs.json"),
            route_path: PathBuf::from("data/route.geojson"),
            interval_policy: IntervalPolicy::default(),
            permission: PermissionMode::Granted,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let defaults = IntervalPolicy::default();
        let interval_policy = IntervalPolicy {
            interval: secs_var("FIX_INTERVAL_SECS", defaults.interval)?,
            fastest_interval: secs_var("FIX_FASTEST_INTERVAL_SECS", defaults.fastest_interval)?,
            priority: match env::var("FIX_PRIORITY") {
                Ok(v) => v
                    .parse::<Priority>()
                    .map_err(|_| ConfigError::Invalid("FIX_PRIORITY", v))?,
                Err(_) => defaults.priority,
            },
        };

        Ok(Self {
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            collection: env::var("TRACKER_COLLECTION")
                .unwrap_or_else(|_| DEFAULT_COLLECTION.to_string()),
            datastore: match env::var("TRACKER_DATASTORE").as_deref() {
                Err(_) | Ok("firestore") => DatastoreKind::Firestore,
                Ok("memory") => DatastoreKind::Memory,
                Ok(other) => return Err(ConfigError::Invalid("TRACKER_DATASTORE", other.into())),
            },
            identity_path: env::var("IDENTITY_PATH")
                .unwrap_or_else(|_| "device_tracker_prefs.json".to_string())
                .into(),
            route_path: env::var("ROUTE_PATH")
                .map_err(|_| ConfigError::Missing("ROUTE_PATH"))?
                .into(),
            interval_policy,
            permission: match env::var("LOCATION_PERMISSION").as_deref() {
                Err(_) | Ok("granted") => PermissionMode::Granted,
                Ok("denied") => PermissionMode::Denied,
                Ok("prompt") => PermissionMode::Prompt,
                Ok(other) => {
                    return Err(ConfigError::Invalid("LOCATION_PERMISSION", other.into()))
                }
            },
        })
    }
}

fn secs_var(name: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    match env::var(name) {
        Ok(v) => v
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| ConfigError::Invalid(name, v)),
        Err(_) => Ok(default),
    }
}

impl std::str::FromStr for Priority {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "high_accuracy" => Ok(Priority::HighAccuracy),
            "balanced" => Ok(Priority::Balanced),
            "low_power" => Ok(Priority::LowPower),
            _ => Err(()),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
