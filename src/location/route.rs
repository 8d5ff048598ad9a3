// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Location provider that replays a recorded track.

use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use futures_util::StreamExt;
use geo::{Coord, LineString, MultiLineString};
use geojson::GeoJson;
use tokio::time::{interval, Instant, MissedTickBehavior};

use super::{FixStream, IntervalPolicy, LocationProvider, Priority, SourceError};
use crate::models::LocationFix;
use crate::time_utils::to_chrono;

/// Replays the vertices of a track, one per interval, looping forever.
#[derive(Debug, Clone)]
pub struct RouteReplayProvider {
    route: LineString<f64>,
}

impl Default for RouteReplayProvider {
    fn default() -> Self {
        Self::new(LineString::new(vec![]))
    }
}

impl RouteReplayProvider {
    pub fn new(route: LineString<f64>) -> Self {
        Self { route }
    }

    /// Load a track from a file. `.geojson`/`.json` files are parsed as
    /// GeoJSON; anything else is read as an encoded polyline.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, RouteError> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|e| RouteError::IoError(e.to_string()))?;

        let is_geojson = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("geojson") || ext.eq_ignore_ascii_case("json"));

        let provider = if is_geojson {
            Self::load_from_json(&data)?
        } else {
            Self::from_polyline(data.trim())?
        };

        tracing::info!(
            path = %path.display(),
            points = provider.route.0.len(),
            "Loaded replay route"
        );
        Ok(provider)
    }

    /// Load a track from GeoJSON. Every `LineString`/`MultiLineString` found
    /// is joined, in document order, into one track.
    pub fn load_from_json(json_data: &str) -> Result<Self, RouteError> {
        let geojson: GeoJson = json_data
            .parse()
            .map_err(|e: geojson::Error| RouteError::ParseError(e.to_string()))?;

        let geometries: Vec<geojson::Value> = match geojson {
            GeoJson::Geometry(geom) => vec![geom.value],
            GeoJson::Feature(feature) => feature.geometry.into_iter().map(|g| g.value).collect(),
            GeoJson::FeatureCollection(collection) => collection
                .features
                .into_iter()
                .filter_map(|f| f.geometry)
                .map(|g| g.value)
                .collect(),
        };

        let mut coords: Vec<Coord<f64>> = Vec::new();
        for value in geometries {
            coords.extend(Self::convert_geometry(value)?);
        }

        if coords.is_empty() {
            return Err(RouteError::Empty);
        }
        Ok(Self::new(LineString::new(coords)))
    }

    /// Decode a Google encoded polyline (precision 5).
    pub fn from_polyline(encoded: &str) -> Result<Self, RouteError> {
        let line = polyline::decode_polyline(encoded, 5)
            .map_err(|e| RouteError::PolylineError(e.to_string()))?;
        if line.0.is_empty() {
            return Err(RouteError::Empty);
        }
        Ok(Self::new(line))
    }

    fn convert_geometry(value: geojson::Value) -> Result<Vec<Coord<f64>>, RouteError> {
        use std::convert::TryInto;

        let line_result: Result<LineString<f64>, _> = value.clone().try_into();
        if let Ok(line) = line_result {
            return Ok(line.0);
        }

        let multi_result: Result<MultiLineString<f64>, _> = value.try_into();
        if let Ok(multi) = multi_result {
            return Ok(multi.0.into_iter().flat_map(|l| l.0).collect());
        }

        Err(RouteError::UnsupportedGeometry)
    }

    pub fn route(&self) -> &LineString<f64> {
        &self.route
    }
}

impl LocationProvider for RouteReplayProvider {
    fn is_available(&self) -> bool {
        !self.route.0.is_empty()
    }

    fn open(&self, policy: &IntervalPolicy) -> Result<FixStream, SourceError> {
        if self.route.0.is_empty() {
            return Err(SourceError::Unavailable("replay route is empty".to_string()));
        }

        let coords: Vec<Coord<f64>> = self
            .route
            .0
            .iter()
            .map(|c| coarsen(*c, policy.priority))
            .collect();
        let period = policy.interval.max(Duration::from_millis(1));
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // Timestamps follow the runtime clock from a wall-clock origin.
        let origin = (Utc::now(), Instant::now());

        let stream = futures_util::stream::unfold((ticker, 0usize), move |(mut ticker, idx)| {
            let coord = coords[idx % coords.len()];
            async move {
                let tick = ticker.tick().await;
                let observed_at = origin.0 + to_chrono(tick.saturating_duration_since(origin.1));
                let fix = LocationFix::from((coord, observed_at));
                Some((fix, (ticker, idx.wrapping_add(1))))
            }
        });

        Ok(stream.boxed())
    }
}

/// Round a vertex to the precision a real provider would report at
/// `priority`: about 100 m for `Balanced`, about 10 km for `LowPower`.
fn coarsen(coord: Coord<f64>, priority: Priority) -> Coord<f64> {
    let scale = match priority {
        Priority::HighAccuracy => return coord,
        Priority::Balanced => 1e3,
        Priority::LowPower => 1e1,
    };
    Coord {
        x: (coord.x * scale).round() / scale,
        y: (coord.y * scale).round() / scale,
    }
}

/// Errors from route loading.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("Failed to read file: {0}")]
    IoError(String),

    #[error("Failed to parse GeoJSON: {0}")]
    ParseError(String),

    #[error("Unsupported geometry type (expected LineString or MultiLineString)")]
    UnsupportedGeometry,

    #[error("Failed to decode polyline: {0}")]
    PolylineError(String),

    #[error("Route has no points")]
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACK: &str = r#"{
        "type": "Feature",
        "properties": {},
        "geometry": {
            "type": "LineString",
            "coordinates": [[20.0, 10.0], [20.5, 10.5]]
        }
    }"#;

    #[test]
    fn test_load_geojson_feature() {
        let provider = RouteReplayProvider::load_from_json(TRACK).unwrap();
        assert_eq!(provider.route().0.len(), 2);
        assert_eq!(provider.route().0[0], Coord { x: 20.0, y: 10.0 });
        assert!(provider.is_available());
    }

    #[test]
    fn test_polygon_is_rejected() {
        let polygon = r#"{"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]]}"#;
        assert!(matches!(
            RouteReplayProvider::load_from_json(polygon),
            Err(RouteError::UnsupportedGeometry)
        ));
    }

    #[test]
    fn test_polyline_decodes_lat_lng() {
        // Canonical example from the polyline format documentation.
        let provider = RouteReplayProvider::from_polyline("_p~iF~ps|U_ulLnnqC_mqNvxq`@").unwrap();
        let first = provider.route().0[0];
        assert!((first.y - 38.5).abs() < 1e-6);
        assert!((first.x + 120.2).abs() < 1e-6);
        assert_eq!(provider.route().0.len(), 3);
    }

    #[test]
    fn test_empty_route_is_unavailable() {
        let provider = RouteReplayProvider::default();
        assert!(!provider.is_available());
        assert!(provider.open(&IntervalPolicy::default()).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_priority_coarsens_reported_fixes() {
        let provider = RouteReplayProvider::new(LineString::from(vec![(20.987654, 10.123456)]));

        let precise = IntervalPolicy::default();
        let fix = provider.open(&precise).unwrap().next().await.unwrap();
        assert_eq!((fix.latitude, fix.longitude), (10.123456, 20.987654));

        let balanced = IntervalPolicy {
            priority: Priority::Balanced,
            ..IntervalPolicy::default()
        };
        let fix = provider.open(&balanced).unwrap().next().await.unwrap();
        assert!((fix.latitude - 10.123).abs() < 1e-9);
        assert!((fix.longitude - 20.988).abs() < 1e-9);

        let low_power = IntervalPolicy {
            priority: Priority::LowPower,
            ..IntervalPolicy::default()
        };
        let fix = provider.open(&low_power).unwrap().next().await.unwrap();
        assert!((fix.latitude - 10.1).abs() < 1e-9);
        assert!((fix.longitude - 21.0).abs() < 1e-9);
        // The stored track itself is untouched.
        assert_eq!(provider.route().0[0], Coord { x: 20.987654, y: 10.123456 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_loops_and_restarts() {
        let provider = RouteReplayProvider::load_from_json(TRACK).unwrap();
        let policy = IntervalPolicy::default();

        let mut stream = provider.open(&policy).unwrap();
        let lats: Vec<f64> = (&mut stream).take(3).map(|f| f.latitude).collect().await;
        assert_eq!(lats, vec![10.0, 10.5, 10.0]);

        // A fresh open starts again from the first vertex.
        let mut again = provider.open(&policy).unwrap();
        assert_eq!(again.next().await.map(|f| f.latitude), Some(10.0));
    }
}
