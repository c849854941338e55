//! Request bodies sent to the routing engine.
//!
//! Each body is built fresh from validated inputs; the engine-specific fixed
//! fields (`location_type`, `range_type`) are set here and nowhere else.

use evscore_core::Coordinate;
use serde::Serialize;

use crate::error::RoutingError;

/// Body for `POST {base}/directions/{profile}/geojson`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectionsRequest {
    coordinates: Vec<[f64; 2]>,
}

impl DirectionsRequest {
    /// Waypoints are visited in the given order.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::InvalidRequest`] for fewer than two waypoints.
    pub fn new(waypoints: &[Coordinate]) -> Result<Self, RoutingError> {
        if waypoints.len() < 2 {
            return Err(RoutingError::InvalidRequest(format!(
                "a route needs at least two waypoints, got {}",
                waypoints.len()
            )));
        }
        Ok(Self {
            coordinates: waypoints.iter().map(|c| [c.lon(), c.lat()]).collect(),
        })
    }

    #[must_use]
    pub fn waypoint_count(&self) -> usize {
        self.coordinates.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationType {
    Start,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeType {
    Distance,
}

/// Body for `POST {base}/isochrones/{profile}/`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IsochroneRequest {
    locations: Vec<[f64; 2]>,
    range: Vec<f64>,
    location_type: LocationType,
    range_type: RangeType,
}

impl IsochroneRequest {
    /// Distance-ranged isochrones starting at each location.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::InvalidRequest`] when no location or range is
    /// given, or when a range is not a positive finite number of meters.
    pub fn new(locations: &[Coordinate], ranges_m: &[f64]) -> Result<Self, RoutingError> {
        if locations.is_empty() {
            return Err(RoutingError::InvalidRequest(
                "an isochrone needs at least one location".to_string(),
            ));
        }
        if ranges_m.is_empty() {
            return Err(RoutingError::InvalidRequest(
                "an isochrone needs at least one range".to_string(),
            ));
        }
        if let Some(bad) = ranges_m.iter().find(|r| !r.is_finite() || **r <= 0.0) {
            return Err(RoutingError::InvalidRequest(format!(
                "isochrone range must be a positive number of meters, got {bad}"
            )));
        }
        Ok(Self {
            locations: locations.iter().map(|c| [c.lon(), c.lat()]).collect(),
            range: ranges_m.to_vec(),
            location_type: LocationType::Start,
            range_type: RangeType::Distance,
        })
    }

    /// # Errors
    ///
    /// See [`IsochroneRequest::new`].
    pub fn single(origin: Coordinate, range_m: f64) -> Result<Self, RoutingError> {
        Self::new(&[origin], &[range_m])
    }
}
