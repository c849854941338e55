use serde::{Deserialize, Serialize};

use crate::geometry::Coordinate;
use crate::CoreError;

/// A charging station as stored; never mutated by the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargingStation {
    pub id: String,
    pub address: String,
    pub city: String,
    pub longitude: f64,
    pub latitude: f64,
    pub geometry: geojson::Geometry,
}

impl ChargingStation {
    /// # Errors
    ///
    /// Returns [`CoreError`] if the stored longitude/latitude are not a valid
    /// WGS84 position.
    pub fn coordinate(&self) -> Result<Coordinate, CoreError> {
        Coordinate::new(self.longitude, self.latitude)
    }
}

/// A candidate station annotated with its routed distance from the route point.
///
/// `distance` is `None` when routing to the station failed; `error` then says why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationWithDistance {
    #[serde(flatten)]
    pub station: ChargingStation,
    pub distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
