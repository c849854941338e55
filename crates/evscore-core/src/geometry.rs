//! Coordinates and reachable-area polygons.

use geo::{Contains, MultiPolygon, Point};
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// A WGS84 position. Serialized as a GeoJSON-style `[lon, lat]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinate {
    lon: f64,
    lat: f64,
}

impl Coordinate {
    /// Build a validated coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError`] when either value is not finite or falls outside
    /// the WGS84 range.
    pub fn new(lon: f64, lat: f64) -> Result<Self, CoreError> {
        if !lon.is_finite() || !lat.is_finite() {
            return Err(CoreError::NonFiniteCoordinate { lon, lat });
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(CoreError::LongitudeOutOfRange(lon));
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(CoreError::LatitudeOutOfRange(lat));
        }
        Ok(Self { lon, lat })
    }

    #[must_use]
    pub fn lon(self) -> f64 {
        self.lon
    }

    #[must_use]
    pub fn lat(self) -> f64 {
        self.lat
    }

    #[must_use]
    pub fn to_point(self) -> Point<f64> {
        Point::new(self.lon, self.lat)
    }
}

impl TryFrom<[f64; 2]> for Coordinate {
    type Error = CoreError;

    fn try_from([lon, lat]: [f64; 2]) -> Result<Self, Self::Error> {
        Self::new(lon, lat)
    }
}

impl From<Coordinate> for [f64; 2] {
    fn from(value: Coordinate) -> Self {
        [value.lon, value.lat]
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.lon, self.lat)
    }
}

/// Area reachable from an origin within a travel-distance budget.
///
/// Held as a multipolygon so single-ring and multi-ring engine answers share
/// one representation. An isochrone with no polygons is valid but empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Isochrone {
    area: MultiPolygon<f64>,
}

impl Isochrone {
    #[must_use]
    pub fn new(area: MultiPolygon<f64>) -> Self {
        Self { area }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self {
            area: MultiPolygon::new(Vec::new()),
        }
    }

    /// Collect every polygon of a GeoJSON feature collection into one area.
    ///
    /// Features without geometry are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnsupportedIsochroneGeometry`] for any geometry
    /// that is not a polygon or multipolygon.
    pub fn from_feature_collection(
        collection: &geojson::FeatureCollection,
    ) -> Result<Self, CoreError> {
        let mut polygons = Vec::new();
        for geometry in collection.features.iter().filter_map(|f| f.geometry.as_ref()) {
            match &geometry.value {
                geojson::Value::Polygon(_) | geojson::Value::MultiPolygon(_) => {
                    let converted = geo::Geometry::<f64>::try_from(geometry.value.clone())
                        .map_err(|e| CoreError::UnsupportedIsochroneGeometry(e.to_string()))?;
                    match converted {
                        geo::Geometry::Polygon(p) => polygons.push(p),
                        geo::Geometry::MultiPolygon(mp) => polygons.extend(mp.0),
                        other => {
                            return Err(CoreError::UnsupportedIsochroneGeometry(format!(
                                "{other:?}"
                            )))
                        }
                    }
                }
                other => {
                    return Err(CoreError::UnsupportedIsochroneGeometry(
                        geojson_type_name(other).to_string(),
                    ))
                }
            }
        }
        Ok(Self::new(MultiPolygon::new(polygons)))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.area.0.is_empty()
    }

    #[must_use]
    pub fn area(&self) -> &MultiPolygon<f64> {
        &self.area
    }

    #[must_use]
    pub fn contains(&self, coordinate: Coordinate) -> bool {
        self.area.contains(&coordinate.to_point())
    }

    /// GeoJSON text of the area, suitable for binding to `ST_GeomFromGeoJSON`.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if the geometry cannot be encoded.
    pub fn to_geojson_string(&self) -> Result<String, serde_json::Error> {
        let geometry = geojson::Geometry::new(geojson::Value::from(&self.area));
        serde_json::to_string(&geometry)
    }
}

fn geojson_type_name(value: &geojson::Value) -> &'static str {
    match value {
        geojson::Value::Point(_) => "Point",
        geojson::Value::MultiPoint(_) => "MultiPoint",
        geojson::Value::LineString(_) => "LineString",
        geojson::Value::MultiLineString(_) => "MultiLineString",
        geojson::Value::Polygon(_) => "Polygon",
        geojson::Value::MultiPolygon(_) => "MultiPolygon",
        geojson::Value::GeometryCollection(_) => "GeometryCollection",
    }
}
