//! Row types for the station, amenity and region queries.
//!
//! Geometry is selected as `ST_AsGeoJSON` text and parsed here, so callers
//! only ever see `geojson` values.

use evscore_core::{Amenity, AmenityCategory, ChargingStation};

use crate::DbError;

/// A row from `charging_stations`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StationRow {
    pub id: String,
    pub address: String,
    pub city: String,
    pub longitude: f64,
    pub latitude: f64,
    /// `ST_AsGeoJSON(geom)`.
    pub geometry: String,
}

impl TryFrom<StationRow> for ChargingStation {
    type Error = DbError;

    fn try_from(row: StationRow) -> Result<Self, Self::Error> {
        let geometry = parse_geometry("charging_stations", &row.geometry)?;
        Ok(ChargingStation {
            id: row.id,
            address: row.address,
            city: row.city,
            longitude: row.longitude,
            latitude: row.latitude,
            geometry,
        })
    }
}

/// A row from either amenity source, already shaped to the shared columns.
///
/// Map amenities select their OSM `amenity` tag as `category` and a literal
/// `0` rating; rated restaurants select the literal `rated_restaurant`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AmenityRow {
    pub id: String,
    pub category: String,
    pub name: String,
    pub rating: f64,
    pub longitude: f64,
    pub latitude: f64,
    pub geometry: String,
}

impl TryFrom<AmenityRow> for Amenity {
    type Error = DbError;

    fn try_from(row: AmenityRow) -> Result<Self, Self::Error> {
        let category =
            AmenityCategory::parse(&row.category).map_err(|e| DbError::MalformedRow {
                table: "amenities",
                reason: e.to_string(),
            })?;
        let geometry = parse_geometry("amenities", &row.geometry)?;
        Ok(Amenity {
            id: row.id,
            category,
            name: row.name,
            rating: row.rating,
            longitude: row.longitude,
            latitude: row.latitude,
            geometry,
        })
    }
}

/// Number of bars and pubs inside one administrative area.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CityBarCountRow {
    pub osm_id: i64,
    pub name: Option<String>,
    pub geometry: String,
    pub numbars: i64,
}

impl CityBarCountRow {
    /// GeoJSON feature with `name` and `numbars` properties, keyed by OSM id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::MalformedRow`] if the stored geometry is not GeoJSON.
    pub fn into_feature(self) -> Result<geojson::Feature, DbError> {
        let geometry = parse_geometry("planet_osm_polygon", &self.geometry)?;
        let mut properties = serde_json::Map::new();
        properties.insert(
            "name".to_string(),
            self.name.map_or(serde_json::Value::Null, serde_json::Value::from),
        );
        #[allow(clippy::cast_precision_loss)]
        properties.insert(
            "numbars".to_string(),
            serde_json::Value::from(self.numbars as f64),
        );
        Ok(geojson::Feature {
            bbox: None,
            geometry: Some(geometry),
            id: Some(geojson::feature::Id::Number(self.osm_id.into())),
            properties: Some(properties),
            foreign_members: None,
        })
    }
}

fn parse_geometry(table: &'static str, raw: &str) -> Result<geojson::Geometry, DbError> {
    raw.parse::<geojson::Geometry>()
        .map_err(|e| DbError::MalformedRow {
            table,
            reason: format!("geometry is not GeoJSON: {e}"),
        })
}
