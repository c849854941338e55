//! Read operations for the `charging_stations` table.

use evscore_core::{ChargingStation, Isochrone};
use sqlx::PgPool;

use crate::types::StationRow;
use crate::DbError;

/// Stations whose point geometry lies inside `area`.
///
/// The area is bound as GeoJSON and tagged EPSG:4326 so the containment test
/// runs in the stored reference system. An empty area matches nothing and
/// skips the round trip.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, or
/// [`DbError::MalformedRow`] for a row whose geometry cannot be parsed.
pub async fn find_stations_within(
    pool: &PgPool,
    area: &Isochrone,
) -> Result<Vec<ChargingStation>, DbError> {
    if area.is_empty() {
        return Ok(Vec::new());
    }
    let area_geojson = area.to_geojson_string()?;

    let rows = sqlx::query_as::<_, StationRow>(
        "SELECT cs.id, cs.address, cs.city, \
                ST_X(cs.geom) AS longitude, ST_Y(cs.geom) AS latitude, \
                ST_AsGeoJSON(cs.geom) AS geometry \
         FROM charging_stations cs \
         WHERE ST_Contains(ST_SetSRID(ST_GeomFromGeoJSON($1), 4326), cs.geom) \
         ORDER BY cs.id",
    )
    .bind(area_geojson)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(ChargingStation::try_from).collect()
}
