//! Read operations for the two amenity sources.
//!
//! Generic amenities are OSM points tagged `amenity=*` in `planet_osm_point`;
//! rated restaurants live in `restaurants`. Both radius searches cast to
//! `geography`, so the radius is in meters on the spheroid.

use evscore_core::{Amenity, AmenityCategory, Coordinate};
use sqlx::PgPool;

use crate::measure::check_radius;
use crate::types::AmenityRow;
use crate::DbError;

/// Map amenities with one of the generic food and drink tags within `radius_m`.
///
/// # Errors
///
/// Returns [`DbError::InvalidGeometry`] for a negative or non-finite radius,
/// [`DbError::Sqlx`] if the query fails, or [`DbError::MalformedRow`] for a
/// row that cannot be converted.
pub async fn find_generic_amenities_within(
    pool: &PgPool,
    origin: Coordinate,
    radius_m: f64,
) -> Result<Vec<Amenity>, DbError> {
    check_radius(radius_m)?;

    let rows = sqlx::query_as::<_, AmenityRow>(
        "SELECT p.osm_id::text AS id, p.amenity AS category, \
                COALESCE(p.name, '') AS name, 0::float8 AS rating, \
                ST_X(p.way) AS longitude, ST_Y(p.way) AS latitude, \
                ST_AsGeoJSON(p.way) AS geometry \
         FROM planet_osm_point p \
         WHERE p.amenity = ANY($1) \
           AND ST_DWithin(p.way::geography, \
                          ST_SetSRID(ST_MakePoint($2, $3), 4326)::geography, $4)",
    )
    .bind(AmenityCategory::generic_tags())
    .bind(origin.lon())
    .bind(origin.lat())
    .bind(radius_m)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(Amenity::try_from).collect()
}

/// Restaurants from the rated dataset within `radius_m`.
///
/// # Errors
///
/// Same as [`find_generic_amenities_within`].
pub async fn find_rated_restaurants_within(
    pool: &PgPool,
    origin: Coordinate,
    radius_m: f64,
) -> Result<Vec<Amenity>, DbError> {
    check_radius(radius_m)?;

    let rows = sqlx::query_as::<_, AmenityRow>(
        "SELECT r.id, 'rated_restaurant'::text AS category, r.name, r.rating, \
                ST_X(r.geom) AS longitude, ST_Y(r.geom) AS latitude, \
                ST_AsGeoJSON(r.geom) AS geometry \
         FROM restaurants r \
         WHERE ST_DWithin(r.geom::geography, \
                          ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography, $3)",
    )
    .bind(origin.lon())
    .bind(origin.lat())
    .bind(radius_m)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(Amenity::try_from).collect()
}
