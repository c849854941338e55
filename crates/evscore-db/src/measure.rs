//! Geometry measurements and the bars-per-city aggregate.

use sqlx::PgPool;
use thiserror::Error;

use crate::types::CityBarCountRow;
use crate::DbError;

/// Longest WKT accepted from a client, in bytes.
pub const MAX_WKT_LEN: usize = 64 * 1024;

const WKT_TYPES: [&str; 7] = [
    "POINT",
    "LINESTRING",
    "POLYGON",
    "MULTIPOINT",
    "MULTILINESTRING",
    "MULTIPOLYGON",
    "GEOMETRYCOLLECTION",
];

/// PostGIS reports WKT parse failures as an internal error.
const POSTGIS_PARSE_ERROR: &str = "XX000";

#[derive(Debug, Clone, Error, PartialEq)]
pub enum GeometryError {
    #[error("geometry text is empty")]
    Empty,

    #[error("geometry text is {len} bytes, limit is {max}")]
    TooLong { len: usize, max: usize },

    #[error("unsupported geometry type '{0}'")]
    UnknownType(String),

    #[error("unexpected character {0:?} in geometry text")]
    InvalidCharacter(char),

    #[error("unbalanced parentheses in geometry text")]
    Unbalanced,

    #[error("store rejected geometry: {0}")]
    Rejected(String),

    #[error("search radius must be a finite, non-negative number of meters, got {0}")]
    InvalidRadius(f64),
}

/// Cheap structural check on client-supplied WKT before it reaches the store.
///
/// Accepts the seven OGC geometry tags (case-insensitive) followed by a
/// parenthesised body or `EMPTY`. Returns the trimmed text.
///
/// # Errors
///
/// Returns the first [`GeometryError`] found.
pub fn validate_wkt(raw: &str) -> Result<&str, GeometryError> {
    let wkt = raw.trim();
    if wkt.is_empty() {
        return Err(GeometryError::Empty);
    }
    if wkt.len() > MAX_WKT_LEN {
        return Err(GeometryError::TooLong {
            len: wkt.len(),
            max: MAX_WKT_LEN,
        });
    }
    if let Some(bad) = wkt
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || " \t\r\n.,+-()".contains(*c)))
    {
        return Err(GeometryError::InvalidCharacter(bad));
    }

    let tag: String = wkt
        .chars()
        .take_while(char::is_ascii_alphabetic)
        .collect::<String>()
        .to_ascii_uppercase();
    if !WKT_TYPES.contains(&tag.as_str()) {
        return Err(GeometryError::UnknownType(tag));
    }

    let body = wkt[tag.len()..].trim_start();
    if body.eq_ignore_ascii_case("EMPTY") {
        return Ok(wkt);
    }
    if !body.starts_with('(') {
        return Err(GeometryError::Unbalanced);
    }

    let mut depth: i64 = 0;
    for c in body.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return Err(GeometryError::Unbalanced);
                }
            }
            _ => {}
        }
    }
    if depth != 0 || !body.ends_with(')') {
        return Err(GeometryError::Unbalanced);
    }

    Ok(wkt)
}

pub(crate) fn check_radius(radius_m: f64) -> Result<(), GeometryError> {
    if radius_m.is_finite() && radius_m >= 0.0 {
        Ok(())
    } else {
        Err(GeometryError::InvalidRadius(radius_m))
    }
}

/// Great-circle distance in meters between two WKT geometries in EPSG:4326.
///
/// # Errors
///
/// Returns [`DbError::InvalidGeometry`] if either text fails validation or
/// the store cannot parse it, and [`DbError::Sqlx`] for any other failure.
pub async fn geography_distance(pool: &PgPool, wkt_a: &str, wkt_b: &str) -> Result<f64, DbError> {
    let wkt_a = validate_wkt(wkt_a)?;
    let wkt_b = validate_wkt(wkt_b)?;

    let distance = sqlx::query_scalar::<_, Option<f64>>(
        "SELECT ST_Distance(ST_GeomFromText($1, 4326)::geography, \
                            ST_GeomFromText($2, 4326)::geography)",
    )
    .bind(wkt_a)
    .bind(wkt_b)
    .fetch_one(pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(POSTGIS_PARSE_ERROR) => {
            DbError::InvalidGeometry(GeometryError::Rejected(db.message().to_owned()))
        }
        other => DbError::Sqlx(other),
    })?;

    distance.ok_or_else(|| {
        DbError::InvalidGeometry(GeometryError::Rejected(
            "distance is undefined for empty geometries".to_owned(),
        ))
    })
}

/// Bars and pubs (points and polygons) per administrative area.
///
/// Areas are the level-6 boundary named `region` plus every level-8
/// boundary. Areas without bars are reported with a count of zero.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, or
/// [`DbError::MalformedRow`] for an area whose geometry cannot be parsed.
pub async fn count_bars_per_city(
    pool: &PgPool,
    region: &str,
) -> Result<Vec<CityBarCountRow>, DbError> {
    sqlx::query_as::<_, CityBarCountRow>(
        "WITH cities AS ( \
             SELECT osm_id, name, way AS geom \
             FROM planet_osm_polygon \
             WHERE admin_level = '6' AND name = $1 \
             UNION \
             SELECT osm_id, name, ST_Union(way) AS geom \
             FROM planet_osm_polygon \
             WHERE admin_level = '8' \
             GROUP BY osm_id, name \
         ), bars AS ( \
             SELECT osm_id, way AS geom FROM planet_osm_polygon \
             WHERE amenity IN ('bar', 'pub') \
             UNION \
             SELECT osm_id, way AS geom FROM planet_osm_point \
             WHERE amenity IN ('bar', 'pub') \
         ) \
         SELECT c.osm_id, c.name, ST_AsGeoJSON(c.geom) AS geometry, \
                COUNT(b.osm_id) AS numbars \
         FROM cities c \
         LEFT JOIN bars b ON ST_Contains(c.geom, b.geom) \
         GROUP BY c.osm_id, c.name, c.geom \
         ORDER BY c.name",
    )
    .bind(region)
    .fetch_all(pool)
    .await
    .map_err(DbError::from)
}
