//! Read-only PostGIS access for charging stations and amenities.
//!
//! The schema itself is owned by the bulk loader; every geometry column is
//! expected in EPSG:4326. All queries bind their inputs as parameters.

use std::time::Duration;

use evscore_core::AppConfig;
use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;

mod amenities;
mod measure;
#[cfg(any(test, feature = "test-support"))]
pub mod memory;
mod stations;
mod store;
mod types;

pub use amenities::{find_generic_amenities_within, find_rated_restaurants_within};
pub use measure::{count_bars_per_city, geography_distance, validate_wkt, GeometryError};
pub use stations::find_stations_within;
pub use store::{GeoStore, PgGeoStore};
pub use types::{AmenityRow, CityBarCountRow, StationRow};

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_MIN_CONNECTIONS: u32 = 1;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: DEFAULT_MIN_CONNECTIONS,
            acquire_timeout_secs: DEFAULT_ACQUIRE_TIMEOUT_SECS,
        }
    }
}

impl PoolConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_connections: config.db_max_connections,
            min_connections: config.db_min_connections,
            acquire_timeout_secs: config.db_acquire_timeout_secs,
        }
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    /// Geometry or radius input refused before (or by) the store.
    #[error(transparent)]
    InvalidGeometry(#[from] GeometryError),

    /// A stored row could not be turned into a domain value.
    #[error("malformed row in {table}: {reason}")]
    MalformedRow { table: &'static str, reason: String },

    #[error("cannot encode search area: {0}")]
    EncodeArea(#[from] serde_json::Error),
}

impl DbError {
    /// True when the caller supplied bad input rather than the store failing.
    #[must_use]
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, DbError::InvalidGeometry(_))
    }
}

/// Connect to a Postgres pool using explicit URL and config.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the connection cannot be established.
pub async fn connect_pool(database_url: &str, config: PoolConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(database_url)
        .await
}

/// Build a pool that connects on first use.
///
/// Lets the server start while the store is still coming up; `/health`
/// reports the database state.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if `database_url` cannot be parsed.
pub fn connect_pool_lazy(database_url: &str, config: PoolConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect_lazy(database_url)
}

/// Send a `SELECT 1` to verify the pool has a live connection.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await?;
    Ok(())
}

/// Ping the pool and confirm PostGIS is installed.
///
/// # Errors
///
/// Returns [`DbError`] if either query fails.
pub async fn health_check(pool: &PgPool) -> Result<String, DbError> {
    ping(pool).await?;
    let version = sqlx::query_scalar::<_, String>("SELECT postgis_lib_version()")
        .fetch_one(pool)
        .await?;
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_config_has_sane_defaults() {
        let config = PoolConfig::default();

        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(config.min_connections, DEFAULT_MIN_CONNECTIONS);
        assert_eq!(config.acquire_timeout_secs, DEFAULT_ACQUIRE_TIMEOUT_SECS);
    }

    #[test]
    fn geometry_errors_count_as_invalid_input() {
        let err = DbError::from(GeometryError::Empty);
        assert!(err.is_invalid_input());
        assert!(!DbError::MalformedRow {
            table: "charging_stations",
            reason: "x".to_string()
        }
        .is_invalid_input());
    }
}
