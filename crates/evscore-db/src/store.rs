use async_trait::async_trait;
use evscore_core::{merge_amenities, Amenity, ChargingStation, Coordinate, Isochrone};
use sqlx::PgPool;

use crate::types::CityBarCountRow;
use crate::{amenities, measure, stations, DbError};

/// Spatial lookups the scoring pipeline needs from the store.
///
/// [`PgGeoStore`] answers them from PostGIS; `memory::MemoryGeoStore`
/// (feature `test-support`) answers them from in-process vectors.
#[async_trait]
pub trait GeoStore: Send + Sync {
    async fn find_stations_within(&self, area: &Isochrone)
        -> Result<Vec<ChargingStation>, DbError>;

    async fn find_generic_amenities_within(
        &self,
        origin: Coordinate,
        radius_m: f64,
    ) -> Result<Vec<Amenity>, DbError>;

    async fn find_rated_restaurants_within(
        &self,
        origin: Coordinate,
        radius_m: f64,
    ) -> Result<Vec<Amenity>, DbError>;

    /// Both sources queried concurrently, merged and deduplicated.
    async fn find_amenities_within(
        &self,
        origin: Coordinate,
        radius_m: f64,
    ) -> Result<Vec<Amenity>, DbError> {
        let (map, rated) = futures::try_join!(
            self.find_generic_amenities_within(origin, radius_m),
            self.find_rated_restaurants_within(origin, radius_m),
        )?;
        Ok(merge_amenities(map, rated))
    }
}

/// [`GeoStore`] over a pooled PostGIS connection.
#[derive(Debug, Clone)]
pub struct PgGeoStore {
    pool: PgPool,
}

impl PgGeoStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// See [`measure::geography_distance`].
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidGeometry`] for bad WKT, [`DbError::Sqlx`] otherwise.
    pub async fn geography_distance(&self, wkt_a: &str, wkt_b: &str) -> Result<f64, DbError> {
        measure::geography_distance(&self.pool, wkt_a, wkt_b).await
    }

    /// See [`measure::count_bars_per_city`].
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the aggregate query fails.
    pub async fn count_bars_per_city(&self, region: &str) -> Result<Vec<CityBarCountRow>, DbError> {
        measure::count_bars_per_city(&self.pool, region).await
    }
}

#[async_trait]
impl GeoStore for PgGeoStore {
    async fn find_stations_within(
        &self,
        area: &Isochrone,
    ) -> Result<Vec<ChargingStation>, DbError> {
        stations::find_stations_within(&self.pool, area).await
    }

    async fn find_generic_amenities_within(
        &self,
        origin: Coordinate,
        radius_m: f64,
    ) -> Result<Vec<Amenity>, DbError> {
        amenities::find_generic_amenities_within(&self.pool, origin, radius_m).await
    }

    async fn find_rated_restaurants_within(
        &self,
        origin: Coordinate,
        radius_m: f64,
    ) -> Result<Vec<Amenity>, DbError> {
        amenities::find_rated_restaurants_within(&self.pool, origin, radius_m).await
    }
}
