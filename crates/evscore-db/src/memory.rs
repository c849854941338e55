//! In-process [`GeoStore`] for tests.
//!
//! Containment uses `geo` point-in-polygon on the isochrone and radius
//! searches use haversine distance, so results agree with PostGIS geography
//! predicates to within a few meters at city scale.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use evscore_core::{Amenity, ChargingStation, Coordinate, Isochrone};
use geo::{Distance, Haversine};

use crate::measure::check_radius;
use crate::store::GeoStore;
use crate::DbError;

/// Fixed rows served from memory.
///
/// [`MemoryGeoStore::unavailable`] builds a store whose every query fails
/// like an unreachable database.
#[derive(Debug, Default)]
pub struct MemoryGeoStore {
    stations: Vec<ChargingStation>,
    map_amenities: Vec<Amenity>,
    rated_restaurants: Vec<Amenity>,
    unavailable: bool,
    station_queries: AtomicUsize,
    amenity_queries: AtomicUsize,
}

impl MemoryGeoStore {
    #[must_use]
    pub fn new(
        stations: Vec<ChargingStation>,
        map_amenities: Vec<Amenity>,
        rated_restaurants: Vec<Amenity>,
    ) -> Self {
        Self {
            stations,
            map_amenities,
            rated_restaurants,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    /// Number of station containment queries served so far.
    pub fn station_queries(&self) -> usize {
        self.station_queries.load(Ordering::SeqCst)
    }

    /// Number of amenity radius queries served so far, both sources counted.
    pub fn amenity_queries(&self) -> usize {
        self.amenity_queries.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), DbError> {
        if self.unavailable {
            Err(DbError::Sqlx(sqlx::Error::PoolTimedOut))
        } else {
            Ok(())
        }
    }

    fn within(rows: &[Amenity], origin: Coordinate, radius_m: f64) -> Vec<Amenity> {
        let origin = origin.to_point();
        rows.iter()
            .filter(|a| {
                let point = geo::Point::new(a.longitude, a.latitude);
                Haversine.distance(origin, point) <= radius_m
            })
            .cloned()
            .collect()
    }
}

#[async_trait]
impl GeoStore for MemoryGeoStore {
    async fn find_stations_within(
        &self,
        area: &Isochrone,
    ) -> Result<Vec<ChargingStation>, DbError> {
        self.station_queries.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        Ok(self
            .stations
            .iter()
            .filter(|s| s.coordinate().is_ok_and(|c| area.contains(c)))
            .cloned()
            .collect())
    }

    async fn find_generic_amenities_within(
        &self,
        origin: Coordinate,
        radius_m: f64,
    ) -> Result<Vec<Amenity>, DbError> {
        self.amenity_queries.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        check_radius(radius_m)?;
        Ok(Self::within(&self.map_amenities, origin, radius_m))
    }

    async fn find_rated_restaurants_within(
        &self,
        origin: Coordinate,
        radius_m: f64,
    ) -> Result<Vec<Amenity>, DbError> {
        self.amenity_queries.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        check_radius(radius_m)?;
        Ok(Self::within(&self.rated_restaurants, origin, radius_m))
    }
}
