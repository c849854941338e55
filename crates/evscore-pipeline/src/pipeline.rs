//! Entry points used by the HTTP handlers and the CLI.

use std::sync::Arc;
use std::time::Duration;

use evscore_core::{
    Amenity, AppConfig, Coordinate, FeatureCollection, ScoredStation, StationWithDistance,
};
use evscore_db::GeoStore;
use evscore_routing::RoutingService;

use crate::amenities::AmenityFinder;
use crate::assemble::{assemble_restaurants, assemble_scored_stations, assemble_stations};
use crate::error::PipelineError;
use crate::limiter::RoutingLimiter;
use crate::scorer::Scorer;
use crate::stations::StationFinder;

/// Back-off ceiling per retry, matching the routing client.
const MAX_BACKOFF_MS: u64 = 5_000;

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Routing calls in flight at once, across all stations of all requests
    /// sharing this pipeline.
    pub max_concurrent_routing: usize,
    /// Deadline for one routing call including the client's own retries.
    pub routing_call_timeout: Duration,
    /// Largest accepted search radius or isochrone range, in meters.
    pub max_search_distance_m: f64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_concurrent_routing: 16,
            routing_call_timeout: Duration::from_secs(30),
            max_search_distance_m: 100_000.0,
        }
    }
}

impl PipelineSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        let attempts = u64::from(config.routing_max_retries) + 1;
        let backoff_ms: u64 = (0..config.routing_max_retries)
            .map(|n| {
                config
                    .routing_retry_backoff_ms
                    .saturating_mul(1u64 << n.min(10))
                    .min(MAX_BACKOFF_MS)
            })
            .sum();
        // Jitter can stretch each back-off by a quarter.
        let backoff_ms = backoff_ms.saturating_add(backoff_ms / 4);

        Self {
            max_concurrent_routing: config.routing_max_concurrent.max(1),
            routing_call_timeout: Duration::from_secs(
                config.routing_timeout_secs.saturating_mul(attempts),
            )
            .checked_add(Duration::from_millis(backoff_ms))
            .unwrap_or(Duration::MAX),
            max_search_distance_m: config.max_search_distance_m,
        }
    }
}

/// Station search, scoring and amenity lookup over one routing engine and
/// one store.
#[derive(Clone)]
pub struct ScoringPipeline {
    stations: StationFinder,
    amenities: AmenityFinder,
    scorer: Scorer,
    settings: PipelineSettings,
}

impl ScoringPipeline {
    #[must_use]
    pub fn new(
        routing: Arc<dyn RoutingService>,
        store: Arc<dyn GeoStore>,
        settings: PipelineSettings,
    ) -> Self {
        let limiter = RoutingLimiter::new(
            settings.max_concurrent_routing,
            settings.routing_call_timeout,
        );
        let amenities = AmenityFinder::new(Arc::clone(&store));
        let stations = StationFinder::new(Arc::clone(&routing), store, limiter.clone());
        let scorer = Scorer::new(
            routing,
            amenities.clone(),
            limiter,
            settings.max_concurrent_routing,
        );
        Self {
            stations,
            amenities,
            scorer,
            settings,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Stations inside the `distance_m` isochrone, each with its routed distance.
    ///
    /// # Errors
    ///
    /// [`PipelineError::InvalidInput`] for a bad distance; otherwise see
    /// [`StationFinder::find_stations`].
    pub async fn stations(
        &self,
        route_point: Coordinate,
        distance_m: f64,
    ) -> Result<FeatureCollection<StationWithDistance>, PipelineError> {
        self.check_distance("distance", distance_m, false)?;
        let stations = self
            .stations
            .find_stations_with_distance(
                route_point,
                distance_m,
                self.settings.max_concurrent_routing,
            )
            .await?;
        tracing::info!(
            %route_point,
            distance_m,
            stations = stations.len(),
            "station search done"
        );
        Ok(assemble_stations(stations))
    }

    /// Score every station inside the `station_distance_m` isochrone, counting
    /// amenities within `amenity_distance_m` of each.
    ///
    /// # Errors
    ///
    /// [`PipelineError::InvalidInput`] for a bad distance,
    /// [`PipelineError::EmptyIsochrone`] / [`PipelineError::Routing`] if the
    /// reachable area cannot be determined, [`PipelineError::Store`] if any
    /// store query fails.
    pub async fn score_stations(
        &self,
        route_point: Coordinate,
        station_distance_m: f64,
        amenity_distance_m: f64,
    ) -> Result<FeatureCollection<ScoredStation>, PipelineError> {
        self.check_distance("station-distance", station_distance_m, false)?;
        self.check_distance("amenity-distance", amenity_distance_m, true)?;

        let search = self
            .stations
            .find_stations(route_point, station_distance_m)
            .await?;
        let candidates = search.stations.len();
        let scored = self
            .scorer
            .score_all(search.stations, route_point, amenity_distance_m)
            .await?;

        let unscored = scored.iter().filter(|s| !s.is_scored()).count();
        tracing::info!(
            %route_point,
            station_distance_m,
            amenity_distance_m,
            candidates,
            unscored,
            "station scoring done"
        );
        Ok(assemble_scored_stations(scored))
    }

    /// Amenities of both sources within `distance_m` of `station`.
    ///
    /// # Errors
    ///
    /// [`PipelineError::InvalidInput`] for a bad distance,
    /// [`PipelineError::Store`] if a query fails.
    pub async fn restaurants(
        &self,
        station: Coordinate,
        distance_m: f64,
    ) -> Result<FeatureCollection<Amenity>, PipelineError> {
        self.check_distance("distance", distance_m, true)?;
        let amenities = self.amenities.find_amenities(station, distance_m).await?;
        Ok(assemble_restaurants(amenities))
    }

    fn check_distance(
        &self,
        field: &str,
        value: f64,
        allow_zero: bool,
    ) -> Result<(), PipelineError> {
        let max = self.settings.max_search_distance_m;
        let positive = if allow_zero { value >= 0.0 } else { value > 0.0 };
        if value.is_finite() && value <= max && positive {
            Ok(())
        } else {
            Err(PipelineError::InvalidInput(format!(
                "{field} must be a number of meters in {}, {max}], got {value}",
                if allow_zero { "[0" } else { "(0" }
            )))
        }
    }
}
