//! Candidate stations reachable from a route point.

use std::sync::Arc;

use evscore_core::{ChargingStation, Coordinate, Isochrone, StationWithDistance};
use evscore_db::GeoStore;
use evscore_routing::RoutingService;
use futures::stream::{self, StreamExt};

use crate::error::PipelineError;
use crate::limiter::RoutingLimiter;

/// Stations found inside one isochrone, with the area that selected them.
#[derive(Debug, Clone)]
pub struct StationSearch {
    pub isochrone: Isochrone,
    pub stations: Vec<ChargingStation>,
}

/// Finds stations by road reachability rather than straight-line radius.
#[derive(Clone)]
pub struct StationFinder {
    routing: Arc<dyn RoutingService>,
    store: Arc<dyn GeoStore>,
    limiter: RoutingLimiter,
}

impl StationFinder {
    #[must_use]
    pub fn new(
        routing: Arc<dyn RoutingService>,
        store: Arc<dyn GeoStore>,
        limiter: RoutingLimiter,
    ) -> Self {
        Self {
            routing,
            store,
            limiter,
        }
    }

    /// Request the isochrone around `route_point`, then the stations it contains.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::Routing`] if the isochrone request fails.
    /// - [`PipelineError::EmptyIsochrone`] if the engine returns no area.
    /// - [`PipelineError::Store`] if the containment query fails.
    pub async fn find_stations(
        &self,
        route_point: Coordinate,
        max_distance_m: f64,
    ) -> Result<StationSearch, PipelineError> {
        let isochrone = self
            .limiter
            .run(self.routing.isochrone(route_point, max_distance_m))
            .await?;

        if isochrone.is_empty() {
            tracing::warn!(%route_point, max_distance_m, "routing engine returned an empty isochrone");
            return Err(PipelineError::EmptyIsochrone {
                origin: route_point,
                range_m: max_distance_m,
            });
        }

        let stations = self.store.find_stations_within(&isochrone).await.map_err(|e| {
            tracing::error!(error = %e, "station containment query failed");
            PipelineError::Store(e)
        })?;

        tracing::debug!(%route_point, max_distance_m, found = stations.len(), "stations inside isochrone");
        Ok(StationSearch {
            isochrone,
            stations,
        })
    }

    /// [`Self::find_stations`] with each station's routed distance from the
    /// route point.
    ///
    /// A station that cannot be routed keeps `distance: None` and an `error`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::find_stations`].
    pub async fn find_stations_with_distance(
        &self,
        route_point: Coordinate,
        max_distance_m: f64,
        concurrency: usize,
    ) -> Result<Vec<StationWithDistance>, PipelineError> {
        let search = self.find_stations(route_point, max_distance_m).await?;

        let annotated = stream::iter(search.stations)
            .map(|station| async move {
                match self.route_distance(route_point, &station).await {
                    Ok(distance) => StationWithDistance {
                        station,
                        distance: Some(distance),
                        error: None,
                    },
                    Err(reason) => {
                        tracing::warn!(station_id = %station.id, error = %reason, "station routing failed");
                        StationWithDistance {
                            station,
                            distance: None,
                            error: Some(reason),
                        }
                    }
                }
            })
            .buffer_unordered(concurrency.max(1))
            .collect::<Vec<_>>()
            .await;

        Ok(annotated)
    }

    async fn route_distance(
        &self,
        route_point: Coordinate,
        station: &ChargingStation,
    ) -> Result<f64, String> {
        let target = station.coordinate().map_err(|e| e.to_string())?;
        self.limiter
            .run(self.routing.route(&[route_point, target]))
            .await
            .map(|summary| summary.distance_m)
            .map_err(|e| e.to_string())
    }
}
