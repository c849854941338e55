//! Per-station scoring: routed station distance, nearby amenities and their
//! routed distances, folded into one desirability score.

use std::sync::Arc;

use evscore_core::{Amenity, ChargingStation, Coordinate, ScoredAmenity, ScoredStation};
use evscore_routing::{RoutingError, RoutingService};
use futures::stream::{self, StreamExt, TryStreamExt};

use crate::amenities::AmenityFinder;
use crate::error::PipelineError;
use crate::limiter::RoutingLimiter;

/// Scores stations against a route point.
///
/// Failure policy:
/// - a station that cannot be routed is returned unscored with its reason;
/// - an amenity that cannot be routed is left out, logged, and counted in
///   `skipped_amenities`;
/// - a store failure aborts the whole request.
#[derive(Clone)]
pub struct Scorer {
    routing: Arc<dyn RoutingService>,
    amenities: AmenityFinder,
    limiter: RoutingLimiter,
    concurrency: usize,
}

impl Scorer {
    /// `concurrency` caps how many stations, and how many amenities per
    /// station, are in progress at once; the limiter caps the total calls.
    #[must_use]
    pub fn new(
        routing: Arc<dyn RoutingService>,
        amenities: AmenityFinder,
        limiter: RoutingLimiter,
        concurrency: usize,
    ) -> Self {
        Self {
            routing,
            amenities,
            limiter,
            concurrency: concurrency.max(1),
        }
    }

    /// # Errors
    ///
    /// Returns [`PipelineError::Store`] if the amenity search fails.
    pub async fn score(
        &self,
        station: ChargingStation,
        route_point: Coordinate,
        amenity_radius_m: f64,
    ) -> Result<ScoredStation, PipelineError> {
        let location = match station.coordinate() {
            Ok(location) => location,
            Err(e) => {
                tracing::warn!(station_id = %station.id, error = %e, "station has an invalid position");
                return Ok(ScoredStation::unscored(station, e.to_string()));
            }
        };

        // Station distance and amenity search do not depend on each other.
        let (station_distance, nearby) = futures::join!(
            self.route_distance(route_point, location),
            self.amenities.find_amenities(location, amenity_radius_m),
        );
        let nearby = nearby?;

        let station_distance = match station_distance {
            Ok(distance) => distance,
            Err(e) => {
                tracing::warn!(station_id = %station.id, error = %e, "station routing failed, returning unscored");
                return Ok(ScoredStation::unscored(station, e.to_string()));
            }
        };

        let (mut close, skipped) = self.route_amenities(&station, location, nearby).await;
        close.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.amenity.id.cmp(&b.amenity.id))
        });

        let scored = ScoredStation::scored(station, station_distance, close, skipped);
        tracing::debug!(
            station_id = %scored.station.id,
            distance = station_distance,
            amenities = scored.close_restaurants.len(),
            skipped,
            score = scored.score,
            "station scored"
        );
        Ok(scored)
    }

    /// Score every station concurrently. Output order is not significant.
    ///
    /// # Errors
    ///
    /// Returns the first [`PipelineError::Store`]; outstanding work is dropped.
    pub async fn score_all(
        &self,
        stations: Vec<ChargingStation>,
        route_point: Coordinate,
        amenity_radius_m: f64,
    ) -> Result<Vec<ScoredStation>, PipelineError> {
        stream::iter(stations)
            .map(|station| self.score(station, route_point, amenity_radius_m))
            .buffer_unordered(self.concurrency)
            .try_collect()
            .await
    }

    async fn route_amenities(
        &self,
        station: &ChargingStation,
        location: Coordinate,
        nearby: Vec<Amenity>,
    ) -> (Vec<ScoredAmenity>, usize) {
        let outcomes = stream::iter(nearby)
            .map(|amenity| async move {
                let routed = match amenity.coordinate() {
                    Ok(target) => self.route_distance(location, target).await,
                    Err(e) => Err(RoutingError::InvalidRequest(e.to_string())),
                };
                (amenity, routed)
            })
            .buffer_unordered(self.concurrency)
            .collect::<Vec<_>>()
            .await;

        let mut close = Vec::with_capacity(outcomes.len());
        let mut skipped = 0usize;
        for (amenity, routed) in outcomes {
            match routed {
                Ok(distance) => close.push(ScoredAmenity { amenity, distance }),
                Err(e) => {
                    skipped += 1;
                    tracing::warn!(
                        station_id = %station.id,
                        amenity_id = %amenity.id,
                        error = %e,
                        "amenity routing failed, skipping"
                    );
                }
            }
        }
        (close, skipped)
    }

    async fn route_distance(&self, from: Coordinate, to: Coordinate) -> Result<f64, RoutingError> {
        self.limiter
            .run(self.routing.route(&[from, to]))
            .await
            .map(|summary| summary.distance_m)
    }
}

#[cfg(test)]
#[path = "scorer_test.rs"]
mod tests;
