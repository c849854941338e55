//! Test double for [`RoutingService`].
//!
//! [`StubRouter`] answers route requests with haversine distance scaled by a
//! detour factor and isochrone requests with a fixed area, without any HTTP.
//! It also records call counts and peak concurrency so callers can assert on
//! fan-out behaviour.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use evscore_core::{Coordinate, Isochrone};
use geo::{Distance, Haversine};

use crate::error::RoutingError;
use crate::service::{RouteSummary, RoutingService};

/// Deterministic in-process router.
#[derive(Debug)]
pub struct StubRouter {
    isochrone: Isochrone,
    detour_factor: f64,
    unroutable: Vec<Coordinate>,
    isochrone_fails: bool,
    delay: Duration,
    route_calls: AtomicUsize,
    isochrone_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl StubRouter {
    /// Router whose isochrone is always `isochrone` and whose routes follow
    /// straight lines.
    #[must_use]
    pub fn new(isochrone: Isochrone) -> Self {
        Self {
            isochrone,
            detour_factor: 1.0,
            unroutable: Vec::new(),
            isochrone_fails: false,
            delay: Duration::ZERO,
            route_calls: AtomicUsize::new(0),
            isochrone_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Scale every straight-line distance, e.g. `1.3` for a typical road network.
    #[must_use]
    pub fn with_detour_factor(mut self, factor: f64) -> Self {
        self.detour_factor = factor;
        self
    }

    /// Any route touching `point` is rejected the way the engine rejects an
    /// off-network coordinate.
    #[must_use]
    pub fn unroutable_at(mut self, point: Coordinate) -> Self {
        self.unroutable.push(point);
        self
    }

    /// Every isochrone request fails with a 503.
    #[must_use]
    pub fn with_failing_isochrone(mut self) -> Self {
        self.isochrone_fails = true;
        self
    }

    /// Each route call sleeps this long before answering.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn route_calls(&self) -> usize {
        self.route_calls.load(Ordering::SeqCst)
    }

    pub fn isochrone_calls(&self) -> usize {
        self.isochrone_calls.load(Ordering::SeqCst)
    }

    /// Route calls currently running.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of route calls observed running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn is_unroutable(&self, point: Coordinate) -> bool {
        self.unroutable
            .iter()
            .any(|u| (u.lon() - point.lon()).abs() < 1e-9 && (u.lat() - point.lat()).abs() < 1e-9)
    }
}

/// Decrements the in-flight gauge even when the call is cancelled mid-sleep.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl RoutingService for StubRouter {
    async fn route(&self, waypoints: &[Coordinate]) -> Result<RouteSummary, RoutingError> {
        self.route_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if waypoints.len() < 2 {
            return Err(RoutingError::InvalidRequest(
                "a route needs at least two waypoints".to_owned(),
            ));
        }
        if waypoints.iter().any(|p| self.is_unroutable(*p)) {
            return Err(RoutingError::Rejected {
                status: 404,
                message: "Could not find routable point".to_owned(),
            });
        }

        let straight: f64 = waypoints
            .windows(2)
            .map(|pair| Haversine.distance(pair[0].to_point(), pair[1].to_point()))
            .sum();
        let distance_m = straight * self.detour_factor;

        Ok(RouteSummary {
            distance_m,
            duration_s: None,
            raw: serde_json::json!({
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "properties": {"summary": {"distance": distance_m}},
                    "geometry": {
                        "type": "LineString",
                        "coordinates": waypoints.iter().map(|p| [p.lon(), p.lat()]).collect::<Vec<_>>()
                    }
                }]
            }),
        })
    }

    async fn isochrone(
        &self,
        _origin: Coordinate,
        _range_m: f64,
    ) -> Result<Isochrone, RoutingError> {
        self.isochrone_calls.fetch_add(1, Ordering::SeqCst);
        if self.isochrone_fails {
            return Err(RoutingError::UpstreamStatus {
                status: 503,
                message: "isochrone service unavailable".to_owned(),
            });
        }
        Ok(self.isochrone.clone())
    }
}
