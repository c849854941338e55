use async_trait::async_trait;
use evscore_core::{Coordinate, Isochrone};

use crate::error::RoutingError;

/// Travel distance between waypoints as answered by the routing engine.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSummary {
    /// Road distance in meters; never negative.
    pub distance_m: f64,
    pub duration_s: Option<f64>,
    /// The engine's full GeoJSON answer.
    pub raw: serde_json::Value,
}

/// Road-network distances and reachable areas.
///
/// Implemented by [`crate::RoutingClient`] against an OpenRouteService-style
/// engine; tests substitute in-process fakes.
#[async_trait]
pub trait RoutingService: Send + Sync {
    /// Route through `waypoints` in order using the configured profile.
    async fn route(&self, waypoints: &[Coordinate]) -> Result<RouteSummary, RoutingError>;

    /// Area reachable from `origin` within `range_m` meters of road travel.
    async fn isochrone(&self, origin: Coordinate, range_m: f64)
        -> Result<Isochrone, RoutingError>;
}
