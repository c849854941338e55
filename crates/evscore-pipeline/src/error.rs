use evscore_core::Coordinate;
use evscore_db::DbError;
use evscore_routing::RoutingError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Request values outside what the pipeline accepts; nothing was called.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The routing engine failed on a call the request cannot do without.
    #[error("routing failed: {0}")]
    Routing(#[from] RoutingError),

    #[error("store query failed: {0}")]
    Store(#[from] DbError),

    /// The engine answered, but with no reachable area at all.
    #[error("routing engine returned an empty isochrone for {origin} within {range_m} m")]
    EmptyIsochrone { origin: Coordinate, range_m: f64 },
}
