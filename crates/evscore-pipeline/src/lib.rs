//! Station search and scoring over a routing engine and a spatial store.
//!
//! [`ScoringPipeline`] is the entry point: it validates request distances,
//! asks the routing engine for the reachable area around a route point,
//! selects the stations inside it, then routes to each station and to the
//! amenities around it to compute a score. All routing calls made through one
//! pipeline share a [`RoutingLimiter`].

pub mod amenities;
pub mod assemble;
pub mod error;
pub mod limiter;
pub mod pipeline;
pub mod scorer;
pub mod stations;

pub use amenities::AmenityFinder;
pub use assemble::{assemble_restaurants, assemble_scored_stations, assemble_stations};
pub use error::PipelineError;
pub use limiter::RoutingLimiter;
pub use pipeline::{PipelineSettings, ScoringPipeline};
pub use scorer::Scorer;
pub use stations::{StationFinder, StationSearch};
