//! Client for the road routing engine: routed distances and isochrones.

pub mod client;
pub mod error;
pub mod request;
pub(crate) mod retry;
pub mod service;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use client::{RoutingClient, RoutingClientConfig, DEFAULT_PROFILE};
pub use error::RoutingError;
pub use request::{DirectionsRequest, IsochroneRequest};
pub use service::{RouteSummary, RoutingService};
