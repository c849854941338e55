use std::sync::Arc;

use evscore_core::{Amenity, Coordinate};
use evscore_db::GeoStore;

use crate::error::PipelineError;

/// Amenities within a straight-line (geography) radius of a point.
///
/// Unlike station search this does not use an isochrone; both sources are
/// queried concurrently and merged without duplicates.
#[derive(Clone)]
pub struct AmenityFinder {
    store: Arc<dyn GeoStore>,
}

impl AmenityFinder {
    #[must_use]
    pub fn new(store: Arc<dyn GeoStore>) -> Self {
        Self { store }
    }

    /// # Errors
    ///
    /// Returns [`PipelineError::Store`] if either source query fails.
    pub async fn find_amenities(
        &self,
        origin: Coordinate,
        radius_m: f64,
    ) -> Result<Vec<Amenity>, PipelineError> {
        self.store
            .find_amenities_within(origin, radius_m)
            .await
            .map_err(|e| {
                tracing::error!(%origin, radius_m, error = %e, "amenity query failed");
                PipelineError::Store(e)
            })
    }
}
