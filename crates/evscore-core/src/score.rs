//! Station desirability score.
//!
//! `score = 100/(d_station + 100) + Σ_amenities [100/(d_amenity + 100) + bonus]`
//! where the bonus is [`RATED_RESTAURANT_BONUS`] for rated restaurants and
//! zero otherwise. Each decay term lies in `(0, 1]` and equals exactly `1` at
//! zero distance. Sums are deliberately not normalized by amenity count, so a
//! station never loses score by gaining an amenity.

use serde::{Deserialize, Serialize};

use crate::amenity::Amenity;
use crate::station::ChargingStation;

/// Flat bonus for amenities from the curated, rated restaurant dataset.
pub const RATED_RESTAURANT_BONUS: f64 = 2.0;

/// Distance at which a decay term has fallen to one half.
const DECAY_SCALE_M: f64 = 100.0;

/// Harmonic distance decay, `100 / (distance + 100)`.
#[must_use]
pub fn distance_term(distance_m: f64) -> f64 {
    DECAY_SCALE_M / (distance_m + DECAY_SCALE_M)
}

/// Contribution of one amenity: its decay term plus any category bonus.
#[must_use]
pub fn amenity_term(amenity: &ScoredAmenity) -> f64 {
    let bonus = if amenity.amenity.is_rated_restaurant() {
        RATED_RESTAURANT_BONUS
    } else {
        0.0
    };
    distance_term(amenity.distance) + bonus
}

#[must_use]
pub fn station_score(station_distance_m: f64, amenities: &[ScoredAmenity]) -> f64 {
    distance_term(station_distance_m) + amenities.iter().map(amenity_term).sum::<f64>()
}

/// An amenity with its routed distance from the station, in meters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredAmenity {
    #[serde(flatten)]
    pub amenity: Amenity,
    pub distance: f64,
}

/// A station with its routed distance, nearby amenities and score.
///
/// When the station itself could not be routed, `distance` and `score` are
/// `None`, `close_restaurants` is empty and `error` carries the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredStation {
    #[serde(flatten)]
    pub station: ChargingStation,
    pub distance: Option<f64>,
    #[serde(rename = "closeRestaurants", default)]
    pub close_restaurants: Vec<ScoredAmenity>,
    pub score: Option<f64>,
    /// Nearby amenities left out because routing to them failed.
    #[serde(rename = "skippedAmenities", default)]
    pub skipped_amenities: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScoredStation {
    #[must_use]
    pub fn scored(
        station: ChargingStation,
        distance_m: f64,
        close_restaurants: Vec<ScoredAmenity>,
        skipped_amenities: usize,
    ) -> Self {
        let score = station_score(distance_m, &close_restaurants);
        Self {
            station,
            distance: Some(distance_m),
            close_restaurants,
            score: Some(score),
            skipped_amenities,
            error: None,
        }
    }

    #[must_use]
    pub fn unscored(station: ChargingStation, reason: impl Into<String>) -> Self {
        Self {
            station,
            distance: None,
            close_restaurants: Vec::new(),
            score: None,
            skipped_amenities: 0,
            error: Some(reason.into()),
        }
    }

    #[must_use]
    pub fn is_scored(&self) -> bool {
        self.score.is_some()
    }
}
