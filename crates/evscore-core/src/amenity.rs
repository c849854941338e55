//! Amenities near a charging station, drawn from two disjoint sources.
//!
//! Generic map amenities carry one of the OSM `amenity=*` food and drink tags.
//! Rated restaurants come from a separately curated dataset and are the only
//! amenities with a meaningful rating.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::geometry::Coordinate;
use crate::CoreError;

/// Rating carried by amenities that have none.
pub const UNRATED: f64 = 0.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmenityCategory {
    Bar,
    Bbq,
    Biergarten,
    Cafe,
    FastFood,
    FoodCourt,
    IceCream,
    Pub,
    Restaurant,
    RatedRestaurant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AmenitySource {
    /// `amenity=*` points from the OSM import.
    Map,
    /// The curated restaurant dataset with ratings.
    Rated,
}

impl AmenityCategory {
    /// Every category the generic map source can produce.
    pub const GENERIC: [AmenityCategory; 9] = [
        AmenityCategory::Bar,
        AmenityCategory::Bbq,
        AmenityCategory::Biergarten,
        AmenityCategory::Cafe,
        AmenityCategory::FastFood,
        AmenityCategory::FoodCourt,
        AmenityCategory::IceCream,
        AmenityCategory::Pub,
        AmenityCategory::Restaurant,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AmenityCategory::Bar => "bar",
            AmenityCategory::Bbq => "bbq",
            AmenityCategory::Biergarten => "biergarten",
            AmenityCategory::Cafe => "cafe",
            AmenityCategory::FastFood => "fast_food",
            AmenityCategory::FoodCourt => "food_court",
            AmenityCategory::IceCream => "ice_cream",
            AmenityCategory::Pub => "pub",
            AmenityCategory::Restaurant => "restaurant",
            AmenityCategory::RatedRestaurant => "rated_restaurant",
        }
    }

    /// Parse a stored tag value.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownCategory`] for anything outside the enumeration.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        Self::GENERIC
            .into_iter()
            .chain(std::iter::once(AmenityCategory::RatedRestaurant))
            .find(|c| c.as_str() == raw)
            .ok_or_else(|| CoreError::UnknownCategory(raw.to_string()))
    }

    #[must_use]
    pub fn source(self) -> AmenitySource {
        match self {
            AmenityCategory::RatedRestaurant => AmenitySource::Rated,
            _ => AmenitySource::Map,
        }
    }

    /// Tag values for the generic source, in the form bound to SQL `ANY($n)`.
    #[must_use]
    pub fn generic_tags() -> Vec<String> {
        Self::GENERIC.iter().map(|c| c.as_str().to_string()).collect()
    }
}

impl std::fmt::Display for AmenityCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Amenity {
    pub id: String,
    pub category: AmenityCategory,
    pub name: String,
    pub rating: f64,
    pub longitude: f64,
    pub latitude: f64,
    pub geometry: geojson::Geometry,
}

impl Amenity {
    /// # Errors
    ///
    /// Returns [`CoreError`] if the stored position is not valid WGS84.
    pub fn coordinate(&self) -> Result<Coordinate, CoreError> {
        Coordinate::new(self.longitude, self.latitude)
    }

    #[must_use]
    pub fn source(&self) -> AmenitySource {
        self.category.source()
    }

    #[must_use]
    pub fn is_rated_restaurant(&self) -> bool {
        self.category == AmenityCategory::RatedRestaurant
    }
}

/// Union of both amenity sources with each `(source, id)` kept once.
///
/// Map amenities are forced onto the [`UNRATED`] sentinel so a rating only
/// ever reaches the output for `rated_restaurant` entries. Rows whose
/// category disagrees with the list they came from are dropped.
#[must_use]
pub fn merge_amenities(map: Vec<Amenity>, rated: Vec<Amenity>) -> Vec<Amenity> {
    let mut seen: HashSet<(AmenitySource, String)> = HashSet::new();
    let mut merged = Vec::with_capacity(map.len() + rated.len());

    let tagged = map
        .into_iter()
        .map(|a| (AmenitySource::Map, a))
        .chain(rated.into_iter().map(|a| (AmenitySource::Rated, a)));

    for (expected, mut amenity) in tagged {
        // A category that contradicts its source is a store data error.
        if amenity.source() != expected {
            continue;
        }
        if expected == AmenitySource::Map {
            amenity.rating = UNRATED;
        }
        if seen.insert((expected, amenity.id.clone())) {
            merged.push(amenity);
        }
    }

    merged
}
