//! Shape pipeline output into response envelopes.

use evscore_core::{Amenity, FeatureCollection, ScoredStation, StationWithDistance};

/// Scored stations, best score first; unscored stations trail in id order.
#[must_use]
pub fn assemble_scored_stations(mut stations: Vec<ScoredStation>) -> FeatureCollection<ScoredStation> {
    stations.sort_by(|a, b| match (a.score, b.score) {
        (Some(x), Some(y)) => y.total_cmp(&x).then_with(|| a.station.id.cmp(&b.station.id)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.station.id.cmp(&b.station.id),
    });
    FeatureCollection::stations(stations)
}

/// Stations nearest first; stations without a distance trail in id order.
#[must_use]
pub fn assemble_stations(
    mut stations: Vec<StationWithDistance>,
) -> FeatureCollection<StationWithDistance> {
    stations.sort_by(|a, b| match (a.distance, b.distance) {
        (Some(x), Some(y)) => x.total_cmp(&y).then_with(|| a.station.id.cmp(&b.station.id)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.station.id.cmp(&b.station.id),
    });
    FeatureCollection::stations(stations)
}

#[must_use]
pub fn assemble_restaurants(mut amenities: Vec<Amenity>) -> FeatureCollection<Amenity> {
    amenities.sort_by(|a, b| a.id.cmp(&b.id));
    FeatureCollection::restaurants(amenities)
}
