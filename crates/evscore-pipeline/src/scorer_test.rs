use std::sync::Arc;
use std::time::Duration;

use evscore_core::{
    distance_term, Amenity, AmenityCategory, ChargingStation, Coordinate, Isochrone, UNRATED,
};
use evscore_db::memory::MemoryGeoStore;
use evscore_routing::test_support::StubRouter;

use super::*;

fn point(lon: f64, lat: f64) -> geojson::Geometry {
    geojson::Geometry::new(geojson::Value::Point(vec![lon, lat]))
}

fn coord(lon: f64, lat: f64) -> Coordinate {
    Coordinate::new(lon, lat).unwrap()
}

fn station(id: &str, lon: f64, lat: f64) -> ChargingStation {
    ChargingStation {
        id: id.to_string(),
        address: "Bertoldstr. 10".to_string(),
        city: "79098 Freiburg".to_string(),
        longitude: lon,
        latitude: lat,
        geometry: point(lon, lat),
    }
}

fn amenity(id: &str, category: AmenityCategory, lon: f64, lat: f64) -> Amenity {
    Amenity {
        id: id.to_string(),
        category,
        name: format!("{category} {id}"),
        rating: if category == AmenityCategory::RatedRestaurant {
            4.2
        } else {
            UNRATED
        },
        longitude: lon,
        latitude: lat,
        geometry: point(lon, lat),
    }
}

fn scorer(router: Arc<StubRouter>, store: MemoryGeoStore, limiter: RoutingLimiter) -> Scorer {
    Scorer::new(
        router,
        AmenityFinder::new(Arc::new(store)),
        limiter,
        4,
    )
}

fn limiter() -> RoutingLimiter {
    RoutingLimiter::new(4, Duration::from_secs(5))
}

#[tokio::test]
async fn station_without_amenities_scores_its_distance_term() {
    let router = Arc::new(StubRouter::new(Isochrone::empty()));
    let store = MemoryGeoStore::new(Vec::new(), Vec::new(), Vec::new());
    let scorer = scorer(Arc::clone(&router), store, limiter());

    let scored = scorer
        .score(station("st-1", 7.86, 47.99), coord(7.85, 47.99), 300.0)
        .await
        .unwrap();

    let distance = scored.distance.unwrap();
    assert!(distance > 700.0 && distance < 800.0, "got {distance}");
    assert!(scored.close_restaurants.is_empty());
    assert_eq!(scored.score, Some(distance_term(distance)));
    assert_eq!(router.route_calls(), 1);
}

#[tokio::test]
async fn colocated_station_and_rated_restaurant_score_exactly() {
    // Station on the route point (1.0) with a rated restaurant on the station (1.0 + 2.0).
    let router = Arc::new(StubRouter::new(Isochrone::empty()));
    let store = MemoryGeoStore::new(
        Vec::new(),
        Vec::new(),
        vec![amenity("r-1", AmenityCategory::RatedRestaurant, 7.85, 47.99)],
    );
    let scorer = scorer(Arc::clone(&router), store, limiter());

    let scored = scorer
        .score(station("st-1", 7.85, 47.99), coord(7.85, 47.99), 100.0)
        .await
        .unwrap();

    assert_eq!(scored.distance, Some(0.0));
    assert_eq!(scored.close_restaurants.len(), 1);
    assert!((scored.score.unwrap() - 4.0).abs() < 1e-12);
}

#[tokio::test]
async fn close_amenities_are_sorted_by_routed_distance() {
    let router = Arc::new(StubRouter::new(Isochrone::empty()).with_detour_factor(1.3));
    let store = MemoryGeoStore::new(
        Vec::new(),
        vec![
            amenity("1002", AmenityCategory::Cafe, 7.852, 47.99),
            amenity("1001", AmenityCategory::Bar, 7.8505, 47.99),
        ],
        vec![amenity("r-1", AmenityCategory::RatedRestaurant, 7.851, 47.99)],
    );
    let scorer = scorer(router, store, limiter());

    let scored = scorer
        .score(station("st-1", 7.85, 47.99), coord(7.85, 47.99), 500.0)
        .await
        .unwrap();

    let ids: Vec<_> = scored
        .close_restaurants
        .iter()
        .map(|a| a.amenity.id.as_str())
        .collect();
    assert_eq!(ids, vec!["1001", "r-1", "1002"]);

    let expected = distance_term(0.0)
        + scored
            .close_restaurants
            .iter()
            .map(evscore_core::amenity_term)
            .sum::<f64>();
    assert!((scored.score.unwrap() - expected).abs() < 1e-12);
    // The rated restaurant carries the bonus, so the score exceeds 3.
    assert!(scored.score.unwrap() > 3.0);
}

#[tokio::test]
async fn unroutable_amenity_is_skipped_and_counted() {
    let router = Arc::new(
        StubRouter::new(Isochrone::empty()).unroutable_at(coord(7.851, 47.99)),
    );
    let store = MemoryGeoStore::new(
        Vec::new(),
        vec![
            amenity("1001", AmenityCategory::Pub, 7.851, 47.99),
            amenity("1002", AmenityCategory::Cafe, 7.852, 47.99),
        ],
        Vec::new(),
    );
    let scorer = scorer(router, store, limiter());

    let scored = scorer
        .score(station("st-1", 7.85, 47.99), coord(7.85, 47.99), 500.0)
        .await
        .unwrap();

    assert!(scored.is_scored());
    assert_eq!(scored.skipped_amenities, 1);
    assert_eq!(scored.close_restaurants.len(), 1);
    assert_eq!(scored.close_restaurants[0].amenity.id, "1002");
}

#[tokio::test]
async fn unroutable_station_is_returned_unscored() {
    let router = Arc::new(
        StubRouter::new(Isochrone::empty()).unroutable_at(coord(7.86, 47.99)),
    );
    let store = MemoryGeoStore::new(
        Vec::new(),
        vec![amenity("1001", AmenityCategory::Pub, 7.8601, 47.99)],
        Vec::new(),
    );
    let scorer = scorer(Arc::clone(&router), store, limiter());

    let scored = scorer
        .score(station("st-9", 7.86, 47.99), coord(7.85, 47.99), 500.0)
        .await
        .unwrap();

    assert!(!scored.is_scored());
    assert_eq!(scored.distance, None);
    assert!(scored.close_restaurants.is_empty());
    assert!(scored.error.as_deref().unwrap().contains("404"));
    // No amenity is routed once the station itself failed.
    assert_eq!(router.route_calls(), 1);
}

#[tokio::test]
async fn store_failure_aborts_scoring() {
    let router = Arc::new(StubRouter::new(Isochrone::empty()));
    let scorer = scorer(router, MemoryGeoStore::unavailable(), limiter());

    let err = scorer
        .score(station("st-1", 7.85, 47.99), coord(7.85, 47.99), 500.0)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Store(_)));
}

#[tokio::test]
async fn slow_station_route_times_out_unscored() {
    let router = Arc::new(
        StubRouter::new(Isochrone::empty()).with_delay(Duration::from_millis(500)),
    );
    let store = MemoryGeoStore::new(Vec::new(), Vec::new(), Vec::new());
    let scorer = scorer(
        router,
        store,
        RoutingLimiter::new(4, Duration::from_millis(20)),
    );

    let scored = scorer
        .score(station("st-1", 7.86, 47.99), coord(7.85, 47.99), 100.0)
        .await
        .unwrap();

    assert!(!scored.is_scored());
    assert!(scored.error.as_deref().unwrap().contains("timed out"));
}

#[tokio::test]
async fn score_all_keeps_routing_within_the_limiter() {
    let router = Arc::new(
        StubRouter::new(Isochrone::empty()).with_delay(Duration::from_millis(10)),
    );
    let store = MemoryGeoStore::new(
        Vec::new(),
        vec![amenity("1001", AmenityCategory::Cafe, 7.855, 47.99)],
        Vec::new(),
    );
    let scorer = scorer(
        Arc::clone(&router),
        store,
        RoutingLimiter::new(2, Duration::from_secs(5)),
    );

    let stations: Vec<_> = (0..6_u32)
        .map(|i| station(&format!("st-{i}"), 7.855 + f64::from(i) * 0.0001, 47.99))
        .collect();
    let scored = scorer
        .score_all(stations, coord(7.85, 47.99), 500.0)
        .await
        .unwrap();

    assert_eq!(scored.len(), 6);
    assert!(scored.iter().all(ScoredStation::is_scored));
    // One station route and one amenity route per station.
    assert_eq!(router.route_calls(), 12);
    assert!(router.max_in_flight() <= 2);
}
