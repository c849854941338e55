use super::*;

fn test_client(base_url: &str) -> RoutingClient {
    RoutingClient::with_base_url(base_url, 10).expect("client construction should not fail")
}

#[test]
fn endpoint_extends_base_path() {
    let client = test_client("http://localhost:8080/ors/v2");
    let url = client.endpoint("directions/driving-car/geojson").unwrap();
    assert_eq!(
        url.as_str(),
        "http://localhost:8080/ors/v2/directions/driving-car/geojson"
    );
}

#[test]
fn endpoint_tolerates_trailing_slashes() {
    let client = test_client("http://localhost:8080/ors/v2//");
    let url = client.endpoint("isochrones/driving-car").unwrap();
    assert_eq!(url.as_str(), "http://localhost:8080/ors/v2/isochrones/driving-car");
}

#[test]
fn rejects_unparseable_base_url() {
    assert!(matches!(
        RoutingClient::with_base_url("not a url", 10),
        Err(RoutingError::InvalidConfig(_))
    ));
}

#[test]
fn rejects_profile_outside_allowed_alphabet() {
    for profile in ["", "driving car", "../admin", "Driving-Car", "-x"] {
        let mut config = RoutingClientConfig::new("http://localhost:8080/ors/v2");
        config.profile = profile.to_owned();
        assert!(
            matches!(RoutingClient::new(&config), Err(RoutingError::InvalidConfig(_))),
            "profile {profile:?} should be refused"
        );
    }
}

#[test]
fn blank_api_key_is_ignored() {
    let mut config = RoutingClientConfig::new("http://localhost:8080/ors/v2");
    config.api_key = Some("   ".to_owned());
    let client = RoutingClient::new(&config).unwrap();
    assert!(client.api_key.is_none());
}

#[test]
fn config_debug_redacts_api_key() {
    let mut config = RoutingClientConfig::new("http://localhost:8080/ors/v2");
    config.api_key = Some("secret-key".to_owned());
    let debug = format!("{config:?}");
    assert!(!debug.contains("secret-key"));
    assert!(debug.contains("[redacted]"));
}

#[test]
fn route_summary_reads_first_feature_distance() {
    let raw = serde_json::json!({
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": {"summary": {"distance": 1234.5, "duration": 180.2}},
            "geometry": {"type": "LineString", "coordinates": [[7.85, 47.99], [7.86, 48.0]]}
        }]
    });
    let summary = route_summary(raw).unwrap();
    assert!((summary.distance_m - 1234.5).abs() < f64::EPSILON);
    assert_eq!(summary.duration_s, Some(180.2));
}

#[test]
fn route_summary_treats_missing_distance_as_zero() {
    let raw = serde_json::json!({
        "type": "FeatureCollection",
        "features": [{"type": "Feature", "properties": {"summary": {}}, "geometry": null}]
    });
    let summary = route_summary(raw).unwrap();
    assert!(summary.distance_m.abs() < f64::EPSILON);
    assert!(summary.duration_s.is_none());
}

#[test]
fn route_summary_rejects_negative_distance() {
    let raw = serde_json::json!({
        "features": [{"properties": {"summary": {"distance": -3.0}}}]
    });
    assert!(matches!(
        route_summary(raw),
        Err(RoutingError::InvalidResponse { .. })
    ));
}

#[test]
fn route_summary_rejects_missing_features() {
    assert!(matches!(
        route_summary(serde_json::json!({"type": "FeatureCollection"})),
        Err(RoutingError::InvalidResponse { .. })
    ));
    assert!(matches!(
        route_summary(serde_json::json!({"features": []})),
        Err(RoutingError::InvalidResponse { .. })
    ));
}

#[test]
fn parse_isochrone_refuses_non_polygon_features() {
    let raw = serde_json::json!({
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": {},
            "geometry": {"type": "Point", "coordinates": [7.85, 47.99]}
        }]
    });
    assert!(matches!(
        parse_isochrone(raw),
        Err(RoutingError::InvalidResponse { .. })
    ));
}

#[test]
fn upstream_message_prefers_structured_error() {
    let body = r#"{"error":{"code":2010,"message":"Could not find routable point"}}"#;
    assert_eq!(upstream_message(body), "Could not find routable point");
    assert_eq!(upstream_message(r#"{"error":"Access denied"}"#), "Access denied");
}

#[test]
fn upstream_message_truncates_plain_bodies() {
    let long = "x".repeat(500);
    assert_eq!(upstream_message(&long).len(), MAX_UPSTREAM_MESSAGE_CHARS);
    assert_eq!(upstream_message("  "), "empty response body");
}
