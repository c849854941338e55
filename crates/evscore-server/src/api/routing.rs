//! Pass-through endpoints: requests are validated and rebuilt, then the
//! engine's GeoJSON is returned untouched.

use axum::{extract::rejection::JsonRejection, extract::State, Extension, Json};
use evscore_core::Coordinate;
use evscore_routing::{DirectionsRequest, IsochroneRequest};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{map_json_rejection, map_routing_error, parse_coordinate, ApiError, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct RouteRequest {
    pub coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
pub(super) struct IsochronesRequest {
    pub locations: Vec<[f64; 2]>,
    pub range: Vec<f64>,
}

fn parse_coordinates(
    request_id: &str,
    field: &str,
    raw: &[[f64; 2]],
) -> Result<Vec<Coordinate>, ApiError> {
    raw.iter()
        .enumerate()
        .map(|(i, pair)| parse_coordinate(request_id, &format!("{field}[{i}]"), *pair))
        .collect()
}

pub(super) async fn route(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    payload: Result<Json<RouteRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Json(body) = payload.map_err(|e| map_json_rejection(req_id.0.clone(), &e))?;
    let waypoints = parse_coordinates(&req_id.0, "coordinates", &body.coordinates)?;
    let request =
        DirectionsRequest::new(&waypoints).map_err(|e| map_routing_error(req_id.0.clone(), &e))?;

    let geojson = state
        .routing
        .directions_raw(&request)
        .await
        .map_err(|e| map_routing_error(req_id.0.clone(), &e))?;
    Ok(Json(geojson))
}

pub(super) async fn isochrones(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    payload: Result<Json<IsochronesRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Json(body) = payload.map_err(|e| map_json_rejection(req_id.0.clone(), &e))?;
    let locations = parse_coordinates(&req_id.0, "locations", &body.locations)?;

    let max = state.pipeline.settings().max_search_distance_m;
    if let Some(too_far) = body.range.iter().find(|r| **r > max) {
        return Err(ApiError::validation(
            req_id.0,
            format!("range {too_far} exceeds the maximum of {max} m"),
        ));
    }
    let request = IsochroneRequest::new(&locations, &body.range)
        .map_err(|e| map_routing_error(req_id.0.clone(), &e))?;

    let geojson = state
        .routing
        .isochrones_raw(&request)
        .await
        .map_err(|e| map_routing_error(req_id.0.clone(), &e))?;
    Ok(Json(geojson))
}
