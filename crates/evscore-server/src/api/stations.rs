use axum::{extract::rejection::JsonRejection, extract::State, Extension, Json};
use evscore_core::{Amenity, FeatureCollection, ScoredStation, StationWithDistance};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{map_json_rejection, map_pipeline_error, parse_coordinate, ApiError, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct StationsRequest {
    pub routepoint: [f64; 2],
    pub distance: f64,
}

#[derive(Debug, Deserialize)]
pub(super) struct ScoreRequest {
    pub routepoint: [f64; 2],
    #[serde(rename = "station-distance")]
    pub station_distance: f64,
    #[serde(rename = "amenity-distance")]
    pub amenity_distance: f64,
}

#[derive(Debug, Deserialize)]
pub(super) struct RestaurantsRequest {
    pub station: [f64; 2],
    pub distance: f64,
}

pub(super) async fn find_stations(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    payload: Result<Json<StationsRequest>, JsonRejection>,
) -> Result<Json<FeatureCollection<StationWithDistance>>, ApiError> {
    let Json(body) = payload.map_err(|e| map_json_rejection(req_id.0.clone(), &e))?;
    let route_point = parse_coordinate(&req_id.0, "routepoint", body.routepoint)?;

    let collection = state
        .pipeline
        .stations(route_point, body.distance)
        .await
        .map_err(|e| map_pipeline_error(req_id.0.clone(), &e))?;
    Ok(Json(collection))
}

pub(super) async fn score_stations(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    payload: Result<Json<ScoreRequest>, JsonRejection>,
) -> Result<Json<FeatureCollection<ScoredStation>>, ApiError> {
    let Json(body) = payload.map_err(|e| map_json_rejection(req_id.0.clone(), &e))?;
    let route_point = parse_coordinate(&req_id.0, "routepoint", body.routepoint)?;

    let collection = state
        .pipeline
        .score_stations(route_point, body.station_distance, body.amenity_distance)
        .await
        .map_err(|e| map_pipeline_error(req_id.0.clone(), &e))?;
    Ok(Json(collection))
}

pub(super) async fn find_restaurants(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    payload: Result<Json<RestaurantsRequest>, JsonRejection>,
) -> Result<Json<FeatureCollection<Amenity>>, ApiError> {
    let Json(body) = payload.map_err(|e| map_json_rejection(req_id.0.clone(), &e))?;
    let station = parse_coordinate(&req_id.0, "station", body.station)?;

    let collection = state
        .pipeline
        .restaurants(station, body.distance)
        .await
        .map_err(|e| map_pipeline_error(req_id.0.clone(), &e))?;
    Ok(Json(collection))
}
