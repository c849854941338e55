use axum::{extract::rejection::JsonRejection, extract::State, Extension, Json};
use evscore_db::{validate_wkt, CityBarCountRow};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_db_error, map_json_rejection, ApiError, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct DistanceRequest {
    pub geom1: String,
    pub geom2: String,
}

#[derive(Debug, Serialize)]
pub(super) struct DistanceResponse {
    /// Geodesic distance in meters.
    pub distance: f64,
}

/// Geodesic distance between two WKT geometries. Both are validated before
/// the store is touched.
pub(super) async fn distance(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    payload: Result<Json<DistanceRequest>, JsonRejection>,
) -> Result<Json<DistanceResponse>, ApiError> {
    let Json(body) = payload.map_err(|e| map_json_rejection(req_id.0.clone(), &e))?;
    let geom1 = validate_wkt(&body.geom1)
        .map_err(|e| ApiError::validation(req_id.0.clone(), format!("geom1: {e}")))?;
    let geom2 = validate_wkt(&body.geom2)
        .map_err(|e| ApiError::validation(req_id.0.clone(), format!("geom2: {e}")))?;

    let distance = state
        .store
        .geography_distance(geom1, geom2)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(Json(DistanceResponse { distance }))
}

/// Bars and pubs per municipality of the configured region.
pub(super) async fn bars_per_city(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<geojson::FeatureCollection>, ApiError> {
    let rows = state
        .store
        .count_bars_per_city(&state.numbars_region)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let features = rows
        .into_iter()
        .map(CityBarCountRow::into_feature)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    tracing::debug!(region = %state.numbars_region, cities = features.len(), "bar counts loaded");
    Ok(Json(geojson::FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }))
}
