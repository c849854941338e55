mod geometry;
mod routing;
mod stations;

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use evscore_core::{AppConfig, Coordinate};
use evscore_db::{DbError, PgGeoStore};
use evscore_pipeline::{PipelineError, PipelineSettings, ScoringPipeline};
use evscore_routing::{RoutingClient, RoutingClientConfig, RoutingError};
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{request_id, RequestId, REQUEST_ID_HEADER};

#[derive(Clone)]
pub struct AppState {
    /// Station search and scoring.
    pub pipeline: ScoringPipeline,
    /// Direct store access for `/distance`, `/numbars` and `/health`.
    pub store: PgGeoStore,
    /// Raw engine access for the `/route` and `/isochrones` pass-throughs.
    pub routing: Arc<RoutingClient>,
    pub numbars_region: Arc<str>,
}

impl AppState {
    /// Wire the pipeline and the pass-through endpoints to one routing client
    /// and one pool.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::InvalidConfig`] for an unusable routing base
    /// URL or profile.
    pub fn from_config(config: &AppConfig, pool: PgPool) -> Result<Self, RoutingError> {
        let routing = Arc::new(RoutingClient::new(&RoutingClientConfig::from_app_config(
            config,
        ))?);
        let store = PgGeoStore::new(pool);
        let pipeline = ScoringPipeline::new(
            Arc::clone(&routing) as Arc<dyn evscore_routing::RoutingService>,
            Arc::new(store.clone()),
            PipelineSettings::from_app_config(config),
        );
        Ok(Self {
            pipeline,
            store,
            routing,
            numbars_region: Arc::from(config.numbars_region.as_str()),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    postgis: Option<String>,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }

    pub(super) fn validation(request_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(request_id, "validation_error", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "validation_error" => StatusCode::BAD_REQUEST,
            "not_found" => StatusCode::NOT_FOUND,
            "upstream_rejected" => StatusCode::UNPROCESSABLE_ENTITY,
            "upstream_error" => StatusCode::BAD_GATEWAY,
            "upstream_timeout" => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn map_json_rejection(request_id: String, rejection: &JsonRejection) -> ApiError {
    ApiError::validation(request_id, rejection.body_text())
}

pub(super) fn map_db_error(request_id: String, error: &DbError) -> ApiError {
    if error.is_invalid_input() {
        return ApiError::validation(request_id, error.to_string());
    }
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

pub(super) fn map_routing_error(request_id: String, error: &RoutingError) -> ApiError {
    match error {
        RoutingError::InvalidRequest(message) => ApiError::validation(request_id, message.clone()),
        RoutingError::InvalidConfig(_) => {
            tracing::error!(error = %error, "routing client misconfigured");
            ApiError::new(request_id, "internal_error", "routing client misconfigured")
        }
        e if e.is_timeout() => {
            tracing::warn!(error = %e, "routing engine timed out");
            ApiError::new(request_id, "upstream_timeout", e.to_string())
        }
        RoutingError::Rejected { .. } => {
            tracing::info!(error = %error, "routing engine rejected the request");
            ApiError::new(request_id, "upstream_rejected", error.to_string())
        }
        _ => {
            tracing::warn!(error = %error, "routing engine failed");
            ApiError::new(request_id, "upstream_error", error.to_string())
        }
    }
}

pub(super) fn map_pipeline_error(request_id: String, error: &PipelineError) -> ApiError {
    match error {
        PipelineError::InvalidInput(message) => ApiError::validation(request_id, message.clone()),
        PipelineError::Routing(e) => map_routing_error(request_id, e),
        PipelineError::Store(e) => map_db_error(request_id, e),
        PipelineError::EmptyIsochrone { .. } => {
            ApiError::new(request_id, "upstream_error", error.to_string())
        }
    }
}

/// Parse a `[lon, lat]` pair from a request field.
pub(super) fn parse_coordinate(
    request_id: &str,
    field: &str,
    raw: [f64; 2],
) -> Result<Coordinate, ApiError> {
    Coordinate::new(raw[0], raw[1])
        .map_err(|e| ApiError::validation(request_id, format!("{field}: {e}")))
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, REQUEST_ID_HEADER])
        .expose_headers([REQUEST_ID_HEADER])
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/stations", post(stations::find_stations))
        .route("/stations-score", post(stations::score_stations))
        .route("/restaurants", post(stations::find_restaurants))
        .route("/distance", post(geometry::distance))
        .route(
            "/numbars",
            get(geometry::bars_per_city).post(geometry::bars_per_city),
        )
        .route("/route", post(routing::route))
        .route("/isochrones", post(routing::isochrones))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match evscore_db::health_check(state.store.pool()).await {
        Ok(version) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                    postgis: Some(version),
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                        postgis: None,
                    },
                    meta,
                }),
            )
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use evscore_core::{Amenity, AmenityCategory, ChargingStation, Isochrone, UNRATED};
    use evscore_db::memory::MemoryGeoStore;
    use evscore_db::{PgGeoStore, PoolConfig};
    use evscore_pipeline::{PipelineSettings, ScoringPipeline};
    use evscore_routing::test_support::StubRouter;
    use evscore_routing::RoutingClient;
    use geo::{coord, MultiPolygon, Rect};
    use tower::ServiceExt;

    use super::{build_app, AppState};

    /// Nothing listens on port 1, so every real query fails fast.
    const UNREACHABLE_DB: &str = "postgres://evscore@127.0.0.1:1/gis_db";

    fn point(lon: f64, lat: f64) -> geojson::Geometry {
        geojson::Geometry::new(geojson::Value::Point(vec![lon, lat]))
    }

    pub(crate) fn city_centre() -> Isochrone {
        let rect = Rect::new(coord! { x: 7.83, y: 47.98 }, coord! { x: 7.87, y: 48.01 });
        Isochrone::new(MultiPolygon::new(vec![rect.to_polygon()]))
    }

    pub(crate) fn station(id: &str, lon: f64, lat: f64) -> ChargingStation {
        ChargingStation {
            id: id.to_string(),
            address: "Rotteckring 14".to_string(),
            city: "79098 Freiburg".to_string(),
            longitude: lon,
            latitude: lat,
            geometry: point(lon, lat),
        }
    }

    pub(crate) fn amenity(id: &str, category: AmenityCategory, lon: f64, lat: f64) -> Amenity {
        Amenity {
            id: id.to_string(),
            category,
            name: format!("Gasthaus {id}"),
            rating: if category == AmenityCategory::RatedRestaurant {
                4.4
            } else {
                UNRATED
            },
            longitude: lon,
            latitude: lat,
            geometry: point(lon, lat),
        }
    }

    pub(crate) fn freiburg_store() -> MemoryGeoStore {
        MemoryGeoStore::new(
            vec![
                station("st-center", 7.852, 47.995),
                station("st-station", 7.842, 47.998),
                station("st-denzlingen", 7.88, 48.07),
            ],
            vec![amenity("1001", AmenityCategory::Cafe, 7.8525, 47.9952)],
            vec![amenity("r-markthalle", AmenityCategory::RatedRestaurant, 7.853, 47.995)],
        )
    }

    /// App over an in-memory store and stub router for the pipeline, a
    /// routing client aimed at `routing_base_url` for the pass-throughs, and
    /// an unreachable database for everything else.
    pub(crate) fn app(router: StubRouter, store: MemoryGeoStore, routing_base_url: &str) -> Router {
        let pool = evscore_db::connect_pool_lazy(
            UNREACHABLE_DB,
            PoolConfig {
                max_connections: 1,
                min_connections: 0,
                acquire_timeout_secs: 1,
            },
        )
        .expect("lazy pool");
        let settings = PipelineSettings {
            max_concurrent_routing: 4,
            routing_call_timeout: Duration::from_secs(5),
            max_search_distance_m: 50_000.0,
        };
        build_app(AppState {
            pipeline: ScoringPipeline::new(Arc::new(router), Arc::new(store), settings),
            store: PgGeoStore::new(pool),
            routing: Arc::new(RoutingClient::with_base_url(routing_base_url, 2).expect("client")),
            numbars_region: Arc::from("Freiburg im Breisgau"),
        })
    }

    pub(crate) fn default_app() -> Router {
        app(
            StubRouter::new(city_centre()),
            freiburg_store(),
            "http://127.0.0.1:1/ors/v2",
        )
    }

    pub(crate) fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    pub(crate) async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.oneshot(request).await.expect("response");
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json = if body.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&body).expect("json parse")
        };
        (status, json)
    }
}
