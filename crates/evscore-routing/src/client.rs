//! HTTP client for an OpenRouteService-compatible routing engine.
//!
//! Wraps `reqwest` with engine-specific error handling, optional API key
//! management and typed extraction of the few fields the pipeline needs. The
//! raw GeoJSON answers are also exposed unchanged for the proxy endpoints.

use std::time::Duration;

use async_trait::async_trait;
use evscore_core::{AppConfig, Coordinate, Isochrone};
use reqwest::{header, Client, Url};
use serde::Serialize;

use crate::error::RoutingError;
use crate::request::{DirectionsRequest, IsochroneRequest};
use crate::retry::retry_with_backoff;
use crate::service::{RouteSummary, RoutingService};

pub const DEFAULT_PROFILE: &str = "driving-car";

const USER_AGENT: &str = "evscore/0.1 (station-scoring)";
const CONNECT_TIMEOUT_SECS: u64 = 5;
const MAX_UPSTREAM_MESSAGE_CHARS: usize = 200;

/// Connection settings for [`RoutingClient`].
#[derive(Clone)]
pub struct RoutingClientConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub profile: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

impl RoutingClientConfig {
    /// Settings for `base_url` with the default profile and no retries.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_owned(),
            api_key: None,
            profile: DEFAULT_PROFILE.to_owned(),
            timeout_secs: 10,
            max_retries: 0,
            retry_backoff_ms: 0,
        }
    }

    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            base_url: config.routing_base_url.clone(),
            api_key: config.routing_api_key.clone(),
            profile: config.routing_profile.clone(),
            timeout_secs: config.routing_timeout_secs,
            max_retries: config.routing_max_retries,
            retry_backoff_ms: config.routing_retry_backoff_ms,
        }
    }
}

impl std::fmt::Debug for RoutingClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutingClientConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .field("profile", &self.profile)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .finish()
    }
}

/// Client for the directions and isochrone services of the routing engine.
///
/// The travel profile is fixed at construction; callers cannot pick one per
/// request. Use [`RoutingClient::with_base_url`] to point at a mock server in
/// tests.
pub struct RoutingClient {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
    profile: String,
    max_retries: u32,
    retry_backoff_ms: u64,
}

impl RoutingClient {
    /// # Errors
    ///
    /// Returns [`RoutingError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`RoutingError::InvalidConfig`] for a base
    /// URL that does not parse or a profile that is not a plain
    /// `lowercase-with-dashes` name.
    pub fn new(config: &RoutingClientConfig) -> Result<Self, RoutingError> {
        if !is_valid_profile(&config.profile) {
            return Err(RoutingError::InvalidConfig(format!(
                "routing profile '{}' must be lowercase letters and dashes",
                config.profile
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(
                CONNECT_TIMEOUT_SECS.min(config.timeout_secs.max(1)),
            ))
            .user_agent(USER_AGENT)
            .build()?;

        // Exactly one trailing slash, so joined service paths extend the base
        // path instead of replacing its last segment.
        let normalised = format!("{}/", config.base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| {
            RoutingError::InvalidConfig(format!("invalid base URL '{}': {e}", config.base_url))
        })?;

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            profile: config.profile.clone(),
            max_retries: config.max_retries,
            retry_backoff_ms: config.retry_backoff_ms,
        })
    }

    /// Client with default settings against a custom base URL (for wiremock).
    ///
    /// # Errors
    ///
    /// See [`RoutingClient::new`].
    pub fn with_base_url(base_url: &str, timeout_secs: u64) -> Result<Self, RoutingError> {
        let mut config = RoutingClientConfig::new(base_url);
        config.timeout_secs = timeout_secs;
        Self::new(&config)
    }

    #[must_use]
    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// Posts a directions request and returns the engine's GeoJSON unchanged.
    ///
    /// # Errors
    ///
    /// - [`RoutingError::Rejected`] when the engine answers 4xx.
    /// - [`RoutingError::UpstreamStatus`] when it still answers 5xx after retries.
    /// - [`RoutingError::Http`] on network failure.
    /// - [`RoutingError::Deserialize`] if the body is not JSON.
    pub async fn directions_raw(
        &self,
        request: &DirectionsRequest,
    ) -> Result<serde_json::Value, RoutingError> {
        let url = self.endpoint(&format!("directions/{}/geojson", self.profile))?;
        self.post_json(&url, request).await
    }

    /// Posts an isochrone request and returns the engine's GeoJSON unchanged.
    ///
    /// # Errors
    ///
    /// Same as [`RoutingClient::directions_raw`].
    pub async fn isochrones_raw(
        &self,
        request: &IsochroneRequest,
    ) -> Result<serde_json::Value, RoutingError> {
        let url = self.endpoint(&format!("isochrones/{}/", self.profile))?;
        self.post_json(&url, request).await
    }

    fn endpoint(&self, path: &str) -> Result<Url, RoutingError> {
        self.base_url
            .join(path)
            .map_err(|e| RoutingError::InvalidConfig(format!("cannot build URL for {path}: {e}")))
    }

    async fn post_json<B>(&self, url: &Url, body: &B) -> Result<serde_json::Value, RoutingError>
    where
        B: Serialize + Sync,
    {
        retry_with_backoff(self.max_retries, self.retry_backoff_ms, || {
            self.post_once(url, body)
        })
        .await
    }

    /// Sends one POST and classifies the status before parsing the body.
    async fn post_once<B>(&self, url: &Url, body: &B) -> Result<serde_json::Value, RoutingError>
    where
        B: Serialize + Sync,
    {
        let mut request = self.client.post(url.clone()).json(body);
        if let Some(key) = &self.api_key {
            request = request.header(header::AUTHORIZATION, key.as_str());
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_client_error() {
            return Err(RoutingError::Rejected {
                status: status.as_u16(),
                message: upstream_message(&text),
            });
        }
        if !status.is_success() {
            return Err(RoutingError::UpstreamStatus {
                status: status.as_u16(),
                message: upstream_message(&text),
            });
        }

        serde_json::from_str(&text).map_err(|e| RoutingError::Deserialize {
            context: url.path().to_owned(),
            source: e,
        })
    }
}

#[async_trait]
impl RoutingService for RoutingClient {
    async fn route(&self, waypoints: &[Coordinate]) -> Result<RouteSummary, RoutingError> {
        let request = DirectionsRequest::new(waypoints)?;
        let raw = self.directions_raw(&request).await?;
        route_summary(raw)
    }

    async fn isochrone(
        &self,
        origin: Coordinate,
        range_m: f64,
    ) -> Result<Isochrone, RoutingError> {
        let request = IsochroneRequest::single(origin, range_m)?;
        let raw = self.isochrones_raw(&request).await?;
        parse_isochrone(raw)
    }
}

fn is_valid_profile(profile: &str) -> bool {
    !profile.is_empty()
        && !profile.starts_with('-')
        && profile.chars().all(|c| c.is_ascii_lowercase() || c == '-')
}

/// Pulls the route distance out of a directions FeatureCollection.
///
/// A missing `summary.distance` means a zero-length route; the engine omits
/// the field in that case.
fn route_summary(raw: serde_json::Value) -> Result<RouteSummary, RoutingError> {
    const CONTEXT: &str = "directions";
    let invalid = |reason: &str| RoutingError::InvalidResponse {
        context: CONTEXT.to_owned(),
        reason: reason.to_owned(),
    };

    let features = raw
        .get("features")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| invalid("missing features array"))?;
    let first = features.first().ok_or_else(|| invalid("no route returned"))?;
    let summary = first.pointer("/properties/summary");

    let distance_m = match summary.and_then(|s| s.get("distance")) {
        None | Some(serde_json::Value::Null) => 0.0,
        Some(value) => value
            .as_f64()
            .ok_or_else(|| invalid("summary.distance is not a number"))?,
    };
    if !distance_m.is_finite() || distance_m < 0.0 {
        return Err(invalid(&format!("distance {distance_m} is not a valid length")));
    }

    let duration_s = summary
        .and_then(|s| s.get("duration"))
        .and_then(serde_json::Value::as_f64);

    Ok(RouteSummary {
        distance_m,
        duration_s,
        raw,
    })
}

fn parse_isochrone(raw: serde_json::Value) -> Result<Isochrone, RoutingError> {
    let collection: geojson::FeatureCollection =
        serde_json::from_value(raw).map_err(|e| RoutingError::Deserialize {
            context: "isochrones".to_owned(),
            source: e,
        })?;
    Isochrone::from_feature_collection(&collection).map_err(|e| RoutingError::InvalidResponse {
        context: "isochrones".to_owned(),
        reason: e.to_string(),
    })
}

/// Best-effort human message from an engine error body.
///
/// The engine answers `{"error": {"code": .., "message": ..}}` or
/// `{"error": "..."}`; anything else is passed through, truncated.
fn upstream_message(body: &str) -> String {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
    let from_json = parsed.as_ref().and_then(|v| {
        let error = v.get("error")?;
        error
            .get("message")
            .and_then(serde_json::Value::as_str)
            .or_else(|| error.as_str())
            .map(str::to_owned)
    });

    from_json.unwrap_or_else(|| {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            "empty response body".to_owned()
        } else {
            trimmed.chars().take(MAX_UPSTREAM_MESSAGE_CHARS).collect()
        }
    })
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
