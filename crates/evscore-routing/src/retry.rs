//! Retry with exponential back-off and jitter for routing calls.
//!
//! Only transient failures (network errors, 5xx) are retried. Rejections by
//! the engine and malformed responses are returned on the first attempt.

use std::future::Future;
use std::time::Duration;

use crate::error::RoutingError;

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// **Retriable:**
/// - Network-level failures: timeout, connection refused or reset.
/// - [`RoutingError::UpstreamStatus`]: 5xx from the routing engine.
///
/// **Not retriable:**
/// - [`RoutingError::Rejected`]: 4xx; the same request will be refused again.
/// - [`RoutingError::Deserialize`] / [`RoutingError::InvalidResponse`].
/// - [`RoutingError::InvalidRequest`] and [`RoutingError::Timeout`].
pub(crate) fn is_retriable(err: &RoutingError) -> bool {
    match err {
        RoutingError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        RoutingError::UpstreamStatus { .. } => true,
        RoutingError::Rejected { .. }
        | RoutingError::Deserialize { .. }
        | RoutingError::InvalidResponse { .. }
        | RoutingError::InvalidRequest(_)
        | RoutingError::InvalidConfig(_)
        | RoutingError::Timeout { .. } => false,
    }
}

/// Longest sleep between two attempts.
const MAX_DELAY_MS: u64 = 5_000;

/// Sleep before retry `attempt` (1-based): `base × 2^(attempt-1)`, capped at
/// [`MAX_DELAY_MS`], then scaled by `jitter` (expected in `[0.75, 1.25]`).
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn backoff_delay_ms(base_ms: u64, attempt: u32, jitter: f64) -> u64 {
    let exponent = attempt.saturating_sub(1).min(10);
    let capped = base_ms.saturating_mul(1u64 << exponent).min(MAX_DELAY_MS);
    (capped as f64 * jitter) as u64
}

/// Run `call`, retrying transient failures up to `max_retries` more times.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut call: F,
) -> Result<T, RoutingError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RoutingError>>,
{
    let mut retries = 0u32;
    loop {
        let err = match call().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if retries >= max_retries || !is_retriable(&err) {
            return Err(err);
        }
        retries += 1;
        let jitter = 0.75 + rand::random::<f64>() * 0.5;
        let delay_ms = backoff_delay_ms(backoff_base_ms, retries, jitter);
        tracing::warn!(
            retry = retries,
            max_retries,
            delay_ms,
            error = %err,
            "routing engine failed transiently, backing off"
        );
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }
}
