//! Shared bound on in-flight routing calls, with a per-call deadline.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use evscore_routing::RoutingError;
use tokio::sync::Semaphore;

/// Admits at most `max_concurrent` routing calls at once across every task
/// holding a clone, and fails any call that outlives `call_timeout`.
///
/// The deadline starts once a permit is held, so time spent queueing behind
/// other calls is not charged to the call itself.
#[derive(Debug, Clone)]
pub struct RoutingLimiter {
    permits: Arc<Semaphore>,
    call_timeout: Duration,
}

impl RoutingLimiter {
    /// `max_concurrent` is clamped to at least one.
    #[must_use]
    pub fn new(max_concurrent: usize, call_timeout: Duration) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
            call_timeout,
        }
    }

    #[must_use]
    pub fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    /// # Errors
    ///
    /// Returns the call's own error, or [`RoutingError::Timeout`] when the
    /// deadline passes first. A timed-out call is dropped, which cancels it.
    pub async fn run<T, F>(&self, call: F) -> Result<T, RoutingError>
    where
        F: Future<Output = Result<T, RoutingError>>,
    {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| RoutingError::InvalidConfig("routing limiter is closed".to_owned()))?;

        match tokio::time::timeout(self.call_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(RoutingError::Timeout {
                after_ms: u64::try_from(self.call_timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }
}
