use thiserror::Error;

/// Errors returned by the routing client.
#[derive(Debug, Error)]
pub enum RoutingError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The routing engine refused the request (4xx). Never retried.
    #[error("routing request rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    /// The routing engine failed internally (5xx).
    #[error("routing service failed with status {status}: {message}")]
    UpstreamStatus { status: u16, message: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The response parsed but its content is unusable.
    #[error("invalid routing response for {context}: {reason}")]
    InvalidResponse { context: String, reason: String },

    /// The request could not be built from the given inputs.
    #[error("invalid routing request: {0}")]
    InvalidRequest(String),

    /// The client was configured with an unusable base URL or profile.
    #[error("invalid routing client configuration: {0}")]
    InvalidConfig(String),

    /// A call exceeded the caller's deadline.
    #[error("routing call timed out after {after_ms} ms")]
    Timeout { after_ms: u64 },
}

impl RoutingError {
    /// True for failures that mean the engine answered with a client-side rejection.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(self, RoutingError::Rejected { .. } | RoutingError::InvalidRequest(_))
    }

    /// True for failures where the engine could not be reached in time.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            RoutingError::Timeout { .. } => true,
            RoutingError::Http(e) => e.is_timeout(),
            _ => false,
        }
    }
}
