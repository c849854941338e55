use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub routing_base_url: String,
    pub routing_api_key: Option<String>,
    pub routing_profile: String,
    pub routing_timeout_secs: u64,
    pub routing_max_retries: u32,
    pub routing_retry_backoff_ms: u64,
    pub routing_max_concurrent: usize,
    /// Upper bound accepted for any search radius or isochrone range, in meters.
    pub max_search_distance_m: f64,
    /// Administrative area name used by the bars-per-city aggregate.
    pub numbars_region: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("routing_base_url", &self.routing_base_url)
            .field(
                "routing_api_key",
                &self.routing_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("routing_profile", &self.routing_profile)
            .field("routing_timeout_secs", &self.routing_timeout_secs)
            .field("routing_max_retries", &self.routing_max_retries)
            .field("routing_retry_backoff_ms", &self.routing_retry_backoff_ms)
            .field("routing_max_concurrent", &self.routing_max_concurrent)
            .field("max_search_distance_m", &self.max_search_distance_m)
            .field("numbars_region", &self.numbars_region)
            .finish()
    }
}
