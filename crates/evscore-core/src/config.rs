use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so tests can drive it with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let database_url = require("DATABASE_URL")?;

    let env = parse_environment(&or_default("EVSCORE_ENV", "development"))?;
    let bind_addr = parse_addr("EVSCORE_BIND_ADDR", "0.0.0.0:5000")?;
    let log_level = or_default("EVSCORE_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("EVSCORE_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("EVSCORE_DB_MIN_CONNECTIONS", "1")?;
    if db_min_connections > db_max_connections {
        return Err(invalid(
            "EVSCORE_DB_MIN_CONNECTIONS",
            format!(
                "must not exceed EVSCORE_DB_MAX_CONNECTIONS ({db_min_connections} > {db_max_connections})"
            ),
        ));
    }
    let db_acquire_timeout_secs = parse_u64("EVSCORE_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let routing_base_url = or_default("EVSCORE_ROUTING_BASE_URL", "http://localhost:8080/ors/v2");
    let routing_api_key = lookup("EVSCORE_ROUTING_API_KEY")
        .ok()
        .filter(|key| !key.trim().is_empty());
    let routing_profile = or_default("EVSCORE_ROUTING_PROFILE", "driving-car");
    let routing_timeout_secs = parse_u64("EVSCORE_ROUTING_TIMEOUT_SECS", "10")?;
    if routing_timeout_secs == 0 {
        return Err(invalid(
            "EVSCORE_ROUTING_TIMEOUT_SECS",
            "must be greater than zero".to_string(),
        ));
    }
    let routing_max_retries = parse_u32("EVSCORE_ROUTING_MAX_RETRIES", "2")?;
    let routing_retry_backoff_ms = parse_u64("EVSCORE_ROUTING_RETRY_BACKOFF_MS", "250")?;
    let routing_max_concurrent = parse_usize("EVSCORE_ROUTING_MAX_CONCURRENT", "16")?.max(1);

    let max_search_distance_m = parse_positive_f64(
        "EVSCORE_MAX_SEARCH_DISTANCE_M",
        &or_default("EVSCORE_MAX_SEARCH_DISTANCE_M", "100000"),
    )?;
    let numbars_region = or_default("EVSCORE_NUMBARS_REGION", "Freiburg im Breisgau");

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        routing_base_url,
        routing_api_key,
        routing_profile,
        routing_timeout_secs,
        routing_max_retries,
        routing_retry_backoff_ms,
        routing_max_concurrent,
        max_search_distance_m,
        numbars_region,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "EVSCORE_ENV".to_string(),
            reason: format!("expected development, test or production; got {other:?}"),
        }),
    }
}

fn parse_positive_f64(var: &str, raw: &str) -> Result<f64, ConfigError> {
    let value = raw.parse::<f64>().map_err(|e| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason: e.to_string(),
    })?;
    if !value.is_finite() || value <= 0.0 {
        return Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: format!("must be a positive number, got {raw}"),
        });
    }
    Ok(value)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
