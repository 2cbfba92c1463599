use crate::app_config::{AppConfig, Environment};
use crate::regions::CountryCode;
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
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
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

    let database_url = optional("DATABASE_URL");
    let rest_url = optional("DEALDECK_REST_URL");
    let rest_api_key = optional("DEALDECK_REST_API_KEY");

    if database_url.is_none() && rest_url.is_none() {
        return Err(ConfigError::MissingEnvVar(
            "DATABASE_URL or DEALDECK_REST_URL".to_string(),
        ));
    }

    let env = parse_environment(&or_default("DEALDECK_ENV", "development"))?;

    let bind_addr = or_default("DEALDECK_BIND_ADDR", "0.0.0.0:3000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("DEALDECK_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("DEALDECK_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("DEALDECK_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("DEALDECK_DB_MIN_CONNECTIONS", "1")?;
    if db_min_connections > db_max_connections {
        return Err(invalid(
            "DEALDECK_DB_MIN_CONNECTIONS",
            format!(
                "min connections ({db_min_connections}) exceeds max connections ({db_max_connections})"
            ),
        ));
    }
    let db_acquire_timeout_secs = parse_u64("DEALDECK_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let geo_probe_url = or_default("DEALDECK_GEO_PROBE_URL", "http://localhost:3000/api/geo");
    let geo_fallback_country =
        CountryCode::parse(&or_default("DEALDECK_GEO_FALLBACK_COUNTRY", "IN"))
            .map_err(|e| invalid("DEALDECK_GEO_FALLBACK_COUNTRY", e.to_string()))?;

    let request_timeout_secs = parse_u64("DEALDECK_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("DEALDECK_USER_AGENT", "dealdeck/0.1 (offer-catalog)");

    let storage_dir = PathBuf::from(or_default("DEALDECK_STORAGE_DIR", "./.dealdeck"));
    let presentations_path = PathBuf::from(or_default(
        "DEALDECK_PRESENTATIONS_PATH",
        "./config/presentations.yaml",
    ));

    let revalidate_tokens: Vec<String> = or_default("DEALDECK_REVALIDATE_TOKENS", "")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect();

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        rest_url,
        rest_api_key,
        geo_probe_url,
        geo_fallback_country,
        request_timeout_secs,
        user_agent,
        storage_dir,
        presentations_path,
        revalidate_tokens,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnvVar`] for anything other than
/// `development`, `test`, or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "DEALDECK_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
