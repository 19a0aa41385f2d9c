use crate::app_config::{AppConfig, Environment};
use crate::fuel::parse_fuel_list;
use crate::geo::Coordinate;
use crate::settings::IntegrationSettings;
use crate::ConfigError;

pub const DEFAULT_API_BASE_URL: &str = "https://fppdirectapi-prod.fuelpricesqld.com.au";

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
/// Parsing and validation are decoupled from the process environment so tests
/// can drive them with a plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
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
            .trim()
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .trim()
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_f64 = |var: &str| -> Result<Option<f64>, ConfigError> {
        match lookup(var) {
            Ok(raw) if !raw.trim().is_empty() => raw
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|e| invalid(var, e.to_string())),
            _ => Ok(None),
        }
    };

    let subscriber_token = require("QLDFUEL_SUBSCRIBER_TOKEN")?;
    let env = parse_environment(&or_default("QLDFUEL_ENV", "development"))?;

    let home = match (
        parse_f64("QLDFUEL_HOME_LATITUDE")?,
        parse_f64("QLDFUEL_HOME_LONGITUDE")?,
    ) {
        (Some(lat), Some(lng)) => Some(Coordinate::new(lat, lng).map_err(|e| {
            let var = match &e {
                ConfigError::InvalidSetting { field, .. } if field == "longitude" => {
                    "QLDFUEL_HOME_LONGITUDE"
                }
                _ => "QLDFUEL_HOME_LATITUDE",
            };
            invalid(var, e.to_string())
        })?),
        (None, None) => None,
        (Some(_), None) => {
            return Err(invalid(
                "QLDFUEL_HOME_LONGITUDE",
                "must be set together with QLDFUEL_HOME_LATITUDE".to_string(),
            ))
        }
        (None, Some(_)) => {
            return Err(invalid(
                "QLDFUEL_HOME_LATITUDE",
                "must be set together with QLDFUEL_HOME_LONGITUDE".to_string(),
            ))
        }
    };

    let radius_km = parse_u32("QLDFUEL_RADIUS_KM", "5")?;
    let fuel_types = parse_fuel_list(&or_default("QLDFUEL_FUEL_TYPES", "12,5,3"))
        .map_err(|e| invalid("QLDFUEL_FUEL_TYPES", e.to_string()))?;
    let scan_interval_hours = parse_u32("QLDFUEL_SCAN_INTERVAL_HOURS", "6")?;
    let settings = IntegrationSettings::new(radius_km, fuel_types, scan_interval_hours)?;

    let api_base_url = or_default("QLDFUEL_API_BASE_URL", DEFAULT_API_BASE_URL);
    let request_timeout_secs = parse_u64("QLDFUEL_REQUEST_TIMEOUT_SECS", "30")?;
    if request_timeout_secs == 0 {
        return Err(invalid(
            "QLDFUEL_REQUEST_TIMEOUT_SECS",
            "must be greater than zero".to_string(),
        ));
    }

    let bind_addr = or_default("QLDFUEL_BIND_ADDR", "0.0.0.0:3000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("QLDFUEL_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("QLDFUEL_LOG_LEVEL", "info");
    let database_url = lookup("DATABASE_URL").ok().filter(|v| !v.is_empty());

    let db_max_connections = parse_u32("QLDFUEL_DB_MAX_CONNECTIONS", "5")?;
    let db_min_connections = parse_u32("QLDFUEL_DB_MIN_CONNECTIONS", "1")?;
    if db_min_connections > db_max_connections {
        return Err(invalid(
            "QLDFUEL_DB_MIN_CONNECTIONS",
            format!(
                "must not exceed QLDFUEL_DB_MAX_CONNECTIONS ({db_min_connections} > {db_max_connections})"
            ),
        ));
    }
    let db_acquire_timeout_secs = parse_u64("QLDFUEL_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    Ok(AppConfig {
        env,
        subscriber_token,
        home,
        settings,
        api_base_url,
        request_timeout_secs,
        bind_addr,
        log_level,
        database_url,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "production" => Ok(Environment::Production),
        "test" => Ok(Environment::Test),
        other => Err(ConfigError::InvalidEnvVar {
            var: "QLDFUEL_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
