use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

const DEFAULT_SOURCE_URL: &str = "https://pharmaciedegardetanger.site/";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
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
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
#[allow(clippy::too_many_lines)]
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

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

    let parse_i32 = |var: &str, default: &str| -> Result<i32, ConfigError> {
        or_default(var, default)
            .parse::<i32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_f64 = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let value = or_default(var, default)
            .parse::<f64>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(invalid(var, "must be a finite number".to_string()))
        }
    };

    let database_url = lookup("DATABASE_URL").ok().filter(|s| !s.trim().is_empty());
    let env = parse_environment(&or_default("GARDE_ENV", "development"))?;

    let bind_addr = parse_addr("GARDE_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("GARDE_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("GARDE_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("GARDE_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("GARDE_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let source_url = or_default("GARDE_SOURCE_URL", DEFAULT_SOURCE_URL);
    if !(source_url.starts_with("http://") || source_url.starts_with("https://")) {
        return Err(invalid(
            "GARDE_SOURCE_URL",
            "must be an http(s) URL".to_string(),
        ));
    }
    let scraper_request_timeout_secs = parse_u64("GARDE_SCRAPER_REQUEST_TIMEOUT_SECS", "15")?;
    let scraper_user_agent = or_default("GARDE_SCRAPER_USER_AGENT", DEFAULT_USER_AGENT);

    let city_latitude = parse_f64("GARDE_CITY_LATITUDE", "35.7595")?;
    let city_longitude = parse_f64("GARDE_CITY_LONGITUDE", "-5.8340")?;
    let location_jitter_degrees = parse_f64("GARDE_LOCATION_JITTER_DEGREES", "0.05")?;
    if location_jitter_degrees < 0.0 {
        return Err(invalid(
            "GARDE_LOCATION_JITTER_DEGREES",
            "must not be negative".to_string(),
        ));
    }
    let locate_concurrency = parse_usize("GARDE_LOCATE_CONCURRENCY", "8")?;
    let utc_offset_minutes = parse_i32("GARDE_UTC_OFFSET_MINUTES", "60")?;
    if utc_offset_minutes.abs() >= 24 * 60 {
        return Err(invalid(
            "GARDE_UTC_OFFSET_MINUTES",
            "must be strictly between -1440 and 1440".to_string(),
        ));
    }

    let scrape_cron = or_default("GARDE_SCRAPE_CRON", "0 0 0 * * *");
    let duty_refresh_cron = or_default("GARDE_DUTY_REFRESH_CRON", "0 5 0 * * *");

    let allowed_origins = or_default("GARDE_ALLOWED_ORIGINS", "*")
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
        source_url,
        scraper_request_timeout_secs,
        scraper_user_agent,
        city_latitude,
        city_longitude,
        location_jitter_degrees,
        locate_concurrency,
        utc_offset_minutes,
        scrape_cron,
        duty_refresh_cron,
        allowed_origins,
    })
}

fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "GARDE_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}
