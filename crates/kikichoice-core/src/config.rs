use crate::app_config::{AppConfig, Environment, LocalDbConfig};
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
/// Unlike [`load_app_config`], this does NOT load `.env` files; useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Read the mirror database settings (`LOCAL_DB_*`) from the process env.
#[must_use]
pub fn load_local_db_config() -> LocalDbConfig {
    build_local_db_config(|key| std::env::var(key))
}

/// Validate a mirror database config for a `--sync-local` run and return its
/// host and port.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` if `LOCAL_DB_ENABLED` is not `true` or
/// `LOCAL_DB_PORT` is not a port number, and `ConfigError::MissingEnvVar` if
/// `LOCAL_DB_HOST` is unset.
pub fn require_local_db(config: &LocalDbConfig) -> Result<(&str, u16), ConfigError> {
    if !config.enabled {
        return Err(ConfigError::InvalidEnvVar {
            var: "LOCAL_DB_ENABLED".to_string(),
            reason: "must be set to 'true' when local sync is requested".to_string(),
        });
    }
    let host = config
        .host
        .as_deref()
        .ok_or_else(|| ConfigError::MissingEnvVar("LOCAL_DB_HOST".to_string()))?;
    let port = config
        .port
        .parse::<u16>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: "LOCAL_DB_PORT".to_string(),
            reason: e.to_string(),
        })?;
    Ok((host, port))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup, no `set_var`/`remove_var` needed.
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

    let optional = |var: &str| -> Option<String> {
        lookup(var).ok().filter(|v| !v.trim().is_empty())
    };

    let parse = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("KIKI_ENV", "development"))?;

    let bind_addr = parse("KIKI_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("KIKI_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("KIKI_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("KIKI_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("KIKI_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    if db_min_connections > db_max_connections {
        return Err(ConfigError::InvalidEnvVar {
            var: "KIKI_DB_MIN_CONNECTIONS".to_string(),
            reason: format!(
                "min connections ({db_min_connections}) exceeds max connections ({db_max_connections})"
            ),
        });
    }

    let azure_storage_account = optional("AZURE_BLOB_STORAGE_ACCOUNT_NAME");
    let azure_storage_key = optional("AZURE_BLOB_STORAGE_KEY");

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        azure_storage_account,
        azure_storage_key,
    })
}

/// Build the mirror database config. Empty values count as unset, and
/// `LOCAL_DB_ENABLED` only enables the mirror when it is exactly `"true"`.
fn build_local_db_config<F>(lookup: F) -> LocalDbConfig
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let non_empty = |var: &str| -> Option<String> { lookup(var).ok().filter(|v| !v.is_empty()) };

    LocalDbConfig {
        host: non_empty("LOCAL_DB_HOST"),
        port: non_empty("LOCAL_DB_PORT").unwrap_or_else(|| "5432".to_string()),
        user: non_empty("LOCAL_DB_USER").unwrap_or_else(|| "postgres".to_string()),
        password: non_empty("LOCAL_DB_PASSWORD"),
        name: non_empty("LOCAL_DB_NAME").unwrap_or_else(|| "postgres".to_string()),
        enabled: non_empty("LOCAL_DB_ENABLED").as_deref() == Some("true"),
    }
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "production" => Ok(Environment::Production),
        "test" => Ok(Environment::Test),
        other => Err(ConfigError::InvalidEnvVar {
            var: "KIKI_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
