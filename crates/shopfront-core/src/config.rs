use std::path::PathBuf;

use crate::app_config::{AppConfig, DatabaseConfig};
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
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup — no `set_var`/`remove_var` needed.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u16 = |var: &str, default: &str| -> Result<u16, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u16>().map_err(|e| ConfigError::InvalidEnvVar {
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

    let database = DatabaseConfig {
        host: or_default("MYSQL_HOST", "localhost"),
        port: parse_u16("MYSQL_PORT", "3306")?,
        user: require("MYSQL_USER")?,
        password: require("MYSQL_PASSWORD")?,
        database: require("MYSQL_DATABASE")?,
    };

    let log_level = or_default("SHOPFRONT_LOG_LEVEL", "info");
    let seed_path = PathBuf::from(or_default("SHOPFRONT_SEED_PATH", "./config/products.yaml"));

    let db_max_connections = parse_u32("SHOPFRONT_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("SHOPFRONT_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("SHOPFRONT_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    Ok(AppConfig {
        database,
        log_level,
        seed_path,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::env::VarError;

    use super::*;

    fn lookup_from_map<'a>(
        map: &'a HashMap<&'a str, &'a str>,
    ) -> impl Fn(&str) -> Result<String, VarError> + 'a {
        move |key| {
            map.get(key)
                .map(|v| (*v).to_string())
                .ok_or(VarError::NotPresent)
        }
    }

    /// Returns a map with all required env vars populated with valid defaults.
    fn full_env<'a>() -> HashMap<&'a str, &'a str> {
        let mut m = HashMap::new();
        m.insert("MYSQL_USER", "shop");
        m.insert("MYSQL_PASSWORD", "secret");
        m.insert("MYSQL_DATABASE", "shopfront");
        m
    }

    #[test]
    fn build_app_config_fails_without_user() {
        let mut map = full_env();
        map.remove("MYSQL_USER");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "MYSQL_USER"),
            "expected MissingEnvVar(MYSQL_USER), got: {result:?}"
        );
    }

    #[test]
    fn build_app_config_fails_without_password() {
        let mut map = full_env();
        map.remove("MYSQL_PASSWORD");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "MYSQL_PASSWORD"),
            "expected MissingEnvVar(MYSQL_PASSWORD), got: {result:?}"
        );
    }

    #[test]
    fn build_app_config_fails_without_database() {
        let mut map = full_env();
        map.remove("MYSQL_DATABASE");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "MYSQL_DATABASE"),
            "expected MissingEnvVar(MYSQL_DATABASE), got: {result:?}"
        );
    }

    #[test]
    fn build_app_config_succeeds_with_all_required_vars() {
        let map = full_env();
        let result = build_app_config(lookup_from_map(&map));
        assert!(result.is_ok(), "expected Ok, got: {result:?}");
        let cfg = result.unwrap();
        assert_eq!(cfg.database.host, "localhost");
        assert_eq!(cfg.database.port, 3306);
        assert_eq!(cfg.database.user, "shop");
        assert_eq!(cfg.database.database, "shopfront");
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.seed_path, PathBuf::from("./config/products.yaml"));
        assert_eq!(cfg.db_max_connections, 10);
        assert_eq!(cfg.db_min_connections, 1);
        assert_eq!(cfg.db_acquire_timeout_secs, 10);
    }

    #[test]
    fn build_app_config_host_and_port_override() {
        let mut map = full_env();
        map.insert("MYSQL_HOST", "db.internal");
        map.insert("MYSQL_PORT", "3307");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.database.host, "db.internal");
        assert_eq!(cfg.database.port, 3307);
    }

    #[test]
    fn build_app_config_fails_with_invalid_port() {
        let mut map = full_env();
        map.insert("MYSQL_PORT", "not-a-port");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "MYSQL_PORT"),
            "expected InvalidEnvVar(MYSQL_PORT), got: {result:?}"
        );
    }

    #[test]
    fn build_app_config_pool_overrides() {
        let mut map = full_env();
        map.insert("SHOPFRONT_DB_MAX_CONNECTIONS", "25");
        map.insert("SHOPFRONT_DB_MIN_CONNECTIONS", "5");
        map.insert("SHOPFRONT_DB_ACQUIRE_TIMEOUT_SECS", "30");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.db_max_connections, 25);
        assert_eq!(cfg.db_min_connections, 5);
        assert_eq!(cfg.db_acquire_timeout_secs, 30);
    }

    #[test]
    fn build_app_config_fails_with_invalid_pool_size() {
        let mut map = full_env();
        map.insert("SHOPFRONT_DB_MAX_CONNECTIONS", "lots");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "SHOPFRONT_DB_MAX_CONNECTIONS"),
            "expected InvalidEnvVar(SHOPFRONT_DB_MAX_CONNECTIONS), got: {result:?}"
        );
    }

    #[test]
    fn build_app_config_seed_path_override() {
        let mut map = full_env();
        map.insert("SHOPFRONT_SEED_PATH", "/srv/catalog.yaml");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.seed_path, PathBuf::from("/srv/catalog.yaml"));
    }
}
