//! Application configuration.
//!
//! Every setting comes from the environment and falls back to a default.
//! The legacy `OPENSHIFT_*` names are honoured when the primary name is unset.

use std::time::Duration;

use crate::errors::{AppError, AppResult};

const DEFAULT_BIND_IP: &str = "127.0.0.1";
const DEFAULT_BIND_PORT: u16 = 8080;
const DEFAULT_DB_HOST: &str = "127.0.0.1";
const DEFAULT_DB_PORT: u16 = 27017;
const DEFAULT_DB_NAME: &str = "test";
const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Database target shared by every connector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
}

impl Default for DbSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_DB_HOST.to_string(),
            port: DEFAULT_DB_PORT,
            user: String::new(),
            password: String::new(),
            name: DEFAULT_DB_NAME.to_string(),
        }
    }
}

/// Server configuration, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Address the HTTP listener binds to.
    pub bind_ip: String,
    /// Port the HTTP listener binds to.
    pub bind_port: u16,
    /// Database the probes connect to.
    pub db: DbSettings,
    /// Upper bound on draining in-flight requests after a shutdown signal.
    pub shutdown_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_ip: DEFAULT_BIND_IP.to_string(),
            bind_port: DEFAULT_BIND_PORT,
            db: DbSettings::default(),
            shutdown_timeout: Duration::from_secs(DEFAULT_SHUTDOWN_TIMEOUT_SECS),
        }
    }
}

impl AppConfig {
    /// Loads configuration from the process environment.
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    /// Returns `AppError::Config` when a numeric variable does not parse.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |primary: &str, legacy: &str| lookup(primary).or_else(|| lookup(legacy));

        let bind_ip = var("BIND_IP", "OPENSHIFT_NODEJS_IP")
            .unwrap_or_else(|| DEFAULT_BIND_IP.to_string());
        let bind_port = parse_number(
            "BIND_PORT",
            var("BIND_PORT", "OPENSHIFT_NODEJS_PORT"),
            DEFAULT_BIND_PORT,
        )?;

        let db = DbSettings {
            host: var("DB_HOST", "OPENSHIFT_EXT_DB_HOST")
                .unwrap_or_else(|| DEFAULT_DB_HOST.to_string()),
            port: parse_number(
                "DB_PORT",
                var("DB_PORT", "OPENSHIFT_EXT_DB_PORT"),
                DEFAULT_DB_PORT,
            )?,
            user: var("DB_USER", "OPENSHIFT_EXT_DB_USERNAME").unwrap_or_default(),
            password: var("DB_PASSWORD", "OPENSHIFT_EXT_DB_PASSWORD").unwrap_or_default(),
            name: var("DB_NAME", "OPENSHIFT_APP_NAME")
                .unwrap_or_else(|| DEFAULT_DB_NAME.to_string()),
        };

        let shutdown_secs = parse_number(
            "SHUTDOWN_TIMEOUT_SECS",
            lookup("SHUTDOWN_TIMEOUT_SECS"),
            DEFAULT_SHUTDOWN_TIMEOUT_SECS,
        )?;

        Ok(Self {
            bind_ip,
            bind_port,
            db,
            shutdown_timeout: Duration::from_secs(shutdown_secs),
        })
    }

    /// `ip:port` string handed to the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_ip, self.bind_port)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: Option<String>, default: T) -> AppResult<T> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{} must be a number, got {:?}", key, value))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> AppResult<AppConfig> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let config = load(&[]).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
        assert_eq!(config.db.port, 27017);
        assert_eq!(config.db.name, "test");
        assert!(config.db.user.is_empty());
        assert!(config.db.password.is_empty());
    }

    #[test]
    fn test_primary_variables_override_defaults() {
        let config = load(&[
            ("BIND_IP", "0.0.0.0"),
            ("BIND_PORT", "9000"),
            ("DB_HOST", "db.internal"),
            ("DB_PORT", "5432"),
            ("DB_USER", "alice"),
            ("DB_PASSWORD", "s3cret"),
            ("DB_NAME", "inventory"),
        ])
        .unwrap();

        assert_eq!(config.bind_addr(), "0.0.0.0:9000");
        assert_eq!(
            config.db,
            DbSettings {
                host: "db.internal".into(),
                port: 5432,
                user: "alice".into(),
                password: "s3cret".into(),
                name: "inventory".into(),
            }
        );
    }

    #[test]
    fn test_legacy_names_are_fallbacks_only() {
        let config = load(&[
            ("OPENSHIFT_NODEJS_PORT", "8181"),
            ("OPENSHIFT_EXT_DB_HOST", "legacy-host"),
            ("DB_HOST", "primary-host"),
            ("OPENSHIFT_APP_NAME", "legacyapp"),
        ])
        .unwrap();

        assert_eq!(config.bind_port, 8181);
        assert_eq!(config.db.host, "primary-host");
        assert_eq!(config.db.name, "legacyapp");
    }

    #[test]
    fn test_empty_db_name_is_kept_verbatim() {
        let config = load(&[("DB_NAME", "")]).unwrap();
        assert_eq!(config.db.name, "");
    }

    #[test]
    fn test_non_numeric_port_is_rejected() {
        let err = load(&[("DB_PORT", "mongo")]).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        assert!(err.to_string().contains("DB_PORT"));
    }

    #[test]
    fn test_shutdown_timeout() {
        let config = load(&[("SHUTDOWN_TIMEOUT_SECS", "5")]).unwrap();
        assert_eq!(config.shutdown_timeout, Duration::from_secs(5));
    }
}
