use std::net::SocketAddr;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Docta";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_BIND: &str = "127.0.0.1:3000";
pub const DEFAULT_MESSAGE_RETENTION_DAYS: i64 = 90;
/// Upper bound on the read-message retention window (a century).
pub const MAX_MESSAGE_RETENTION_DAYS: i64 = 36_500;

/// Get the application data directory
/// ~/Docta/ on all platforms, falling back to the working directory.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Default SQLite database location
pub fn default_database_path() -> PathBuf {
    app_data_dir().join("docta.db")
}

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "docta=info,docta_lib=info,tower_http=warn"
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// GoTrue-compatible service at `DOCTA_AUTH_URL`.
    Remote,
    /// In-process accounts, for development.
    Local,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },

    #[error("{0} is required when DOCTA_AUTH_MODE=remote")]
    Missing(&'static str),
}

/// Runtime configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub database_path: PathBuf,
    pub auth_mode: AuthMode,
    pub auth_url: Option<String>,
    pub auth_key: Option<String>,
    pub cron_secret: Option<String>,
    pub message_retention_days: i64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_raw = get("DOCTA_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_raw.parse().map_err(|_| ConfigError::Invalid {
            key: "DOCTA_BIND",
            value: bind_raw.clone(),
        })?;

        let auth_url = get("DOCTA_AUTH_URL");
        let auth_mode = match get("DOCTA_AUTH_MODE").as_deref() {
            Some("remote") => AuthMode::Remote,
            Some("local") => AuthMode::Local,
            None if auth_url.is_some() => AuthMode::Remote,
            None => AuthMode::Local,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "DOCTA_AUTH_MODE",
                    value: other.to_string(),
                })
            }
        };
        let auth_key = get("DOCTA_AUTH_KEY");
        if auth_mode == AuthMode::Remote {
            if auth_url.is_none() {
                return Err(ConfigError::Missing("DOCTA_AUTH_URL"));
            }
            if auth_key.is_none() {
                return Err(ConfigError::Missing("DOCTA_AUTH_KEY"));
            }
        }

        let message_retention_days = match get("DOCTA_MESSAGE_RETENTION_DAYS") {
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|d| (1..=MAX_MESSAGE_RETENTION_DAYS).contains(d))
                .ok_or(ConfigError::Invalid {
                    key: "DOCTA_MESSAGE_RETENTION_DAYS",
                    value: raw,
                })?,
            None => DEFAULT_MESSAGE_RETENTION_DAYS,
        };

        Ok(Self {
            bind,
            database_path: get("DOCTA_DATABASE")
                .map(PathBuf::from)
                .unwrap_or_else(default_database_path),
            auth_mode,
            auth_url,
            auth_key,
            cron_secret: get("CRON_SECRET"),
            message_retention_days,
        })
    }
}
