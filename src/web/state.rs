use std::sync::Arc;

use rusqlite::Connection;

use crate::auth::{AuthBackend, AuthError, LocalAuth, RemoteAuth};
use crate::config::{AppConfig, AuthMode};
use crate::db::sqlite::open_database;
use crate::db::DatabaseError;

/// Shared handler state. Each request opens its own SQLite connection.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth: Arc<AuthBackend>,
}

impl AppState {
    pub fn new(config: AppConfig, auth: AuthBackend) -> Self {
        Self {
            config: Arc::new(config),
            auth: Arc::new(auth),
        }
    }

    /// Build the auth backend the configuration asks for.
    pub fn from_config(config: AppConfig) -> Result<Self, AuthError> {
        let auth = match config.auth_mode {
            AuthMode::Remote => {
                let (url, key) = config
                    .auth_url
                    .as_deref()
                    .zip(config.auth_key.as_deref())
                    .ok_or_else(|| AuthError::Transport("auth service not configured".into()))?;
                AuthBackend::Remote(RemoteAuth::new(url, key)?)
            }
            AuthMode::Local => {
                tracing::warn!("Using in-process accounts; set DOCTA_AUTH_URL for production");
                AuthBackend::Local(LocalAuth::new())
            }
        };
        Ok(Self::new(config, auth))
    }

    pub fn open_db(&self) -> Result<Connection, DatabaseError> {
        open_database(&self.config.database_path)
    }
}
