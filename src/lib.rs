pub mod actions; // form actions: role checks, validation, writes
pub mod auth; // identity provider (GoTrue-compatible or in-process)
pub mod config;
pub mod datetime;
pub mod db;
pub mod models;
pub mod rbac; // roles, sections, home paths
pub mod stay; // unified view over both hospitalization schemas
pub mod validation;
pub mod views; // server-rendered HTML
pub mod web; // axum router, middleware, endpoints

use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error("Auth backend: {0}")]
    Auth(#[from] auth::AuthError),

    #[error(transparent)]
    Database(#[from] db::DatabaseError),

    #[error("Server: {0}")]
    Io(#[from] std::io::Error),
}

/// Load configuration from the environment, migrate the database and serve
/// until Ctrl-C.
pub async fn run() -> Result<(), StartupError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("Docta starting v{}", config::APP_VERSION);

    let config = config::AppConfig::from_env()?;
    let bind = config.bind;
    let state = web::AppState::from_config(config)?;

    // migrate once up front; request connections then find the schema current
    let conn = state.open_db()?;
    let tables = db::sqlite::count_tables(&conn)?;
    drop(conn);
    tracing::info!(
        database = %state.config.database_path.display(),
        tables,
        auth = state.auth.mode(),
        "Database ready"
    );

    web::server::run(state, bind, web::server::ctrl_c()).await?;
    Ok(())
}
