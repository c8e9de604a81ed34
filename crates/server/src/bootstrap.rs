use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use raboneko_core::config::{AppConfig, ConfigError, LoadOptions};
use raboneko_db::{connect_with_settings, migrations, DbPool, SqlProgressLogRepository};
use raboneko_discord::api::HttpDiscordApi;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub repository: Arc<SqlProgressLogRepository>,
    pub api: Arc<HttpDiscordApi>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!("starting application bootstrap");

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!("database connection established");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!("database migrations applied");

    let repository = Arc::new(SqlProgressLogRepository::new(db_pool.clone()));
    let api = Arc::new(HttpDiscordApi::new(
        config.discord.bot_token.clone(),
        config.discord.application_id.clone(),
    ));

    Ok(Application { config, db_pool, repository, api })
}
