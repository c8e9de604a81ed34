mod bootstrap;
mod http;
mod progress;
mod report;

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use raboneko_core::config::{AppConfig, LoadOptions};
use raboneko_core::ThreadRngChance;
use raboneko_discord::api::DiscordApi;
use raboneko_discord::commands::progress_command;
use raboneko_discord::events::{EventDispatcher, SlashCommandHandler};
use raboneko_discord::gateway::GatewayRunner;
use raboneko_discord::keyword::KeywordReactHandler;

use crate::progress::ProgressService;
use crate::report::WeeklyReportService;

fn init_logging(config: &AppConfig) {
    use raboneko_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Load config and initialize logging before any other operations.
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;

    if let Err(error) = app
        .api
        .register_guild_command(&app.config.discord.guild_id, &progress_command())
        .await
    {
        warn!(error = %error, "slash command registration failed; keeping the previous registration");
    }

    let report_service = Arc::new(WeeklyReportService::new(
        Arc::clone(&app.repository),
        Arc::clone(&app.api),
        ThreadRngChance,
        app.config.discord.guild_id.clone(),
        app.config.discord.announcements_channel_id.clone(),
        app.config.report.joke_chance,
    ));

    http::spawn(
        &app.config.server.bind_address,
        app.config.server.port,
        app.db_pool.clone(),
        report_service,
    )
    .await?;

    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(SlashCommandHandler::new(ProgressService::new(
        Arc::clone(&app.repository),
        Arc::clone(&app.api),
        app.config.discord.updates_channel_id.clone(),
    )));
    dispatcher.register(KeywordReactHandler::new(Arc::clone(&app.api)));

    let runner = GatewayRunner::noop(dispatcher);
    runner.start().await?;

    info!("raboneko started");
    wait_for_shutdown().await?;
    info!("raboneko stopping");

    Ok(())
}

async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
