mod commands;
mod config;
mod error;
mod executor;
mod platform;
mod reply;
mod router;
mod services;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::{CommandRegistry, Services};
use crate::config::Config;
use crate::executor::ProcessExecutor;
use crate::router::Router;
use crate::services::{TorrentControl, VpnControl};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,seedbox_bot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    info!("  Allowed users: {:?}", config.telegram.allowed_user_ids);
    info!("  Torrent client: {}", config.transmission.program);
    info!(
        "  Download path: {} (default folder: {})",
        config.transmission.download_path.display(),
        config.transmission.default_folder
    );
    info!("  VPN service: {}", config.vpn.program);
    info!("  Command timeout: {:?}", config.command_timeout());

    let bot = Bot::new(&config.telegram.bot_token);
    let me = bot
        .get_me()
        .await
        .context("Failed to fetch bot identity from Telegram")?;
    let bot_username = me.user.username.clone();
    info!("  Bot username: {:?}", bot_username);

    let services = Services {
        torrent: TorrentControl::new(&config.transmission),
        vpn: VpnControl::new(&config.vpn),
    };
    let runner = Arc::new(ProcessExecutor::new(config.command_timeout()));
    let router = Arc::new(Router::new(
        config.telegram.allowed_user_ids.iter().copied(),
        CommandRegistry::new(bot_username),
        services,
        runner,
    ));

    // Run forever, dispatching messages
    info!("Bot is starting...");
    platform::telegram::run(router, bot).await?;

    Ok(())
}
