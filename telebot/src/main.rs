//! Binary for the telebot device client.

use std::path::Path;

use anyhow::Result;
use clap::Parser;
use telebot::handlers::register_default_handlers;
use telebot::{BotConfig, Cli, Commands, TeleBot};
use telebot_core::{init_tracing, ConnectivityState};
use telebot_storage::FileStore;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { token } => run(load(token)?).await,
        Commands::Check { token } => check(load(token)?).await,
    }
}

fn load(token: Option<String>) -> Result<BotConfig> {
    let config = BotConfig::load(token)?;
    config.validate()?;
    init_tracing(Some(Path::new(&config.log_file)))?;
    Ok(config)
}

async fn run(config: BotConfig) -> Result<()> {
    let mut bot = TeleBot::from_config(&config)?;

    let store = match &config.storage_root {
        Some(root) => Some(FileStore::open(root).await?),
        None => None,
    };
    register_default_handlers(&mut bot, store)?;
    bot.on_status(Box::new(|state: ConnectivityState| info!(%state, "connectivity changed")));

    bot.begin()?;
    if let Err(e) = bot.connect(config.connection_config()?).await {
        warn!(error = %e, "initial connect failed, relying on auto reconnect");
    }
    bot.run().await
}

async fn check(config: BotConfig) -> Result<()> {
    let mut bot = TeleBot::from_config(&config)?;
    let me = bot.api().get_me().await?;
    let username = me.get("username").and_then(|v| v.as_str()).unwrap_or("?");
    info!(username, "token accepted");
    println!("@{}", username);
    Ok(())
}
