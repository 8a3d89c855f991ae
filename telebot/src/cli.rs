//! CLI parser.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "telebot")]
#[command(about = "Telegram bot device client", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the bot (config from env; token can override BOT_TOKEN).
    Run {
        #[arg(short, long)]
        token: Option<String>,
    },
    /// Check the token with getMe and exit.
    Check {
        #[arg(short, long)]
        token: Option<String>,
    },
}
