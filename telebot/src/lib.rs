//! # telebot
//!
//! Application crate: environment configuration, the [`TeleBot`] driver that ties the
//! connectivity supervisor, request client, update poller and dispatcher to one `tick`, the CLI
//! and the handlers of the `telebot` binary.

pub mod cli;
pub mod config;
pub mod handlers;
pub mod runner;

pub use cli::{Cli, Commands};
pub use config::BotConfig;
pub use runner::{TeleBot, DEFAULT_POLL_INTERVAL};
