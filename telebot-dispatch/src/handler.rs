//! Handler capabilities, one per event path. Handlers get the client so they can reply.

use async_trait::async_trait;
use telebot_api::Api;
use telebot_core::{CallbackEvent, MessageEvent, Result};

/// Receives messages that did not match a registered command.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn on_message(&self, api: &mut Api, message: &MessageEvent) -> Result<()>;
}

/// Receives one slash-command. `args` is the text after the command token, leading whitespace
/// removed.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn on_command(&self, api: &mut Api, message: &MessageEvent, args: &str) -> Result<()>;
}

/// Receives inline-button presses.
#[async_trait]
pub trait CallbackHandler: Send + Sync {
    async fn on_callback(&self, api: &mut Api, callback: &CallbackEvent) -> Result<()>;
}
