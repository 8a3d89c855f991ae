//! Handlers of the `telebot` binary: echo, a handful of commands, inline-button presses and
//! optional file-store access.

use std::sync::Arc;

use async_trait::async_trait;
use telebot_api::Api;
use telebot_core::{
    CallbackEvent, InlineButton, KeyboardSpec, MessageEvent, Result, DELETE_CALLBACK_DATA,
};
use telebot_dispatch::{CallbackHandler, CommandHandler, MessageHandler};
use telebot_storage::FileStore;
use tracing::{info, warn};

use crate::runner::TeleBot;

const NOTES_FILE: &str = "/notes.txt";

const HELP_TEXT: &str = "Commands:\n\
/start - show the main keyboard\n\
/help - this text\n\
/buttons - inline buttons\n\
/time - device clock\n\
/files [dir] - list stored files\n\
/note <text> - append a note";

/// Replies with the received text.
pub struct EchoHandler;

#[async_trait]
impl MessageHandler for EchoHandler {
    async fn on_message(&self, api: &mut Api, message: &MessageEvent) -> Result<()> {
        let name = message.from.first_name.as_deref().unwrap_or("there");
        info!(chat_id = message.chat_id, "echo");
        api.send_text(message.chat_id, &format!("{}, you said: {}", name, message.text)).await?;
        Ok(())
    }
}

pub struct StartCommand;

#[async_trait]
impl CommandHandler for StartCommand {
    async fn on_command(&self, api: &mut Api, message: &MessageEvent, _args: &str) -> Result<()> {
        let rows = [["/help", "/time"], ["/buttons", "/files"]];
        let keyboard = KeyboardSpec::reply(&rows, true, false);
        api.send_keyboard(message.chat_id, "Hello! Pick a command.", &keyboard).await?;
        Ok(())
    }
}

pub struct HelpCommand;

#[async_trait]
impl CommandHandler for HelpCommand {
    async fn on_command(&self, api: &mut Api, message: &MessageEvent, _args: &str) -> Result<()> {
        api.send_text(message.chat_id, HELP_TEXT).await?;
        Ok(())
    }
}

pub struct TimeCommand;

#[async_trait]
impl CommandHandler for TimeCommand {
    async fn on_command(&self, api: &mut Api, message: &MessageEvent, _args: &str) -> Result<()> {
        let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        api.send_text(message.chat_id, &format!("Device time: {}", now)).await?;
        Ok(())
    }
}

/// Sends an inline keyboard whose presses come back as callback events.
pub struct ButtonsCommand;

#[async_trait]
impl CommandHandler for ButtonsCommand {
    async fn on_command(&self, api: &mut Api, message: &MessageEvent, _args: &str) -> Result<()> {
        let keyboard = KeyboardSpec::inline(
            &[
                InlineButton::callback("👋 Say hi", "hi"),
                InlineButton::callback("🕒 Time", "time"),
                InlineButton::link("Bot API docs", "https://core.telegram.org/bots/api"),
            ],
            true,
        );
        api.send_keyboard(message.chat_id, "Buttons:", &keyboard).await?;
        Ok(())
    }
}

/// Acknowledges every press; the delete button removes the message it is attached to.
pub struct ButtonPressHandler;

#[async_trait]
impl CallbackHandler for ButtonPressHandler {
    async fn on_callback(&self, api: &mut Api, callback: &CallbackEvent) -> Result<()> {
        match callback.data.as_str() {
            DELETE_CALLBACK_DATA => {
                api.answer_callback_query(&callback.callback_id, None).await?;
                if callback.message_id != 0 {
                    api.delete_message(callback.chat_id, callback.message_id).await?;
                }
            }
            "time" => {
                let now = chrono::Local::now().format("%H:%M:%S").to_string();
                api.answer_callback_query(&callback.callback_id, Some(&now)).await?;
            }
            data => {
                api.answer_callback_query(&callback.callback_id, Some("👍")).await?;
                if callback.chat_id != 0 {
                    api.send_text(callback.chat_id, &format!("You pressed: {}", data)).await?;
                }
            }
        }
        Ok(())
    }
}

/// `/files [dir]`: directory listing of the file store.
pub struct FilesCommand {
    store: FileStore,
}

#[async_trait]
impl CommandHandler for FilesCommand {
    async fn on_command(&self, api: &mut Api, message: &MessageEvent, args: &str) -> Result<()> {
        let dir = if args.trim().is_empty() { "/" } else { args.trim() };
        let reply = match self.store.list(dir).await {
            Ok(listing) => listing,
            Err(e) => {
                warn!(dir, error = %e, "listing failed");
                format!("Cannot list {}: {}", dir, e)
            }
        };
        api.send_text(message.chat_id, &reply).await?;
        Ok(())
    }
}

/// `/note <text>`: appends a timestamped line to the notes file.
pub struct NoteCommand {
    store: FileStore,
}

#[async_trait]
impl CommandHandler for NoteCommand {
    async fn on_command(&self, api: &mut Api, message: &MessageEvent, args: &str) -> Result<()> {
        if args.trim().is_empty() {
            api.send_text(message.chat_id, "Usage: /note <text>").await?;
            return Ok(());
        }
        let line = format!(
            "{} {}\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            args.trim()
        );
        let reply = match self.store.append(NOTES_FILE, line.as_bytes()).await {
            Ok(()) => "Noted.".to_string(),
            Err(e) => {
                warn!(error = %e, "note not stored");
                format!("Note not stored: {}", e)
            }
        };
        api.send_text(message.chat_id, &reply).await?;
        Ok(())
    }
}

/// Registers every handler of the binary on `bot`. File commands need a store.
pub fn register_default_handlers(bot: &mut TeleBot, store: Option<FileStore>) -> Result<()> {
    bot.on_message(Arc::new(EchoHandler));
    bot.on_callback(Arc::new(ButtonPressHandler));
    bot.on_command("start", Arc::new(StartCommand))?;
    bot.on_command("help", Arc::new(HelpCommand))?;
    bot.on_command("time", Arc::new(TimeCommand))?;
    bot.on_command("buttons", Arc::new(ButtonsCommand))?;
    if let Some(store) = store {
        bot.on_command("files", Arc::new(FilesCommand { store: store.clone() }))?;
        bot.on_command("note", Arc::new(NoteCommand { store }))?;
    }
    Ok(())
}
