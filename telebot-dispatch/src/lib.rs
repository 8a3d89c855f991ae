//! # telebot-dispatch
//!
//! Routes each decoded [`Event`] to exactly one handler path. Callback events go to the callback
//! handler and never reach command lookup; message events whose text starts with `/` are matched by
//! exact token against the command table; everything else goes to the generic message handler.
//! A missing handler is a silent no-op.

mod handler;

use std::collections::HashMap;
use std::sync::Arc;

use telebot_api::Api;
use telebot_core::{BotError, Event, Result};
use tracing::{debug, error, info, instrument, warn};

pub use handler::{CallbackHandler, CommandHandler, MessageHandler};

/// Which path an event took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Command(String),
    Message,
    Callback,
    /// No handler registered for the event's path.
    Dropped,
}

/// Splits `/cmd rest` at the first whitespace. `None` when `text` does not start with `/`.
pub fn parse_command(text: &str) -> Option<(&str, &str)> {
    if !text.starts_with('/') {
        return None;
    }
    match text.split_once(char::is_whitespace) {
        Some((token, rest)) => Some((token, rest.trim_start())),
        None => Some((text, "")),
    }
}

/// Command table plus the generic message and callback handlers.
#[derive(Clone, Default)]
pub struct Dispatcher {
    commands: HashMap<String, Arc<dyn CommandHandler>>,
    limit: Option<usize>,
    message_handler: Option<Arc<dyn MessageHandler>>,
    callback_handler: Option<Arc<dyn CallbackHandler>>,
}

impl Dispatcher {
    /// Dispatcher with an unbounded command table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatcher whose command table holds at most `limit` distinct commands.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn on_message(&mut self, handler: Arc<dyn MessageHandler>) {
        self.message_handler = Some(handler);
    }

    pub fn on_callback(&mut self, handler: Arc<dyn CallbackHandler>) {
        self.callback_handler = Some(handler);
    }

    /// Binds `command` (with or without the leading `/`). Registering an existing command replaces
    /// its handler and returns `Ok(true)`. A full table returns [`BotError::Capacity`].
    pub fn on_command(&mut self, command: &str, handler: Arc<dyn CommandHandler>) -> Result<bool> {
        let token = if command.starts_with('/') {
            command.to_string()
        } else {
            format!("/{}", command)
        };

        if let Some(limit) = self.limit {
            if self.commands.len() >= limit && !self.commands.contains_key(&token) {
                warn!(command = %token, limit, "command table full");
                return Err(BotError::Capacity(limit));
            }
        }

        let replaced = self.commands.insert(token.clone(), handler).is_some();
        if replaced {
            warn!(command = %token, "command handler replaced");
        } else {
            debug!(command = %token, "command registered");
        }
        Ok(replaced)
    }

    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    /// Classifies `event` without running anything.
    pub fn route(&self, event: &Event) -> Route {
        match event {
            Event::Callback(_) if self.callback_handler.is_some() => Route::Callback,
            Event::Callback(_) => Route::Dropped,
            Event::Message(message) => {
                if let Some((token, _)) = parse_command(&message.text) {
                    if self.commands.contains_key(token) {
                        return Route::Command(token.to_string());
                    }
                }
                if self.message_handler.is_some() {
                    Route::Message
                } else {
                    Route::Dropped
                }
            }
        }
    }

    /// Runs the handler for `event`. Handler errors are logged and recorded on `api`, never
    /// propagated.
    #[instrument(
        skip(self, api, event),
        fields(update_id = event.update_id(), chat_id = event.chat_id())
    )]
    pub async fn dispatch(&self, api: &mut Api, event: &Event) -> Route {
        let route = self.route(event);
        let outcome = match (event, &route) {
            (Event::Callback(callback), Route::Callback) => match &self.callback_handler {
                Some(handler) => handler.on_callback(api, callback).await,
                None => Ok(()),
            },
            (Event::Message(message), Route::Command(token)) => {
                let args = parse_command(&message.text).map(|(_, args)| args).unwrap_or_default();
                match self.commands.get(token) {
                    Some(handler) => handler.on_command(api, message, args).await,
                    None => Ok(()),
                }
            }
            (Event::Message(message), Route::Message) => match &self.message_handler {
                Some(handler) => handler.on_message(api, message).await,
                None => Ok(()),
            },
            _ => Ok(()),
        };

        match &outcome {
            Ok(()) => info!(route = ?route, "step: event dispatched"),
            Err(e) => {
                error!(route = ?route, error = %e, "handler failed");
                api.record_error(e);
            }
        }
        route
    }
}
