//! Core types: connectivity state, sender identity and the decoded update events.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Link state owned by the connectivity supervisor. Exactly one value is live at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectivityState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

impl fmt::Display for ConnectivityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectivityState::Disconnected => "disconnected",
            ConnectivityState::Connecting => "connecting",
            ConnectivityState::Connected => "connected",
            ConnectivityState::Error => "error",
        };
        f.write_str(s)
    }
}

/// Who sent a message or pressed a button.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    pub username: Option<String>,
    pub first_name: Option<String>,
}

/// A chat message (plain text or slash-command).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEvent {
    pub update_id: i64,
    pub chat_id: i64,
    pub message_id: i64,
    /// Empty when the message carries no text (media, stickers, service messages).
    pub text: String,
    pub from: Sender,
}

/// An inline-button press.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackEvent {
    pub update_id: i64,
    pub chat_id: i64,
    /// Id of the message the pressed keyboard is attached to.
    pub message_id: i64,
    pub from: Sender,
    /// Passed back to `answerCallbackQuery`.
    pub callback_id: String,
    pub data: String,
}

/// One decoded server update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    Message(MessageEvent),
    Callback(CallbackEvent),
}

impl Event {
    /// Server-assigned, strictly increasing update id.
    pub fn update_id(&self) -> i64 {
        match self {
            Event::Message(m) => m.update_id,
            Event::Callback(c) => c.update_id,
        }
    }

    pub fn chat_id(&self) -> i64 {
        match self {
            Event::Message(m) => m.chat_id,
            Event::Callback(c) => c.chat_id,
        }
    }

    pub fn from(&self) -> &Sender {
        match self {
            Event::Message(m) => &m.from,
            Event::Callback(c) => &c.from,
        }
    }

    pub fn is_callback(&self) -> bool {
        matches!(self, Event::Callback(_))
    }
}
