//! # telebot-core
//!
//! Core types shared by every telebot crate: decoded [`Event`]s, [`ConnectivityState`],
//! the [`BotError`] taxonomy, keyboard [`markup`] construction and tracing initialization.
//! Transport-agnostic; used by telebot-api, telebot-link, telebot-dispatch and the app crate.

pub mod error;
pub mod logger;
pub mod markup;
pub mod types;

pub use error::{BotError, Result, TransportError};
pub use logger::init_tracing;
pub use markup::{
    build_inline_keyboard, build_reply_keyboard, build_url_keyboard, InlineButton, KeyboardSpec,
    DELETE_BUTTON_LABEL, DELETE_CALLBACK_DATA,
};
pub use types::{CallbackEvent, ConnectivityState, Event, MessageEvent, Sender};
