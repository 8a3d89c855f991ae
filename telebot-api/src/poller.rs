//! Long-poll update retrieval and cursor tracking.

use serde::Deserialize;
use serde_json::Value;
use telebot_core::{BotError, CallbackEvent, Event, MessageEvent, Result, Sender};
use tracing::{debug, info, warn};

use crate::client::{parse_envelope, Api};

/// Owns the update cursor: the highest update id seen so far. It never moves backwards.
#[derive(Debug, Clone, Default)]
pub struct UpdatePoller {
    cursor: Option<i64>,
}

impl UpdatePoller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last seen update id, 0 before the first update arrives.
    pub fn cursor(&self) -> i64 {
        self.cursor.unwrap_or(0)
    }

    /// `offset` for the next request; `None` until an update has been seen.
    pub fn next_offset(&self) -> Option<i64> {
        self.cursor.map(|c| c + 1)
    }

    /// Fetches and decodes one batch. The caller decides the cadence.
    pub async fn poll(&mut self, api: &mut Api) -> Result<Vec<Event>> {
        let long_poll_secs = api.config().long_poll_secs;
        let body = api.get_updates(long_poll_secs, self.next_offset()).await?;
        let events = self.ingest(&body);
        if let Err(e) = &events {
            warn!(error = %e, "update batch rejected");
            api.record_error(e);
        }
        events
    }

    /// Decodes a `getUpdates` body and advances the cursor to the batch maximum before any item
    /// is decoded, so an undecodable item is never requested again. A malformed envelope leaves
    /// the cursor untouched.
    pub fn ingest(&mut self, body: &str) -> Result<Vec<Event>> {
        let result = parse_envelope(body)?;
        let items = result
            .as_array()
            .ok_or_else(|| BotError::protocol("getUpdates result is not an array"))?;

        if let Some(max_id) = items
            .iter()
            .filter_map(|item| item.get("update_id").and_then(Value::as_i64))
            .max()
        {
            self.advance(max_id);
        }

        let events: Vec<Event> = items
            .iter()
            .filter_map(|item| match decode_update(item) {
                Ok(Some(event)) => Some(event),
                Ok(None) => {
                    debug!("skipping update without message or callback_query");
                    None
                }
                Err(e) => {
                    warn!(error = %e, "skipping undecodable update");
                    None
                }
            })
            .collect();

        if !items.is_empty() {
            info!(
                received = items.len(),
                decoded = events.len(),
                cursor = self.cursor(),
                "updates received"
            );
        }
        Ok(events)
    }

    fn advance(&mut self, update_id: i64) {
        self.cursor = Some(self.cursor.map_or(update_id, |c| c.max(update_id)));
    }
}

#[derive(Deserialize)]
struct RawUpdate {
    update_id: i64,
    message: Option<RawMessage>,
    callback_query: Option<RawCallbackQuery>,
}

#[derive(Deserialize)]
struct RawMessage {
    message_id: i64,
    chat: RawChat,
    from: Option<RawUser>,
    text: Option<String>,
}

#[derive(Deserialize)]
struct RawChat {
    id: i64,
}

#[derive(Deserialize)]
struct RawUser {
    username: Option<String>,
    first_name: Option<String>,
}

#[derive(Deserialize)]
struct RawCallbackQuery {
    id: String,
    from: Option<RawUser>,
    message: Option<RawMessage>,
    data: Option<String>,
}

fn sender(user: Option<RawUser>) -> Sender {
    match user {
        Some(u) => Sender {
            username: u.username,
            first_name: u.first_name,
        },
        None => Sender::default(),
    }
}

/// Decodes one raw update. `Ok(None)` for update kinds other than `message` / `callback_query`.
pub fn decode_update(item: &Value) -> Result<Option<Event>> {
    let raw = RawUpdate::deserialize(item)?;

    if let Some(msg) = raw.message {
        return Ok(Some(Event::Message(MessageEvent {
            update_id: raw.update_id,
            chat_id: msg.chat.id,
            message_id: msg.message_id,
            text: msg.text.unwrap_or_default(),
            from: sender(msg.from),
        })));
    }

    if let Some(query) = raw.callback_query {
        let (chat_id, message_id) = query
            .message
            .as_ref()
            .map(|m| (m.chat.id, m.message_id))
            .unwrap_or((0, 0));
        return Ok(Some(Event::Callback(CallbackEvent {
            update_id: raw.update_id,
            chat_id,
            message_id,
            from: sender(query.from),
            callback_id: query.id,
            data: query.data.unwrap_or_default(),
        })));
    }

    Ok(None)
}
