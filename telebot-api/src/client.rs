//! Protocol request client and outbound operations.
//!
//! Every call opens a fresh connection, writes one request, reads the response and closes the
//! connection whatever happened. Failures never escape as panics: they come back as [`BotError`]
//! and are also kept as the latest error description.

use serde_json::Value;
use telebot_core::{BotError, KeyboardSpec, Result, TransportError};
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use crate::config::ApiConfig;
use crate::encoding::FormParams;
use crate::http::{self, HttpMethod};
use crate::transport::Transport;

/// Header block allowance on top of the body limit.
const MAX_HEADER_BYTES: usize = 8 * 1024;

/// Outcome of a raw [`Api::call`]: success flag and the (possibly partial) body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub ok: bool,
    pub body: String,
}

/// Bot API client over an owned [`Transport`].
pub struct Api {
    config: ApiConfig,
    transport: Box<dyn Transport>,
    last_error: Option<String>,
}

impl Api {
    pub fn new(config: ApiConfig, transport: Box<dyn Transport>) -> Self {
        Self {
            config,
            transport,
            last_error: None,
        }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Description of the most recent failure, if any call has failed.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn record_error(&mut self, err: &BotError) {
        self.last_error = Some(err.to_string());
    }

    /// Raw call: POSTs `params` to `method`. `ok` is true only for a decodable `{"ok": true}` body.
    pub async fn call(&mut self, method: &str, params: &FormParams) -> ApiResponse {
        let path = self.config.method_path(method);
        match self.fetch(HttpMethod::Post, &path, &params.to_string(), 0).await {
            Ok(body) => {
                let ok = match parse_envelope(&body) {
                    Ok(_) => true,
                    Err(e) => {
                        self.record_error(&e);
                        false
                    }
                };
                ApiResponse { ok, body }
            }
            Err(e) => {
                self.record_error(&e);
                ApiResponse {
                    ok: false,
                    body: String::new(),
                }
            }
        }
    }

    /// Calls `method` and returns the envelope's `result` field.
    #[instrument(skip(self, params))]
    pub async fn invoke(&mut self, method: &str, params: &FormParams) -> Result<Value> {
        let path = self.config.method_path(method);
        let outcome = match self.fetch(HttpMethod::Post, &path, &params.to_string(), 0).await {
            Ok(body) => parse_envelope(&body),
            Err(e) => Err(e),
        };
        match &outcome {
            Ok(_) => debug!(method, "call succeeded"),
            Err(e) => {
                warn!(method, error = %e, "call failed");
                self.record_error(e);
            }
        }
        outcome
    }

    /// Long-poll read: `GET /bot<token>/getUpdates?timeout=<n>[&offset=<o>]`. Returns the raw body.
    pub async fn get_updates(&mut self, timeout_secs: u32, offset: Option<i64>) -> Result<String> {
        let mut path = format!(
            "{}?timeout={}",
            self.config.method_path("getUpdates"),
            timeout_secs
        );
        if let Some(offset) = offset {
            path.push_str(&format!("&offset={}", offset));
        }
        let result = self.fetch(HttpMethod::Get, &path, "", timeout_secs).await;
        if let Err(e) = &result {
            self.record_error(e);
        }
        result
    }

    /// Sends a text message; returns the new message id.
    pub async fn send_message(
        &mut self,
        chat_id: i64,
        text: &str,
        parse_mode: Option<&str>,
        reply_markup: Option<&str>,
    ) -> Result<i64> {
        let params = FormParams::new()
            .push("chat_id", chat_id)
            .push("text", text)
            .push_opt("parse_mode", parse_mode)
            .push_opt("reply_markup", reply_markup);
        let result = self.invoke("sendMessage", &params).await?;
        message_id(&result)
    }

    pub async fn send_text(&mut self, chat_id: i64, text: &str) -> Result<i64> {
        self.send_message(chat_id, text, None, None).await
    }

    /// Sends a text message with a keyboard attached.
    pub async fn send_keyboard(
        &mut self,
        chat_id: i64,
        text: &str,
        keyboard: &KeyboardSpec,
    ) -> Result<i64> {
        let markup = keyboard.to_string();
        self.send_message(chat_id, text, None, Some(&markup)).await
    }

    pub async fn send_photo(
        &mut self,
        chat_id: i64,
        photo_url: &str,
        caption: Option<&str>,
    ) -> Result<i64> {
        let params = FormParams::new()
            .push("chat_id", chat_id)
            .push("photo", photo_url)
            .push_opt("caption", caption);
        let result = self.invoke("sendPhoto", &params).await?;
        message_id(&result)
    }

    pub async fn send_document(
        &mut self,
        chat_id: i64,
        doc_url: &str,
        caption: Option<&str>,
    ) -> Result<i64> {
        let params = FormParams::new()
            .push("chat_id", chat_id)
            .push("document", doc_url)
            .push_opt("caption", caption);
        let result = self.invoke("sendDocument", &params).await?;
        message_id(&result)
    }

    pub async fn send_location(
        &mut self,
        chat_id: i64,
        latitude: f64,
        longitude: f64,
    ) -> Result<i64> {
        let params = FormParams::new()
            .push("chat_id", chat_id)
            .push("latitude", format!("{:.6}", latitude))
            .push("longitude", format!("{:.6}", longitude));
        let result = self.invoke("sendLocation", &params).await?;
        message_id(&result)
    }

    /// Shows a chat action such as `typing` or `upload_photo`.
    pub async fn send_chat_action(&mut self, chat_id: i64, action: &str) -> Result<()> {
        let params = FormParams::new()
            .push("chat_id", chat_id)
            .push("action", action);
        self.invoke("sendChatAction", &params).await.map(|_| ())
    }

    pub async fn edit_message_text(
        &mut self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        reply_markup: Option<&str>,
    ) -> Result<()> {
        let params = FormParams::new()
            .push("chat_id", chat_id)
            .push("message_id", message_id)
            .push("text", text)
            .push_opt("reply_markup", reply_markup);
        self.invoke("editMessageText", &params).await.map(|_| ())
    }

    pub async fn delete_message(&mut self, chat_id: i64, message_id: i64) -> Result<()> {
        let params = FormParams::new()
            .push("chat_id", chat_id)
            .push("message_id", message_id);
        self.invoke("deleteMessage", &params).await.map(|_| ())
    }

    /// Acknowledges an inline-button press, optionally with a toast text.
    pub async fn answer_callback_query(
        &mut self,
        callback_id: &str,
        text: Option<&str>,
    ) -> Result<()> {
        let params = FormParams::new()
            .push("callback_query_id", callback_id)
            .push_opt("text", text);
        self.invoke("answerCallbackQuery", &params).await.map(|_| ())
    }

    /// Bot identity (`getMe` result object).
    pub async fn get_me(&mut self) -> Result<Value> {
        self.invoke("getMe", &FormParams::new()).await
    }

    /// Connects, exchanges one request and always closes.
    async fn fetch(
        &mut self,
        method: HttpMethod,
        path: &str,
        body: &str,
        extra_wait_secs: u32,
    ) -> Result<String> {
        let host = self.config.host.clone();
        self.transport.connect(&host, self.config.port).await?;
        let request = http::encode_request(method, &host, path, body);
        let wait =
            self.config.response_wait + std::time::Duration::from_secs(u64::from(extra_wait_secs));
        let outcome = self.exchange(&request, wait).await;
        self.transport.close().await;
        outcome
    }

    async fn exchange(&mut self, request: &[u8], wait: std::time::Duration) -> Result<String> {
        self.transport.write(request).await?;

        let limit = self.config.max_body_bytes + MAX_HEADER_BYTES;
        let mut raw: Vec<u8> = Vec::new();
        let mut deadline = Some(Instant::now() + wait);
        loop {
            let chunk = match self.transport.read_available(deadline).await {
                Ok(chunk) => chunk,
                Err(TransportError::Timeout) if !raw.is_empty() => break,
                Err(e) => return Err(e.into()),
            };
            if chunk.is_empty() {
                break;
            }
            raw.extend_from_slice(&chunk);
            // Data has started arriving: read on until the peer closes or framing says we are done.
            deadline = None;
            if raw.len() >= limit {
                raw.truncate(limit);
                break;
            }
            if http::is_complete(&raw) {
                break;
            }
        }

        if raw.is_empty() {
            return Err(BotError::protocol("empty response"));
        }
        let response = http::parse_response(&raw, self.config.max_body_bytes)?;
        debug!(status = response.status, bytes = response.body.len(), "response received");
        Ok(response.body_text())
    }
}

/// Decodes a response body and returns its `result` when `ok` is `true`.
pub(crate) fn parse_envelope(body: &str) -> Result<Value> {
    let mut envelope: Value = serde_json::from_str(body)?;
    if envelope.get("ok").and_then(Value::as_bool) == Some(true) {
        return Ok(envelope.get_mut("result").map(Value::take).unwrap_or(Value::Null));
    }
    let description = envelope
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or("response not ok");
    match envelope.get("error_code").and_then(Value::as_i64) {
        Some(code) => Err(BotError::Protocol(format!("{} ({})", description, code))),
        None => Err(BotError::Protocol(description.to_string())),
    }
}

fn message_id(result: &Value) -> Result<i64> {
    result
        .get("message_id")
        .and_then(Value::as_i64)
        .ok_or_else(|| BotError::protocol("result has no message_id"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_envelope_ok_returns_result() {
        let result = parse_envelope(r#"{"ok":true,"result":{"message_id":5}}"#).unwrap();
        assert_eq!(message_id(&result).unwrap(), 5);
    }

    #[test]
    fn test_parse_envelope_not_ok_carries_description() {
        let body = r#"{"ok":false,"error_code":400,"description":"Bad Request"}"#;
        let err = parse_envelope(body).unwrap_err();
        assert_eq!(err.to_string(), "Protocol error: Bad Request (400)");
    }

    #[test]
    fn test_parse_envelope_rejects_malformed_json() {
        assert!(matches!(parse_envelope("{\"ok\":tr"), Err(BotError::Protocol(_))));
        assert!(matches!(parse_envelope(r#"{"ok":"true"}"#), Err(BotError::Protocol(_))));
    }
}
