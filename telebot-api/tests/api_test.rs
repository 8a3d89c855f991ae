//! Integration tests for [`telebot_api::Api`] and [`telebot_api::UpdatePoller`].
//!
//! Covers: request framing on the wire, connection closed after every call, response wait budget,
//! failure reporting via `last_error`, cursor-driven `offset`, and one end-to-end call over a real
//! socket against a mockito server.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use telebot_api::{Api, ApiConfig, FormParams, TcpTransport, TlsMode, Transport, UpdatePoller};
use telebot_core::{BotError, Event, TransportError};
use tokio::time::Instant;

enum Reply {
    /// Chunks delivered one per read, then EOF.
    Chunks(Vec<Vec<u8>>),
    /// Accepts the request but never answers.
    Silent,
}

#[derive(Default)]
struct Script {
    replies: VecDeque<Reply>,
    current: Option<Reply>,
    requests: Vec<String>,
    connects: usize,
    closes: usize,
    refuse: bool,
}

/// Transport fake: one scripted reply per connection; records every request written.
#[derive(Clone, Default)]
struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    fn reply_json(self, body: &str) -> Self {
        let raw = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
            body.len(),
            body
        );
        self.reply(Reply::Chunks(vec![raw.into_bytes()]))
    }

    fn reply(self, reply: Reply) -> Self {
        self.script.lock().unwrap().replies.push_back(reply);
        self
    }

    fn refusing(self) -> Self {
        self.script.lock().unwrap().refuse = true;
        self
    }

    fn requests(&self) -> Vec<String> {
        self.script.lock().unwrap().requests.clone()
    }

    fn counts(&self) -> (usize, usize) {
        let script = self.script.lock().unwrap();
        (script.connects, script.closes)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn connect(&mut self, host: &str, port: u16) -> Result<(), TransportError> {
        let mut script = self.script.lock().unwrap();
        if script.refuse {
            return Err(TransportError::Connect {
                host: host.to_string(),
                port,
                reason: "refused".to_string(),
            });
        }
        script.connects += 1;
        script.current = script.replies.pop_front();
        Ok(())
    }

    async fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let mut script = self.script.lock().unwrap();
        script.requests.push(String::from_utf8_lossy(bytes).into_owned());
        Ok(())
    }

    async fn read_available(
        &mut self,
        deadline: Option<Instant>,
    ) -> Result<Vec<u8>, TransportError> {
        let next = {
            let mut script = self.script.lock().unwrap();
            match script.current.as_mut() {
                Some(Reply::Chunks(chunks)) if !chunks.is_empty() => Some(chunks.remove(0)),
                Some(Reply::Silent) => None,
                _ => Some(Vec::new()),
            }
        };
        match next {
            Some(bytes) => Ok(bytes),
            None => {
                match deadline {
                    Some(deadline) => tokio::time::sleep_until(deadline).await,
                    None => std::future::pending::<()>().await,
                }
                Err(TransportError::Timeout)
            }
        }
    }

    async fn close(&mut self) {
        let mut script = self.script.lock().unwrap();
        script.closes += 1;
        script.current = None;
    }
}

fn api_with(transport: &ScriptedTransport) -> Api {
    Api::new(ApiConfig::with_token("TOKEN"), Box::new(transport.clone()))
}

/// **Test: sendMessage is a form-encoded POST returning the new message id; the connection is
/// closed.**
#[tokio::test]
async fn test_send_message_frames_form_post() {
    let transport =
        ScriptedTransport::default().reply_json(r#"{"ok":true,"result":{"message_id":321}}"#);
    let mut api = api_with(&transport);

    let id = api
        .send_message(42, "a b&c", Some("HTML"), Some(r#"{"inline_keyboard":[]}"#))
        .await
        .unwrap();

    assert_eq!(id, 321);
    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    let body = "chat_id=42&text=a+b%26c&parse_mode=HTML\
                &reply_markup=%7B%22inline_keyboard%22%3A%5B%5D%7D";
    assert!(requests[0]
        .starts_with("POST /botTOKEN/sendMessage HTTP/1.1\r\nHost: api.telegram.org\r\n"));
    assert!(requests[0].contains(&format!("Content-Length: {}\r\n", body.len())));
    assert!(requests[0].ends_with(&format!("\r\n\r\n{}", body)));
    assert_eq!(transport.counts(), (1, 1));
    assert!(api.last_error().is_none());
}

fn form_body(request: &str) -> &str {
    request.split_once("\r\n\r\n").map(|(_, body)| body).unwrap_or_default()
}

/// **Test: sendPhoto / sendDocument carry the URL, omit an empty caption and return the id.**
#[tokio::test]
async fn test_send_media_bodies() {
    let transport = ScriptedTransport::default()
        .reply_json(r#"{"ok":true,"result":{"message_id":10}}"#)
        .reply_json(r#"{"ok":true,"result":{"message_id":11}}"#);
    let mut api = api_with(&transport);

    let photo = api
        .send_photo(5, "https://x.org/a.png", Some("Cat & dog"))
        .await
        .unwrap();
    let doc = api.send_document(5, "https://x.org/r.csv", Some("")).await.unwrap();

    assert_eq!((photo, doc), (10, 11));
    let requests = transport.requests();
    assert!(requests[0].starts_with("POST /botTOKEN/sendPhoto HTTP/1.1\r\n"));
    assert_eq!(
        form_body(&requests[0]),
        "chat_id=5&photo=https%3A%2F%2Fx.org%2Fa.png&caption=Cat+%26+dog"
    );
    assert!(requests[1].starts_with("POST /botTOKEN/sendDocument HTTP/1.1\r\n"));
    assert_eq!(form_body(&requests[1]), "chat_id=5&document=https%3A%2F%2Fx.org%2Fr.csv");
}

/// **Test: sendLocation formats coordinates with six decimals.**
#[tokio::test]
async fn test_send_location_body() {
    let transport =
        ScriptedTransport::default().reply_json(r#"{"ok":true,"result":{"message_id":12}}"#);
    let mut api = api_with(&transport);

    let id = api.send_location(5, 55.751244, 37.6184).await.unwrap();

    assert_eq!(id, 12);
    let requests = transport.requests();
    assert!(requests[0].starts_with("POST /botTOKEN/sendLocation HTTP/1.1\r\n"));
    assert_eq!(form_body(&requests[0]), "chat_id=5&latitude=55.751244&longitude=37.618400");
}

/// **Test: sendChatAction and editMessageText bodies; the markup is escaped.**
#[tokio::test]
async fn test_chat_action_and_edit_bodies() {
    let transport = ScriptedTransport::default()
        .reply_json(r#"{"ok":true,"result":true}"#)
        .reply_json(r#"{"ok":true,"result":{"message_id":1}}"#);
    let mut api = api_with(&transport);

    api.send_chat_action(5, "typing").await.unwrap();
    api.edit_message_text(5, 1, "x y", Some("{}")).await.unwrap();

    let requests = transport.requests();
    assert!(requests[0].starts_with("POST /botTOKEN/sendChatAction HTTP/1.1\r\n"));
    assert_eq!(form_body(&requests[0]), "chat_id=5&action=typing");
    assert!(requests[1].starts_with("POST /botTOKEN/editMessageText HTTP/1.1\r\n"));
    assert_eq!(form_body(&requests[1]), "chat_id=5&message_id=1&text=x+y&reply_markup=%7B%7D");
    assert!(api.last_error().is_none());
}

/// **Test: a send whose result lacks message_id is a protocol error.**
#[tokio::test]
async fn test_send_without_message_id_is_protocol_error() {
    let transport = ScriptedTransport::default().reply_json(r#"{"ok":true,"result":true}"#);
    let mut api = api_with(&transport);

    let err = api.send_photo(5, "https://x.org/a.png", None).await.unwrap_err();

    assert!(matches!(err, BotError::Protocol(_)));
}

/// **Test: a response split over several reads is reassembled.**
#[tokio::test]
async fn test_response_split_across_reads() {
    let transport = ScriptedTransport::default().reply(Reply::Chunks(vec![
        b"HTTP/1.1 200 OK\r\nContent-Le".to_vec(),
        b"ngth: 11\r\n\r\n{\"ok\"".to_vec(),
        b":true}".to_vec(),
    ]));
    let mut api = api_with(&transport);

    let response = api.call("getMe", &FormParams::new()).await;

    assert!(response.ok);
    assert_eq!(response.body, r#"{"ok":true}"#);
}

/// **Test: `ok: false` is a failed call; body is kept and the description becomes the last error.**
#[tokio::test]
async fn test_not_ok_response_records_description() {
    let body = r#"{"ok":false,"error_code":400,"description":"Bad Request: chat not found"}"#;
    let transport = ScriptedTransport::default().reply_json(body).reply_json(body);
    let mut api = api_with(&transport);

    let response = api.call("sendMessage", &FormParams::new().push("chat_id", 1)).await;
    assert!(!response.ok);
    assert_eq!(response.body, body);
    assert_eq!(api.last_error(), Some("Protocol error: Bad Request: chat not found (400)"));

    let err = api.delete_message(1, 2).await.unwrap_err();
    assert!(matches!(err, BotError::Protocol(_)));
}

/// **Test: a silent server times out after the response wait; the connection is still closed.**
#[tokio::test(start_paused = true)]
async fn test_silent_server_times_out() {
    let transport = ScriptedTransport::default().reply(Reply::Silent);
    let mut api = api_with(&transport);
    let started = Instant::now();

    let response = api.call("getMe", &FormParams::new()).await;

    assert!(!response.ok);
    assert!(response.body.is_empty());
    assert!(started.elapsed() >= Duration::from_secs(5));
    assert!(started.elapsed() < Duration::from_secs(6));
    assert_eq!(api.last_error(), Some("Transport error: Timed out waiting for data"));
    assert_eq!(transport.counts(), (1, 1));
}

/// **Test: long-poll wait budget is the response wait plus the server-side hint.**
#[tokio::test(start_paused = true)]
async fn test_long_poll_wait_includes_hint() {
    let transport = ScriptedTransport::default().reply(Reply::Silent);
    let mut api = api_with(&transport);
    let started = Instant::now();

    let err = api.get_updates(5, None).await.unwrap_err();

    assert!(err.is_transport());
    assert!(started.elapsed() >= Duration::from_secs(10));
    assert!(started.elapsed() < Duration::from_secs(11));
}

/// **Test: connect failure is reported, not raised.**
#[tokio::test]
async fn test_connect_failure_reports_error() {
    let transport = ScriptedTransport::default().refusing();
    let mut api = api_with(&transport);

    let response = api.call("getMe", &FormParams::new()).await;

    assert!(!response.ok);
    assert!(api.last_error().unwrap().contains("refused"));
    assert!(transport.requests().is_empty());
}

/// **Test: first poll omits offset; later polls ask for cursor + 1; empty batch keeps the cursor.**
#[tokio::test]
async fn test_poller_offsets_follow_cursor() {
    let transport = ScriptedTransport::default()
        .reply_json(
            r#"{"ok":true,"result":[
                {"update_id":100,"message":{"message_id":1,"chat":{"id":7},"text":"/start"}}
            ]}"#,
        )
        .reply_json(r#"{"ok":true,"result":[]}"#)
        .reply_json(r#"{"ok":true,"result":[]}"#);
    let mut api = api_with(&transport);
    let mut poller = UpdatePoller::new();

    let first = poller.poll(&mut api).await.unwrap();
    let second = poller.poll(&mut api).await.unwrap();
    let third = poller.poll(&mut api).await.unwrap();

    assert!(matches!(first.as_slice(), [Event::Message(m)] if m.text == "/start"));
    assert!(second.is_empty() && third.is_empty());
    assert_eq!(poller.cursor(), 100);

    let requests = transport.requests();
    assert!(requests[0].starts_with("GET /botTOKEN/getUpdates?timeout=5 HTTP/1.1\r\n"));
    assert!(requests[1].starts_with("GET /botTOKEN/getUpdates?timeout=5&offset=101 HTTP/1.1\r\n"));
    assert!(requests[2].starts_with("GET /botTOKEN/getUpdates?timeout=5&offset=101 HTTP/1.1\r\n"));
}

/// **Test: a malformed batch is a protocol error recorded on the client; the cursor stays.**
#[tokio::test]
async fn test_poller_malformed_batch_is_recorded() {
    let transport = ScriptedTransport::default()
        .reply_json(r#"{"ok":true,"result":[{"update_id":5}]}"#)
        .reply_json(r#"{"ok":true,"result":[{"update_id":6"#);
    let mut api = api_with(&transport);
    let mut poller = UpdatePoller::new();

    poller.poll(&mut api).await.unwrap();
    let err = poller.poll(&mut api).await.unwrap_err();

    assert!(matches!(err, BotError::Protocol(_)));
    assert_eq!(poller.cursor(), 5);
    assert!(api.last_error().unwrap().starts_with("Protocol error"));
}

/// **Test: end-to-end sendMessage over plain TCP against a mock API server.**
#[tokio::test]
async fn test_send_message_over_tcp_with_mock_server() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/botTEST/sendMessage")
        .match_header("content-type", "application/x-www-form-urlencoded")
        .match_body("chat_id=42&text=hello+world")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"ok":true,"result":{"message_id":9}}"#)
        .create_async()
        .await;

    let host_port = server.host_with_port();
    let (host, port) = host_port.split_once(':').unwrap();
    let config = ApiConfig::with_token("TEST").endpoint(host, port.parse().unwrap());
    let transport = TcpTransport::new(TlsMode::Disabled).unwrap();
    let mut api = Api::new(config, Box::new(transport));

    let id = api.send_text(42, "hello world").await.unwrap();

    assert_eq!(id, 9);
    mock.assert_async().await;
}
