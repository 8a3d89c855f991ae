//! # telebot-api
//!
//! Protocol layer of the telebot device client: the byte [`Transport`] capability and its tokio
//! implementation, form percent-encoding, HTTP/1.1 framing, the request client [`Api`] with every
//! outbound operation, and the long-poll [`UpdatePoller`] that owns the update cursor.
//! Each call opens and closes its own connection; nothing here spawns tasks.

mod client;
mod config;
mod encoding;
mod http;
mod poller;
mod transport;

pub use client::{Api, ApiResponse};
pub use config::ApiConfig;
pub use encoding::{percent_encode, FormParams};
pub use http::{HttpMethod, HttpResponse};
pub use poller::{decode_update, UpdatePoller};
pub use transport::{TcpTransport, TlsMode, Transport};
