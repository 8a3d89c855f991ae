//! Request client settings: token, endpoint, wait budgets.

use std::time::Duration;

/// Default API host.
pub const DEFAULT_API_HOST: &str = "api.telegram.org";
/// Default API port (TLS).
pub const DEFAULT_API_PORT: u16 = 443;

/// Settings for [`Api`](crate::Api).
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub token: String,
    pub host: String,
    pub port: u16,
    /// Server-side wait hint sent as `timeout` on `getUpdates`.
    pub long_poll_secs: u32,
    /// Budget for the first response bytes to arrive; the long-poll hint is added for `getUpdates`.
    pub response_wait: Duration,
    /// Response bodies are truncated to this many bytes.
    pub max_body_bytes: usize,
}

impl ApiConfig {
    /// Defaults for everything but the token.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            host: DEFAULT_API_HOST.to_string(),
            port: DEFAULT_API_PORT,
            long_poll_secs: 5,
            response_wait: Duration::from_secs(5),
            max_body_bytes: 32 * 1024,
        }
    }

    pub fn endpoint(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = host.into();
        self.port = port;
        self
    }

    /// Path of a method call, e.g. `/bot<token>/sendMessage`.
    pub fn method_path(&self, method: &str) -> String {
        format!("/bot{}/{}", self.token, method)
    }
}
