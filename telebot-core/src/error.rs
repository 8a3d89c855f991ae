use thiserror::Error;

/// Top-level error for telebot. Every variant is recoverable: callers record it as the
/// latest error description and keep the control loop running.
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Capacity error: command table is full ({0} entries)")]
    Capacity(usize),
}

/// Failures of the byte transport (socket, TLS, deadlines).
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Connect to {host}:{port} failed: {reason}")]
    Connect {
        host: String,
        port: u16,
        reason: String,
    },

    #[error("Not connected")]
    NotConnected,

    #[error("Timed out waiting for data")]
    Timeout,

    #[error("Link to {0} not up before timeout")]
    LinkTimeout(String),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BotError {
    /// Shorthand for a protocol error from anything displayable.
    pub fn protocol(msg: impl std::fmt::Display) -> Self {
        BotError::Protocol(msg.to_string())
    }

    /// True when the error came from the transport layer (connect/read/write/timeout).
    pub fn is_transport(&self) -> bool {
        matches!(self, BotError::Transport(_))
    }
}

impl From<serde_json::Error> for BotError {
    fn from(e: serde_json::Error) -> Self {
        BotError::Protocol(format!("JSON error: {}", e))
    }
}

pub type Result<T> = std::result::Result<T, BotError>;
