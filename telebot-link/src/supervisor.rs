//! Connectivity state machine.
//!
//! ```text
//! Disconnected/Error --connect--> Connecting --link up--> Connected
//!                                           --timeout / static addressing failure--> Error
//! any --disconnect--> Disconnected
//! Connected --link lost (tick)--> Disconnected
//! ```

use std::time::Duration;

use telebot_core::{BotError, ConnectivityState, Result, TransportError};
use tokio::time::{sleep, Instant};
use tracing::{info, instrument, warn};

use crate::config::ConnectionConfig;
use crate::link::Link;

/// Interval between link-status checks while connecting.
pub const STATUS_POLL_INTERVAL: Duration = Duration::from_millis(500);
/// Default spacing of auto-reconnect attempts.
pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_secs(30);

/// Receives every state transition, synchronously, from inside `connect` / `disconnect` / `tick`.
pub trait StatusObserver: Send + Sync {
    fn on_status(&self, state: ConnectivityState);
}

impl<F> StatusObserver for F
where
    F: Fn(ConnectivityState) + Send + Sync,
{
    fn on_status(&self, state: ConnectivityState) {
        self(state)
    }
}

pub struct ConnectivitySupervisor {
    link: Box<dyn Link>,
    state: ConnectivityState,
    observer: Option<Box<dyn StatusObserver>>,
    config: Option<ConnectionConfig>,
    auto_reconnect: bool,
    reconnect_interval: Duration,
    last_attempt: Option<Instant>,
    last_error: Option<String>,
}

impl ConnectivitySupervisor {
    pub fn new(link: Box<dyn Link>) -> Self {
        Self {
            link,
            state: ConnectivityState::Disconnected,
            observer: None,
            config: None,
            auto_reconnect: true,
            reconnect_interval: DEFAULT_RECONNECT_INTERVAL,
            last_attempt: None,
            last_error: None,
        }
    }

    pub fn set_observer(&mut self, observer: Box<dyn StatusObserver>) {
        self.observer = Some(observer);
    }

    pub fn set_auto_reconnect(&mut self, enabled: bool, interval: Duration) {
        self.auto_reconnect = enabled;
        self.reconnect_interval = interval;
    }

    pub fn status(&self) -> ConnectivityState {
        self.state
    }

    /// Live driver status, independent of the recorded state.
    pub fn is_link_up(&self) -> bool {
        self.link.is_connected()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Brings the link up, waiting at most `config.timeout`.
    #[instrument(skip(self, config), fields(ssid = %config.ssid))]
    pub async fn connect(&mut self, config: ConnectionConfig) -> Result<()> {
        if self.state == ConnectivityState::Connected {
            self.link.disconnect();
        }
        self.config = Some(config.clone());
        self.set_state(ConnectivityState::Connecting);

        if let Some(name) = &config.device_name {
            self.link.set_hostname(name);
        }

        if let Some(addressing) = &config.static_addressing {
            let applied = addressing
                .validate()
                .and_then(|_| self.link.configure_static(addressing));
            if let Err(e) = applied {
                warn!(error = %e, "static addressing rejected");
                return Err(self.fail(e));
            }
        }

        self.link.begin(&config.ssid, &config.credential);

        let deadline = Instant::now() + config.timeout;
        while !self.link.is_connected() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            sleep(STATUS_POLL_INTERVAL.min(deadline - now)).await;
        }

        if self.link.is_connected() {
            info!("link up");
            self.last_error = None;
            self.set_state(ConnectivityState::Connected);
            Ok(())
        } else {
            warn!(timeout_ms = config.timeout.as_millis() as u64, "link timeout");
            Err(self.fail(TransportError::LinkTimeout(config.ssid.clone()).into()))
        }
    }

    /// Forces the link down.
    pub fn disconnect(&mut self) {
        self.link.disconnect();
        info!("link disconnected");
        self.set_state(ConnectivityState::Disconnected);
    }

    /// One control-loop step: follows the driver status and, when enabled and due, fires a
    /// non-blocking reconnect attempt. Attempts are spaced by the reconnect interval whatever
    /// their outcome.
    pub fn tick(&mut self) {
        let up = self.link.is_connected();
        match self.state {
            ConnectivityState::Connected if !up => {
                warn!("link lost");
                self.set_state(ConnectivityState::Disconnected);
            }
            ConnectivityState::Disconnected | ConnectivityState::Error if up => {
                info!("link restored");
                self.set_state(ConnectivityState::Connected);
            }
            _ => {}
        }

        if !self.auto_reconnect
            || self.state == ConnectivityState::Connected
            || self.config.is_none()
        {
            return;
        }

        let now = Instant::now();
        let due = self
            .last_attempt
            .map_or(true, |last| now.duration_since(last) > self.reconnect_interval);
        if !due {
            return;
        }

        info!("auto reconnect attempt");
        self.last_attempt = Some(now);
        self.link.reconnect();
        if self.link.is_connected() {
            info!("link restored");
            self.set_state(ConnectivityState::Connected);
        }
    }

    fn fail(&mut self, err: BotError) -> BotError {
        self.last_error = Some(err.to_string());
        self.set_state(ConnectivityState::Error);
        err
    }

    fn set_state(&mut self, state: ConnectivityState) {
        if self.state == state {
            return;
        }
        self.state = state;
        if let Some(observer) = &self.observer {
            observer.on_status(state);
        }
    }
}
