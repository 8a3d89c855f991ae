use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use telebot_api::{Api, TcpTransport, UpdatePoller};
use telebot_core::{BotError, ConnectivityState};
use telebot_dispatch::{CallbackHandler, CommandHandler, Dispatcher, MessageHandler};
use telebot_link::{ConnectionConfig, ConnectivitySupervisor, HostLink, Link, StatusObserver};
use tokio::time::{sleep, Instant};
use tracing::{debug, info, instrument, warn};

use crate::config::BotConfig;

/// Default minimum spacing between two update polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);
/// Idle sleep between two `tick` calls in [`TeleBot::run`].
const IDLE_SLEEP: Duration = Duration::from_millis(100);

/// TeleBot: supervisor, request client, poller and dispatcher driven by one `tick`.
pub struct TeleBot {
    supervisor: ConnectivitySupervisor,
    api: Api,
    poller: UpdatePoller,
    dispatcher: Dispatcher,
    poll_interval: Duration,
    last_poll: Option<Instant>,
}

impl TeleBot {
    pub fn new(api: Api, link: Box<dyn Link>) -> Self {
        Self {
            supervisor: ConnectivitySupervisor::new(link),
            api,
            poller: UpdatePoller::new(),
            dispatcher: Dispatcher::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            last_poll: None,
        }
    }

    /// Builds a bot on the TCP transport and the host network link.
    pub fn from_config(config: &BotConfig) -> Result<Self> {
        let transport = TcpTransport::new(config.tls_mode())?;
        let api = Api::new(config.api_config(), Box::new(transport));
        let mut bot = Self::new(api, Box::new(HostLink::new()));
        bot.set_poll_interval(config.poll_interval);
        bot.set_auto_reconnect(config.auto_reconnect, config.reconnect_interval);
        Ok(bot)
    }

    /// Checks the token and logs the start. Call once before the first `tick`.
    pub fn begin(&self) -> telebot_core::Result<()> {
        if self.api.config().token.trim().is_empty() {
            return Err(BotError::Config("bot token is empty".to_string()));
        }
        info!(
            host = %self.api.config().host,
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            "bot started"
        );
        Ok(())
    }

    pub async fn connect(&mut self, config: ConnectionConfig) -> telebot_core::Result<()> {
        self.supervisor.connect(config).await
    }

    pub fn disconnect(&mut self) {
        self.supervisor.disconnect();
    }

    /// One control-loop step. Follows the link and, when it is up and the poll interval has
    /// elapsed, polls once and dispatches every decoded event in order. Returns the number of
    /// events dispatched.
    pub async fn tick(&mut self) -> usize {
        self.supervisor.tick();
        if self.supervisor.status() != ConnectivityState::Connected {
            return 0;
        }

        if let Some(last) = self.last_poll {
            if Instant::now().duration_since(last) <= self.poll_interval {
                return 0;
            }
        }

        let polled = self.poller.poll(&mut self.api).await;
        self.last_poll = Some(Instant::now());

        let events = match polled {
            Ok(events) => events,
            Err(e) => {
                warn!(error = %e, "poll failed");
                return 0;
            }
        };

        for event in &events {
            self.dispatcher.dispatch(&mut self.api, event).await;
        }
        if !events.is_empty() {
            debug!(count = events.len(), cursor = self.poller.cursor(), "batch dispatched");
        }
        events.len()
    }

    /// Ticks until ctrl-c.
    #[instrument(skip(self))]
    pub async fn run(&mut self) -> Result<()> {
        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                res = &mut shutdown => {
                    res?;
                    info!("shutdown requested");
                    break;
                }
                _ = self.step() => {}
            }
        }
        self.supervisor.disconnect();
        Ok(())
    }

    async fn step(&mut self) {
        self.tick().await;
        sleep(IDLE_SLEEP).await;
    }

    pub fn on_message(&mut self, handler: Arc<dyn MessageHandler>) {
        self.dispatcher.on_message(handler);
    }

    /// Registers `command` (with or without the leading `/`). Returns true when it replaced a
    /// previous registration.
    pub fn on_command(
        &mut self,
        command: &str,
        handler: Arc<dyn CommandHandler>,
    ) -> telebot_core::Result<bool> {
        self.dispatcher.on_command(command, handler)
    }

    pub fn on_callback(&mut self, handler: Arc<dyn CallbackHandler>) {
        self.dispatcher.on_callback(handler);
    }

    pub fn on_status(&mut self, observer: Box<dyn StatusObserver>) {
        self.supervisor.set_observer(observer);
    }

    /// Replaces the dispatcher, e.g. one built with a command limit.
    pub fn set_dispatcher(&mut self, dispatcher: Dispatcher) {
        self.dispatcher = dispatcher;
    }

    pub fn set_poll_interval(&mut self, interval: Duration) {
        self.poll_interval = interval;
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn set_auto_reconnect(&mut self, enabled: bool, interval: Duration) {
        self.supervisor.set_auto_reconnect(enabled, interval);
    }

    /// Latest request failure, or the latest connectivity failure when no request has failed.
    pub fn last_error(&self) -> Option<&str> {
        self.api.last_error().or_else(|| self.supervisor.last_error())
    }

    /// Highest update id seen so far (0 before the first update).
    pub fn last_update(&self) -> i64 {
        self.poller.cursor()
    }

    pub fn connectivity(&self) -> ConnectivityState {
        self.supervisor.status()
    }

    pub fn is_link_up(&self) -> bool {
        self.supervisor.is_link_up()
    }

    /// The request client, for sending outside of handlers.
    pub fn api(&mut self) -> &mut Api {
        &mut self.api
    }
}
