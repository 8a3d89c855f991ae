//! BotConfig: token, link, polling, API endpoint, storage and logging. Loaded from env.

use std::env;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use telebot_api::{ApiConfig, TlsMode};
use telebot_link::{ConnectionConfig, StaticAddressing};

const STATIC_VARS: [&str; 5] = [
    "STATIC_IP",
    "STATIC_GATEWAY",
    "STATIC_SUBNET",
    "STATIC_DNS1",
    "STATIC_DNS2",
];

#[derive(Debug, Clone)]
pub struct BotConfig {
    /// BOT_TOKEN
    pub bot_token: String,
    /// WIFI_SSID; empty means the host network
    pub wifi_ssid: String,
    /// WIFI_PASSWORD
    pub wifi_password: String,
    /// DEVICE_NAME
    pub device_name: Option<String>,
    /// WIFI_TIMEOUT_MS
    pub wifi_timeout: Duration,
    /// STATIC_IP, STATIC_GATEWAY, STATIC_SUBNET, STATIC_DNS1, STATIC_DNS2 in that order
    pub static_addressing: [Option<String>; 5],
    /// POLL_INTERVAL_MS
    pub poll_interval: Duration,
    /// AUTO_RECONNECT
    pub auto_reconnect: bool,
    /// RECONNECT_INTERVAL_MS
    pub reconnect_interval: Duration,
    /// TELEGRAM_API_HOST
    pub api_host: String,
    /// TELEGRAM_API_PORT
    pub api_port: u16,
    /// TELEGRAM_TLS
    pub tls: bool,
    /// TLS_INSECURE: skip certificate validation
    pub tls_insecure: bool,
    /// STORAGE_ROOT
    pub storage_root: Option<PathBuf>,
    /// LOG_FILE
    pub log_file: String,
}

impl BotConfig {
    /// Load from environment variables. `token` overrides BOT_TOKEN if provided.
    pub fn load(token: Option<String>) -> Result<Self> {
        let bot_token = match token {
            Some(token) => token,
            None => env::var("BOT_TOKEN").context("BOT_TOKEN not set")?,
        };

        Ok(Self {
            bot_token,
            wifi_ssid: env::var("WIFI_SSID").unwrap_or_default(),
            wifi_password: env::var("WIFI_PASSWORD").unwrap_or_default(),
            device_name: non_empty("DEVICE_NAME"),
            wifi_timeout: Duration::from_millis(parse_var("WIFI_TIMEOUT_MS", 20_000)?),
            static_addressing: STATIC_VARS.map(non_empty),
            poll_interval: Duration::from_millis(parse_var("POLL_INTERVAL_MS", 1_000)?),
            auto_reconnect: parse_var("AUTO_RECONNECT", true)?,
            reconnect_interval: Duration::from_millis(parse_var("RECONNECT_INTERVAL_MS", 30_000)?),
            api_host: env::var("TELEGRAM_API_HOST")
                .unwrap_or_else(|_| "api.telegram.org".to_string()),
            api_port: parse_var("TELEGRAM_API_PORT", 443)?,
            tls: parse_var("TELEGRAM_TLS", true)?,
            tls_insecure: parse_var("TLS_INSECURE", true)?,
            storage_root: non_empty("STORAGE_ROOT").map(PathBuf::from),
            log_file: env::var("LOG_FILE").unwrap_or_else(|_| "logs/telebot.log".to_string()),
        })
    }

    /// Rejects values the bot cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.bot_token.trim().is_empty() {
            bail!("BOT_TOKEN is empty");
        }
        if self.poll_interval.is_zero() {
            bail!("POLL_INTERVAL_MS must be greater than zero");
        }
        if self.api_port == 0 {
            bail!("TELEGRAM_API_PORT must be greater than zero");
        }
        if let Some(addressing) = self.static_addressing()? {
            addressing.validate()?;
        }
        Ok(())
    }

    /// Static addressing when all five variables are set, `None` when none are.
    pub fn static_addressing(&self) -> Result<Option<StaticAddressing>> {
        let set = self.static_addressing.iter().filter(|v| v.is_some()).count();
        if set == 0 {
            return Ok(None);
        }
        if set != STATIC_VARS.len() {
            let missing: Vec<&str> = STATIC_VARS
                .iter()
                .zip(&self.static_addressing)
                .filter(|(_, value)| value.is_none())
                .map(|(name, _)| *name)
                .collect();
            bail!("static addressing is partially configured, missing {}", missing.join(", "));
        }

        let mut parsed = [Ipv4Addr::UNSPECIFIED; 5];
        let values = parsed
            .iter_mut()
            .zip(STATIC_VARS)
            .zip(&self.static_addressing);
        for ((slot, name), value) in values {
            let value = value.as_deref().unwrap_or_default();
            *slot = value
                .parse()
                .with_context(|| format!("{} is not an IPv4 address: {}", name, value))?;
        }
        let [address, gateway, subnet, dns1, dns2] = parsed;
        Ok(Some(StaticAddressing {
            address,
            gateway,
            subnet,
            dns1,
            dns2,
        }))
    }

    pub fn connection_config(&self) -> Result<ConnectionConfig> {
        let mut config = ConnectionConfig::new(&self.wifi_ssid, &self.wifi_password)
            .timeout(self.wifi_timeout);
        if let Some(name) = &self.device_name {
            config = config.device_name(name);
        }
        if let Some(addressing) = self.static_addressing()? {
            config = config.static_addressing(addressing);
        }
        Ok(config)
    }

    pub fn api_config(&self) -> ApiConfig {
        ApiConfig::with_token(&self.bot_token).endpoint(&self.api_host, self.api_port)
    }

    pub fn tls_mode(&self) -> TlsMode {
        match (self.tls, self.tls_insecure) {
            (false, _) => TlsMode::Disabled,
            (true, true) => TlsMode::AcceptAny,
            (true, false) => TlsMode::VerifyRoots,
        }
    }
}

fn non_empty(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Parses `name` when set, `default` otherwise. A value that does not parse is an error.
fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T> {
    match non_empty(name) {
        Some(raw) => match raw.trim().parse() {
            Ok(value) => Ok(value),
            Err(_) => bail!("{} has an invalid value: {}", name, raw),
        },
        None => Ok(default),
    }
}
