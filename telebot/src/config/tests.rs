//! Config tests.

use std::env;
use std::net::Ipv4Addr;
use std::time::Duration;

use serial_test::serial;
use telebot_api::TlsMode;

use crate::config::BotConfig;

const ALL_VARS: [&str; 19] = [
    "BOT_TOKEN",
    "WIFI_SSID",
    "WIFI_PASSWORD",
    "DEVICE_NAME",
    "WIFI_TIMEOUT_MS",
    "STATIC_IP",
    "STATIC_GATEWAY",
    "STATIC_SUBNET",
    "STATIC_DNS1",
    "STATIC_DNS2",
    "POLL_INTERVAL_MS",
    "AUTO_RECONNECT",
    "RECONNECT_INTERVAL_MS",
    "TELEGRAM_API_HOST",
    "TELEGRAM_API_PORT",
    "TELEGRAM_TLS",
    "TLS_INSECURE",
    "STORAGE_ROOT",
    "LOG_FILE",
];

fn clear_env() {
    for name in ALL_VARS {
        env::remove_var(name);
    }
}

fn set_static_addressing() {
    env::set_var("STATIC_IP", "192.168.1.50");
    env::set_var("STATIC_GATEWAY", "192.168.1.1");
    env::set_var("STATIC_SUBNET", "255.255.255.0");
    env::set_var("STATIC_DNS1", "8.8.8.8");
    env::set_var("STATIC_DNS2", "1.1.1.1");
}

#[test]
#[serial]
fn test_load_config_with_defaults() {
    clear_env();
    env::set_var("BOT_TOKEN", "test_token");

    let config = BotConfig::load(None).unwrap();
    config.validate().unwrap();

    assert_eq!(config.bot_token, "test_token");
    assert_eq!(config.wifi_ssid, "");
    assert!(config.device_name.is_none());
    assert_eq!(config.wifi_timeout, Duration::from_millis(20_000));
    assert_eq!(config.poll_interval, Duration::from_millis(1_000));
    assert!(config.auto_reconnect);
    assert_eq!(config.reconnect_interval, Duration::from_millis(30_000));
    assert_eq!(config.api_host, "api.telegram.org");
    assert_eq!(config.api_port, 443);
    assert_eq!(config.tls_mode(), TlsMode::AcceptAny);
    assert!(config.storage_root.is_none());
    assert_eq!(config.log_file, "logs/telebot.log");
    assert!(config.static_addressing().unwrap().is_none());
}

#[test]
#[serial]
fn test_load_config_with_custom_values() {
    clear_env();
    env::set_var("BOT_TOKEN", "custom_token");
    env::set_var("WIFI_SSID", "workshop");
    env::set_var("WIFI_PASSWORD", "secret");
    env::set_var("DEVICE_NAME", "greenhouse");
    env::set_var("POLL_INTERVAL_MS", "250");
    env::set_var("AUTO_RECONNECT", "false");
    env::set_var("TELEGRAM_API_HOST", "127.0.0.1");
    env::set_var("TELEGRAM_API_PORT", "8081");
    env::set_var("TELEGRAM_TLS", "false");
    env::set_var("STORAGE_ROOT", "/tmp/telebot-sd");
    set_static_addressing();

    let config = BotConfig::load(None).unwrap();
    config.validate().unwrap();

    assert_eq!(config.poll_interval, Duration::from_millis(250));
    assert!(!config.auto_reconnect);
    assert_eq!(config.tls_mode(), TlsMode::Disabled);

    let api = config.api_config();
    assert_eq!(api.host, "127.0.0.1");
    assert_eq!(api.port, 8081);
    assert_eq!(api.method_path("getMe"), "/botcustom_token/getMe");

    let link = config.connection_config().unwrap();
    assert_eq!(link.ssid, "workshop");
    assert_eq!(link.device_name.as_deref(), Some("greenhouse"));
    let addressing = link.static_addressing.unwrap();
    assert_eq!(addressing.address, Ipv4Addr::new(192, 168, 1, 50));
    assert_eq!(addressing.dns2, Ipv4Addr::new(1, 1, 1, 1));

    clear_env();
}

#[test]
#[serial]
fn test_token_argument_overrides_env() {
    clear_env();
    env::set_var("BOT_TOKEN", "from_env");

    let config = BotConfig::load(Some("from_cli".to_string())).unwrap();
    assert_eq!(config.bot_token, "from_cli");
}

#[test]
#[serial]
fn test_missing_token_is_an_error() {
    clear_env();
    assert!(BotConfig::load(None).is_err());
}

#[test]
#[serial]
fn test_invalid_numbers_are_rejected() {
    clear_env();
    env::set_var("BOT_TOKEN", "t");
    env::set_var("TELEGRAM_API_PORT", "https");
    assert!(BotConfig::load(None).is_err());

    env::set_var("TELEGRAM_API_PORT", "443");
    env::set_var("POLL_INTERVAL_MS", "0");
    let config = BotConfig::load(None).unwrap();
    assert!(config.validate().is_err());

    clear_env();
}

#[test]
#[serial]
fn test_partial_static_addressing_is_rejected() {
    clear_env();
    env::set_var("BOT_TOKEN", "t");
    env::set_var("STATIC_IP", "192.168.1.50");
    env::set_var("STATIC_GATEWAY", "192.168.1.1");

    let config = BotConfig::load(None).unwrap();
    let err = config.validate().unwrap_err().to_string();
    assert!(err.contains("STATIC_SUBNET"), "{}", err);
    assert!(config.connection_config().is_err());

    clear_env();
}

#[test]
#[serial]
fn test_inconsistent_static_addressing_is_rejected() {
    clear_env();
    env::set_var("BOT_TOKEN", "t");
    set_static_addressing();
    env::set_var("STATIC_GATEWAY", "10.0.0.1");

    let config = BotConfig::load(None).unwrap();
    assert!(config.validate().is_err());

    env::set_var("STATIC_GATEWAY", "not-an-address");
    let config = BotConfig::load(None).unwrap();
    assert!(config.validate().is_err());

    clear_env();
}
