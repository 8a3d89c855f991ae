//! Link driver capability.

use telebot_core::{BotError, Result};
use tracing::{debug, info};

use crate::config::StaticAddressing;

/// Network interface driver. Every method returns promptly; waiting is the supervisor's job.
pub trait Link: Send {
    fn set_hostname(&mut self, name: &str);

    /// Applies static addressing before `begin`. An error leaves the link unconfigured.
    fn configure_static(&mut self, addressing: &StaticAddressing) -> Result<()>;

    /// Starts joining `ssid`; completion is observed through `is_connected`.
    fn begin(&mut self, ssid: &str, credential: &str);

    fn is_connected(&self) -> bool;

    /// Re-joins the last network without waiting.
    fn reconnect(&mut self);

    fn disconnect(&mut self);
}

/// Link for hosts whose network is managed by the operating system: it is up once started and
/// until disconnected. Static addressing cannot be applied from here and is refused.
#[derive(Debug, Default)]
pub struct HostLink {
    hostname: Option<String>,
    network: Option<String>,
    up: bool,
}

impl HostLink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hostname(&self) -> Option<&str> {
        self.hostname.as_deref()
    }
}

impl Link for HostLink {
    fn set_hostname(&mut self, name: &str) {
        self.hostname = Some(name.to_string());
    }

    fn configure_static(&mut self, _addressing: &StaticAddressing) -> Result<()> {
        Err(BotError::Config(
            "static addressing is managed by the host operating system".to_string(),
        ))
    }

    fn begin(&mut self, ssid: &str, _credential: &str) {
        info!(network = %ssid, "using host network");
        self.network = Some(ssid.to_string());
        self.up = true;
    }

    fn is_connected(&self) -> bool {
        self.up
    }

    fn reconnect(&mut self) {
        if self.network.is_some() {
            debug!("host link reconnect");
            self.up = true;
        }
    }

    fn disconnect(&mut self) {
        self.up = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_host_link_lifecycle() {
        let mut link = HostLink::new();
        assert!(!link.is_connected());

        link.reconnect();
        assert!(!link.is_connected());

        link.set_hostname("telebot");
        link.begin("host", "");
        assert!(link.is_connected());
        assert_eq!(link.hostname(), Some("telebot"));

        link.disconnect();
        assert!(!link.is_connected());
        link.reconnect();
        assert!(link.is_connected());
    }

    #[test]
    fn test_host_link_refuses_static_addressing() {
        let mut link = HostLink::new();
        let addressing = StaticAddressing {
            address: Ipv4Addr::new(192, 168, 1, 2),
            gateway: Ipv4Addr::new(192, 168, 1, 1),
            subnet: Ipv4Addr::new(255, 255, 255, 0),
            dns1: Ipv4Addr::new(1, 1, 1, 1),
            dns2: Ipv4Addr::new(8, 8, 8, 8),
        };
        assert!(matches!(link.configure_static(&addressing), Err(BotError::Config(_))));
    }
}
