//! Link connection parameters.

use std::net::Ipv4Addr;
use std::time::Duration;

use telebot_core::{BotError, Result};

/// Network identity and bring-up options. Copied into the supervisor on `connect`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub ssid: String,
    pub credential: String,
    pub device_name: Option<String>,
    pub timeout: Duration,
    pub static_addressing: Option<StaticAddressing>,
}

impl ConnectionConfig {
    /// DHCP config with the default 20 s connect timeout.
    pub fn new(ssid: impl Into<String>, credential: impl Into<String>) -> Self {
        Self {
            ssid: ssid.into(),
            credential: credential.into(),
            device_name: None,
            timeout: Duration::from_secs(20),
            static_addressing: None,
        }
    }

    pub fn device_name(mut self, name: impl Into<String>) -> Self {
        self.device_name = Some(name.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn static_addressing(mut self, addressing: StaticAddressing) -> Self {
        self.static_addressing = Some(addressing);
        self
    }
}

/// Static IPv4 configuration. There is no DHCP fallback when it is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticAddressing {
    pub address: Ipv4Addr,
    pub gateway: Ipv4Addr,
    pub subnet: Ipv4Addr,
    pub dns1: Ipv4Addr,
    pub dns2: Ipv4Addr,
}

impl StaticAddressing {
    /// Checks the mask is contiguous, the address is a host address of the subnet and the
    /// gateway sits on the same subnet.
    pub fn validate(&self) -> Result<()> {
        let mask = u32::from(self.subnet);
        if mask == 0 || mask.leading_ones() + mask.trailing_zeros() != 32 {
            return Err(BotError::Config(format!("subnet mask {} is not contiguous", self.subnet)));
        }
        let address = u32::from(self.address);
        let host_bits = !mask;
        if host_bits != 0 && (address & host_bits == 0 || address & host_bits == host_bits) {
            return Err(BotError::Config(format!(
                "{} is not a host address in {}/{}",
                self.address,
                Ipv4Addr::from(address & mask),
                mask.leading_ones()
            )));
        }
        if u32::from(self.gateway) & mask != address & mask {
            return Err(BotError::Config(format!(
                "gateway {} is outside the subnet of {}",
                self.gateway, self.address
            )));
        }
        Ok(())
    }
}
