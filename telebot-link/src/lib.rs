//! # telebot-link
//!
//! Owns the network link lifecycle. [`Link`] is the driver capability (join a network, report
//! status, reconnect); [`ConnectivitySupervisor`] runs the state machine on top of it and
//! notifies a [`StatusObserver`] on every transition.

mod config;
mod link;
mod supervisor;

pub use config::{ConnectionConfig, StaticAddressing};
pub use link::{HostLink, Link};
pub use supervisor::{
    ConnectivitySupervisor, StatusObserver, DEFAULT_RECONNECT_INTERVAL, STATUS_POLL_INTERVAL,
};
