//! Bot configuration loaded from the environment.

mod bot_config;

#[cfg(test)]
mod tests;

pub use bot_config::BotConfig;
