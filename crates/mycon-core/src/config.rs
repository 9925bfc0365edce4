use embassy_time::Duration;
use serde::{Deserialize, Serialize};

use crate::keys::KeyLayout;

/// Port the stock controller app sends to and expects heartbeat replies on.
pub const DEFAULT_PORT: u16 = 59630;

#[derive(Serialize, Deserialize, Debug)]
#[serde(bound(deserialize = "'de: 'a"))]
pub struct Config<'a> {
    pub wifi: WifiConfig<'a>,
    pub receiver: ReceiverConfig,
    pub listen_port: u16,
}

impl Default for Config<'_> {
    fn default() -> Self {
        Self {
            wifi: WifiConfig::default(),
            receiver: ReceiverConfig::default(),
            listen_port: DEFAULT_PORT,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct WifiConfig<'a> {
    pub ssid: &'a str,
    pub password: &'a str,
}

/// Settings fixed for the lifetime of a receiver.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiverConfig {
    /// Port heartbeat replies are sent to on the sender's address.
    pub reply_port: u16,
    /// Silence after which every key is forced up.
    pub timeout_ms: u64,
    /// Delay between socket polls.
    pub poll_interval_ms: u64,
    /// Initial value of the per-packet debug logging switch.
    pub debug_output: bool,
    pub layout: KeyLayout,
}

impl ReceiverConfig {
    pub const DEFAULT_TIMEOUT_MS: u64 = 500;
    pub const DEFAULT_POLL_INTERVAL_MS: u64 = 10;

    pub fn with_reply_port(mut self, port: u16) -> Self {
        self.reply_port = port;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_poll_interval_ms(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    pub fn with_debug_output(mut self, enabled: bool) -> Self {
        self.debug_output = enabled;
        self
    }

    pub fn with_layout(mut self, layout: KeyLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            reply_port: DEFAULT_PORT,
            timeout_ms: Self::DEFAULT_TIMEOUT_MS,
            poll_interval_ms: Self::DEFAULT_POLL_INTERVAL_MS,
            debug_output: false,
            layout: KeyLayout::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_stock_device() {
        let config = ReceiverConfig::default();
        assert_eq!(config.reply_port, 59630);
        assert_eq!(config.timeout(), Duration::from_millis(500));
        assert_eq!(config.poll_interval(), Duration::from_millis(10));
        assert!(!config.debug_output);
        assert_eq!(config.layout, KeyLayout::default());
    }

    #[test]
    fn test_builder_overrides() {
        let config = ReceiverConfig::default()
            .with_reply_port(4000)
            .with_timeout_ms(50)
            .with_poll_interval_ms(1)
            .with_debug_output(true);
        assert_eq!(config.reply_port, 4000);
        assert_eq!(config.timeout(), Duration::from_millis(50));
        assert_eq!(config.poll_interval(), Duration::from_millis(1));
        assert!(config.debug_output);
    }
}
