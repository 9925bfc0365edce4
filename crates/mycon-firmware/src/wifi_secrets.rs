//! Build-time configuration forwarded by `build.rs` from `.env`.

use mycon_core::config::{Config, WifiConfig};
use mycon_core::{DEFAULT_PORT, ReceiverConfig};

const WIFI_SSID: Option<&str> = option_env!("MYCON_WIFI_SSID");
const WIFI_PASSWORD: Option<&str> = option_env!("MYCON_WIFI_PASSWORD");
const LISTEN_PORT: Option<&str> = option_env!("MYCON_PORT");

/// Device configuration, or `None` when no SSID was provided at build time.
pub fn config() -> Option<Config<'static>> {
    let ssid = WIFI_SSID.filter(|s| !s.is_empty())?;

    Some(Config {
        wifi: WifiConfig {
            ssid,
            password: WIFI_PASSWORD.unwrap_or(""),
        },
        receiver: ReceiverConfig::default(),
        listen_port: listen_port(),
    })
}

fn listen_port() -> u16 {
    match LISTEN_PORT.map(str::parse::<u16>) {
        Some(Ok(port)) => port,
        Some(Err(_)) => {
            log::warn!("MYCON_PORT is not a valid port, using {}", DEFAULT_PORT);
            DEFAULT_PORT
        }
        None => DEFAULT_PORT,
    }
}
