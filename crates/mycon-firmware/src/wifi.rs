//! Wi-Fi station bring-up and link supervision.

use embassy_net::{Runner, Stack};
use embassy_time::{Duration, Timer};
use esp_radio::wifi::{ClientConfig, ModeConfig, WifiController, WifiDevice, WifiError};
use log::{info, warn};

use mycon_core::config::WifiConfig;

/// How often the link is checked while connected.
const LINK_CHECK_INTERVAL: Duration = Duration::from_secs(2);
/// Retry delay after a failed start or connect, doubled per failure.
const RETRY_BASE_SECS: u64 = 1;
const RETRY_MAX_SECS: u64 = 30;

/// Put the controller in station mode with the given credentials.
pub fn configure_station(
    controller: &mut WifiController<'static>,
    wifi: &WifiConfig<'_>,
) -> Result<(), WifiError> {
    let client_config = ClientConfig::default()
        .with_ssid(wifi.ssid.into())
        .with_password(wifi.password.into());
    controller.set_config(&ModeConfig::Client(client_config))
}

fn retry_delay(consecutive_failures: u32) -> Duration {
    let secs = RETRY_BASE_SECS
        .checked_shl(consecutive_failures)
        .unwrap_or(RETRY_MAX_SECS)
        .min(RETRY_MAX_SECS);
    Duration::from_secs(secs)
}

async fn wait_before_retry(consecutive_failures: &mut u32) {
    let delay = retry_delay(*consecutive_failures);
    *consecutive_failures = consecutive_failures.saturating_add(1);
    info!(
        "Wi-Fi retrying in {}s (consecutive_failures={})",
        delay.as_secs(),
        *consecutive_failures
    );
    Timer::after(delay).await;
}

/// Keeps the station connected, reconnecting whenever the link drops.
#[embassy_executor::task]
pub async fn connection_task(mut controller: WifiController<'static>, stack: Stack<'static>) {
    let mut consecutive_failures = 0u32;

    loop {
        if !controller.is_started().unwrap_or(false) {
            info!("Starting Wi-Fi");
            if let Err(e) = controller.start_async().await {
                warn!("Wi-Fi start failed: {:?}", e);
                wait_before_retry(&mut consecutive_failures).await;
                continue;
            }
        }

        if let Err(e) = controller.connect_async().await {
            warn!("Wi-Fi connect failed: {:?}", e);
            let _ = controller.disconnect_async().await;
            wait_before_retry(&mut consecutive_failures).await;
            continue;
        }

        info!("Wi-Fi connected");
        consecutive_failures = 0;

        loop {
            Timer::after(LINK_CHECK_INTERVAL).await;
            if !matches!(controller.is_connected(), Ok(true)) {
                warn!(
                    "Wi-Fi link lost (link_up={}), reconnecting",
                    stack.is_link_up()
                );
                break;
            }
        }
    }
}

/// Background task for running the network stack
#[embassy_executor::task]
pub async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) {
    runner.run().await;
}
