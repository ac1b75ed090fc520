use embassy_net::Runner;
use embassy_time::{Duration, Timer};
use esp_radio::wifi::{WifiController, WifiDevice, WifiEvent, WifiStaState};
use log::{info, warn};
use sunrise_core::WifiCredentials;

use crate::infrastructure::drivers::wifi::client_config;

const RECONNECT_DELAY: Duration = Duration::from_secs(2);
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Keeps the station joined to the provisioned network
///
/// Waits for a disconnect and reconnects, retrying until the access point
/// is back.
#[embassy_executor::task]
pub async fn wifi_keepalive_task(
    mut controller: WifiController<'static>,
    credentials: WifiCredentials,
) {
    loop {
        if esp_radio::wifi::sta_state() == WifiStaState::Connected {
            controller.wait_for_event(WifiEvent::StaDisconnected).await;
            warn!("network: disconnected from {}", credentials.ssid);
            Timer::after(RECONNECT_DELAY).await;
        }
        if !matches!(controller.is_started(), Ok(true)) {
            let started = match controller.set_config(&client_config(&credentials)) {
                Ok(()) => controller.start_async().await,
                Err(e) => Err(e),
            };
            if let Err(e) = started {
                warn!("network: failed to start station: {:?}", e);
                Timer::after(RETRY_DELAY).await;
                continue;
            }
        }

        info!("network: reconnecting to {}", credentials.ssid);
        if let Err(e) = controller.connect_async().await {
            warn!("network: error connecting: {:?}", e);
            Timer::after(RETRY_DELAY).await;
        }
    }
}

/// Drives one network stack; one instance per interface
#[embassy_executor::task(pool_size = 2)]
pub async fn network_runner_task(mut runner: Runner<'static, WifiDevice<'static>>) {
    runner.run().await;
}
