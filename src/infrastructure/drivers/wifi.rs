//! Wi-Fi radio shared by the station link and the setup access point
//!
//! Both network interfaces get their own embassy-net stack up front; the
//! controller switches the radio between client and access point mode.

use embassy_executor::Spawner;
use embassy_net::{DhcpConfig, Ipv4Cidr, Stack, StackResources, StaticConfigV4};
use embassy_time::Instant;
use esp_hal::peripherals::WIFI;
use esp_radio::wifi::{
    AccessPointConfig,
    AuthMethod,
    ClientConfig,
    Config,
    ModeConfig,
    WifiController,
};
use heapless::String;
use log::{info, warn};
use static_cell::make_static;
use sunrise_core::WifiCredentials;

use super::network::{wait_for_ip, wait_for_link};
use super::random::get_seed;
use crate::config::{HOSTNAME, PORTAL_URL, PROVISIONING};
use crate::controllers::portal::PORTAL;
use crate::domain::entity::PortalForm;
use crate::domain::ports::{CaptivePortal, LinkError, StationLink};
use crate::infrastructure::tasks::{
    captive_dns_task,
    dhcp_server_task,
    network_runner_task,
    portal_http_task,
    wifi_keepalive_task,
};

/// DNS, SNTP and the two OTA sockets
const MAX_STA_SOCKETS: usize = 6;
/// DHCP, DNS and HTTP
const MAX_AP_SOCKETS: usize = 4;

/// Bring up the radio and both network stacks.
pub fn init_wifi(spawner: Spawner, wifi_device: WIFI<'static>) -> WifiManager {
    let esp_radio_ctrl = &*make_static!(esp_radio::init().unwrap());
    let (controller, interfaces) =
        esp_radio::wifi::new(esp_radio_ctrl, wifi_device, Config::default()).unwrap();

    let mut dhcp_config = DhcpConfig::default();
    dhcp_config.hostname = String::try_from(HOSTNAME).ok();
    let sta_resources = make_static!(StackResources::<MAX_STA_SOCKETS>::new());
    let (sta_stack, sta_runner) = embassy_net::new(
        interfaces.sta,
        embassy_net::Config::dhcpv4(dhcp_config),
        sta_resources,
        get_seed(),
    );

    let ap_config = StaticConfigV4 {
        address: Ipv4Cidr::new(PROVISIONING.ap_address, PROVISIONING.ap_prefix_len),
        gateway: Some(PROVISIONING.ap_address),
        dns_servers: heapless::Vec::default(),
    };
    let ap_resources = make_static!(StackResources::<MAX_AP_SOCKETS>::new());
    let (ap_stack, ap_runner) = embassy_net::new(
        interfaces.ap,
        embassy_net::Config::ipv4_static(ap_config),
        ap_resources,
        get_seed(),
    );

    spawner.spawn(network_runner_task(sta_runner)).ok();
    spawner.spawn(network_runner_task(ap_runner)).ok();

    WifiManager {
        controller,
        spawner,
        sta_stack,
        ap_stack,
        portal_tasks_started: false,
        joined: None,
    }
}

pub(crate) fn client_config(credentials: &WifiCredentials) -> ModeConfig {
    let config = ClientConfig::default().with_ssid(credentials.ssid.as_str().into());
    let config = if credentials.password.is_empty() {
        config.with_auth_method(AuthMethod::None)
    } else {
        config.with_password(credentials.password.as_str().into())
    };
    ModeConfig::Client(config)
}

pub struct WifiManager {
    controller: WifiController<'static>,
    spawner: Spawner,
    sta_stack: Stack<'static>,
    ap_stack: Stack<'static>,
    portal_tasks_started: bool,
    joined: Option<WifiCredentials>,
}

impl WifiManager {
    pub fn station_stack(&self) -> Stack<'static> {
        self.sta_stack
    }

    /// Hand the radio to a background task that rejoins after drops.
    pub fn spawn_keepalive(self) {
        match self.joined {
            Some(credentials) => {
                self.spawner
                    .spawn(wifi_keepalive_task(self.controller, credentials))
                    .ok();
            }
            None => warn!("wifi: no joined network to keep alive"),
        }
    }

    async fn apply(&mut self, mode: &ModeConfig) -> Result<(), LinkError> {
        if matches!(self.controller.is_started(), Ok(true)) {
            self.controller.stop_async().await.map_err(|e| {
                warn!("wifi: stop failed: {:?}", e);
                LinkError::Radio
            })?;
        }
        self.controller.set_config(mode).map_err(|e| {
            warn!("wifi: invalid configuration: {:?}", e);
            LinkError::Radio
        })?;
        self.controller.start_async().await.map_err(|e| {
            warn!("wifi: start failed: {:?}", e);
            LinkError::Radio
        })
    }
}

impl StationLink for WifiManager {
    async fn join(&mut self, credentials: &WifiCredentials) -> Result<(), LinkError> {
        self.apply(&client_config(credentials)).await?;
        self.controller.connect_async().await.map_err(|e| {
            warn!("wifi: connect failed: {:?}", e);
            LinkError::Connect
        })?;

        let config = wait_for_ip(self.sta_stack).await;
        info!(
            "wifi: connected to {}, address {}",
            credentials.ssid, config.address
        );
        self.joined = Some(credentials.clone());
        Ok(())
    }
}

impl CaptivePortal for WifiManager {
    async fn open(&mut self, form: &PortalForm) -> Result<(), LinkError> {
        PORTAL.set_defaults(form);

        let ap_config = AccessPointConfig::default()
            .with_ssid(PROVISIONING.ap_ssid.into())
            .with_auth_method(AuthMethod::None);
        self.apply(&ModeConfig::AccessPoint(ap_config)).await?;
        wait_for_link(self.ap_stack).await;

        if !self.portal_tasks_started {
            let address = PROVISIONING.ap_address;
            self.spawner.spawn(dhcp_server_task(self.ap_stack, address)).ok();
            self.spawner.spawn(captive_dns_task(self.ap_stack, address)).ok();
            self.spawner.spawn(portal_http_task(self.ap_stack)).ok();
            self.portal_tasks_started = true;
        }

        info!(
            "wifi: access point '{}' up, setup page at {}",
            PROVISIONING.ap_ssid, PORTAL_URL
        );
        Ok(())
    }

    async fn next_submission(&mut self) -> PortalForm {
        PORTAL.next_submission().await
    }

    fn last_activity(&self) -> Option<Instant> {
        PORTAL.last_activity()
    }

    async fn close(&mut self) {
        if let Err(e) = self.controller.stop_async().await {
            warn!("wifi: failed to stop access point: {:?}", e);
        }
        info!("wifi: access point closed");
    }
}
