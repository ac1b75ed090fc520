//! Compile-time device configuration

use embassy_net::Ipv4Address;
use embassy_time::Duration;

pub const BUILD_VERSION: &str = env!("BUILD_VERSION");

/// Base address of the `spiffs` data partition (defined in partitions.csv).
///
/// Holds the settings records and is the target of filesystem uploads.
pub const SPIFFS_PARTITION_OFFSET: u32 = 0x31_0000;

pub struct ProvisioningConfig {
    /// Name of the open setup access point
    pub ap_ssid: &'static str,
    pub ap_address: Ipv4Address,
    pub ap_prefix_len: u8,
    /// Time allowed to join a network, including DHCP
    pub join_timeout: Duration,
    /// Portal idle time before giving up
    pub portal_timeout: Duration,
    /// Pause before the restart that follows a failed provisioning
    pub restart_delay: Duration,
}

pub struct TimeConfig {
    pub ntp_host: &'static str,
    pub response_timeout: Duration,
    pub refresh_interval: Duration,
    pub utc_offset_secs: i64,
}

pub struct SunriseConfig {
    /// Time from black to white
    pub length: Duration,
    /// Period of the render loop
    pub frame_interval: Duration,
}

pub struct OtaConfig {
    pub password: &'static str,
    /// Longest wait for the next chunk of an image
    pub receive_timeout: Duration,
}

pub const HOSTNAME: &str = "sunrise-lamp";

/// Address every captive request is redirected to; matches `PROVISIONING.ap_address`
pub const PORTAL_URL: &str = "http://192.168.4.1/";

pub const PROVISIONING: ProvisioningConfig = ProvisioningConfig {
    ap_ssid: "badal",
    ap_address: Ipv4Address::new(192, 168, 4, 1),
    ap_prefix_len: 24,
    join_timeout: Duration::from_secs(20),
    portal_timeout: Duration::from_secs(180),
    restart_delay: Duration::from_secs(3),
};

pub const TIME: TimeConfig = TimeConfig {
    ntp_host: "pool.ntp.org",
    response_timeout: Duration::from_secs(1),
    refresh_interval: sunrise_core::gate::REFRESH_INTERVAL,
    utc_offset_secs: 10 * 60 * 60,
};

pub const SUNRISE: SunriseConfig = SunriseConfig {
    length: Duration::from_secs(30 * 60),
    frame_interval: Duration::from_millis(20),
};

pub const OTA: OtaConfig = OtaConfig {
    password: match option_env!("OTA_PASSWORD") {
        Some(password) => password,
        None => "password",
    },
    receive_timeout: Duration::from_secs(10),
};

/// Number of pixels on the data line
pub const LED_COUNT: usize = 1;

#[macro_export]
macro_rules! led_gpio {
    ($p:expr) => {
        $p.GPIO4
    };
}
