use sunrise_core::{DeviceSettings, WifiCredentials};

/// Values shown on and returned from the setup page
#[derive(Debug, Clone, Default)]
pub struct PortalForm {
    pub credentials: WifiCredentials,
    pub settings: DeviceSettings,
}

impl PortalForm {
    /// Pre-fill the form with the stored values. The password is never echoed.
    pub fn prefilled(credentials: &WifiCredentials, settings: &DeviceSettings) -> Self {
        Self {
            credentials: WifiCredentials::new(credentials.ssid.as_str(), ""),
            settings: settings.clone(),
        }
    }
}

/// Result of the startup provisioning flow.
#[derive(Debug, Clone)]
pub struct ProvisioningOutcome {
    /// Settings the device runs with
    pub settings: DeviceSettings,
    /// Set when the values came from a portal submission
    pub changed: bool,
}
