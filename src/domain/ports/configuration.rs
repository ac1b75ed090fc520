use sunrise_core::{DeviceSettings, StorageError, WifiCredentials};

/// Persistent device settings and network credentials
#[allow(async_fn_in_trait)]
pub trait ConfigurationStore {
    /// Get the stored settings, empty fields when nothing valid is stored
    async fn load_settings(&self) -> DeviceSettings;

    /// Persist the settings
    async fn save_settings(&self, settings: &DeviceSettings) -> Result<(), StorageError>;

    /// Get the stored network credentials
    async fn load_credentials(&self) -> WifiCredentials;

    /// Persist the network credentials
    async fn save_credentials(&self, credentials: &WifiCredentials) -> Result<(), StorageError>;
}
