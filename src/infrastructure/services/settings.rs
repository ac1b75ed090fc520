use log::{debug, info};
use sunrise_core::{DeviceSettings, RecordStorage, StorageError, WifiCredentials};

use crate::domain::ports::ConfigurationStore;
use crate::infrastructure::drivers::{
    CREDENTIALS_RECORD_OFFSET,
    FlashRecordDriver,
    FlashStorageMutex,
    SETTINGS_RECORD_OFFSET,
};

/// Settings and credentials records in the `spiffs` partition
pub struct FlashConfigurationStore {
    settings: RecordStorage<FlashRecordDriver>,
    credentials: RecordStorage<FlashRecordDriver>,
}

impl FlashConfigurationStore {
    pub fn new(flash: &'static FlashStorageMutex) -> Self {
        Self {
            settings: RecordStorage::new(FlashRecordDriver::new(flash, SETTINGS_RECORD_OFFSET)),
            credentials: RecordStorage::new(FlashRecordDriver::new(
                flash,
                CREDENTIALS_RECORD_OFFSET,
            )),
        }
    }
}

impl ConfigurationStore for FlashConfigurationStore {
    async fn load_settings(&self) -> DeviceSettings {
        let settings: DeviceSettings = self.settings.load_or_default("settings").await;
        info!("settings: location={}", settings.location);
        debug!("settings: apikey={}", settings.api_key);
        settings
    }

    async fn save_settings(&self, settings: &DeviceSettings) -> Result<(), StorageError> {
        self.settings.save(settings).await?;
        info!("settings: written");
        Ok(())
    }

    async fn load_credentials(&self) -> WifiCredentials {
        self.credentials.load_or_default("credentials").await
    }

    async fn save_credentials(&self, credentials: &WifiCredentials) -> Result<(), StorageError> {
        self.credentials.save(credentials).await
    }
}
