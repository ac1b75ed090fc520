mod ota;
mod settings;
mod time;

pub use ota::{FirmwareError, OtaService, OtaSession, reboot};
pub use settings::FlashConfigurationStore;
pub use time::SntpTimeSource;
