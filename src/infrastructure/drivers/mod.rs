mod flash_storage;
mod led_ws2812;
mod network;
mod random;
pub mod wifi;

pub(crate) use flash_storage::{CREDENTIALS_RECORD_OFFSET, FlashRecordDriver, SETTINGS_RECORD_OFFSET};
pub use flash_storage::{FlashStorageMutex, init_flash_storage_mutex};
pub use led_ws2812::EspLedDriver;
pub(crate) use network::resolve_host;
pub use network::{wait_for_ip, wait_for_link};
pub(crate) use random::{get_seed, nonce_seed};
pub use wifi::{WifiManager, init_wifi};
