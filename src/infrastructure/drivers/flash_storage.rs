//! Flash storage driver with shared mutex access
//!
//! Settings records and OTA image writes both go through one
//! [`FlashStorageMutex`] so they never interleave.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::{Mutex, raw::CriticalSectionRawMutex};
use embedded_storage::nor_flash::{NorFlash, ReadNorFlash};
use esp_hal::peripherals::FLASH;
use esp_storage::FlashStorage;
use log::warn;
use static_cell::StaticCell;
use sunrise_core::{StorageDriver, StorageError};

use crate::config::SPIFFS_PARTITION_OFFSET;

pub(crate) const BLOCK_SIZE: u32 = 4096;

/// Device settings record, first block of the `spiffs` partition
pub(crate) const SETTINGS_RECORD_OFFSET: u32 = SPIFFS_PARTITION_OFFSET;
/// Network credentials record, the block after the settings
pub(crate) const CREDENTIALS_RECORD_OFFSET: u32 = SPIFFS_PARTITION_OFFSET + BLOCK_SIZE;

pub type FlashStorageMutex = Mutex<CriticalSectionRawMutex, RefCell<FlashStorage<'static>>>;

static FLASH_STORAGE_CELL: StaticCell<FlashStorageMutex> = StaticCell::new();

/// Wrap the FLASH peripheral in the shared mutex.
///
/// # Panics
/// Panics if called more than once.
pub fn init_flash_storage_mutex(flash: FLASH<'static>) -> &'static FlashStorageMutex {
    let flash_storage = FlashStorage::new(flash);
    FLASH_STORAGE_CELL.init(Mutex::new(RefCell::new(flash_storage)))
}

/// One erase block of flash holding a single record.
pub struct FlashRecordDriver {
    storage: &'static FlashStorageMutex,
    addr: u32,
}

impl FlashRecordDriver {
    pub(crate) fn new(storage: &'static FlashStorageMutex, addr: u32) -> Self {
        Self { storage, addr }
    }
}

impl StorageDriver for FlashRecordDriver {
    async fn read(&self, buffer: &mut [u8]) -> Result<(), StorageError> {
        self.storage.lock(|cell| {
            cell.borrow_mut().read(self.addr, buffer).map_err(|e| {
                warn!("flash: read at 0x{:X} failed: {:?}", self.addr, e);
                StorageError::DriverError
            })
        })
    }

    async fn write(&self, buffer: &[u8]) -> Result<(), StorageError> {
        self.storage.lock(|cell| {
            let mut flash = cell.borrow_mut();
            flash.erase(self.addr, self.addr + BLOCK_SIZE).map_err(|e| {
                warn!("flash: erase at 0x{:X} failed: {:?}", self.addr, e);
                StorageError::DriverError
            })?;
            NorFlash::write(&mut *flash, self.addr, buffer).map_err(|e| {
                warn!("flash: write at 0x{:X} failed: {:?}", self.addr, e);
                StorageError::DriverError
            })
        })
    }
}
