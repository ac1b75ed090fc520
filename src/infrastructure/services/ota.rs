//! OTA flash service
//!
//! Resolves where an uploaded image goes, erases that region once and streams
//! the image into it through the shared flash mutex. Firmware images land in
//! the next OTA app partition and are activated on success; filesystem images
//! replace the `spiffs` partition.

use embedded_storage::nor_flash::ReadNorFlash as _;
use esp_bootloader_esp_idf::ota::{Ota, OtaImageState, Slot};
use esp_bootloader_esp_idf::ota_updater::OtaUpdater;
use esp_bootloader_esp_idf::partitions::{
    DataPartitionSubType,
    PARTITION_TABLE_MAX_LEN,
    PartitionType,
    read_partition_table,
};
use esp_storage::FlashStorage;
use log::{debug, info, warn};
use sunrise_core::flash::{AlignedWriter, FlashWriteError, erase_region};
use sunrise_core::ota::OtaCommand;

use crate::infrastructure::drivers::FlashStorageMutex;

#[derive(Debug)]
pub enum FirmwareError {
    /// Failed to read or parse the partition table
    PartitionTable,
    NoOtaDataPartition,
    /// The image has nowhere to go
    NoTargetPartition,
    ImageTooLarge { size: u32, capacity: u32 },
    InvalidState,
    Erase,
    Write,
    Activation,
}

/// Flash region an update is written to
#[derive(Debug, Clone, Copy)]
struct UpdateTarget {
    offset: u32,
    capacity: u32,
}

pub struct OtaService {
    flash: &'static FlashStorageMutex,
}

impl OtaService {
    pub fn new(flash: &'static FlashStorageMutex) -> Self {
        Self { flash }
    }

    /// Mark a freshly activated image as valid so the bootloader keeps it.
    pub fn handle_boot_state(&self) {
        let result = self.flash.lock(|cell| {
            let mut flash = cell.borrow_mut();
            with_ota_data(&mut flash, |ota| {
                if ota.current_slot().map_err(|_| FirmwareError::InvalidState)? == Slot::None {
                    debug!("ota: running the factory image");
                    return Ok(());
                }
                match ota.current_ota_state() {
                    Ok(OtaImageState::New | OtaImageState::PendingVerify) => {
                        ota.set_current_ota_state(OtaImageState::Valid)
                            .map_err(|_| FirmwareError::Activation)?;
                        info!("ota: marked current image as valid");
                    }
                    Ok(state) => debug!("ota: current image state {:?}", state),
                    Err(_) => return Err(FirmwareError::InvalidState),
                }
                Ok(())
            })
        });

        if let Err(e) = result {
            warn!("ota: boot state check failed: {:?}", e);
        }
    }

    /// Erase the target of an image of `size` bytes and open a session.
    pub fn begin(&self, command: OtaCommand, size: u32) -> Result<OtaSession, FirmwareError> {
        let target = self.flash.lock(|cell| {
            let mut flash = cell.borrow_mut();
            match command {
                OtaCommand::Firmware => prepare_app_partition(&mut flash, size),
                OtaCommand::Filesystem => prepare_filesystem(&mut flash, size),
            }
        })?;
        info!(
            "ota: erased 0x{:X} for {} bytes ({} bytes available)",
            target.offset, size, target.capacity
        );

        Ok(OtaSession {
            flash: self.flash,
            command,
            writer: AlignedWriter::new(target.offset, target.capacity),
        })
    }
}

/// An update being written to flash
pub struct OtaSession {
    flash: &'static FlashStorageMutex,
    command: OtaCommand,
    writer: AlignedWriter,
}

impl OtaSession {
    pub fn write_chunk(&mut self, data: &[u8]) -> Result<(), FirmwareError> {
        let writer = &mut self.writer;
        self.flash
            .lock(|cell| writer.write(&mut *cell.borrow_mut(), data))
            .map_err(|e| {
                debug!("ota: write failed: {:?}", e);
                FirmwareError::Write
            })
    }

    /// Flush the image and activate it. Filesystem images need no activation.
    pub fn finalize(self) -> Result<(), FirmwareError> {
        let Self {
            flash,
            command,
            writer,
        } = self;

        flash.lock(|cell| {
            let mut flash = cell.borrow_mut();
            let written = writer
                .finish(&mut *flash)
                .map_err(|_| FirmwareError::Write)?;
            if command == OtaCommand::Filesystem {
                info!("ota: filesystem image written, {} bytes", written);
                return Ok(());
            }

            let mut buffer = [0u8; PARTITION_TABLE_MAX_LEN];
            let mut updater =
                OtaUpdater::new(&mut *flash, &mut buffer).map_err(|_| FirmwareError::PartitionTable)?;
            // Verified on the next boot by `handle_boot_state`.
            updater
                .activate_next_partition()
                .and_then(|()| updater.set_current_ota_state(OtaImageState::New))
                .map_err(|_| FirmwareError::Activation)?;
            info!("ota: firmware image activated, {} bytes", written);
            Ok(())
        })
    }
}

/// Run `op` against the OTA data partition
fn with_ota_data<R>(
    flash: &mut FlashStorage<'static>,
    op: impl FnOnce(&mut Ota<'_, FlashStorage<'static>>) -> Result<R, FirmwareError>,
) -> Result<R, FirmwareError> {
    let mut buffer = [0u8; PARTITION_TABLE_MAX_LEN];
    let table = read_partition_table(flash, &mut buffer).map_err(|_| FirmwareError::PartitionTable)?;
    let ota_data = table
        .find_partition(PartitionType::Data(DataPartitionSubType::Ota))
        .map_err(|_| FirmwareError::PartitionTable)?
        .ok_or(FirmwareError::NoOtaDataPartition)?;

    let mut region = ota_data.as_embedded_storage(flash);
    let mut ota = Ota::new(&mut region).map_err(|_| FirmwareError::InvalidState)?;
    op(&mut ota)
}

/// Erase the app partition the bootloader will try next.
fn prepare_app_partition(
    flash: &mut FlashStorage<'static>,
    size: u32,
) -> Result<UpdateTarget, FirmwareError> {
    let mut buffer = [0u8; PARTITION_TABLE_MAX_LEN];
    let mut updater =
        OtaUpdater::new(&mut *flash, &mut buffer).map_err(|_| FirmwareError::PartitionTable)?;
    let (mut partition, subtype) = updater
        .next_partition()
        .map_err(|_| FirmwareError::NoTargetPartition)?;
    debug!("ota: target partition {:?}", subtype);

    let capacity = region_capacity(partition.capacity());
    check_fits(size, capacity)?;
    erase_region(&mut partition, 0, size, capacity).map_err(erase_error)?;

    let offset = find_target(flash, PartitionType::App(subtype))?.offset;
    Ok(UpdateTarget { offset, capacity })
}

/// Erase the `spiffs` data partition.
fn prepare_filesystem(
    flash: &mut FlashStorage<'static>,
    size: u32,
) -> Result<UpdateTarget, FirmwareError> {
    let target = find_target(flash, PartitionType::Data(DataPartitionSubType::Spiffs))?;
    check_fits(size, target.capacity)?;
    erase_region(flash, target.offset, size, target.capacity).map_err(erase_error)?;
    Ok(target)
}

fn find_target(
    flash: &mut FlashStorage<'static>,
    partition_type: PartitionType,
) -> Result<UpdateTarget, FirmwareError> {
    let mut buffer = [0u8; PARTITION_TABLE_MAX_LEN];
    let table = read_partition_table(flash, &mut buffer).map_err(|_| FirmwareError::PartitionTable)?;
    let partition = table
        .find_partition(partition_type)
        .map_err(|_| FirmwareError::PartitionTable)?
        .ok_or(FirmwareError::NoTargetPartition)?;

    Ok(UpdateTarget {
        offset: partition.offset(),
        capacity: partition.len(),
    })
}

fn check_fits(size: u32, capacity: u32) -> Result<(), FirmwareError> {
    if size > capacity {
        return Err(FirmwareError::ImageTooLarge { size, capacity });
    }
    Ok(())
}

#[allow(clippy::cast_possible_truncation)]
fn region_capacity(capacity: usize) -> u32 {
    capacity as u32
}

fn erase_error(error: FlashWriteError) -> FirmwareError {
    debug!("ota: erase failed: {:?}", error);
    FirmwareError::Erase
}

/// Restart into the updated image
pub fn reboot() -> ! {
    info!("ota: rebooting");
    esp_hal::system::software_reset();
}
