//! Framed records on top of a raw storage slot
//!
//! Layout of a slot: `0xBEEF` magic (LE), payload length (u16 LE), JSON
//! payload, zero padding up to [`RECORD_SIZE`]. Records are always written
//! whole so flash drivers only see aligned writes.

use crate::settings::JsonRecord;

const MAGIC_HEADER: u16 = 0xBEEF;
pub const MAGIC_HEADER_SIZE: usize = MAGIC_HEADER.to_le_bytes().len();
const LENGTH_SIZE: usize = 2;
pub const HEADER_SIZE: usize = MAGIC_HEADER_SIZE + LENGTH_SIZE;

/// Bytes read and written per record
pub const RECORD_SIZE: usize = 512;
/// Largest payload a record can carry
pub const MAX_PAYLOAD_SIZE: usize = RECORD_SIZE - HEADER_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    DriverError,
    InvalidMagicHeader,
    InvalidData,
    TooLarge,
}

/// Raw access to one record slot.
#[allow(async_fn_in_trait)]
pub trait StorageDriver {
    /// Fill `buffer` from the start of the slot.
    async fn read(&self, buffer: &mut [u8]) -> Result<(), StorageError>;
    /// Replace the slot contents with `buffer`.
    async fn write(&self, buffer: &[u8]) -> Result<(), StorageError>;
}

impl<T: StorageDriver> StorageDriver for &T {
    async fn read(&self, buffer: &mut [u8]) -> Result<(), StorageError> {
        (**self).read(buffer).await
    }

    async fn write(&self, buffer: &[u8]) -> Result<(), StorageError> {
        (**self).write(buffer).await
    }
}

/// Persistent storage of one JSON record using a storage driver.
pub struct RecordStorage<D: StorageDriver> {
    driver: D,
}

impl<D: StorageDriver> RecordStorage<D> {
    pub const fn new(driver: D) -> Self {
        Self { driver }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Load the record from storage
    pub async fn load<T: JsonRecord>(&self) -> Result<T, StorageError> {
        let mut buffer = [0u8; RECORD_SIZE];
        self.driver
            .read(&mut buffer)
            .await
            .map_err(|_| StorageError::DriverError)?;

        let magic = u16::from_le_bytes([buffer[0], buffer[1]]);
        if magic != MAGIC_HEADER {
            return Err(StorageError::InvalidMagicHeader);
        }

        let length = usize::from(u16::from_le_bytes([buffer[2], buffer[3]]));
        if length > MAX_PAYLOAD_SIZE {
            return Err(StorageError::InvalidData);
        }

        T::decode(&buffer[HEADER_SIZE..HEADER_SIZE + length]).map_err(|_| StorageError::InvalidData)
    }

    /// Load the record, falling back to the default value on any failure.
    ///
    /// A blank slot is expected on first boot and only logged at info level.
    pub async fn load_or_default<T: JsonRecord + Default>(&self, name: &str) -> T {
        match self.load().await {
            Ok(record) => record,
            Err(StorageError::InvalidMagicHeader) => {
                log::info!("No stored {name}, using defaults");
                T::default()
            }
            Err(err) => {
                log::warn!("Failed to load {name}: {err:?}, using defaults");
                T::default()
            }
        }
    }

    /// Overwrite the stored record
    pub async fn save<T: JsonRecord>(&self, record: &T) -> Result<(), StorageError> {
        let mut data = [0u8; RECORD_SIZE];

        let length = record
            .encode(&mut data[HEADER_SIZE..])
            .map_err(|_| StorageError::TooLarge)?;
        let length_field = u16::try_from(length).map_err(|_| StorageError::TooLarge)?;

        data[0..MAGIC_HEADER_SIZE].copy_from_slice(&MAGIC_HEADER.to_le_bytes());
        data[MAGIC_HEADER_SIZE..HEADER_SIZE].copy_from_slice(&length_field.to_le_bytes());

        self.driver
            .write(&data)
            .await
            .map_err(|_| StorageError::DriverError)
    }
}
