//! In-memory storage and flash used by tests.

use core::cell::{Cell, RefCell};

use embedded_storage::nor_flash::{
    ErrorType,
    NorFlash,
    NorFlashErrorKind,
    ReadNorFlash,
};

use crate::flash::{ERASE_SECTOR, WRITE_ALIGN};
use crate::storage::{RECORD_SIZE, StorageDriver, StorageError};

/// Value of erased NOR flash
const ERASED: u8 = 0xFF;

/// A single record slot kept in RAM, starting out erased.
pub struct MemoryStorageDriver {
    data: RefCell<[u8; RECORD_SIZE]>,
    failing: Cell<bool>,
    writes: Cell<usize>,
}

impl MemoryStorageDriver {
    pub const fn new() -> Self {
        Self {
            data: RefCell::new([ERASED; RECORD_SIZE]),
            failing: Cell::new(false),
            writes: Cell::new(0),
        }
    }

    /// Make every following read and write fail, like an unmountable flash.
    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }

    /// Overwrite the beginning of the slot with raw bytes.
    pub fn fill(&self, bytes: &[u8]) {
        let mut data = self.data.borrow_mut();
        data.fill(ERASED);
        data[..bytes.len()].copy_from_slice(bytes);
    }

    pub fn writes(&self) -> usize {
        self.writes.get()
    }
}

impl Default for MemoryStorageDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageDriver for MemoryStorageDriver {
    async fn read(&self, buffer: &mut [u8]) -> Result<(), StorageError> {
        if self.failing.get() {
            return Err(StorageError::DriverError);
        }
        let data = self.data.borrow();
        let len = buffer.len().min(RECORD_SIZE);
        buffer[..len].copy_from_slice(&data[..len]);
        Ok(())
    }

    async fn write(&self, buffer: &[u8]) -> Result<(), StorageError> {
        if self.failing.get() || buffer.len() > RECORD_SIZE {
            return Err(StorageError::DriverError);
        }
        self.fill(buffer);
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}

/// NOR flash of two erase sectors that checks alignment and write-once
/// semantics, counting erases.
pub struct MemoryFlash {
    data: [u8; Self::SIZE],
    erases: usize,
}

impl MemoryFlash {
    pub const SIZE: usize = 2 * ERASE_SECTOR as usize;

    /// Flash with every byte programmed to zero, as left by an earlier image.
    pub const fn new() -> Self {
        Self {
            data: [0; Self::SIZE],
            erases: 0,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn erases(&self) -> usize {
        self.erases
    }
}

impl Default for MemoryFlash {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorType for MemoryFlash {
    type Error = NorFlashErrorKind;
}

impl ReadNorFlash for MemoryFlash {
    const READ_SIZE: usize = 1;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        let start = offset as usize;
        let source = self
            .data
            .get(start..start + bytes.len())
            .ok_or(NorFlashErrorKind::OutOfBounds)?;
        bytes.copy_from_slice(source);
        Ok(())
    }

    fn capacity(&self) -> usize {
        Self::SIZE
    }
}

impl NorFlash for MemoryFlash {
    const WRITE_SIZE: usize = WRITE_ALIGN;
    const ERASE_SIZE: usize = ERASE_SECTOR as usize;

    fn erase(&mut self, from: u32, to: u32) -> Result<(), Self::Error> {
        let (from, to) = (from as usize, to as usize);
        if from % Self::ERASE_SIZE != 0 || to % Self::ERASE_SIZE != 0 {
            return Err(NorFlashErrorKind::NotAligned);
        }
        self.data
            .get_mut(from..to)
            .ok_or(NorFlashErrorKind::OutOfBounds)?
            .fill(ERASED);
        self.erases += 1;
        Ok(())
    }

    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        let start = offset as usize;
        if start % Self::WRITE_SIZE != 0 || bytes.len() % Self::WRITE_SIZE != 0 {
            return Err(NorFlashErrorKind::NotAligned);
        }
        let target = self
            .data
            .get_mut(start..start + bytes.len())
            .ok_or(NorFlashErrorKind::OutOfBounds)?;
        // Programming only clears bits; anything else needs an erase first.
        if target.iter().any(|byte| *byte != ERASED) {
            return Err(NorFlashErrorKind::Other);
        }
        target.copy_from_slice(bytes);
        Ok(())
    }
}
