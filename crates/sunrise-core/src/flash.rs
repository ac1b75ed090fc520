//! Streaming image writes to NOR flash
//!
//! Uploads arrive in chunks of any length while flash takes word-aligned
//! writes into erased memory. [`AlignedWriter`] keeps the odd bytes of each
//! chunk until the next one completes the word.

use embedded_storage::nor_flash::NorFlash;

/// Write granularity of the ESP32 flash
pub const WRITE_ALIGN: usize = 4;
/// Erase granularity of the ESP32 flash
pub const ERASE_SECTOR: u32 = 4096;

/// Value of erased NOR flash
const ERASED: u8 = 0xFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashWriteError {
    /// The image does not fit the region
    Overflow,
    /// The flash driver refused an erase or write
    Flash,
}

/// Bytes to erase before writing an image of `size` bytes into a region of
/// `capacity` bytes: whole sectors, never past the region.
pub fn erase_size(size: u32, capacity: u32) -> u32 {
    let sectors = size.div_ceil(ERASE_SECTOR);
    sectors.saturating_mul(ERASE_SECTOR).min(capacity)
}

/// Erase the sectors an image of `size` bytes will occupy at `offset`.
pub fn erase_region<F: NorFlash>(
    flash: &mut F,
    offset: u32,
    size: u32,
    capacity: u32,
) -> Result<(), FlashWriteError> {
    if size > capacity {
        return Err(FlashWriteError::Overflow);
    }
    let end = offset + erase_size(size, capacity);
    flash.erase(offset, end).map_err(|_| FlashWriteError::Flash)
}

/// Sequential writer into an erased flash region
#[derive(Debug)]
pub struct AlignedWriter {
    offset: u32,
    capacity: u32,
    /// Bytes already written to flash
    flushed: u32,
    tail: [u8; WRITE_ALIGN],
    tail_len: usize,
}

impl AlignedWriter {
    pub fn new(offset: u32, capacity: u32) -> Self {
        Self {
            offset,
            capacity,
            flushed: 0,
            tail: [ERASED; WRITE_ALIGN],
            tail_len: 0,
        }
    }

    /// Bytes accepted so far, including the ones not yet on flash
    #[allow(clippy::cast_possible_truncation)]
    pub fn accepted(&self) -> u32 {
        self.flushed + self.tail_len as u32
    }

    /// Append `data`, writing every completed word.
    #[allow(clippy::cast_possible_truncation)]
    pub fn write<F: NorFlash>(&mut self, flash: &mut F, data: &[u8]) -> Result<(), FlashWriteError> {
        let len = u32::try_from(data.len()).map_err(|_| FlashWriteError::Overflow)?;
        self.accepted()
            .checked_add(len)
            .filter(|end| *end <= self.capacity)
            .ok_or(FlashWriteError::Overflow)?;

        let mut rest = data;
        if self.tail_len != 0 {
            let take = (WRITE_ALIGN - self.tail_len).min(rest.len());
            self.tail[self.tail_len..self.tail_len + take].copy_from_slice(&rest[..take]);
            self.tail_len += take;
            rest = &rest[take..];
            if self.tail_len < WRITE_ALIGN {
                return Ok(());
            }
            let word = self.tail;
            self.program(flash, &word)?;
            self.tail = [ERASED; WRITE_ALIGN];
            self.tail_len = 0;
        }

        let aligned_len = rest.len() - rest.len() % WRITE_ALIGN;
        if aligned_len != 0 {
            self.program(flash, &rest[..aligned_len])?;
        }

        let remainder = &rest[aligned_len..];
        self.tail[..remainder.len()].copy_from_slice(remainder);
        self.tail_len = remainder.len();
        Ok(())
    }

    /// Write the pending partial word, padded with erased bytes.
    pub fn finish<F: NorFlash>(mut self, flash: &mut F) -> Result<u32, FlashWriteError> {
        let accepted = self.accepted();
        if self.tail_len != 0 {
            let word = self.tail;
            self.program(flash, &word)?;
        }
        Ok(accepted)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn program<F: NorFlash>(&mut self, flash: &mut F, data: &[u8]) -> Result<(), FlashWriteError> {
        flash
            .write(self.offset + self.flushed, data)
            .map_err(|_| FlashWriteError::Flash)?;
        self.flushed += data.len() as u32;
        Ok(())
    }
}
