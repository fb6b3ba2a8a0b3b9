#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Binding record persistence in the last page of internal flash.
//!
//! The page holds one record image padded to the flash write granularity.
//! A freshly erased page reads back as `0xFF` everywhere and means "nothing
//! stored yet".

use robot_core::commands::{BINDING_RECORD_LEN, BindingRecord, RecordError};

/// STM32G0B1KE: 512 KiB of flash in 2 KiB pages.
pub const FLASH_SIZE: u32 = 512 * 1024;
pub const PAGE_SIZE: u32 = 2 * 1024;
/// Offset of the binding page from the start of flash.
pub const STORE_OFFSET: u32 = FLASH_SIZE - PAGE_SIZE;
/// Flash programs double words.
pub const WRITE_SIZE: usize = 8;
pub const IMAGE_LEN: usize = BINDING_RECORD_LEN.next_multiple_of(WRITE_SIZE);

const ERASED: u8 = 0xFF;

/// Record bytes padded with the erased value up to a whole number of writes.
pub fn image(record: &BindingRecord) -> [u8; IMAGE_LEN] {
    let mut image = [ERASED; IMAGE_LEN];
    image[..BINDING_RECORD_LEN].copy_from_slice(&record.encode());
    image
}

/// Interprets a page image read back from flash.
///
/// # Errors
///
/// Returns the codec error when the page holds something other than a
/// current binding record.
pub fn parse_image(image: &[u8; IMAGE_LEN]) -> Result<Option<BindingRecord>, RecordError> {
    if image.iter().all(|&byte| byte == ERASED) {
        return Ok(None);
    }
    BindingRecord::decode(&image[..BINDING_RECORD_LEN]).map(Some)
}

#[cfg(target_os = "none")]
pub use flash::{FlashStore, FlashStoreError};

#[cfg(target_os = "none")]
mod flash {
    use embassy_stm32::flash::{Blocking, Error as FlashError, Flash};
    use robot_core::commands::{BindingRecord, BindingStore, RecordError};

    use super::{IMAGE_LEN, PAGE_SIZE, STORE_OFFSET, image, parse_image};

    #[derive(Debug)]
    pub enum FlashStoreError {
        Flash(FlashError),
        Record(RecordError),
    }

    pub struct FlashStore {
        flash: Flash<'static, Blocking>,
    }

    impl FlashStore {
        pub fn new(flash: Flash<'static, Blocking>) -> Self {
            Self { flash }
        }
    }

    impl BindingStore for FlashStore {
        type Error = FlashStoreError;

        fn load(&mut self) -> Result<Option<BindingRecord>, Self::Error> {
            let mut page = [0; IMAGE_LEN];
            self.flash
                .blocking_read(STORE_OFFSET, &mut page)
                .map_err(FlashStoreError::Flash)?;
            parse_image(&page).map_err(FlashStoreError::Record)
        }

        fn save(&mut self, record: &BindingRecord) -> Result<(), Self::Error> {
            self.flash
                .blocking_erase(STORE_OFFSET, STORE_OFFSET + PAGE_SIZE)
                .map_err(FlashStoreError::Flash)?;
            self.flash
                .blocking_write(STORE_OFFSET, &image(record))
                .map_err(FlashStoreError::Flash)
        }
    }
}
