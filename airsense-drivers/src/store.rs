//! Flash-backed calibration store
//!
//! Keeps the engine's calibration blob under [`StorageKey::FusionState`]
//! in the board's key/value flash map.

use airsense_core::traits::{StateStore, StoreError};
use airsense_hal::{FlashError, FlashStorage, StorageKey};

/// [`StateStore`] over a [`FlashStorage`] implementation
pub struct FlashStateStore<F> {
    flash: F,
}

impl<F: FlashStorage> FlashStateStore<F> {
    pub fn new(flash: F) -> Self {
        Self { flash }
    }

    /// Key the blob lives under
    pub fn key(&self) -> StorageKey {
        StorageKey::FusionState
    }

    pub fn release(self) -> F {
        self.flash
    }
}

fn map_error(e: FlashError) -> StoreError {
    match e {
        FlashError::NotFound => StoreError::NotFound,
        FlashError::BufferTooSmall => StoreError::TooLarge,
        _ => StoreError::Io,
    }
}

impl<F: FlashStorage> StateStore for FlashStateStore<F> {
    fn key_name(&self) -> &'static str {
        self.key().name()
    }

    async fn load(&mut self, buffer: &mut [u8]) -> Result<usize, StoreError> {
        self.flash
            .read(StorageKey::FusionState, buffer)
            .await
            .map_err(map_error)
    }

    async fn save(&mut self, data: &[u8]) -> Result<(), StoreError> {
        self.flash
            .write(StorageKey::FusionState, data)
            .await
            .map_err(map_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;
    use std::collections::HashMap;

    /// In-memory key/value flash
    #[derive(Default)]
    struct MemFlash {
        entries: HashMap<u8, Vec<u8>>,
        fail_with: Option<FlashError>,
    }

    impl FlashStorage for MemFlash {
        async fn read(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, FlashError> {
            if let Some(e) = self.fail_with {
                return Err(e);
            }
            let data = self.entries.get(&key.as_u8()).ok_or(FlashError::NotFound)?;
            if data.len() > buffer.len() {
                return Err(FlashError::BufferTooSmall);
            }
            buffer[..data.len()].copy_from_slice(data);
            Ok(data.len())
        }

        async fn write(&mut self, key: StorageKey, data: &[u8]) -> Result<(), FlashError> {
            if let Some(e) = self.fail_with {
                return Err(e);
            }
            self.entries.insert(key.as_u8(), data.to_vec());
            Ok(())
        }

        async fn exists(&mut self, key: StorageKey) -> bool {
            self.entries.contains_key(&key.as_u8())
        }
    }

    #[test]
    fn test_save_then_load() {
        let mut store = FlashStateStore::new(MemFlash::default());
        block_on(store.save(&[1, 2, 3])).unwrap();

        let mut buffer = [0u8; 8];
        let len = block_on(store.load(&mut buffer)).unwrap();
        assert_eq!(&buffer[..len], &[1, 2, 3]);

        assert_eq!(store.key_name(), "bsec/state");
        let mut flash = store.release();
        assert!(block_on(flash.exists(StorageKey::FusionState)));
        assert!(!block_on(flash.exists(StorageKey::SensorConfig)));
    }

    #[test]
    fn test_missing_blob() {
        let mut store = FlashStateStore::new(MemFlash::default());
        let mut buffer = [0u8; 8];
        assert_eq!(block_on(store.load(&mut buffer)), Err(StoreError::NotFound));
    }

    #[test]
    fn test_blob_too_large() {
        let mut store = FlashStateStore::new(MemFlash::default());
        block_on(store.save(&[0xAA; 16])).unwrap();
        let mut buffer = [0u8; 4];
        assert_eq!(block_on(store.load(&mut buffer)), Err(StoreError::TooLarge));
    }

    #[test]
    fn test_flash_failures_are_io() {
        let flash = MemFlash {
            fail_with: Some(FlashError::Full),
            ..Default::default()
        };
        let mut store = FlashStateStore::new(flash);
        assert_eq!(block_on(store.save(&[1])), Err(StoreError::Io));
    }
}
