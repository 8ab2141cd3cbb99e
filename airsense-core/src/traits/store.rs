//! Calibration state store trait

/// Errors from the state store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    /// No blob stored under the key yet
    NotFound,
    /// Stored blob does not fit the caller's buffer
    TooLarge,
    /// Underlying storage failed
    Io,
}

/// Key/value blob store holding the engine's calibration
///
/// Each implementation is bound to one fixed, namespaced key.
pub trait StateStore {
    /// Namespaced key the blob lives under, for logs
    fn key_name(&self) -> &'static str;

    /// Read the stored blob into `buffer`, returning its length
    fn load(
        &mut self,
        buffer: &mut [u8],
    ) -> impl core::future::Future<Output = Result<usize, StoreError>>;

    /// Replace the stored blob
    fn save(&mut self, data: &[u8]) -> impl core::future::Future<Output = Result<(), StoreError>>;
}
