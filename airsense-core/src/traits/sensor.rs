//! Sensor driver trait

use crate::fusion::{FusionRequest, SampleBatch};

/// Errors from the sensor driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriverError {
    /// Register read or write failed on the bus
    Bus,
    /// Device did not answer with the expected chip id
    ChipNotFound(u8),
    /// Requested settings cannot be encoded for this device
    InvalidSettings,
    /// Device not initialized
    NotInitialized,
    /// Device did not settle into the requested mode
    Timeout,
}

/// Driver for the physical gas/environment sensor
///
/// Translates engine requests into device configuration and hands back
/// compensated samples. Implementations apply whatever the request says;
/// mode transitions are not validated.
pub trait SensorDriver {
    /// Reset the device and load its factory calibration
    fn init(&mut self) -> Result<(), DriverError>;

    /// Configure oversampling, heater and operating mode from `request`
    ///
    /// Any failing register operation aborts the apply; the caller skips
    /// the iteration.
    fn apply_settings(&mut self, request: &FusionRequest) -> Result<(), DriverError>;

    /// Read the samples produced since the last apply
    ///
    /// Forced mode yields at most one sample, parallel mode up to three,
    /// ordered by sub-measurement index. Fields without new data are left
    /// out, so the batch may be empty.
    fn read_fields(&mut self) -> Result<SampleBatch, DriverError>;
}
