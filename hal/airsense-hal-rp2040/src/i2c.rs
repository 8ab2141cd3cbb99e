//! I2C bus driver for RP2040
//!
//! Wraps embassy-rp's blocking I2C master so the sensor driver can run its
//! short register transactions without an async context.

use embassy_rp::i2c::{AbortReason, Blocking, Error, I2c, Instance};

pub use airsense_hal::i2c::{I2cBusError, I2cConfig};

/// RP2040 I2C master implementing the shared `I2cBus` trait
pub struct Rp2040I2c<'d, T: Instance> {
    bus: I2c<'d, T, Blocking>,
}

impl<'d, T: Instance> Rp2040I2c<'d, T> {
    /// Wrap an already configured blocking I2C peripheral
    pub fn new(bus: I2c<'d, T, Blocking>) -> Self {
        Self { bus }
    }

    /// Build the embassy-rp configuration for the given bus settings
    pub fn embassy_config(config: I2cConfig) -> embassy_rp::i2c::Config {
        let mut cfg = embassy_rp::i2c::Config::default();
        cfg.frequency = config.frequency;
        cfg
    }
}

fn map_error(e: Error) -> I2cBusError {
    match e {
        Error::Abort(AbortReason::NoAcknowledge) => I2cBusError::Nack,
        Error::Abort(AbortReason::ArbitrationLoss) => I2cBusError::ArbitrationLost,
        Error::Abort(_) => I2cBusError::Bus,
        Error::InvalidReadBufferLength | Error::InvalidWriteBufferLength => {
            I2cBusError::InvalidLength
        }
        _ => I2cBusError::Other,
    }
}

impl<'d, T: Instance> airsense_hal::I2cBus for Rp2040I2c<'d, T> {
    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), I2cBusError> {
        self.bus.blocking_write(address, data).map_err(map_error)
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), I2cBusError> {
        self.bus.blocking_read(address, buf).map_err(map_error)
    }

    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<(), I2cBusError> {
        self.bus
            .blocking_write_read(address, write_data, read_buf)
            .map_err(map_error)
    }
}
