//! Register bus transport
//!
//! Byte-register access to a sensor plus the microsecond delay its
//! datasheet timings need. Drivers talk to this trait only, so tests can
//! swap in a register file.

use airsense_hal::{I2cBus, I2cBusError};
use embedded_hal::delay::DelayNs;

/// Largest number of registers one burst write can carry
pub const MAX_BURST_WRITE: usize = 16;

/// Register-level access to one device
pub trait RegisterBus {
    /// Write consecutive registers starting at `reg`
    fn write_registers(&mut self, reg: u8, data: &[u8]) -> Result<(), I2cBusError>;

    /// Read consecutive registers starting at `reg`
    fn read_registers(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), I2cBusError>;

    /// Busy-wait for `us` microseconds
    fn delay_us(&mut self, us: u32);
}

/// [`RegisterBus`] over an I2C master and a delay provider
///
/// Writes go out as `(register, value)` pairs in one transaction, which is
/// how the BME68x accepts burst writes; reads use a repeated start.
pub struct I2cRegisterBus<B, D> {
    bus: B,
    delay: D,
    address: u8,
}

impl<B: I2cBus, D: DelayNs> I2cRegisterBus<B, D> {
    pub fn new(bus: B, delay: D, address: u8) -> Self {
        Self {
            bus,
            delay,
            address,
        }
    }

    /// 7-bit device address
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Give back the bus and the delay
    pub fn release(self) -> (B, D) {
        (self.bus, self.delay)
    }
}

impl<B: I2cBus, D: DelayNs> RegisterBus for I2cRegisterBus<B, D> {
    fn write_registers(&mut self, reg: u8, data: &[u8]) -> Result<(), I2cBusError> {
        if data.len() > MAX_BURST_WRITE {
            return Err(I2cBusError::InvalidLength);
        }

        let mut frame: heapless::Vec<u8, { 2 * MAX_BURST_WRITE }> = heapless::Vec::new();
        for (offset, value) in data.iter().enumerate() {
            let _ = frame.push(reg.wrapping_add(offset as u8));
            let _ = frame.push(*value);
        }
        self.bus.write(self.address, &frame)
    }

    fn read_registers(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), I2cBusError> {
        self.bus.write_read(self.address, &[reg], buf)
    }

    fn delay_us(&mut self, us: u32) {
        self.delay.delay_us(us);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingI2c {
        writes: Vec<(u8, Vec<u8>)>,
        reads: Vec<(u8, u8)>,
    }

    impl I2cBus for RecordingI2c {
        fn write(&mut self, address: u8, data: &[u8]) -> Result<(), I2cBusError> {
            self.writes.push((address, data.to_vec()));
            Ok(())
        }

        fn read(&mut self, _address: u8, _buf: &mut [u8]) -> Result<(), I2cBusError> {
            Err(I2cBusError::Other)
        }

        fn write_read(
            &mut self,
            address: u8,
            write_data: &[u8],
            read_buf: &mut [u8],
        ) -> Result<(), I2cBusError> {
            self.reads.push((address, write_data[0]));
            read_buf.fill(0x5A);
            Ok(())
        }
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    #[test]
    fn test_burst_write_interleaves_addresses() {
        let mut bus = I2cRegisterBus::new(RecordingI2c::default(), NoDelay, 0x77);
        bus.write_registers(0x5A, &[1, 2, 3]).unwrap();

        let (i2c, _) = bus.release();
        assert_eq!(
            i2c.writes,
            vec![(0x77, vec![0x5A, 1, 0x5B, 2, 0x5C, 3])]
        );
    }

    #[test]
    fn test_oversized_write_rejected() {
        let mut bus = I2cRegisterBus::new(RecordingI2c::default(), NoDelay, 0x76);
        let data = [0u8; MAX_BURST_WRITE + 1];
        assert_eq!(
            bus.write_registers(0x50, &data),
            Err(I2cBusError::InvalidLength)
        );
    }

    #[test]
    fn test_read_uses_repeated_start() {
        let mut bus = I2cRegisterBus::new(RecordingI2c::default(), NoDelay, 0x76);
        let mut buf = [0u8; 2];
        bus.read_registers(0xD0, &mut buf).unwrap();
        assert_eq!(buf, [0x5A, 0x5A]);

        let (i2c, _) = bus.release();
        assert_eq!(i2c.reads, vec![(0x76, 0xD0)]);
    }
}
