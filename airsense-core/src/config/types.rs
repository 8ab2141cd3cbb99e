//! Configuration type definitions
//!
//! Settings for the sampling pipeline. The power profile (sample rate) is
//! chosen when the firmware is built; a copy stored in flash can override
//! the embedded defaults.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::fusion::{SampleRate, NANOS_PER_SEC};

/// Primary I2C address of the BME68x (SDO to GND)
pub const SENSOR_ADDRESS_PRIMARY: u8 = 0x76;

/// Secondary I2C address of the BME68x (SDO to VDDIO)
pub const SENSOR_ADDRESS_SECONDARY: u8 = 0x77;

/// What to do when saving the engine's calibration fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PersistPolicy {
    /// Stop the sampling worker with an error
    #[default]
    Halt,
    /// Log and try again on the next iteration
    Retry,
    /// Log and wait for the next save interval
    Ignore,
}

/// Sampling pipeline configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SamplerConfig {
    /// Output rate of the cached virtual sensors
    pub sample_rate: SampleRate,
    /// Self-heating offset subtracted from the measured temperature (°C)
    pub temperature_offset_c: f32,
    /// Calibration save interval, in sampling periods
    pub save_interval_periods: u32,
    /// Reaction to a failed calibration save
    pub persist_policy: PersistPolicy,
    /// I2C address of the sensor
    pub sensor_address: u8,
    /// Ambient temperature assumed before the first reading (°C)
    pub ambient_temp_c: i8,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            sample_rate: SampleRate::Lp,
            temperature_offset_c: 0.0,
            save_interval_periods: 200, // 10 minutes at 3 s
            persist_policy: PersistPolicy::Halt,
            sensor_address: SENSOR_ADDRESS_SECONDARY,
            ambient_temp_c: 25,
        }
    }
}

impl SamplerConfig {
    /// Fixed sleep between loop iterations
    ///
    /// A disabled rate still wakes the loop once per second so the
    /// engine's own schedule is honored.
    pub fn period_ns(&self) -> i64 {
        self.sample_rate.period_ns().unwrap_or(NANOS_PER_SEC)
    }

    /// Wall-clock interval between calibration saves
    pub fn save_interval_ns(&self) -> i64 {
        self.period_ns()
            .saturating_mul(self.save_interval_periods.max(1) as i64)
    }

    /// Check that values are within supported ranges
    pub fn is_valid(&self) -> bool {
        (self.sensor_address == SENSOR_ADDRESS_PRIMARY
            || self.sensor_address == SENSOR_ADDRESS_SECONDARY)
            && self.save_interval_periods > 0
            && self.temperature_offset_c.is_finite()
            && (-20.0..=20.0).contains(&self.temperature_offset_c)
    }
}
