//! Latest-reading cache
//!
//! Holds the most recently fused value per physical quantity. The sampling
//! loop is the only writer; any number of readers on other threads of
//! control copy values out. A single blocking mutex guards all slots and is
//! held only for the copy, never across sensor I/O or fusion work.
//!
//! Readers always get the last successfully fused value, however old. Use
//! [`ReadingCache::snapshot`] to see when that was.

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;

use crate::fusion::{VirtualOutput, VirtualSensor};

/// Copy of all cached slots
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Readings {
    /// Heat-compensated temperature (°C)
    pub temperature: f64,
    /// Heat-compensated relative humidity (%)
    pub humidity: f64,
    /// Raw pressure (Pa)
    pub pressure: f64,
    /// Indoor air quality index
    pub air_quality: u16,
    /// Accuracy reported with the last air quality value (0..3)
    pub air_quality_accuracy: u8,
    /// Timestamp of the last fused update, `None` before the first one
    pub updated_at_ns: Option<i64>,
}

impl Readings {
    /// Initial value before any fusion step completed
    pub const INITIAL: Self = Self {
        temperature: 0.0,
        humidity: 0.0,
        pressure: 0.0,
        air_quality: 0,
        air_quality_accuracy: 0,
        updated_at_ns: None,
    };

    /// Fold one output into the slots; returns false for outputs with no slot
    fn apply(&mut self, output: &VirtualOutput) -> bool {
        match output.sensor() {
            Some(VirtualSensor::Iaq) => {
                // Saturating float-to-int conversion, NaN maps to 0
                self.air_quality = output.signal as u16;
                self.air_quality_accuracy = output.accuracy;
            }
            Some(VirtualSensor::HeatCompensatedTemperature) => {
                self.temperature = output.signal as f64;
            }
            Some(VirtualSensor::HeatCompensatedHumidity) => {
                self.humidity = output.signal as f64;
            }
            Some(VirtualSensor::RawPressure) => {
                self.pressure = output.signal as f64;
            }
            _ => return false,
        }
        self.updated_at_ns = Some(output.timestamp_ns);
        true
    }
}

/// Mutually exclusive store of the latest readings
///
/// `M` selects the lock flavor; firmware uses `CriticalSectionRawMutex` so
/// the cache can live in a `static`.
pub struct ReadingCache<M: RawMutex> {
    slots: Mutex<M, Cell<Readings>>,
}

impl<M: RawMutex> Default for ReadingCache<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex> ReadingCache<M> {
    /// Create a cache holding [`Readings::INITIAL`]
    pub const fn new() -> Self {
        Self {
            slots: Mutex::new(Cell::new(Readings::INITIAL)),
        }
    }

    /// Latest heat-compensated temperature (°C)
    pub fn temperature(&self) -> f64 {
        self.snapshot().temperature
    }

    /// Latest heat-compensated relative humidity (%)
    pub fn humidity(&self) -> f64 {
        self.snapshot().humidity
    }

    /// Latest pressure (Pa)
    pub fn pressure(&self) -> f64 {
        self.snapshot().pressure
    }

    /// Latest indoor air quality index
    pub fn air_quality(&self) -> u16 {
        self.snapshot().air_quality
    }

    /// Copy of all slots taken under one lock
    pub fn snapshot(&self) -> Readings {
        self.slots.lock(|slots| slots.get())
    }

    /// Fold fused outputs into the cache
    ///
    /// Outputs with unrecognized identifiers are logged and dropped; known
    /// sensors without a slot are ignored. Returns the number of slots
    /// written.
    pub fn update(&self, outputs: &[VirtualOutput]) -> usize {
        for output in outputs {
            if output.sensor().is_none() {
                warn!(
                    "Dropping output with unknown sensor id {}",
                    output.sensor_id
                );
            }
        }

        let written = self.slots.lock(|slots| {
            let mut readings = slots.get();
            let written = outputs.iter().filter(|o| readings.apply(o)).count();
            slots.set(readings);
            written
        });

        trace!("Cache updated, {} slot(s) written", written);
        written
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

    fn out(sensor: VirtualSensor, signal: f32) -> VirtualOutput {
        VirtualOutput::new(sensor, signal, 3, 1_000)
    }

    #[test]
    fn test_initial_readings() {
        let cache = ReadingCache::<CriticalSectionRawMutex>::new();
        assert_eq!(cache.snapshot(), Readings::INITIAL);
        assert_eq!(cache.air_quality(), 0);
        assert!(cache.snapshot().updated_at_ns.is_none());
    }

    #[test]
    fn test_update_writes_matching_slots() {
        let cache = ReadingCache::<CriticalSectionRawMutex>::new();
        let written = cache.update(&[
            out(VirtualSensor::HeatCompensatedTemperature, 21.5),
            out(VirtualSensor::HeatCompensatedHumidity, 45.25),
            out(VirtualSensor::RawPressure, 100_500.0),
            out(VirtualSensor::Iaq, 87.9),
        ]);

        assert_eq!(written, 4);
        assert_eq!(cache.temperature(), 21.5);
        assert_eq!(cache.humidity(), 45.25);
        assert_eq!(cache.pressure(), 100_500.0);
        assert_eq!(cache.air_quality(), 87);
        assert_eq!(cache.snapshot().air_quality_accuracy, 3);
        assert_eq!(cache.snapshot().updated_at_ns, Some(1_000));
    }

    #[test]
    fn test_unknown_output_is_dropped() {
        let cache = ReadingCache::<CriticalSectionRawMutex>::new();
        cache.update(&[out(VirtualSensor::HeatCompensatedTemperature, 19.0)]);
        let before = cache.snapshot();

        let unknown = VirtualOutput {
            sensor_id: 250,
            signal: 1.0,
            accuracy: 0,
            timestamp_ns: 9_000,
        };
        assert_eq!(cache.update(&[unknown]), 0);
        assert_eq!(cache.snapshot(), before);
    }

    #[test]
    fn test_air_quality_with_unknown_neighbour() {
        let cache = ReadingCache::<CriticalSectionRawMutex>::new();
        let unknown = VirtualOutput {
            sensor_id: 0xEE,
            signal: 1.0,
            accuracy: 0,
            timestamp_ns: 1_000,
        };
        cache.update(&[out(VirtualSensor::Iaq, 42.0), unknown]);

        let readings = cache.snapshot();
        assert_eq!(readings.air_quality, 42);
        assert_eq!(readings.temperature, 0.0);
        assert_eq!(readings.humidity, 0.0);
        assert_eq!(readings.pressure, 0.0);
    }

    #[test]
    fn test_known_sensor_without_slot_is_ignored() {
        let cache = ReadingCache::<CriticalSectionRawMutex>::new();
        assert_eq!(cache.update(&[out(VirtualSensor::Co2Equivalent, 600.0)]), 0);
        assert_eq!(cache.snapshot(), Readings::INITIAL);
    }

    #[test]
    fn test_air_quality_saturates() {
        let cache = ReadingCache::<CriticalSectionRawMutex>::new();
        cache.update(&[out(VirtualSensor::Iaq, -5.0)]);
        assert_eq!(cache.air_quality(), 0);
        cache.update(&[out(VirtualSensor::Iaq, 1.0e9)]);
        assert_eq!(cache.air_quality(), u16::MAX);
    }

    #[test]
    fn test_last_output_wins_within_batch() {
        let cache = ReadingCache::<CriticalSectionRawMutex>::new();
        cache.update(&[
            out(VirtualSensor::RawPressure, 99_000.0),
            out(VirtualSensor::RawPressure, 99_100.0),
        ]);
        assert_eq!(cache.pressure(), 99_100.0);
    }
}
