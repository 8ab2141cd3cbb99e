//! Fusion data model
//!
//! Types exchanged between the sampling loop, the sensor driver and the
//! fusion engine. Identifiers follow the numbering used by Bosch's BSEC
//! library so a binding to the real engine can pass them through as-is.

use heapless::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum number of field samples one device read can return
pub const MAX_FIELDS: usize = 3;

/// Maximum heater profile length in parallel mode
pub const MAX_HEATER_PROFILE_LEN: usize = 10;

/// Maximum number of inputs per fusion step
pub const MAX_INPUTS: usize = 6;

/// Maximum number of outputs per fusion step
pub const MAX_OUTPUTS: usize = 16;

/// Maximum size of the engine's persisted calibration blob
pub const MAX_STATE_BLOB_SIZE: usize = 221;

/// Nanoseconds per second, the unit of every fusion timestamp
pub const NANOS_PER_SEC: i64 = 1_000_000_000;

/// Opaque calibration blob with its occupied length
pub type StateBlob = Vec<u8, MAX_STATE_BLOB_SIZE>;

/// Samples returned by a single device read
pub type SampleBatch = Vec<PhysicalSample, MAX_FIELDS>;

/// Inputs handed to one fusion step
pub type InputBatch = Vec<FusionInput, MAX_INPUTS>;

/// Outputs produced by one fusion step
pub type OutputBatch = Vec<VirtualOutput, MAX_OUTPUTS>;

/// Device operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OperatingMode {
    /// No measurement, lowest power
    #[default]
    Sleep,
    /// Single-shot measurement, device returns to sleep afterwards
    Forced,
    /// Continuous multi-profile measurement
    Parallel,
}

/// Oversampling setting for temperature, pressure or humidity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum Oversampling {
    /// No measurement for this quantity
    #[default]
    Skipped = 0,
    X1 = 1,
    X2 = 2,
    X4 = 3,
    X8 = 4,
    X16 = 5,
}

impl Oversampling {
    /// Create from the 3-bit register encoding
    pub fn from_bits(value: u8) -> Self {
        match value {
            1 => Oversampling::X1,
            2 => Oversampling::X2,
            3 => Oversampling::X4,
            4 => Oversampling::X8,
            5 => Oversampling::X16,
            _ => Oversampling::Skipped,
        }
    }

    /// Register encoding
    pub const fn bits(self) -> u8 {
        self as u8
    }

    /// Number of ADC conversion cycles this setting costs
    pub const fn cycles(self) -> u32 {
        match self {
            Oversampling::Skipped => 0,
            Oversampling::X1 => 1,
            Oversampling::X2 => 2,
            Oversampling::X4 => 4,
            Oversampling::X8 => 8,
            Oversampling::X16 => 16,
        }
    }
}

/// One step of a parallel-mode heater profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HeaterStep {
    /// Target heater temperature (°C)
    pub temperature_c: u16,
    /// Duration as a multiple of the shared heater duration
    pub duration_multiplier: u16,
}

/// Heater configuration requested by the engine
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HeaterSettings {
    /// Whether the gas heater runs at all
    pub enabled: bool,
    /// Forced-mode target temperature (°C)
    pub temperature_c: u16,
    /// Forced-mode heating duration (ms)
    pub duration_ms: u16,
    /// Parallel-mode profile
    pub profile: Vec<HeaterStep, MAX_HEATER_PROFILE_LEN>,
}

/// Physical input identifiers understood by the fusion engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PhysicalInput {
    /// Pressure (Pa)
    Pressure = 1,
    /// Relative humidity (%)
    Humidity = 2,
    /// Temperature (°C)
    Temperature = 3,
    /// Gas resistance (Ohm)
    GasResistor = 4,
    /// Temperature offset caused by nearby heat sources (°C)
    HeatSource = 14,
    /// Heater profile step the gas reading belongs to
    ProfilePart = 24,
}

impl PhysicalInput {
    /// Identifier as passed to the engine
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Bit of this input in [`RequiredInputs`]
    pub const fn mask(self) -> u32 {
        1 << (self as u32 - 1)
    }
}

/// Set of inputs the engine needs on its next step
///
/// Produced by [`crate::traits::FusionEngine::schedule`]; the glue layer only
/// emits inputs whose bit is set here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RequiredInputs(pub u32);

impl RequiredInputs {
    pub const NONE: Self = Self(0);

    /// Build a set from a list of inputs
    pub fn of(inputs: &[PhysicalInput]) -> Self {
        Self(inputs.iter().fold(0, |acc, input| acc | input.mask()))
    }

    /// Check whether an input is required
    pub const fn contains(self, input: PhysicalInput) -> bool {
        self.0 & input.mask() != 0
    }

    /// Add an input to the set
    pub const fn with(self, input: PhysicalInput) -> Self {
        Self(self.0 | input.mask())
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// Virtual (fused) sensor identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum VirtualSensor {
    /// Indoor air quality index (0..500)
    Iaq = 1,
    /// IAQ without the long-term baseline adaptation
    StaticIaq = 2,
    /// CO2 equivalent (ppm)
    Co2Equivalent = 3,
    /// Breath VOC equivalent (ppm)
    BreathVocEquivalent = 4,
    /// Unprocessed temperature (°C)
    RawTemperature = 6,
    /// Unprocessed pressure (Pa)
    RawPressure = 7,
    /// Unprocessed relative humidity (%)
    RawHumidity = 8,
    /// Unprocessed gas resistance (Ohm)
    RawGas = 9,
    /// Gas sensor stabilization status
    StabilizationStatus = 12,
    /// Gas sensor run-in status
    RunInStatus = 13,
    /// Temperature compensated for heat sources (°C)
    HeatCompensatedTemperature = 14,
    /// Humidity re-referenced to the compensated temperature (%)
    HeatCompensatedHumidity = 15,
    /// Gas resistance as a percentage of the learned range
    GasPercentage = 21,
}

impl VirtualSensor {
    /// Identifier as reported by the engine
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Map an engine identifier back to a known virtual sensor
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(VirtualSensor::Iaq),
            2 => Some(VirtualSensor::StaticIaq),
            3 => Some(VirtualSensor::Co2Equivalent),
            4 => Some(VirtualSensor::BreathVocEquivalent),
            6 => Some(VirtualSensor::RawTemperature),
            7 => Some(VirtualSensor::RawPressure),
            8 => Some(VirtualSensor::RawHumidity),
            9 => Some(VirtualSensor::RawGas),
            12 => Some(VirtualSensor::StabilizationStatus),
            13 => Some(VirtualSensor::RunInStatus),
            14 => Some(VirtualSensor::HeatCompensatedTemperature),
            15 => Some(VirtualSensor::HeatCompensatedHumidity),
            21 => Some(VirtualSensor::GasPercentage),
            _ => None,
        }
    }
}

/// Output rate of a virtual sensor, selecting the engine's power profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SampleRate {
    /// Output not produced
    Disabled,
    /// Ultra low power, one sample every 300 s
    Ulp,
    /// Low power, one sample every 3 s
    #[default]
    Lp,
    /// Continuous, one sample every second
    Continuous,
    /// Parallel-mode heater profile scan, one scan every 18 s
    Scan,
}

impl SampleRate {
    /// Sampling period, or `None` when disabled
    pub const fn period_ns(self) -> Option<i64> {
        match self {
            SampleRate::Disabled => None,
            SampleRate::Ulp => Some(300 * NANOS_PER_SEC),
            SampleRate::Lp => Some(3 * NANOS_PER_SEC),
            SampleRate::Continuous => Some(NANOS_PER_SEC),
            SampleRate::Scan => Some(18 * NANOS_PER_SEC),
        }
    }

    /// Operating mode the sensor runs in at this rate
    pub const fn operating_mode(self) -> OperatingMode {
        match self {
            SampleRate::Disabled => OperatingMode::Sleep,
            SampleRate::Scan => OperatingMode::Parallel,
            _ => OperatingMode::Forced,
        }
    }
}

/// Requested output of one virtual sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Subscription {
    pub sensor: VirtualSensor,
    pub rate: SampleRate,
}

/// Physical sampling configuration prescribed by the engine
///
/// Regenerated every sampling iteration and immediately consumed to
/// reconfigure the sensor driver.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FusionRequest {
    /// Earliest timestamp the engine wants to be scheduled again (ns)
    pub next_call_ns: i64,
    /// Operating mode to put the device in
    pub mode: OperatingMode,
    pub temperature_oversampling: Oversampling,
    pub pressure_oversampling: Oversampling,
    pub humidity_oversampling: Oversampling,
    pub heater: HeaterSettings,
    /// Whether a measurement result should be read this iteration
    pub trigger_measurement: bool,
    /// Inputs the engine wants on its next step
    pub required_inputs: RequiredInputs,
}

impl FusionRequest {
    /// Whether this request asks for a device read
    pub fn wants_read(&self) -> bool {
        self.trigger_measurement && self.mode != OperatingMode::Sleep
    }
}

/// One device measurement, compensated to physical units
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PhysicalSample {
    /// Time the sample was read (ns), stamped by the sampling loop
    pub timestamp_ns: i64,
    /// Temperature (°C)
    pub temperature: f32,
    /// Relative humidity (%)
    pub humidity: f32,
    /// Pressure (Pa)
    pub pressure: f32,
    /// Gas resistance (Ohm)
    pub gas_resistance: f32,
    /// Heater profile step of the gas reading (parallel mode)
    pub gas_index: u8,
    /// Sub-measurement index used to order parallel-mode fields
    pub meas_index: u8,
    /// Gas measurement completed
    pub gas_valid: bool,
    /// Heater reached its target temperature
    pub heater_stable: bool,
}

/// One engine input signal
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FusionInput {
    pub input: PhysicalInput,
    pub signal: f32,
    pub timestamp_ns: i64,
}

/// One fused result
///
/// `sensor_id` is kept raw so identifiers the pipeline does not know can be
/// reported and dropped instead of failing the whole step.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VirtualOutput {
    pub sensor_id: u8,
    pub signal: f32,
    /// Engine confidence (0 = stabilizing .. 3 = calibrated)
    pub accuracy: u8,
    pub timestamp_ns: i64,
}

impl VirtualOutput {
    pub fn new(sensor: VirtualSensor, signal: f32, accuracy: u8, timestamp_ns: i64) -> Self {
        Self {
            sensor_id: sensor.id(),
            signal,
            accuracy,
            timestamp_ns,
        }
    }

    /// Known virtual sensor, if the identifier is recognized
    pub fn sensor(&self) -> Option<VirtualSensor> {
        VirtualSensor::from_id(self.sensor_id)
    }
}

/// Fusion engine version, logged at init
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EngineVersion {
    pub major: u8,
    pub minor: u8,
    pub major_bugfix: u8,
    pub minor_bugfix: u8,
}
