//! Gas-baseline reference engine
//!
//! Deterministic engine honoring the same contract as the vendor library:
//!
//! - duty-cycled scheduling driven by the subscribed sample rate
//! - heat-source compensation of temperature, with humidity re-referenced
//!   to the compensated temperature (Magnus formula)
//! - pressure pass-through
//! - an IAQ estimate (0..500) from the ratio of the current gas resistance
//!   to a learned clean-air baseline, with accuracy ramping 0..3 as the
//!   baseline matures
//!
//! The baseline tracks the upper envelope of the gas resistance: it jumps
//! to cleaner readings and decays slowly towards dirtier ones.

use airsense_core::fusion::{
    EngineVersion, FusionInput, FusionRequest, HeaterSettings, HeaterStep, OperatingMode,
    OutputBatch, Oversampling, PhysicalInput, RequiredInputs, SampleRate, StateBlob,
    Subscription, VirtualOutput, VirtualSensor, NANOS_PER_SEC,
};
use airsense_core::traits::{FusionEngine, FusionError};

use super::state::EngineState;

/// Reported engine version
pub const ENGINE_VERSION: EngineVersion = EngineVersion {
    major: 1,
    minor: 0,
    major_bugfix: 0,
    minor_bugfix: 0,
};

/// Forced-mode heater target (°C) and duration (ms)
pub const FORCED_HEATER_TEMP_C: u16 = 320;
pub const FORCED_HEATER_DURATION_MS: u16 = 197;

/// Parallel-mode heater profile: (°C, multiples of the shared duration)
pub const SCAN_PROFILE: [(u16, u16); 10] = [
    (320, 5),
    (100, 2),
    (100, 10),
    (100, 30),
    (200, 5),
    (200, 5),
    (200, 5),
    (320, 5),
    (320, 5),
    (320, 5),
];

/// IAQ reported at the clean-air baseline
const IAQ_CLEAN: f32 = 25.0;
const IAQ_MAX: f32 = 500.0;

/// Per-sample decay of the baseline towards lower resistance
const BASELINE_DECAY: f32 = 0.001;

/// Gas samples per accuracy step
const ACCURACY_STEP_SAMPLES: u32 = 20;

/// Samples before the gas readings count as stable
const STABILIZATION_SAMPLES: u32 = 5;

/// Poll interval while nothing is subscribed
const IDLE_PERIOD_NS: i64 = NANOS_PER_SEC;

/// Slots indexed by virtual sensor id
const SENSOR_SLOTS: usize = 32;

/// Deterministic stand-in for the proprietary fusion engine
pub struct BaselineEngine {
    initialized: bool,
    rates: [SampleRate; SENSOR_SLOTS],
    next_call_ns: i64,
    last_input_ns: Option<i64>,
    state: EngineState,
}

impl Default for BaselineEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl BaselineEngine {
    pub const fn new() -> Self {
        Self {
            initialized: false,
            rates: [SampleRate::Disabled; SENSOR_SLOTS],
            next_call_ns: 0,
            last_input_ns: None,
            state: EngineState::new(),
        }
    }

    /// Learned calibration
    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// Rate shared by all subscribed outputs
    pub fn rate(&self) -> SampleRate {
        effective_rate(&self.rates)
    }

    fn subscribed(&self, sensor: VirtualSensor) -> bool {
        self.rates[sensor.id() as usize] != SampleRate::Disabled
    }

    fn ensure_initialized(&self) -> Result<(), FusionError> {
        if self.initialized {
            Ok(())
        } else {
            Err(FusionError::NotInitialized)
        }
    }

    fn learn(&mut self, gas: f32) {
        let state = &mut self.state;
        if state.sample_count == 0 || gas > state.gas_baseline {
            state.gas_baseline = gas;
        } else {
            state.gas_baseline += (gas - state.gas_baseline) * BASELINE_DECAY;
        }
        state.sample_count = state.sample_count.saturating_add(1);
    }

    fn accuracy(&self) -> u8 {
        (self.state.sample_count / ACCURACY_STEP_SAMPLES).min(3) as u8
    }

    fn iaq(&self, gas: f32) -> f32 {
        let ratio = (gas / self.state.gas_baseline).clamp(0.0, 1.0);
        IAQ_CLEAN + (1.0 - ratio) * (IAQ_MAX - IAQ_CLEAN)
    }

    fn emit(
        &self,
        outputs: &mut OutputBatch,
        sensor: VirtualSensor,
        signal: f32,
        accuracy: u8,
        timestamp_ns: i64,
    ) {
        if self.subscribed(sensor) {
            // Capacity covers every virtual sensor
            let _ = outputs.push(VirtualOutput::new(sensor, signal, accuracy, timestamp_ns));
        }
    }
}

fn effective_rate(rates: &[SampleRate]) -> SampleRate {
    rates
        .iter()
        .copied()
        .find(|rate| *rate != SampleRate::Disabled)
        .unwrap_or(SampleRate::Disabled)
}

/// Saturation vapor pressure over water (hPa)
fn saturation_vapor_pressure(temperature_c: f32) -> f32 {
    6.112 * libm::expf(17.62 * temperature_c / (243.12 + temperature_c))
}

/// Relative humidity measured at `measured_c`, expressed at `target_c`
fn rereference_humidity(humidity: f32, measured_c: f32, target_c: f32) -> f32 {
    let rh = humidity * saturation_vapor_pressure(measured_c)
        / saturation_vapor_pressure(target_c);
    rh.clamp(0.0, 100.0)
}

impl FusionEngine for BaselineEngine {
    /// Reset to a cold start; subscriptions and calibration are cleared
    fn init(&mut self) -> Result<(), FusionError> {
        *self = Self::new();
        self.initialized = true;
        Ok(())
    }

    fn version(&self) -> EngineVersion {
        ENGINE_VERSION
    }

    /// All enabled outputs must share one rate
    fn subscribe(&mut self, subscriptions: &[Subscription]) -> Result<(), FusionError> {
        self.ensure_initialized()?;

        let mut rates = self.rates;
        for subscription in subscriptions {
            rates[subscription.sensor.id() as usize] = subscription.rate;
        }

        let rate = effective_rate(&rates);
        if rates
            .iter()
            .any(|r| *r != SampleRate::Disabled && *r != rate)
        {
            return Err(FusionError::InvalidSubscription);
        }

        self.rates = rates;
        Ok(())
    }

    fn schedule(&mut self, now_ns: i64) -> Result<FusionRequest, FusionError> {
        self.ensure_initialized()?;
        if now_ns < self.next_call_ns {
            return Err(FusionError::CallTimingViolation);
        }

        let rate = self.rate();
        let Some(period_ns) = rate.period_ns() else {
            self.next_call_ns = now_ns + IDLE_PERIOD_NS;
            return Ok(FusionRequest {
                next_call_ns: self.next_call_ns,
                ..Default::default()
            });
        };
        self.next_call_ns = now_ns + period_ns;

        let mode = rate.operating_mode();
        let mut required = RequiredInputs::of(&[
            PhysicalInput::HeatSource,
            PhysicalInput::Temperature,
            PhysicalInput::Humidity,
            PhysicalInput::Pressure,
            PhysicalInput::GasResistor,
        ]);

        let mut heater = HeaterSettings {
            enabled: true,
            ..Default::default()
        };
        if mode == OperatingMode::Parallel {
            for (temperature_c, duration_multiplier) in SCAN_PROFILE {
                // Profile fits MAX_HEATER_PROFILE_LEN
                let _ = heater.profile.push(HeaterStep {
                    temperature_c,
                    duration_multiplier,
                });
            }
            required = required.with(PhysicalInput::ProfilePart);
        } else {
            heater.temperature_c = FORCED_HEATER_TEMP_C;
            heater.duration_ms = FORCED_HEATER_DURATION_MS;
        }

        Ok(FusionRequest {
            next_call_ns: self.next_call_ns,
            mode,
            temperature_oversampling: Oversampling::X2,
            pressure_oversampling: Oversampling::X16,
            humidity_oversampling: Oversampling::X1,
            heater,
            trigger_measurement: true,
            required_inputs: required,
        })
    }

    fn step(&mut self, inputs: &[FusionInput], _now_ns: i64) -> Result<OutputBatch, FusionError> {
        self.ensure_initialized()?;
        if inputs.is_empty() {
            return Err(FusionError::NoInputs);
        }

        let last = self.last_input_ns.unwrap_or(i64::MIN);
        if inputs.iter().any(|i| i.timestamp_ns < last) {
            return Err(FusionError::TimestampNotMonotonic);
        }
        let timestamp = inputs.iter().map(|i| i.timestamp_ns).max().unwrap_or(last);
        self.last_input_ns = Some(timestamp);

        let signal = |wanted: PhysicalInput| {
            inputs
                .iter()
                .find(|i| i.input == wanted)
                .map(|i| i.signal)
        };
        let heat_source = signal(PhysicalInput::HeatSource).unwrap_or(0.0);

        let mut outputs = OutputBatch::new();

        if let Some(raw_temperature) = signal(PhysicalInput::Temperature) {
            let temperature = raw_temperature - heat_source;
            self.emit(&mut outputs, VirtualSensor::RawTemperature, raw_temperature, 3, timestamp);
            self.emit(
                &mut outputs,
                VirtualSensor::HeatCompensatedTemperature,
                temperature,
                3,
                timestamp,
            );

            if let Some(humidity) = signal(PhysicalInput::Humidity) {
                let compensated = rereference_humidity(humidity, raw_temperature, temperature);
                self.emit(&mut outputs, VirtualSensor::RawHumidity, humidity, 3, timestamp);
                self.emit(
                    &mut outputs,
                    VirtualSensor::HeatCompensatedHumidity,
                    compensated,
                    3,
                    timestamp,
                );
            }
        }

        if let Some(pressure) = signal(PhysicalInput::Pressure) {
            self.emit(&mut outputs, VirtualSensor::RawPressure, pressure, 3, timestamp);
        }

        // Invalid gas conversions come through as zero resistance
        if let Some(gas) = signal(PhysicalInput::GasResistor).filter(|g| *g > 0.0) {
            self.learn(gas);
            let accuracy = self.accuracy();
            let iaq = self.iaq(gas);
            let stable = self.state.sample_count >= STABILIZATION_SAMPLES;
            let percentage = (gas / self.state.gas_baseline * 100.0).clamp(0.0, 100.0);

            self.emit(&mut outputs, VirtualSensor::Iaq, iaq, accuracy, timestamp);
            self.emit(&mut outputs, VirtualSensor::StaticIaq, iaq, accuracy, timestamp);
            self.emit(
                &mut outputs,
                VirtualSensor::Co2Equivalent,
                400.0 + iaq * 5.0,
                accuracy,
                timestamp,
            );
            self.emit(
                &mut outputs,
                VirtualSensor::BreathVocEquivalent,
                0.5 + iaq / 50.0,
                accuracy,
                timestamp,
            );
            self.emit(&mut outputs, VirtualSensor::RawGas, gas, 3, timestamp);
            self.emit(&mut outputs, VirtualSensor::GasPercentage, percentage, accuracy, timestamp);
            self.emit(
                &mut outputs,
                VirtualSensor::StabilizationStatus,
                stable as u8 as f32,
                3,
                timestamp,
            );
            self.emit(
                &mut outputs,
                VirtualSensor::RunInStatus,
                (accuracy > 0) as u8 as f32,
                3,
                timestamp,
            );
        }

        Ok(outputs)
    }

    fn get_state(&mut self) -> Result<StateBlob, FusionError> {
        self.ensure_initialized()?;
        self.state.encode()
    }

    fn set_state(&mut self, blob: &[u8]) -> Result<(), FusionError> {
        self.ensure_initialized()?;
        self.state = EngineState::decode(blob)?;
        Ok(())
    }
}
