//! Recording mocks for the sampling loop tests
//!
//! All mocks share one virtual clock and one call log so a test can assert
//! on the exact order and time of every collaborator call.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use airsense_core::fusion::{
    EngineVersion, FusionInput, FusionRequest, HeaterSettings, OperatingMode, OutputBatch,
    Oversampling, PhysicalInput, PhysicalSample, RequiredInputs, SampleBatch, StateBlob,
    Subscription, VirtualOutput, VirtualSensor, NANOS_PER_SEC,
};
use airsense_core::traits::{
    Clock, DriverError, FusionEngine, FusionError, SensorDriver, StateStore, StoreError,
};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

pub const SEC: i64 = NANOS_PER_SEC;

pub type StopSignal = Signal<CriticalSectionRawMutex, ()>;

/// Collaborator call with the virtual time it happened at
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Schedule(i64),
    Apply(i64),
    Read(i64),
    Step(i64, usize),
    Save(i64),
    Sleep(i64),
}

#[derive(Clone, Default)]
pub struct Harness {
    pub time: Rc<Cell<i64>>,
    pub log: Rc<RefCell<Vec<Call>>>,
    /// Blob handed to `set_state`
    pub restored: Rc<RefCell<Option<Vec<u8>>>>,
    pub subscriptions: Rc<RefCell<Vec<Subscription>>>,
    /// Inputs of every `step` call
    pub inputs: Rc<RefCell<Vec<Vec<FusionInput>>>>,
}

impl Harness {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, call: impl FnOnce(i64) -> Call) {
        self.log.borrow_mut().push(call(self.time.get()));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.log.borrow().clone()
    }

    /// Times of all calls matching `pick`
    pub fn times(&self, pick: fn(&Call) -> Option<i64>) -> Vec<i64> {
        self.log.borrow().iter().filter_map(pick).collect()
    }

    pub fn apply_times(&self) -> Vec<i64> {
        self.times(|c| match c {
            Call::Apply(t) => Some(*t),
            _ => None,
        })
    }

    pub fn read_times(&self) -> Vec<i64> {
        self.times(|c| match c {
            Call::Read(t) => Some(*t),
            _ => None,
        })
    }

    pub fn save_times(&self) -> Vec<i64> {
        self.times(|c| match c {
            Call::Save(t) => Some(*t),
            _ => None,
        })
    }
}

/// Forced-mode request asking for every input
pub fn forced_request(next_call_ns: i64) -> FusionRequest {
    FusionRequest {
        next_call_ns,
        mode: OperatingMode::Forced,
        temperature_oversampling: Oversampling::X2,
        pressure_oversampling: Oversampling::X16,
        humidity_oversampling: Oversampling::X1,
        heater: HeaterSettings {
            enabled: true,
            temperature_c: 320,
            duration_ms: 197,
            profile: heapless::Vec::new(),
        },
        trigger_measurement: true,
        required_inputs: RequiredInputs::of(&[
            PhysicalInput::HeatSource,
            PhysicalInput::Temperature,
            PhysicalInput::Humidity,
            PhysicalInput::Pressure,
            PhysicalInput::GasResistor,
        ]),
    }
}

pub fn sample(temperature: f32) -> PhysicalSample {
    PhysicalSample {
        temperature,
        humidity: 40.0,
        pressure: 101_325.0,
        gas_resistance: 50_000.0,
        gas_valid: true,
        heater_stable: true,
        ..Default::default()
    }
}

/// Virtual clock; cancels the loop once `stop_at_ns` is reached
pub struct MockClock<'a> {
    harness: Harness,
    stop: &'a StopSignal,
    stop_at_ns: i64,
}

impl<'a> MockClock<'a> {
    pub fn new(harness: &Harness, stop: &'a StopSignal, stop_at_ns: i64) -> Self {
        Self {
            harness: harness.clone(),
            stop,
            stop_at_ns,
        }
    }
}

impl Clock for MockClock<'_> {
    fn now_ns(&self) -> i64 {
        self.harness.time.get()
    }

    async fn sleep_until(&mut self, deadline_ns: i64) {
        self.harness.log.borrow_mut().push(Call::Sleep(deadline_ns));
        if deadline_ns < self.stop_at_ns {
            self.harness.time.set(deadline_ns.max(self.harness.time.get()));
            return;
        }

        // Cancel in the middle of the sleep; only the stop signal can wake us
        self.harness.time.set(self.stop_at_ns);
        self.stop.signal(());
        core::future::pending::<()>().await
    }
}

/// Sensor driver replaying scripted results, `Ok` once a script runs dry
#[derive(Default)]
pub struct MockDriver {
    harness: Harness,
    pub init_result: Option<DriverError>,
    pub apply_script: VecDeque<Result<(), DriverError>>,
    pub read_script: VecDeque<Result<SampleBatch, DriverError>>,
    pub last_request: Option<FusionRequest>,
}

impl MockDriver {
    pub fn new(harness: &Harness) -> Self {
        Self {
            harness: harness.clone(),
            ..Default::default()
        }
    }
}

impl SensorDriver for MockDriver {
    fn init(&mut self) -> Result<(), DriverError> {
        match self.init_result {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn apply_settings(&mut self, request: &FusionRequest) -> Result<(), DriverError> {
        self.harness.record(Call::Apply);
        self.last_request = Some(request.clone());
        self.apply_script.pop_front().unwrap_or(Ok(()))
    }

    fn read_fields(&mut self) -> Result<SampleBatch, DriverError> {
        self.harness.record(Call::Read);
        self.read_script.pop_front().unwrap_or_else(|| {
            let mut batch = SampleBatch::new();
            batch.push(sample(21.0)).unwrap();
            Ok(batch)
        })
    }
}

type ScheduleFn = Box<dyn FnMut(i64) -> Result<FusionRequest, FusionError>>;

/// Fusion engine with a scripted schedule and scripted step results
pub struct ScriptedEngine {
    harness: Harness,
    schedule_fn: ScheduleFn,
    pub step_script: VecDeque<Result<OutputBatch, FusionError>>,
    pub state: Vec<u8>,
    pub reject_state: bool,
}

impl ScriptedEngine {
    /// Engine that always asks for the next call `interval_ns` from now
    pub fn every(harness: &Harness, interval_ns: i64) -> Self {
        Self::with_schedule(harness, move |now| Ok(forced_request(now + interval_ns)))
    }

    pub fn with_schedule(
        harness: &Harness,
        schedule: impl FnMut(i64) -> Result<FusionRequest, FusionError> + 'static,
    ) -> Self {
        Self {
            harness: harness.clone(),
            schedule_fn: Box::new(schedule),
            step_script: VecDeque::new(),
            state: vec![0xA5; 16],
            reject_state: false,
        }
    }
}

impl FusionEngine for ScriptedEngine {
    fn init(&mut self) -> Result<(), FusionError> {
        Ok(())
    }

    fn version(&self) -> EngineVersion {
        EngineVersion {
            major: 1,
            minor: 0,
            major_bugfix: 0,
            minor_bugfix: 0,
        }
    }

    fn subscribe(&mut self, subscriptions: &[Subscription]) -> Result<(), FusionError> {
        *self.harness.subscriptions.borrow_mut() = subscriptions.to_vec();
        Ok(())
    }

    fn schedule(&mut self, now_ns: i64) -> Result<FusionRequest, FusionError> {
        self.harness.record(Call::Schedule);
        (self.schedule_fn)(now_ns)
    }

    fn step(&mut self, inputs: &[FusionInput], now_ns: i64) -> Result<OutputBatch, FusionError> {
        self.harness
            .log
            .borrow_mut()
            .push(Call::Step(now_ns, inputs.len()));
        self.harness.inputs.borrow_mut().push(inputs.to_vec());
        self.step_script.pop_front().unwrap_or_else(|| {
            let temperature = inputs
                .iter()
                .find(|i| i.input == PhysicalInput::Temperature)
                .map_or(0.0, |i| i.signal);
            let mut outputs = OutputBatch::new();
            outputs
                .push(VirtualOutput::new(
                    VirtualSensor::HeatCompensatedTemperature,
                    temperature,
                    3,
                    now_ns,
                ))
                .unwrap();
            Ok(outputs)
        })
    }

    fn get_state(&mut self) -> Result<StateBlob, FusionError> {
        StateBlob::from_slice(&self.state).map_err(|_| FusionError::StateTooLarge)
    }

    fn set_state(&mut self, blob: &[u8]) -> Result<(), FusionError> {
        if self.reject_state {
            return Err(FusionError::InvalidState);
        }
        *self.harness.restored.borrow_mut() = Some(blob.to_vec());
        Ok(())
    }
}

/// Blob store backed by an in-memory slot
#[derive(Default)]
pub struct MockStore {
    harness: Harness,
    pub stored: Option<Vec<u8>>,
    pub save_script: VecDeque<Result<(), StoreError>>,
}

impl MockStore {
    pub fn new(harness: &Harness) -> Self {
        Self {
            harness: harness.clone(),
            ..Default::default()
        }
    }
}

impl StateStore for MockStore {
    fn key_name(&self) -> &'static str {
        "test/state"
    }

    async fn load(&mut self, buffer: &mut [u8]) -> Result<usize, StoreError> {
        let data = self.stored.as_ref().ok_or(StoreError::NotFound)?;
        if data.len() > buffer.len() {
            return Err(StoreError::TooLarge);
        }
        buffer[..data.len()].copy_from_slice(data);
        Ok(data.len())
    }

    async fn save(&mut self, data: &[u8]) -> Result<(), StoreError> {
        self.harness.record(Call::Save);
        let result = self.save_script.pop_front().unwrap_or(Ok(()));
        if result.is_ok() {
            self.stored = Some(data.to_vec());
        }
        result
    }
}
