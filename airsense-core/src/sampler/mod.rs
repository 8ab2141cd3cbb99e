//! Duty-cycled sampling loop
//!
//! Drives the sensor driver and the fusion engine in lock-step. The engine
//! decides when the next measurement is due; the loop only defers to it,
//! applies the requested settings, feeds the samples back and folds the
//! outputs into the [`ReadingCache`].
//!
//! One iteration:
//!
//! ```text
//!   now < next_call? ──yes──► sleep until next_call
//!        │ no
//!        ▼
//!   schedule ─► apply_settings ─► read_fields ─► step (per sample) ─► cache
//!        │ (any failure ends the iteration early)
//!        ▼
//!   save calibration if due ─► sleep one period
//! ```
//!
//! Every fallible stage is non-fatal: failures are logged and the next
//! period starts fresh. Only a failed calibration save can stop the loop,
//! depending on [`PersistPolicy`].

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::signal::Signal;

use crate::cache::ReadingCache;
use crate::config::{PersistPolicy, SamplerConfig};
use crate::fusion::{
    samples_to_inputs, FusionRequest, Subscription, VirtualSensor, MAX_STATE_BLOB_SIZE,
};
use crate::traits::{
    Clock, DriverError, FusionEngine, FusionError, SensorDriver, StateStore, StoreError,
};

/// Virtual sensors backing the cache slots
pub const CACHED_OUTPUTS: [VirtualSensor; 4] = [
    VirtualSensor::Iaq,
    VirtualSensor::HeatCompensatedTemperature,
    VirtualSensor::HeatCompensatedHumidity,
    VirtualSensor::RawPressure,
];

/// Errors during one-time setup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InitError {
    /// Engine failed to initialize or rejected the subscription
    Engine(FusionError),
    /// Sensor did not come up
    Driver(DriverError),
}

impl From<FusionError> for InitError {
    fn from(e: FusionError) -> Self {
        InitError::Engine(e)
    }
}

impl From<DriverError> for InitError {
    fn from(e: DriverError) -> Self {
        InitError::Driver(e)
    }
}

/// Errors that stop the sampling loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SamplerError {
    /// Engine could not export its calibration
    StateExport(FusionError),
    /// Store rejected the calibration blob
    Persistence(StoreError),
}

/// Result of a suspension point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wake {
    Elapsed,
    Cancelled,
}

/// Sampling loop state
///
/// Owns the device, the engine, the state store and the clock; shares only
/// the cache.
pub struct Sampler<'a, S, E, P, C, M>
where
    M: RawMutex,
{
    sensor: S,
    engine: E,
    store: P,
    clock: C,
    cache: &'a ReadingCache<M>,
    config: SamplerConfig,
    /// Last request returned by a successful `schedule`
    scheduled: FusionRequest,
    /// Deadline of the next calibration save
    next_save_ns: i64,
}

impl<'a, S, E, P, C, M> Sampler<'a, S, E, P, C, M>
where
    S: SensorDriver,
    E: FusionEngine,
    P: StateStore,
    C: Clock,
    M: RawMutex,
{
    pub fn new(
        sensor: S,
        engine: E,
        store: P,
        clock: C,
        cache: &'a ReadingCache<M>,
        config: SamplerConfig,
    ) -> Self {
        Self {
            sensor,
            engine,
            store,
            clock,
            cache,
            config,
            scheduled: FusionRequest::default(),
            next_save_ns: 0,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Request from the last successful `schedule` call
    pub fn scheduled(&self) -> &FusionRequest {
        &self.scheduled
    }

    /// One-time setup
    ///
    /// Initializes the engine, restores its calibration if the store has
    /// one, subscribes the cached outputs and brings up the sensor. A
    /// missing or rejected calibration blob is not an error; the engine
    /// starts from its cold-start baseline.
    ///
    /// Calling this more than once re-initializes the engine and device.
    pub async fn init(&mut self) -> Result<(), InitError> {
        self.engine.init()?;
        let version = self.engine.version();
        info!(
            "Fusion engine v{}.{}.{}.{}",
            version.major,
            version.minor,
            version.major_bugfix,
            version.minor_bugfix
        );

        self.restore_state().await;

        let subscriptions = CACHED_OUTPUTS.map(|sensor| Subscription {
            sensor,
            rate: self.config.sample_rate,
        });
        self.engine.subscribe(&subscriptions)?;

        self.sensor.init()?;

        self.scheduled = FusionRequest::default();
        self.next_save_ns = self.clock.now_ns() + self.config.save_interval_ns();
        info!("Sampler initialized");
        Ok(())
    }

    async fn restore_state(&mut self) {
        let key = self.store.key_name();
        let mut buffer = [0u8; MAX_STATE_BLOB_SIZE];
        match self.store.load(&mut buffer).await {
            Ok(len) => match self.engine.set_state(&buffer[..len]) {
                Ok(()) => info!("Restored {} byte calibration from {}", len, key),
                Err(e) => warn!("Calibration in {} rejected: {:?}", key, e),
            },
            Err(StoreError::NotFound) => info!("No calibration under {}, starting fresh", key),
            Err(e) => warn!("Failed to load calibration from {}: {:?}", key, e),
        }
    }

    /// Run until `stop` is signaled
    ///
    /// On cancellation a final save is attempted and its outcome only
    /// logged. Returns an error only when a periodic save fails under
    /// [`PersistPolicy::Halt`].
    pub async fn run<SM: RawMutex>(&mut self, stop: &Signal<SM, ()>) -> Result<(), SamplerError> {
        let period_ns = self.config.period_ns();
        info!("Sampling loop started, period {} ms", period_ns / 1_000_000);

        loop {
            if stop.signaled() {
                break;
            }

            let now = self.clock.now_ns();
            if now < self.scheduled.next_call_ns {
                trace!("Deferring to next call at {}", self.scheduled.next_call_ns);
                if self.sleep_until(self.scheduled.next_call_ns, stop).await == Wake::Cancelled {
                    break;
                }
                continue;
            }

            self.iterate(now);
            self.save_if_due().await?;

            if stop.signaled() {
                break;
            }
            let deadline = self.clock.now_ns() + period_ns;
            if self.sleep_until(deadline, stop).await == Wake::Cancelled {
                break;
            }
        }

        info!("Sampling loop stopping");
        match self.persist().await {
            Ok(len) => info!("Final calibration save, {} bytes", len),
            Err(e) => warn!("Final calibration save failed: {:?}", e),
        }
        Ok(())
    }

    /// One pass through the pipeline at `now`
    ///
    /// Stages run strictly in order and any failure ends the pass.
    fn iterate(&mut self, now: i64) {
        self.scheduled = match self.engine.schedule(now) {
            Ok(request) => request,
            Err(e) => {
                warn!("Fusion schedule failed: {:?}", e);
                return;
            }
        };

        if let Err(e) = self.sensor.apply_settings(&self.scheduled) {
            warn!("Applying sensor settings failed: {:?}", e);
            return;
        }

        if !self.scheduled.wants_read() {
            return;
        }

        let samples = match self.sensor.read_fields() {
            Ok(samples) => samples,
            Err(e) => {
                warn!("Reading sensor fields failed: {:?}", e);
                return;
            }
        };

        for mut sample in samples {
            // Drivers have no clock; samples are stamped with the read time
            sample.timestamp_ns = now;
            let inputs = samples_to_inputs(
                &self.scheduled,
                &sample,
                sample.timestamp_ns,
                self.config.temperature_offset_c,
            );
            if inputs.is_empty() {
                continue;
            }

            match self.engine.step(&inputs, now) {
                Ok(outputs) => {
                    self.cache.update(&outputs);
                }
                Err(e) => warn!("Fusion step failed: {:?}", e),
            }
        }
    }

    async fn save_if_due(&mut self) -> Result<(), SamplerError> {
        let now = self.clock.now_ns();
        if now < self.next_save_ns {
            return Ok(());
        }

        match self.persist().await {
            Ok(len) => {
                debug!("Calibration saved, {} bytes", len);
                self.next_save_ns = now + self.config.save_interval_ns();
                Ok(())
            }
            Err(e) => match self.config.persist_policy {
                PersistPolicy::Halt => {
                    error!("Calibration save failed: {:?}, halting", e);
                    Err(e)
                }
                PersistPolicy::Retry => {
                    error!("Calibration save failed: {:?}, retrying next period", e);
                    Ok(())
                }
                PersistPolicy::Ignore => {
                    error!("Calibration save failed: {:?}, skipping", e);
                    self.next_save_ns = now + self.config.save_interval_ns();
                    Ok(())
                }
            },
        }
    }

    async fn persist(&mut self) -> Result<usize, SamplerError> {
        let blob = self.engine.get_state().map_err(SamplerError::StateExport)?;
        self.store
            .save(&blob)
            .await
            .map_err(SamplerError::Persistence)?;
        Ok(blob.len())
    }

    async fn sleep_until<SM: RawMutex>(&mut self, deadline_ns: i64, stop: &Signal<SM, ()>) -> Wake {
        match select(self.clock.sleep_until(deadline_ns), stop.wait()).await {
            Either::First(()) => Wake::Elapsed,
            Either::Second(()) => Wake::Cancelled,
        }
    }
}
