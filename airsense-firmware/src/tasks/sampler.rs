//! Sampling task
//!
//! Owns the sensor, the fusion engine and the flash-backed calibration
//! store, and runs the duty-cycled sampling loop until stopped.

use defmt::*;
use embassy_rp::peripherals::I2C0;
use embassy_time::Delay;

use airsense_core::config::SamplerConfig;
use airsense_core::Sampler;
use airsense_drivers::{BaselineEngine, Bme68x, FlashStateStore, I2cRegisterBus};
use airsense_hal_rp2040::flash::Rp2040FlashStorage;
use airsense_hal_rp2040::i2c::Rp2040I2c;

use crate::channels::{READINGS, SAMPLER_STOP};
use crate::clock::EmbassyClock;

/// Gas sensor on I2C0
pub type SensorDevice = Bme68x<I2cRegisterBus<Rp2040I2c<'static, I2C0>, Delay>>;

/// Calibration store in the flash state partition
pub type StateFlash = FlashStateStore<Rp2040FlashStorage<'static>>;

#[embassy_executor::task]
pub async fn sampler_task(sensor: SensorDevice, store: StateFlash, config: SamplerConfig) {
    info!("Sampler task started");

    let mut sampler = Sampler::new(
        sensor,
        BaselineEngine::new(),
        store,
        EmbassyClock,
        &READINGS,
        config,
    );

    if let Err(e) = sampler.init().await {
        error!("Sampler init failed: {:?}", e);
        return;
    }

    match sampler.run(&SAMPLER_STOP).await {
        Ok(()) => info!("Sampler task stopped"),
        // Losing calibration silently is worse than a reboot
        Err(e) => panic!("Calibration persistence failed: {:?}", e),
    }
}
