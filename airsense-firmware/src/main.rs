//! Airsense - Environmental Sensor Firmware
//!
//! Main firmware binary for RP2040 boards with a BME680/BME688 gas sensor.
//! A sampling task drives the sensor as the fusion engine prescribes and
//! keeps the latest fused readings in a shared cache; the engine's learned
//! calibration is saved to flash periodically and restored at boot.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::i2c::I2c;
use embassy_rp::peripherals::I2C0;
use embassy_time::{Delay, Timer};
use {defmt_rtt as _, panic_probe as _};

use airsense_drivers::{Bme68x, FlashStateStore, I2cRegisterBus};
use airsense_hal::i2c::I2cConfig;
use airsense_hal_rp2040::flash::Rp2040FlashStorage;
use airsense_hal_rp2040::i2c::Rp2040I2c;

mod channels;
mod clock;
mod config;
mod tasks;

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Airsense firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    // Configuration is read before the flash moves into the state store
    let mut flash = Rp2040FlashStorage::new(p.FLASH, p.DMA_CH0);
    let config = config::load_config(&mut flash).await;
    info!(
        "Sample rate {:?}, save every {} periods, policy {:?}",
        config.sample_rate, config.save_interval_periods, config.persist_policy
    );

    // Pin assignment is board-specific (Pico: I2C0 SDA=GPIO4, SCL=GPIO5)
    let i2c = I2c::new_blocking(
        p.I2C0,
        p.PIN_5,
        p.PIN_4,
        Rp2040I2c::<I2C0>::embassy_config(I2cConfig::FAST),
    );
    let bus = I2cRegisterBus::new(Rp2040I2c::new(i2c), Delay, config.sensor_address);
    info!("I2C initialized, sensor at {=u8:#x}", bus.address());

    let sensor = Bme68x::new(bus, config.ambient_temp_c);
    let store = FlashStateStore::new(flash);

    spawner
        .spawn(tasks::sampler_task(sensor, store, config))
        .unwrap();
    spawner.spawn(tasks::report_task()).unwrap();

    info!("All tasks spawned, firmware running");

    loop {
        Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}
