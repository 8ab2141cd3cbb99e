//! RP2040-specific HAL for the Airsense firmware
//!
//! This crate provides RP2040-specific implementations of the shared
//! `airsense-hal` traits:
//!
//! - Blocking I2C master for the gas sensor (implements `airsense_hal::I2cBus`)
//! - Flash storage driver (implements `airsense_hal::FlashStorage`)

#![no_std]

pub mod flash;
pub mod i2c;

// Re-export shared traits from airsense-hal for convenience
pub use airsense_hal::{FlashStorage as FlashStorageTrait, I2cBus as I2cBusTrait, StorageKey};
