//! Hardware driver implementations
//!
//! Concrete implementations of the collaborator traits defined in
//! airsense-core:
//!
//! - Register bus transport over the HAL I2C trait
//! - BME680/BME688 gas sensor driver
//! - Deterministic reference fusion engine
//! - Flash-backed calibration state store

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod bus;
pub mod fusion;
pub mod sensor;
pub mod store;

pub use bus::{I2cRegisterBus, RegisterBus};
pub use fusion::BaselineEngine;
pub use sensor::bme68x::Bme68x;
pub use store::FlashStateStore;
