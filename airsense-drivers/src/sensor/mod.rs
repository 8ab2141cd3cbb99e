//! Sensor drivers

pub mod bme68x;
