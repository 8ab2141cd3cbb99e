//! Board-agnostic core logic for the air quality firmware
//!
//! This crate contains the sensor fusion pipeline independent of any
//! particular board, sensor bus or fusion library:
//!
//! - Data model shared between the sensor driver and the fusion engine
//! - Collaborator traits (sensor driver, fusion engine, state store, clock)
//! - Fusion glue converting samples into engine inputs
//! - Latest-reading cache shared with arbitrary readers
//! - The duty-cycled sampling loop
//! - Configuration types and parser

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

// This must go first so the logging macros are visible to later modules
#[macro_use]
mod fmt;

pub mod cache;
pub mod config;
pub mod fusion;
pub mod sampler;
pub mod traits;

pub use cache::{ReadingCache, Readings};
pub use sampler::{Sampler, SamplerError};
