//! Reference fusion engine
//!
//! Boards without the vendor library run this engine instead. It keeps the
//! timing and state-blob contract of [`airsense_core::traits::FusionEngine`]
//! but fuses with simple, documented formulas.

pub mod baseline;
pub mod state;

pub use baseline::BaselineEngine;
pub use state::EngineState;
