//! Fusion engine data model and glue
//!
//! The engine itself is opaque (see [`crate::traits::FusionEngine`]); this
//! module holds the records it exchanges with the pipeline and the
//! conversions between device samples and engine inputs.

pub mod glue;
pub mod types;

pub use glue::samples_to_inputs;
pub use types::*;
