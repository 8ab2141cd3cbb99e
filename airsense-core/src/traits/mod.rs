//! Collaborator traits
//!
//! These traits define the interface between the sampling loop and the
//! pieces it drives: the physical sensor, the fusion engine, the blob
//! store holding the engine's calibration and the time source.

pub mod clock;
pub mod fusion;
pub mod sensor;
pub mod store;

pub use clock::{deadline_micros, Clock};
pub use fusion::{FusionEngine, FusionError};
pub use sensor::{DriverError, SensorDriver};
pub use store::{StateStore, StoreError};
