//! Embassy async tasks
//!
//! Each task runs independently and shares data through `channels`.

pub mod report;
pub mod sampler;

pub use report::report_task;
pub use sampler::{sampler_task, SensorDevice, StateFlash};
