//! Configuration loading
//!
//! The sampler configuration comes from a TOML copy in flash when one is
//! present, otherwise from the airsense.toml embedded at build time.

pub mod loader;

pub use loader::{load_config, ConfigError};
