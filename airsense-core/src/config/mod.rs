//! Sampler configuration
//!
//! Types plus a small `no_std` reader for the `airsense.toml` subset.

pub mod parse;
pub mod types;

pub use parse::{parse_config, ParseError};
pub use types::*;
