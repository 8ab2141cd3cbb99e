//! Configuration loader
//!
//! Reads an override from flash and falls back to the embedded defaults.

use core::str;
use defmt::*;

use airsense_core::config::{parse_config, ParseError, SamplerConfig};
use airsense_hal::{FlashError, FlashStorage, StorageKey};

/// Embedded default configuration (compiled into firmware)
/// Edit airsense.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../../airsense.toml");

/// Maximum TOML config size stored in flash
const MAX_TOML_SIZE: usize = 1024;

/// Configuration loading errors
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Flash operation failed
    Flash(FlashError),
    /// Invalid UTF-8 in TOML data
    InvalidUtf8,
    /// TOML parsing or validation failed
    Parse(ParseError),
}

impl From<FlashError> for ConfigError {
    fn from(e: FlashError) -> Self {
        ConfigError::Flash(e)
    }
}

impl From<ParseError> for ConfigError {
    fn from(e: ParseError) -> Self {
        ConfigError::Parse(e)
    }
}

/// Load the sampler configuration
///
/// Never fails: a broken flash copy falls back to the embedded file, and a
/// broken embedded file (rejected at build time already) to the defaults.
pub async fn load_config<F: FlashStorage>(flash: &mut F) -> SamplerConfig {
    match load_from_flash(flash).await {
        Ok(config) => {
            info!("Loaded configuration from {}", StorageKey::SensorConfig.name());
            return config;
        }
        Err(ConfigError::Flash(FlashError::NotFound)) => {
            debug!("No configuration under {}", StorageKey::SensorConfig.name());
        }
        Err(e) => {
            warn!("Ignoring configuration in flash: {:?}", e);
        }
    }

    match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => {
            info!("Using embedded configuration");
            config
        }
        Err(e) => {
            error!("Failed to parse embedded config: {:?}, using defaults", e);
            SamplerConfig::default()
        }
    }
}

async fn load_from_flash<F: FlashStorage>(flash: &mut F) -> Result<SamplerConfig, ConfigError> {
    let mut buffer = [0u8; MAX_TOML_SIZE];
    let len = flash.read(StorageKey::SensorConfig, &mut buffer).await?;
    debug!("Read {} bytes of TOML from flash", len);

    let text = str::from_utf8(&buffer[..len]).map_err(|_| ConfigError::InvalidUtf8)?;
    Ok(parse_config(text)?)
}
