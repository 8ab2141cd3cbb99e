//! Persisted engine state
//!
//! The learned gas baseline survives power cycles as a postcard-encoded
//! record behind a magic number, a format version and a CRC32.

use airsense_core::fusion::{StateBlob, MAX_STATE_BLOB_SIZE};
use airsense_core::traits::FusionError;
use serde::{Deserialize, Serialize};

/// Magic number identifying an engine state blob
pub const STATE_MAGIC: u32 = 0x4149_5153; // "AIQS"

/// Current state format version
pub const STATE_VERSION: u8 = 1;

/// Calibration learned by [`super::BaselineEngine`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EngineState {
    /// Magic number for validation
    pub magic: u32,
    /// Data format version
    pub version: u8,
    /// Clean-air gas resistance (Ohm), 0 before the first gas sample
    pub gas_baseline: f32,
    /// Gas samples folded into the baseline
    pub sample_count: u32,
    /// CRC32 over magic..sample_count
    pub crc: u32,
}

impl Default for EngineState {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineState {
    /// Cold-start state
    pub const fn new() -> Self {
        Self {
            magic: STATE_MAGIC,
            version: STATE_VERSION,
            gas_baseline: 0.0,
            sample_count: 0,
            crc: 0,
        }
    }

    /// Check magic and version
    pub fn is_valid(&self) -> bool {
        self.magic == STATE_MAGIC && self.version == STATE_VERSION
    }

    pub fn calculate_crc(&self) -> u32 {
        let mut crc: u32 = 0xFFFF_FFFF;
        crc = crc32_update(crc, &self.magic.to_le_bytes());
        crc = crc32_update(crc, &[self.version]);
        crc = crc32_update(crc, &self.gas_baseline.to_le_bytes());
        crc = crc32_update(crc, &self.sample_count.to_le_bytes());
        !crc
    }

    pub fn update_crc(&mut self) {
        self.crc = self.calculate_crc();
    }

    pub fn verify_crc(&self) -> bool {
        self.crc == self.calculate_crc()
    }

    /// Serialize with a fresh checksum
    pub fn encode(&self) -> Result<StateBlob, FusionError> {
        let mut state = *self;
        state.update_crc();

        let mut buffer = [0u8; MAX_STATE_BLOB_SIZE];
        let used =
            postcard::to_slice(&state, &mut buffer).map_err(|_| FusionError::StateTooLarge)?;
        StateBlob::from_slice(used).map_err(|_| FusionError::StateTooLarge)
    }

    /// Deserialize and validate a stored blob
    pub fn decode(blob: &[u8]) -> Result<Self, FusionError> {
        let state: Self = postcard::from_bytes(blob).map_err(|_| FusionError::InvalidState)?;
        if !state.is_valid() || !state.verify_crc() {
            return Err(FusionError::InvalidState);
        }
        Ok(state)
    }
}

/// CRC32 update (IEEE 802.3 polynomial)
fn crc32_update(crc: u32, data: &[u8]) -> u32 {
    const POLY: u32 = 0xEDB8_8320;
    let mut crc = crc;

    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ POLY;
            } else {
                crc >>= 1;
            }
        }
    }

    crc
}

#[cfg(test)]
mod tests {
    use super::*;

    fn learned() -> EngineState {
        EngineState {
            gas_baseline: 123_456.0,
            sample_count: 42,
            ..EngineState::new()
        }
    }

    #[test]
    fn test_default_is_valid() {
        let state = EngineState::default();
        assert!(state.is_valid());
        assert_eq!(state.sample_count, 0);
    }

    #[test]
    fn test_crc_consistency() {
        let mut state = learned();
        state.update_crc();
        assert!(state.verify_crc());

        state.sample_count += 1;
        assert!(!state.verify_crc());
    }

    #[test]
    fn test_encode_decode() {
        let blob = learned().encode().unwrap();
        assert!(blob.len() <= MAX_STATE_BLOB_SIZE);

        let decoded = EngineState::decode(&blob).unwrap();
        assert_eq!(decoded.gas_baseline, 123_456.0);
        assert_eq!(decoded.sample_count, 42);
    }

    #[test]
    fn test_decode_rejects_corruption() {
        let mut blob = learned().encode().unwrap();
        let last = blob.len() - 1;
        blob[last] ^= 0x5A;
        assert_eq!(EngineState::decode(&blob), Err(FusionError::InvalidState));
    }

    #[test]
    fn test_decode_rejects_foreign_blobs() {
        assert_eq!(EngineState::decode(&[]), Err(FusionError::InvalidState));
        assert_eq!(
            EngineState::decode(&[0xA5; 16]),
            Err(FusionError::InvalidState)
        );

        let foreign = EngineState {
            version: STATE_VERSION + 1,
            ..learned()
        };
        let blob = foreign.encode().unwrap();
        assert_eq!(EngineState::decode(&blob), Err(FusionError::InvalidState));
    }
}
