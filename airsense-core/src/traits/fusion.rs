//! Fusion engine trait
//!
//! Models the closed-source fusion/calibration library as a black box.
//! A binding to the vendor library implements this trait on target; tests
//! and boards without the library use a deterministic stand-in.

use crate::fusion::{
    EngineVersion, FusionInput, FusionRequest, OutputBatch, StateBlob, Subscription,
};

/// Errors reported by the fusion engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FusionError {
    /// Engine not initialized
    NotInitialized,
    /// `schedule` called before the previously returned `next_call`
    CallTimingViolation,
    /// Input timestamps went backwards
    TimestampNotMonotonic,
    /// `step` called without inputs
    NoInputs,
    /// Subscription names an unsupported sensor or rate
    InvalidSubscription,
    /// State blob rejected (wrong format, version or checksum)
    InvalidState,
    /// State does not fit the blob buffer
    StateTooLarge,
    /// Vendor-specific failure code
    Engine(i32),
}

/// Opaque sensor fusion engine
pub trait FusionEngine {
    /// Initialize the engine's internal state
    fn init(&mut self) -> Result<(), FusionError>;

    /// Engine version, for logging
    fn version(&self) -> EngineVersion;

    /// Select which virtual sensors are produced and at what rate
    fn subscribe(&mut self, subscriptions: &[Subscription]) -> Result<(), FusionError>;

    /// Physical sampling configuration required at `now_ns`
    fn schedule(&mut self, now_ns: i64) -> Result<FusionRequest, FusionError>;

    /// Fuse one set of inputs into virtual outputs
    fn step(&mut self, inputs: &[FusionInput], now_ns: i64) -> Result<OutputBatch, FusionError>;

    /// Serialize the learned calibration
    fn get_state(&mut self) -> Result<StateBlob, FusionError>;

    /// Restore a previously serialized calibration
    fn set_state(&mut self, blob: &[u8]) -> Result<(), FusionError>;
}
