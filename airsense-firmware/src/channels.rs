//! Shared state between tasks
//!
//! The reading cache is written by the sampler task only; any task may
//! read it.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

use airsense_core::ReadingCache;

/// Latest fused readings
pub static READINGS: ReadingCache<CriticalSectionRawMutex> = ReadingCache::new();

/// Asks the sampler task to stop after a final calibration save
///
/// Nothing signals this yet; it is the hook for a future shutdown path
/// (brown-out detection or a host command) and the board otherwise samples
/// until power is lost.
pub static SAMPLER_STOP: Signal<CriticalSectionRawMutex, ()> = Signal::new();
