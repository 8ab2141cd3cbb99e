//! Periodic reading report
//!
//! A consumer of the reading cache: logs the latest fused values and how
//! old they are.

use defmt::*;
use embassy_time::{Duration, Instant, Ticker};

use airsense_core::fusion::NANOS_PER_SEC;

use crate::channels::READINGS;

/// Report interval in seconds
pub const REPORT_INTERVAL_SECS: u64 = 30;

#[embassy_executor::task]
pub async fn report_task() {
    info!("Report task started");

    let mut ticker = Ticker::every(Duration::from_secs(REPORT_INTERVAL_SECS));

    loop {
        ticker.next().await;

        let readings = READINGS.snapshot();
        let Some(updated_at_ns) = readings.updated_at_ns else {
            info!("No readings yet");
            continue;
        };

        let now_ns = Instant::now().as_micros() as i64 * 1000;
        info!(
            "T={} C, RH={} %, P={} Pa, IAQ={} (accuracy {}), {} s old",
            readings.temperature,
            readings.humidity,
            readings.pressure,
            readings.air_quality,
            readings.air_quality_accuracy,
            (now_ns - updated_at_ns) / NANOS_PER_SEC
        );
    }
}
