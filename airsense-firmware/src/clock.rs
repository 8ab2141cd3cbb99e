//! Embassy-time backed clock

use airsense_core::traits::{deadline_micros, Clock};
use embassy_time::{Instant, Timer};

/// [`Clock`] over the embassy time driver
///
/// Timestamps are nanoseconds since boot; the time driver ticks in
/// microseconds, so the lower three digits are always zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_ns(&self) -> i64 {
        Instant::now().as_micros() as i64 * 1000
    }

    async fn sleep_until(&mut self, deadline_ns: i64) {
        Timer::at(Instant::from_micros(deadline_micros(deadline_ns))).await;
    }
}
