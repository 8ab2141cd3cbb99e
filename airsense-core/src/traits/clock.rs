//! Monotonic time source

/// Monotonic clock with async sleeping
///
/// Timestamps are nanoseconds since an arbitrary epoch, matching the
/// engine's timestamp unit.
pub trait Clock {
    /// Current monotonic time (ns)
    fn now_ns(&self) -> i64;

    /// Suspend until `deadline_ns` has passed
    fn sleep_until(&mut self, deadline_ns: i64) -> impl core::future::Future<Output = ()>;
}

/// Convert a nanosecond deadline to whole microseconds, rounding up
///
/// Rounding down would wake a microsecond-tick timer before the deadline
/// and leave the caller re-arming a timer that has already expired.
/// Negative deadlines map to zero.
pub fn deadline_micros(deadline_ns: i64) -> u64 {
    (deadline_ns.max(0) as u64).div_ceil(1000)
}
