//! Common time/period helpers for loadtach_core.

/// Number of microseconds in one second.
pub const MICROS_PER_SEC: f64 = 1_000_000.0;
/// Number of microseconds in one millisecond.
pub const MICROS_PER_MILLI: f32 = 1_000.0;
/// Number of seconds in one minute.
pub const SECS_PER_MIN: f64 = 60.0;

/// Convert a capture period in microseconds to milliseconds.
#[inline]
pub fn period_ms(period_us: u32) -> f32 {
    period_us as f32 / MICROS_PER_MILLI
}

/// Revolutions per minute for a pulse period in microseconds.
/// - Returns 0 when the period or `ppr` is zero.
#[inline]
pub fn rpm_from_period_us(period_us: u32, ppr: u32) -> f32 {
    if period_us == 0 || ppr == 0 {
        return 0.0;
    }
    let period_s = f64::from(period_us) / MICROS_PER_SEC;
    (SECS_PER_MIN / (period_s * f64::from(ppr))) as f32
}
