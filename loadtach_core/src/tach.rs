//! Pulse-timing capture for the tachometer input.
//!
//! The edge handler is a pure transition on [`PulseState`]; [`TachCapture`]
//! applies it to the shared cell in one critical section and hands the
//! command side a consistent [`TachSnapshot`].

use crate::shared::Shared;
use crate::util;

/// Fields written by the edge handler.
///
/// `last_period == 0` means no valid period has been observed yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PulseState {
    /// Edges seen since boot; wraps.
    pub pulses_total: u32,
    /// Capture timestamp (µs) of the most recent edge.
    pub last_edge_time: u32,
    /// Ticks between the two most recent accepted edges.
    pub last_period: u32,
}

impl PulseState {
    pub const fn new() -> Self {
        Self {
            pulses_total: 0,
            last_edge_time: 0,
            last_period: 0,
        }
    }

    /// State after an edge at `timestamp`.
    ///
    /// A previous timestamp of 0 is treated as "no previous edge". Intervals
    /// at or below `glitch_reject` leave `last_period` untouched.
    #[must_use]
    pub const fn on_edge(self, timestamp: u32, glitch_reject: u32) -> Self {
        let prev = self.last_edge_time;
        let mut last_period = self.last_period;
        if prev != 0 {
            let dt = timestamp.wrapping_sub(prev);
            if dt > glitch_reject {
                last_period = dt;
            }
        }
        Self {
            pulses_total: self.pulses_total.wrapping_add(1),
            last_edge_time: timestamp,
            last_period,
        }
    }

    pub const fn snapshot(&self) -> TachSnapshot {
        TachSnapshot {
            pulses_total: self.pulses_total,
            last_period: self.last_period,
        }
    }
}

/// Pulse count and period observed together.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TachSnapshot {
    pub pulses_total: u32,
    /// µs; 0 when no period has been observed.
    pub last_period: u32,
}

impl TachSnapshot {
    pub fn rpm(&self, ppr: u32) -> f32 {
        compute_rpm(*self, ppr)
    }

    pub fn period_ms(&self) -> f32 {
        util::period_ms(self.last_period)
    }
}

/// `60 / (period_s * ppr)`, or 0 when either the period or `ppr` is zero.
///
/// A stopped shaft keeps reporting the last observed rate.
pub fn compute_rpm(snapshot: TachSnapshot, ppr: u32) -> f32 {
    util::rpm_from_period_us(snapshot.last_period, ppr)
}

/// Shared pulse state plus the glitch threshold it is updated with.
#[derive(Debug)]
pub struct TachCapture {
    state: Shared<PulseState>,
    glitch_reject_us: u32,
}

impl TachCapture {
    pub const fn new(glitch_reject_us: u32) -> Self {
        Self {
            state: Shared::new(PulseState::new()),
            glitch_reject_us,
        }
    }

    /// Edge handler body. Bounded and non-blocking; safe from interrupt context.
    #[inline]
    pub fn on_edge(&self, timestamp: u32) {
        let threshold = self.glitch_reject_us;
        self.state.update(|s| s.on_edge(timestamp, threshold));
    }

    pub fn snapshot(&self) -> TachSnapshot {
        self.state.get().snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_edge_only_counts() {
        let s = PulseState::new().on_edge(5_000, 100);
        assert_eq!(s.pulses_total, 1);
        assert_eq!(s.last_edge_time, 5_000);
        assert_eq!(s.last_period, 0);
    }

    #[test]
    fn short_interval_keeps_previous_period() {
        let s = PulseState::new()
            .on_edge(1_000, 100)
            .on_edge(11_000, 100)
            .on_edge(11_050, 100);
        assert_eq!(s.last_period, 10_000);
        assert_eq!(s.pulses_total, 3);
        assert_eq!(s.last_edge_time, 11_050);
    }

    #[test]
    fn interval_equal_to_threshold_is_rejected() {
        let s = PulseState::new().on_edge(1_000, 100).on_edge(1_100, 100);
        assert_eq!(s.last_period, 0);
    }

    #[test]
    fn wraparound_is_measured_forward() {
        let s = PulseState::new()
            .on_edge(u32::MAX - 499, 100)
            .on_edge(500, 100);
        assert_eq!(s.last_period, 1_000);
    }

    #[test]
    fn capture_applies_configured_threshold() {
        let cap = TachCapture::new(1_000);
        cap.on_edge(10);
        cap.on_edge(900);
        assert_eq!(cap.snapshot().last_period, 0);
        cap.on_edge(2_000);
        assert_eq!(
            cap.snapshot(),
            TachSnapshot {
                pulses_total: 3,
                last_period: 1_100
            }
        );
    }
}
