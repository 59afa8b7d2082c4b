//! Wall-clock timestamps derived from the monotonic clock.

use std::sync::Arc;
use std::time::Instant;

use loadtach_traits::Clock;

use crate::shared::Shared;

pub struct TimeBase<'a> {
    base_ms: &'a Shared<u64>,
    clock: Arc<dyn Clock + Send + Sync>,
    origin: Instant,
}

impl<'a> TimeBase<'a> {
    /// Monotonic time starts at 0 when the time base is created.
    pub fn new(base_ms: &'a Shared<u64>, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        let origin = clock.now();
        Self {
            base_ms,
            clock,
            origin,
        }
    }

    pub fn monotonic_ms(&self) -> u64 {
        self.clock.ms_since(self.origin)
    }

    /// Anchor the epoch so that `now_ms()` reads `wall_ms` at this instant.
    pub fn set_epoch(&self, wall_ms: u64) {
        self.base_ms.set(wall_ms.wrapping_sub(self.monotonic_ms()));
    }

    pub fn now_ms(&self) -> u64 {
        self.base_ms.get().wrapping_add(self.monotonic_ms())
    }
}
