//! State shared between the edge interrupt and the command processor.
//!
//! Every cross-context field sits in a [`Shared`] cell. Access happens inside
//! a `critical_section` that only copies a value in or out, so the interrupt
//! latency added by the command side is a handful of field assignments.

use core::cell::Cell;

use critical_section::Mutex;

use crate::calibration::Calibration;
use crate::tach::TachCapture;

/// A `Copy` value guarded by a critical section.
pub struct Shared<T: Copy> {
    inner: Mutex<Cell<T>>,
}

impl<T: Copy> Shared<T> {
    pub const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(Cell::new(value)),
        }
    }

    #[inline]
    pub fn get(&self) -> T {
        critical_section::with(|cs| self.inner.borrow(cs).get())
    }

    #[inline]
    pub fn set(&self, value: T) {
        critical_section::with(|cs| self.inner.borrow(cs).set(value));
    }

    /// Read-modify-write in one critical section; returns the new value.
    /// `f` must not block.
    #[inline]
    pub fn update(&self, f: impl FnOnce(T) -> T) -> T {
        critical_section::with(|cs| {
            let cell = self.inner.borrow(cs);
            let next = f(cell.get());
            cell.set(next);
            next
        })
    }
}

impl<T: Copy + core::fmt::Debug> core::fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("Shared").field(&self.get()).finish()
    }
}

impl<T: Copy + Default> Default for Shared<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Default edge-to-edge interval (µs) below which an edge is treated as a glitch.
pub const DEFAULT_GLITCH_REJECT_US: u32 = 100;
/// Pulses per revolution at boot.
pub const DEFAULT_PPR: u32 = 1;

/// Everything the interrupt source and the device both touch.
///
/// Owned by the firmware root (typically a `static`) and handed out by
/// reference.
#[derive(Debug)]
pub struct SharedState {
    tach: TachCapture,
    calibration: Shared<Calibration>,
    epoch_base_ms: Shared<u64>,
    ppr: Shared<u32>,
}

impl SharedState {
    pub const fn new(glitch_reject_us: u32) -> Self {
        Self {
            tach: TachCapture::new(glitch_reject_us),
            calibration: Shared::new(Calibration::DEFAULT),
            epoch_base_ms: Shared::new(0),
            ppr: Shared::new(DEFAULT_PPR),
        }
    }

    /// Written only by the edge source; read by `SPEED?`.
    pub fn tach(&self) -> &TachCapture {
        &self.tach
    }

    pub fn calibration(&self) -> &Shared<Calibration> {
        &self.calibration
    }

    pub fn epoch_base_ms(&self) -> &Shared<u64> {
        &self.epoch_base_ms
    }

    pub fn ppr(&self) -> &Shared<u32> {
        &self.ppr
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new(DEFAULT_GLITCH_REJECT_US)
    }
}
