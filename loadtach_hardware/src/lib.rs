//! Port adapters for the load/tach device.
//!
//! Simulation backends are always available so the firmware can run on a
//! workstation; the Raspberry Pi HX711 driver and GPIO tachometer live behind
//! the `hardware` feature.
pub mod error;
#[cfg(feature = "hardware")]
pub mod gpio_tach;
#[cfg(feature = "hardware")]
pub mod hx711;
pub mod storage;
pub mod tach_sim;
pub mod transport;
pub mod util;

use loadtach_traits::{BoxError, LoadCell};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

pub use storage::{FileStorage, MemoryStorage};
pub use tach_sim::SimulatedTach;
pub use transport::{ScriptedTransport, StreamTransport};

/// Simulated load cell returning a settable raw count.
///
/// Clones share state, so a test can keep a handle after moving one into the device.
#[derive(Debug, Clone, Default)]
pub struct SimulatedLoadCell {
    raw: Arc<AtomicI32>,
    timeout: Arc<AtomicBool>,
}

impl SimulatedLoadCell {
    pub fn new(raw: i32) -> Self {
        Self {
            raw: Arc::new(AtomicI32::new(raw)),
            timeout: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn set_raw(&self, raw: i32) {
        self.raw.store(raw, Ordering::Relaxed);
    }

    /// When set, every read fails with `HwError::Timeout`.
    pub fn set_timeout(&self, on: bool) {
        self.timeout.store(on, Ordering::Relaxed);
    }
}

impl LoadCell for SimulatedLoadCell {
    fn read_raw(&mut self, _timeout: std::time::Duration) -> Result<i32, BoxError> {
        if self.timeout.load(Ordering::Relaxed) {
            return Err(Box::new(error::HwError::Timeout));
        }
        let raw = self.raw.load(Ordering::Relaxed);
        tracing::trace!(raw, "simulated load cell sample");
        Ok(raw)
    }
}

#[cfg(feature = "hardware")]
pub struct HardwareLoadCell {
    hx711: hx711::Hx711,
}

#[cfg(feature = "hardware")]
impl HardwareLoadCell {
    pub fn new(dt_pin: u8, sck_pin: u8, gain_pulses: u8) -> error::Result<Self> {
        let gpio = rppal::gpio::Gpio::new().map_err(|e| error::HwError::Gpio(e.to_string()))?;
        let dt = gpio
            .get(dt_pin)
            .map_err(|e| error::HwError::Gpio(e.to_string()))?
            .into_input();
        let sck = gpio
            .get(sck_pin)
            .map_err(|e| error::HwError::Gpio(e.to_string()))?
            .into_output();
        Ok(Self {
            hx711: hx711::Hx711::new(dt, sck, gain_pulses)?,
        })
    }
}

#[cfg(feature = "hardware")]
impl LoadCell for HardwareLoadCell {
    fn read_raw(&mut self, timeout: std::time::Duration) -> Result<i32, BoxError> {
        match self.hx711.read_with_timeout(timeout) {
            Ok(raw) => {
                tracing::trace!(raw, "hx711 sample");
                Ok(raw)
            }
            Err(e) => {
                tracing::debug!(error = %e, "hx711 read failed");
                Err(Box::new(e))
            }
        }
    }
}
