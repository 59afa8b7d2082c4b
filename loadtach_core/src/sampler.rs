//! Calibrated mass readings from the load cell.

use std::time::Duration;

use loadtach_traits::{LoadCell, NvStorage};

use crate::calibration::{Calibration, CalibrationStore};
use crate::error::DeviceError;
use crate::hw_error::map_hw_error;
use crate::shared::Shared;

/// Default bound on a single acquisition.
pub const DEFAULT_ACQUISITION_TIMEOUT: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MassReading {
    pub mass_g: f32,
    pub raw: i32,
}

/// Blocking acquisition bounded by `timeout`. Never call from the edge handler.
pub struct LoadSampler<'a, L> {
    cell: L,
    timeout: Duration,
    live: &'a Shared<Calibration>,
}

impl<'a, L: LoadCell> LoadSampler<'a, L> {
    pub fn new(cell: L, timeout: Duration, live: &'a Shared<Calibration>) -> Self {
        Self {
            cell,
            timeout,
            live,
        }
    }

    /// One raw count, no retry.
    pub fn read_raw(&mut self) -> Result<i32, DeviceError> {
        match self.cell.read_raw(self.timeout) {
            Ok(raw) => {
                tracing::trace!(raw, "raw sample");
                Ok(raw)
            }
            Err(e) => Err(map_hw_error(e.as_ref())),
        }
    }

    pub fn read_mass(&mut self) -> Result<MassReading, DeviceError> {
        let raw = self.read_raw()?;
        let cal = self.live.get();
        Ok(MassReading {
            mass_g: cal.mass_g(raw),
            raw,
        })
    }

    /// Take the current raw count as the new zero and persist it.
    pub fn tare<S: NvStorage>(
        &mut self,
        store: &mut CalibrationStore<'_, S>,
    ) -> Result<i32, DeviceError> {
        let raw = self.read_raw()?;
        store.apply(store.live().with_tare(raw));
        Ok(raw)
    }
}
