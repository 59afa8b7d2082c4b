//! Type-state builder for `Device`.
//!
//! The builder enforces at compile time that a load cell and a storage are
//! provided before `build()` is available. `try_build()` is always available
//! for dynamic checks.

use std::marker::PhantomData;
use std::sync::Arc;

use loadtach_traits::clock::{Clock, MonotonicClock};
use loadtach_traits::{LoadCell, NvStorage};

use crate::calibration::{CalibrationStore, RECORD_LEN};
use crate::config::{DeviceCfg, Identity};
use crate::device::Device;
use crate::error::{BuildError, Result};
use crate::protocol::LineAssembler;
use crate::sampler::LoadSampler;
use crate::shared::SharedState;
use crate::time_base::TimeBase;

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

/// Builder for `Device`. The configuration is validated on `build()`.
pub struct DeviceBuilder<'a, L, S> {
    shared: &'a SharedState,
    load_cell: Option<Box<dyn LoadCell>>,
    storage: Option<Box<dyn NvStorage>>,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
    cfg: Option<DeviceCfg>,
    identity: Option<Identity>,
    _l: PhantomData<L>,
    _s: PhantomData<S>,
}

impl<'a> DeviceBuilder<'a, Missing, Missing> {
    pub fn new(shared: &'a SharedState) -> Self {
        Self {
            shared,
            load_cell: None,
            storage: None,
            clock: None,
            cfg: None,
            identity: None,
            _l: PhantomData,
            _s: PhantomData,
        }
    }
}

fn validate(cfg: &DeviceCfg) -> Result<()> {
    if cfg.acquisition_timeout.is_zero() {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "acquisition_timeout must be >= 1ms",
        )));
    }
    if cfg.max_line_len == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "max_line_len must be >= 1",
        )));
    }
    if cfg.default_ppr == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "default_ppr must be >= 1",
        )));
    }
    if cfg.storage_address.checked_add(RECORD_LEN).is_none() {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "storage_address out of range",
        )));
    }
    Ok(())
}

impl<'a, L, S> DeviceBuilder<'a, L, S> {
    /// Fallible build available in any type-state; returns detailed error for missing pieces.
    ///
    /// Runs the boot calibration policy against the storage before returning.
    pub fn try_build(self) -> Result<Device<'a>> {
        let load_cell = self
            .load_cell
            .ok_or_else(|| eyre::Report::new(BuildError::MissingLoadCell))?;
        let storage = self
            .storage
            .ok_or_else(|| eyre::Report::new(BuildError::MissingStorage))?;
        let cfg = self.cfg.unwrap_or_default();
        validate(&cfg)?;

        let shared = self.shared;
        let clock: Arc<dyn Clock + Send + Sync> = match self.clock {
            Some(c) => c,
            None => Arc::new(MonotonicClock::new()),
        };

        shared.ppr().set(cfg.default_ppr);
        let mut store = CalibrationStore::new(storage, cfg.storage_address, shared.calibration());
        let boot = store.init();
        tracing::info!(
            ?boot,
            timeout_ms = cfg.acquisition_timeout.as_millis() as u64,
            max_line_len = cfg.max_line_len,
            ppr = cfg.default_ppr,
            "device ready"
        );

        Ok(Device {
            shared,
            sampler: LoadSampler::new(load_cell, cfg.acquisition_timeout, shared.calibration()),
            store,
            time: TimeBase::new(shared.epoch_base_ms(), clock),
            identity: self.identity.unwrap_or_default(),
            assembler: LineAssembler::new(cfg.max_line_len),
            boot,
        })
    }
}

/// Chainable setters that do not affect type-state.
impl<L, S> DeviceBuilder<'_, L, S> {
    pub fn with_cfg(mut self, cfg: DeviceCfg) -> Self {
        self.cfg = Some(cfg);
        self
    }
    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = Some(identity);
        self
    }
    /// Provide a custom clock implementation; defaults to `MonotonicClock` when not provided.
    pub fn with_clock(mut self, clock: impl Clock + Send + Sync + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }
}

// Setters that advance type-state
impl<'a, S> DeviceBuilder<'a, Missing, S> {
    pub fn with_load_cell(self, cell: impl LoadCell + 'static) -> DeviceBuilder<'a, Set, S> {
        DeviceBuilder {
            shared: self.shared,
            load_cell: Some(Box::new(cell)),
            storage: self.storage,
            clock: self.clock,
            cfg: self.cfg,
            identity: self.identity,
            _l: PhantomData,
            _s: PhantomData,
        }
    }
}

impl<'a, L> DeviceBuilder<'a, L, Missing> {
    pub fn with_storage(self, storage: impl NvStorage + 'static) -> DeviceBuilder<'a, L, Set> {
        DeviceBuilder {
            shared: self.shared,
            load_cell: self.load_cell,
            storage: Some(Box::new(storage)),
            clock: self.clock,
            cfg: self.cfg,
            identity: self.identity,
            _l: PhantomData,
            _s: PhantomData,
        }
    }
}

impl<'a> DeviceBuilder<'a, Set, Set> {
    /// Validate and build the Device. Only available when a load cell and storage are set.
    pub fn build(self) -> Result<Device<'a>> {
        self.try_build()
    }
}
