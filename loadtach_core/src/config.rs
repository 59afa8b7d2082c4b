//! Runtime configuration types for the device.
//!
//! These are separate from the TOML-deserialized config in `loadtach_config`;
//! see `conversions` for the mapping.

use std::time::Duration;

use crate::protocol::DEFAULT_MAX_LINE_LEN;
use crate::sampler::DEFAULT_ACQUISITION_TIMEOUT;
use crate::shared::DEFAULT_PPR;

#[derive(Debug, Clone)]
pub struct DeviceCfg {
    /// Bound on a single load-cell acquisition.
    pub acquisition_timeout: Duration,
    /// Longest accepted command line, terminator excluded.
    pub max_line_len: usize,
    /// Pulses per revolution applied at boot.
    pub default_ppr: u32,
    /// Offset of the calibration record in storage.
    pub storage_address: usize,
}

impl Default for DeviceCfg {
    fn default() -> Self {
        Self {
            acquisition_timeout: DEFAULT_ACQUISITION_TIMEOUT,
            max_line_len: DEFAULT_MAX_LINE_LEN,
            default_ppr: DEFAULT_PPR,
            storage_address: 0,
        }
    }
}

/// Strings reported by `INFO`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub vendor: String,
    pub device: String,
    pub fw: String,
}

impl Default for Identity {
    fn default() -> Self {
        Self {
            vendor: "ForeverBearing".to_string(),
            device: "loadtach".to_string(),
            fw: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
