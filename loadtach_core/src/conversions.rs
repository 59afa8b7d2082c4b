//! `From` implementations bridging `loadtach_config` types to `loadtach_core` types.

use std::time::Duration;

use crate::calibration::Calibration;
use crate::config::{DeviceCfg, Identity};

// ── DeviceCfg ────────────────────────────────────────────────────────────────

impl From<&loadtach_config::Config> for DeviceCfg {
    fn from(c: &loadtach_config::Config) -> Self {
        Self {
            acquisition_timeout: Duration::from_millis(c.acquisition.timeout_ms),
            max_line_len: c.protocol.max_line_len,
            default_ppr: c.tach.default_ppr,
            storage_address: c.storage.address,
        }
    }
}

// ── Identity ─────────────────────────────────────────────────────────────────

impl From<&loadtach_config::Identity> for Identity {
    fn from(c: &loadtach_config::Identity) -> Self {
        let fw = c
            .fw
            .clone()
            .unwrap_or_else(|| Identity::default().fw);
        Self {
            vendor: c.vendor.clone(),
            device: c.device.clone(),
            fw,
        }
    }
}

// ── Calibration ──────────────────────────────────────────────────────────────

impl From<&loadtach_config::FittedCalibration> for Calibration {
    fn from(c: &loadtach_config::FittedCalibration) -> Self {
        Self::new(c.slope, c.tare)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_map_to_device_defaults() {
        let cfg = loadtach_config::Config::default();
        let dev = DeviceCfg::from(&cfg);
        let want = DeviceCfg::default();
        assert_eq!(dev.acquisition_timeout, want.acquisition_timeout);
        assert_eq!(dev.max_line_len, want.max_line_len);
        assert_eq!(dev.default_ppr, want.default_ppr);
        assert_eq!(dev.storage_address, want.storage_address);
        assert_eq!(Identity::from(&cfg.identity), Identity::default());
    }

    #[test]
    fn explicit_fw_wins() {
        let id = loadtach_config::Identity {
            fw: Some("9.9.9".into()),
            ..Default::default()
        };
        assert_eq!(Identity::from(&id).fw, "9.9.9");
    }
}
