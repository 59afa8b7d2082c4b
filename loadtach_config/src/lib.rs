#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema and calibration fitting for the load/tach device.
//!
//! - `Config` and its sections are deserialized from TOML and validated.
//!   Every section has defaults, so an empty document is a valid config.
//! - `load_calibration_csv` fits `(slope, tare)` from known-mass readings.
use serde::Deserialize;

pub mod calibration;

pub use calibration::{CalibrationRow, FittedCalibration, load_calibration_csv};

/// Size of the persisted calibration record in bytes.
pub const CALIBRATION_RECORD_LEN: usize = 20;

/// Strings reported by `INFO`.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Identity {
    pub vendor: String,
    pub device: String,
    /// Firmware version; the binary's own version when absent.
    pub fw: Option<String>,
}

impl Default for Identity {
    fn default() -> Self {
        Self {
            vendor: "ForeverBearing".to_string(),
            device: "loadtach".to_string(),
            fw: None,
        }
    }
}

/// Pin assignment for the `hardware` backend. Ignored by the simulator.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Pins {
    pub hx711_dt: u8,
    pub hx711_sck: u8,
    /// Total SCK pulses per HX711 conversion: 25 (A/128), 26 (B/32), 27 (A/64)
    pub hx711_gain_pulses: u8,
    pub tach_in: u8,
    pub tach_pullup: bool,
}

impl Default for Pins {
    fn default() -> Self {
        Self {
            hx711_dt: 4,
            hx711_sck: 2,
            hx711_gain_pulses: 25,
            tach_in: 17,
            tach_pullup: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Acquisition {
    /// Max time to wait for a raw count before reporting a timeout
    pub timeout_ms: u64,
}

impl Default for Acquisition {
    fn default() -> Self {
        Self { timeout_ms: 200 }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Tach {
    /// Edges closer than this to the previous one (µs) do not update the period
    pub glitch_reject_us: u32,
    /// Pulses per revolution at boot (not persisted)
    pub default_ppr: u32,
}

impl Default for Tach {
    fn default() -> Self {
        Self {
            glitch_reject_us: 100,
            default_ppr: 1,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Protocol {
    /// Longest accepted command line in bytes, terminator excluded
    pub max_line_len: usize,
}

impl Default for Protocol {
    fn default() -> Self {
        Self { max_line_len: 127 }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Storage {
    /// Backing file for the emulated EEPROM page
    pub path: String,
    /// Page size in bytes
    pub size: usize,
    /// Offset of the calibration record within the page
    pub address: usize,
}

impl Default for Storage {
    fn default() -> Self {
        Self {
            path: "loadtach_eeprom.bin".to_string(),
            size: 64,
            address: 0,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Config {
    pub identity: Identity,
    pub pins: Pins,
    pub acquisition: Acquisition,
    pub tach: Tach,
    pub protocol: Protocol,
    pub storage: Storage,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Identity: values go on the wire as key=value tokens
        for (key, v) in [
            ("identity.vendor", Some(&self.identity.vendor)),
            ("identity.device", Some(&self.identity.device)),
            ("identity.fw", self.identity.fw.as_ref()),
        ] {
            if let Some(v) = v
                && (v.is_empty() || v.chars().any(|c| c.is_whitespace() || c.is_control()))
            {
                eyre::bail!("{key} must be non-empty and contain no whitespace");
            }
        }

        // Pins
        if !(25..=27).contains(&self.pins.hx711_gain_pulses) {
            eyre::bail!("pins.hx711_gain_pulses must be in [25, 27]");
        }
        if self.pins.hx711_dt == self.pins.hx711_sck || self.pins.tach_in == self.pins.hx711_dt
            || self.pins.tach_in == self.pins.hx711_sck
        {
            eyre::bail!("pins.hx711_dt, pins.hx711_sck and pins.tach_in must be distinct");
        }

        // Acquisition
        if self.acquisition.timeout_ms == 0 {
            eyre::bail!("acquisition.timeout_ms must be >= 1");
        }
        if self.acquisition.timeout_ms > 60_000 {
            eyre::bail!("acquisition.timeout_ms is unreasonably large (>60s)");
        }

        // Tach
        if self.tach.default_ppr == 0 {
            eyre::bail!("tach.default_ppr must be >= 1");
        }

        // Protocol
        if self.protocol.max_line_len == 0 || self.protocol.max_line_len > 4096 {
            eyre::bail!("protocol.max_line_len must be in [1, 4096]");
        }

        // Storage
        if self.storage.path.trim().is_empty() {
            eyre::bail!("storage.path must not be empty");
        }
        match self.storage.address.checked_add(CALIBRATION_RECORD_LEN) {
            Some(end) if end <= self.storage.size => {}
            _ => eyre::bail!(
                "storage.address + {CALIBRATION_RECORD_LEN} must fit within storage.size ({})",
                self.storage.size
            ),
        }

        // Logging
        if let Some(r) = self.logging.rotation.as_deref()
            && !matches!(r, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        Ok(())
    }
}
