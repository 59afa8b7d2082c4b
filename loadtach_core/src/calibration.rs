//! Live calibration and its checksummed persisted record.

use loadtach_traits::NvStorage;

use crate::error::{DeviceError, RecordError};
use crate::hw_error::map_storage_error;
use crate::shared::Shared;

/// Grams per raw count used until a valid record exists.
pub const DEFAULT_SLOPE: f32 = 0.002;
/// Raw-count zero offset used until a valid record exists.
pub const DEFAULT_TARE: i32 = 0;

/// Linear model `grams = (raw - tare) * slope`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    pub slope: f32,
    pub tare: i32,
}

impl Calibration {
    pub const DEFAULT: Self = Self {
        slope: DEFAULT_SLOPE,
        tare: DEFAULT_TARE,
    };

    pub const fn new(slope: f32, tare: i32) -> Self {
        Self { slope, tare }
    }

    /// Convert a raw count to grams.
    #[inline]
    pub fn mass_g(&self, raw: i32) -> f32 {
        let counts = i64::from(raw) - i64::from(self.tare);
        (counts as f64 * f64::from(self.slope)) as f32
    }

    /// Same slope, new zero offset.
    #[must_use]
    pub const fn with_tare(self, tare: i32) -> Self {
        Self {
            slope: self.slope,
            tare,
        }
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// ── Persisted record ─────────────────────────────────────────────────────────

/// Encoded size: magic, version, slope, tare, crc; four bytes each.
pub const RECORD_LEN: usize = 20;
const CRC_OFFSET: usize = 16;
/// "CAL1"
pub const MAGIC: u32 = 0x4341_4C31;
pub const VERSION: u32 = 0x0001_0000;

const _: () = assert!(RECORD_LEN == loadtach_config::CALIBRATION_RECORD_LEN);

/// On-storage form of a [`Calibration`], fields in native byte order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationRecord {
    pub magic: u32,
    pub version: u32,
    pub slope: f32,
    pub tare: i32,
    pub crc: u32,
}

fn crc32(bytes: &[u8]) -> u32 {
    let mut h = crc32fast::Hasher::new();
    h.update(bytes);
    h.finalize()
}

fn word(bytes: &[u8; RECORD_LEN], at: usize) -> [u8; 4] {
    [bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]
}

impl CalibrationRecord {
    /// Record for `cal` with the current magic/version and a fresh CRC.
    pub fn new(cal: Calibration) -> Self {
        let mut rec = Self {
            magic: MAGIC,
            version: VERSION,
            slope: cal.slope,
            tare: cal.tare,
            crc: 0,
        };
        let bytes = rec.encode();
        rec.crc = crc32(&bytes[..CRC_OFFSET]);
        rec
    }

    pub fn encode(&self) -> [u8; RECORD_LEN] {
        let mut out = [0u8; RECORD_LEN];
        out[0..4].copy_from_slice(&self.magic.to_ne_bytes());
        out[4..8].copy_from_slice(&self.version.to_ne_bytes());
        out[8..12].copy_from_slice(&self.slope.to_ne_bytes());
        out[12..16].copy_from_slice(&self.tare.to_ne_bytes());
        out[16..20].copy_from_slice(&self.crc.to_ne_bytes());
        out
    }

    /// Parse and validate: magic, then version, then CRC over the first 16 bytes.
    pub fn decode(bytes: &[u8; RECORD_LEN]) -> Result<Self, RecordError> {
        let rec = Self {
            magic: u32::from_ne_bytes(word(bytes, 0)),
            version: u32::from_ne_bytes(word(bytes, 4)),
            slope: f32::from_ne_bytes(word(bytes, 8)),
            tare: i32::from_ne_bytes(word(bytes, 12)),
            crc: u32::from_ne_bytes(word(bytes, CRC_OFFSET)),
        };
        if rec.magic != MAGIC {
            return Err(RecordError::BadMagic { found: rec.magic });
        }
        if rec.version != VERSION {
            return Err(RecordError::BadVersion { found: rec.version });
        }
        let computed = crc32(&bytes[..CRC_OFFSET]);
        if computed != rec.crc {
            return Err(RecordError::BadCrc {
                stored: rec.crc,
                computed,
            });
        }
        Ok(rec)
    }

    pub fn calibration(&self) -> Calibration {
        Calibration::new(self.slope, self.tare)
    }
}

// ── Store ────────────────────────────────────────────────────────────────────

/// Where the live calibration came from at boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootSource {
    /// A valid record was found and applied.
    Stored,
    /// No valid record; defaults were applied and persisted.
    Defaults,
}

/// Live calibration plus the storage slot that backs it.
pub struct CalibrationStore<'a, S> {
    storage: S,
    address: usize,
    live: &'a Shared<Calibration>,
}

impl<'a, S: NvStorage> CalibrationStore<'a, S> {
    pub fn new(storage: S, address: usize, live: &'a Shared<Calibration>) -> Self {
        Self {
            storage,
            address,
            live,
        }
    }

    /// Read and validate the persisted record. Never touches live state.
    pub fn load(&mut self) -> Result<Calibration, DeviceError> {
        let mut buf = [0u8; RECORD_LEN];
        self.storage
            .read_block(self.address, &mut buf)
            .map_err(|e| map_storage_error(e.as_ref()))?;
        let rec = CalibrationRecord::decode(&buf)?;
        Ok(rec.calibration())
    }

    /// Write a fresh record for `cal` and commit it. Not read back.
    pub fn save(&mut self, cal: Calibration) -> Result<(), DeviceError> {
        let bytes = CalibrationRecord::new(cal).encode();
        self.storage
            .write_block(self.address, &bytes)
            .map_err(|e| map_storage_error(e.as_ref()))?;
        self.storage
            .commit()
            .map_err(|e| map_storage_error(e.as_ref()))?;
        tracing::debug!(slope = cal.slope, tare = cal.tare, "calibration persisted");
        Ok(())
    }

    /// Make `cal` live, then persist it. A failed save is logged, not returned.
    pub fn apply(&mut self, cal: Calibration) {
        self.live.set(cal);
        if let Err(e) = self.save(cal) {
            tracing::warn!(error = %e, "failed to persist calibration; live value kept");
        }
    }

    pub fn reset_to_defaults(&mut self) {
        self.apply(Calibration::DEFAULT);
    }

    /// Boot policy: the stored record if valid, else persisted defaults.
    pub fn init(&mut self) -> BootSource {
        match self.load() {
            Ok(cal) => {
                self.live.set(cal);
                tracing::info!(
                    slope = cal.slope,
                    tare = cal.tare,
                    "calibration loaded from storage"
                );
                BootSource::Stored
            }
            Err(e) => {
                tracing::warn!(error = %e, "no valid calibration record; resetting to defaults");
                self.reset_to_defaults();
                BootSource::Defaults
            }
        }
    }

    pub fn live(&self) -> Calibration {
        self.live.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_model() {
        let c = Calibration::DEFAULT;
        assert!((c.mass_g(1_000) - 2.0).abs() < 1e-6);
        assert_eq!(c.mass_g(0), 0.0);
    }

    #[test]
    fn mass_uses_wide_difference() {
        let c = Calibration::new(1.0, i32::MIN);
        assert!(c.mass_g(i32::MAX) > 4.0e9);
    }

    #[test]
    fn all_zero_bytes_are_rejected() {
        let err = CalibrationRecord::decode(&[0u8; RECORD_LEN]).unwrap_err();
        assert_eq!(err, RecordError::BadMagic { found: 0 });
    }

    #[test]
    fn erased_flash_is_rejected() {
        assert!(CalibrationRecord::decode(&[0xFF; RECORD_LEN]).is_err());
    }

    #[test]
    fn version_is_checked_before_crc() {
        let mut rec = CalibrationRecord::new(Calibration::DEFAULT);
        rec.version = 2;
        let err = CalibrationRecord::decode(&rec.encode()).unwrap_err();
        assert_eq!(err, RecordError::BadVersion { found: 2 });
    }

    #[test]
    fn crc_covers_payload() {
        let mut rec = CalibrationRecord::new(Calibration::new(0.5, 42));
        rec.tare = 43;
        assert!(matches!(
            CalibrationRecord::decode(&rec.encode()),
            Err(RecordError::BadCrc { .. })
        ));
    }

    #[test]
    fn crc_is_ieee() {
        // Check value of the standard CRC-32 on "123456789".
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
    }
}
