use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::{Duration, Instant};

use crate::error::{HwError, Result};

/// Block until `is_high` reports the line low, polling every `poll_interval`.
///
/// The HX711 pulls DT low when a conversion is ready; a line that stays high
/// past `timeout` is `HwError::DataReadyTimeout`.
pub fn wait_until_low_with_timeout(
    mut is_high: impl FnMut() -> bool,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<()> {
    let deadline = Instant::now() + timeout;
    while is_high() {
        if Instant::now() >= deadline {
            return Err(HwError::DataReadyTimeout);
        }
        std::thread::sleep(poll_interval);
    }
    Ok(())
}

/// Microseconds since `origin`, truncated to the 32-bit capture clock.
///
/// Wraps about every 71 minutes; edge consumers subtract with wrapping arithmetic.
pub fn edge_timestamp_us(origin: Instant) -> u32 {
    (origin.elapsed().as_micros() & u128::from(u32::MAX)) as u32
}

/// Replace `path` with `bytes` through a synced temp file and a rename.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("new");
    {
        let mut f = fs::File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    fs::rename(tmp, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_timestamps_are_monotonic_before_wrap() {
        let origin = Instant::now();
        let a = edge_timestamp_us(origin);
        std::thread::sleep(Duration::from_millis(2));
        let b = edge_timestamp_us(origin);
        assert!(b.wrapping_sub(a) >= 2_000);
    }

    #[test]
    fn write_atomic_replaces_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.bin");
        write_atomic(&path, &[1, 2, 3]).unwrap();
        write_atomic(&path, &[9]).unwrap();
        assert_eq!(fs::read(&path).unwrap(), vec![9]);
        assert!(!path.with_extension("new").exists());
    }
}
