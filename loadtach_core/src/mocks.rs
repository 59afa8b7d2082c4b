//! Test and helper mocks for loadtach_core

use loadtach_traits::{BoxError, LoadCell, NvStorage};

/// A load cell that never produces a conversion.
pub struct TimeoutLoadCell;

impl LoadCell for TimeoutLoadCell {
    fn read_raw(&mut self, _timeout: std::time::Duration) -> Result<i32, BoxError> {
        Err(Box::new(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            "load cell timeout",
        )))
    }
}

/// A load cell returning a fixed raw count.
pub struct FixedLoadCell(pub i32);

impl LoadCell for FixedLoadCell {
    fn read_raw(&mut self, _timeout: std::time::Duration) -> Result<i32, BoxError> {
        Ok(self.0)
    }
}

/// Storage that reads erased bytes and accepts writes without keeping them.
pub struct ErasedStorage;

impl NvStorage for ErasedStorage {
    fn read_block(&mut self, _addr: usize, buf: &mut [u8]) -> Result<(), BoxError> {
        buf.fill(0xFF);
        Ok(())
    }
    fn write_block(&mut self, _addr: usize, _data: &[u8]) -> Result<(), BoxError> {
        Ok(())
    }
    fn commit(&mut self) -> Result<(), BoxError> {
        Ok(())
    }
}
