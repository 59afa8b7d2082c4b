//! Hardware ports for the load/tach sensing device.
//!
//! The firmware core talks to the outside world only through these traits:
//! a raw-count acquisition primitive, a non-volatile storage primitive, and a
//! byte-stream transport. Errors cross the boundary as [`BoxError`] and are
//! mapped to typed errors by the core.
pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

/// Error currency at the port boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Raw-count acquisition from the strain-gauge amplifier.
pub trait LoadCell {
    /// Block until a conversion is ready or `timeout` expires.
    fn read_raw(&mut self, timeout: std::time::Duration) -> Result<i32, BoxError>;
}

/// Byte-addressed non-volatile storage (EEPROM or flash emulation).
///
/// Writes land in a cache and only survive a power cycle after `commit`.
pub trait NvStorage {
    fn read_block(&mut self, addr: usize, buf: &mut [u8]) -> Result<(), BoxError>;
    fn write_block(&mut self, addr: usize, data: &[u8]) -> Result<(), BoxError>;
    fn commit(&mut self) -> Result<(), BoxError>;
}

/// Byte-stream link to the host.
pub trait Transport {
    /// `Ok(None)` means nothing is available right now; `Err` means the
    /// stream is closed or broken.
    fn read_byte(&mut self) -> Result<Option<u8>, BoxError>;
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), BoxError>;
}

impl<T: LoadCell + ?Sized> LoadCell for Box<T> {
    fn read_raw(&mut self, timeout: std::time::Duration) -> Result<i32, BoxError> {
        (**self).read_raw(timeout)
    }
}

impl<T: NvStorage + ?Sized> NvStorage for Box<T> {
    fn read_block(&mut self, addr: usize, buf: &mut [u8]) -> Result<(), BoxError> {
        (**self).read_block(addr, buf)
    }
    fn write_block(&mut self, addr: usize, data: &[u8]) -> Result<(), BoxError> {
        (**self).write_block(addr, data)
    }
    fn commit(&mut self) -> Result<(), BoxError> {
        (**self).commit()
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn read_byte(&mut self) -> Result<Option<u8>, BoxError> {
        (**self).read_byte()
    }
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), BoxError> {
        (**self).write_bytes(bytes)
    }
}
