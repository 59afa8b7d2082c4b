//! Maps `Box<dyn Error>` from the port traits to typed `DeviceError`.
//!
//! The traits in `loadtach_traits` use `Box<dyn Error + Send + Sync>`; this
//! module converts those to our typed error enum, with an optional
//! feature-gated path for `loadtach_hardware::HwError` downcasting.

use crate::error::DeviceError;

/// Map a load-cell error to a typed `DeviceError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> DeviceError {
    #[cfg(feature = "hardware-errors")]
    {
        use loadtach_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::Timeout | HwError::DataReadyTimeout => DeviceError::Timeout,
                other => DeviceError::HardwareFault(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("timeout") || s.to_lowercase().contains("timed out") {
        DeviceError::Timeout
    } else {
        DeviceError::Hardware(s)
    }
}

/// Map a storage error; storage failures never count as acquisition timeouts.
pub fn map_storage_error(e: &(dyn std::error::Error + 'static)) -> DeviceError {
    DeviceError::Storage(e.to_string())
}
