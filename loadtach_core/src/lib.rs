#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core logic of the load/tach sensing device (hardware-agnostic).
//!
//! All hardware interactions go through the `loadtach_traits` ports
//! (`LoadCell`, `NvStorage`, `Transport`, `Clock`).
//!
//! ## Architecture
//!
//! - **Shared state**: critical-section cells shared by the edge handler and
//!   the command processor (`shared` module)
//! - **Tach capture**: pure pulse transition with glitch rejection, snapshot, RPM (`tach`)
//! - **Calibration**: live `(slope, tare)`, CRC-checked record, boot policy (`calibration`)
//! - **Load sampler**: bounded acquisition and calibrated mass (`sampler`)
//! - **Time base**: wall-clock epoch over the monotonic clock (`time_base`)
//! - **Protocol**: line assembly, tokenizing, commands, responses (`protocol`)
//! - **Device**: dispatch, built through a type-state builder (`device`, `builder`)
//!
//! Only the edge handler runs outside the command context, and it only ever
//! calls [`TachCapture::on_edge`].

pub mod builder;
pub mod calibration;
pub mod config;
pub mod conversions;
pub mod device;
pub mod error;
pub mod hw_error;
pub mod mocks;
pub mod protocol;
pub mod runner;
pub mod sampler;
pub mod shared;
pub mod tach;
pub mod time_base;
pub mod util;

pub use builder::DeviceBuilder;
pub use calibration::{BootSource, Calibration, CalibrationRecord, CalibrationStore};
pub use config::{DeviceCfg, Identity};
pub use device::Device;
pub use error::{BuildError, DeviceError, ProtocolError, RecordError};
pub use protocol::{Command, LineAssembler, Response};
pub use runner::{ServeStats, serve};
pub use sampler::{LoadSampler, MassReading};
pub use shared::{Shared, SharedState};
pub use tach::{PulseState, TachCapture, TachSnapshot, compute_rpm};
pub use time_base::TimeBase;
