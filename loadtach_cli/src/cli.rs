//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[cfg_attr(feature = "hardware", allow(dead_code))]
/// Simulated load cell: fail every read with a timeout when set (tests).
pub const ENV_SIM_TIMEOUT: &str = "LOADTACH_TEST_SIM_TIMEOUT";
#[cfg_attr(feature = "hardware", allow(dead_code))]
/// Simulated load cell: raw count to report (tests).
pub const ENV_SIM_RAW: &str = "LOADTACH_TEST_SIM_RAW";

#[derive(Parser, Debug)]
#[command(name = "loadtach", version, about = "Load and shaft-speed sensing device")]
pub struct Cli {
    /// Path to config TOML; built-in defaults when omitted
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log as JSON lines instead of pretty; structured output for self-check/fit-cal
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the device protocol on stdin/stdout until EOF or Ctrl-C
    Serve {
        /// Drive the simulated tachometer at this shaft speed (ignored with --features hardware)
        #[arg(long, value_name = "RPM")]
        sim_rpm: Option<f32>,
    },
    /// Quick health check: one acquisition and a calibration record check
    SelfCheck,
    /// Fit slope/tare from a `raw,grams` CSV and print the SETCAL line
    FitCal {
        #[arg(long, value_name = "FILE")]
        csv: PathBuf,
    },
}
