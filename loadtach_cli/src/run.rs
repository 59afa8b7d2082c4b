//! Backend assembly and the subcommands that run the device.

use std::path::Path;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use eyre::{Result, WrapErr};
use loadtach_config::Config;
use loadtach_core::{
    BootSource, Calibration, Command, Device, DeviceCfg, Identity, Response, SharedState,
};
use loadtach_hardware::{FileStorage, StreamTransport};
use loadtach_traits::LoadCell;

/// Shared between the edge source and the device for the life of the process.
static SHARED: OnceLock<SharedState> = OnceLock::new();

/// How long a stdin read waits before re-checking the shutdown flag.
const STDIN_POLL: Duration = Duration::from_millis(50);

fn shared_state(cfg: &Config) -> &'static SharedState {
    SHARED.get_or_init(|| SharedState::new(cfg.tach.glitch_reject_us))
}

// ── Backends ─────────────────────────────────────────────────────────────────

#[cfg(feature = "hardware")]
fn make_load_cell(cfg: &Config) -> Result<Box<dyn LoadCell>> {
    let cell = loadtach_hardware::HardwareLoadCell::new(
        cfg.pins.hx711_dt,
        cfg.pins.hx711_sck,
        cfg.pins.hx711_gain_pulses,
    )
    .wrap_err("open hx711")?;
    Ok(Box::new(cell))
}

#[cfg(not(feature = "hardware"))]
fn make_load_cell(_cfg: &Config) -> Result<Box<dyn LoadCell>> {
    use crate::cli::{ENV_SIM_RAW, ENV_SIM_TIMEOUT};

    let raw = match std::env::var(ENV_SIM_RAW) {
        Ok(s) => s
            .trim()
            .parse::<i32>()
            .wrap_err_with(|| format!("{ENV_SIM_RAW} must be an i32, got {s:?}"))?,
        Err(_) => 0,
    };
    let cell = loadtach_hardware::SimulatedLoadCell::new(raw);
    if std::env::var_os(ENV_SIM_TIMEOUT).is_some() {
        cell.set_timeout(true);
    }
    Ok(Box::new(cell))
}

/// Keeps the edge source running until dropped.
struct EdgeSource {
    _sim: Option<loadtach_hardware::SimulatedTach>,
    #[cfg(feature = "hardware")]
    _gpio: loadtach_hardware::gpio_tach::GpioTach,
}

#[cfg(feature = "hardware")]
fn start_edge_source(
    cfg: &Config,
    shared: &'static SharedState,
    sim_rpm: Option<f32>,
) -> Result<EdgeSource> {
    if sim_rpm.is_some() {
        tracing::warn!("--sim-rpm is ignored with the hardware backend");
    }
    let tach = shared.tach();
    let gpio = loadtach_hardware::gpio_tach::GpioTach::new(
        cfg.pins.tach_in,
        cfg.pins.tach_pullup,
        move |ts| tach.on_edge(ts),
    )
    .wrap_err("open tach input")?;
    Ok(EdgeSource {
        _sim: None,
        _gpio: gpio,
    })
}

#[cfg(not(feature = "hardware"))]
fn start_edge_source(
    cfg: &Config,
    shared: &'static SharedState,
    sim_rpm: Option<f32>,
) -> Result<EdgeSource> {
    let Some(rpm) = sim_rpm else {
        return Ok(EdgeSource { _sim: None });
    };
    let period = loadtach_hardware::SimulatedTach::period_for_rpm(rpm, cfg.tach.default_ppr)
        .ok_or_else(|| eyre::eyre!("--sim-rpm must be a positive, finite speed (got {rpm})"))?;
    let tach = shared.tach();
    tracing::info!(rpm, period_us = period.as_micros() as u64, "simulated tach running");
    Ok(EdgeSource {
        _sim: Some(loadtach_hardware::SimulatedTach::spawn(period, move |ts| {
            tach.on_edge(ts)
        })),
    })
}

fn build_device(cfg: &Config, shared: &'static SharedState) -> Result<Device<'static>> {
    let storage = FileStorage::open(&cfg.storage.path, cfg.storage.size)
        .wrap_err_with(|| format!("open calibration storage {}", cfg.storage.path))?;
    Device::builder(shared)
        .with_load_cell(make_load_cell(cfg)?)
        .with_storage(storage)
        .with_cfg(DeviceCfg::from(cfg))
        .with_identity(Identity::from(&cfg.identity))
        .build()
}

// ── Subcommands ──────────────────────────────────────────────────────────────

pub fn serve(cfg: &Config, sim_rpm: Option<f32>) -> Result<()> {
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let flag = Arc::clone(&shutdown);
        ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
            .wrap_err("install Ctrl-C handler")?;
    }

    let shared = shared_state(cfg);
    let _edges = start_edge_source(cfg, shared, sim_rpm)?;
    let mut device = build_device(cfg, shared)?;
    let mut link = StreamTransport::stdio(STDIN_POLL);
    tracing::info!(identity = ?device.identity(), "serving on stdio");

    loadtach_core::serve(&mut device, &mut link, &shutdown)?;
    Ok(())
}

pub fn self_check(cfg: &Config, json: bool) -> Result<()> {
    let shared = shared_state(cfg);
    let mut device = build_device(cfg, shared)?;
    let boot = match device.boot_source() {
        BootSource::Stored => "stored",
        BootSource::Defaults => "defaults",
    };

    let (mass_g, raw) = match device.execute(Command::Load) {
        Response::Load { mass_g, raw, .. } => (mass_g, raw),
        Response::Err(e) => return Err(eyre::Report::new(e).wrap_err("self-check acquisition")),
        other => eyre::bail!("unexpected self-check reply: {other}"),
    };
    let cal = device.calibration();

    if json {
        let obj = serde_json::json!({
            "ok": true,
            "boot": boot,
            "raw": raw,
            "mass_g": mass_g,
            "slope": cal.slope,
            "tare": cal.tare,
        });
        println!("{obj}");
    } else {
        println!("calibration: {boot} (slope={:.9} tare={})", cal.slope, cal.tare);
        println!("load cell: raw={raw} mass_g={mass_g:.3}");
        println!("OK");
    }
    Ok(())
}

pub fn fit_cal(csv: &Path, json: bool) -> Result<()> {
    let fit = loadtach_config::load_calibration_csv(csv)
        .wrap_err_with(|| format!("fit calibration from {}", csv.display()))?;
    let cal = Calibration::from(&fit);
    tracing::info!(slope = cal.slope, tare = cal.tare, "calibration fitted");

    if json {
        let obj = serde_json::json!({
            "slope": cal.slope,
            "tare": cal.tare,
            "command": fit.setcal_line(),
        });
        println!("{obj}");
    } else {
        println!("{}", fit.setcal_line());
    }
    Ok(())
}
