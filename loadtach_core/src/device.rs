//! The command processor: assembles lines and dispatches them to the
//! sampler, tach capture, calibration store and time base.

use loadtach_traits::{LoadCell, NvStorage};

use crate::builder::{DeviceBuilder, Missing};
use crate::calibration::{BootSource, Calibration, CalibrationStore};
use crate::config::Identity;
use crate::error::ProtocolError;
use crate::protocol::{Assembled, Command, LineAssembler, Response};
use crate::sampler::LoadSampler;
use crate::shared::SharedState;
use crate::time_base::TimeBase;

pub struct Device<'a> {
    pub(crate) shared: &'a SharedState,
    pub(crate) sampler: LoadSampler<'a, Box<dyn LoadCell>>,
    pub(crate) store: CalibrationStore<'a, Box<dyn NvStorage>>,
    pub(crate) time: TimeBase<'a>,
    pub(crate) identity: Identity,
    pub(crate) assembler: LineAssembler,
    pub(crate) boot: BootSource,
}

impl core::fmt::Debug for Device<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Device")
            .field("identity", &self.identity)
            .field("boot", &self.boot)
            .field("calibration", &self.store.live())
            .field("ppr", &self.shared.ppr().get())
            .finish()
    }
}

impl<'a> Device<'a> {
    /// Start building a Device around `shared`.
    pub fn builder(shared: &'a SharedState) -> DeviceBuilder<'a, Missing, Missing> {
        DeviceBuilder::new(shared)
    }

    /// Whether boot applied a stored record or persisted defaults.
    pub fn boot_source(&self) -> BootSource {
        self.boot
    }

    pub fn calibration(&self) -> Calibration {
        self.store.live()
    }

    pub fn ppr(&self) -> u32 {
        self.shared.ppr().get()
    }

    /// Current wall-clock timestamp in milliseconds.
    pub fn now_ms(&self) -> u64 {
        self.time.now_ms()
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Push one inbound byte; returns the response if it completed a line.
    pub fn feed(&mut self, byte: u8) -> Option<Response> {
        match self.assembler.push(byte)? {
            Assembled::Overflow => {
                tracing::debug!(
                    max_len = self.assembler.max_len(),
                    "line too long; discarding"
                );
                Some(Response::Err(ProtocolError::LineTooLong))
            }
            Assembled::Line(bytes) => self.handle_bytes(&bytes),
        }
    }

    /// Dispatch a raw line; non-UTF-8 input is an unknown command.
    pub fn handle_bytes(&mut self, line: &[u8]) -> Option<Response> {
        match std::str::from_utf8(line) {
            Ok(s) => self.handle_line(s),
            Err(_) => {
                tracing::debug!(len = line.len(), "non-UTF-8 line");
                Some(Response::Err(ProtocolError::UnknownCommand))
            }
        }
    }

    /// Dispatch one complete line. Empty lines get no response.
    pub fn handle_line(&mut self, line: &str) -> Option<Response> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let response = match Command::parse(line) {
            Ok(cmd) => {
                tracing::debug!(?cmd, "dispatch");
                self.execute(cmd)
            }
            Err(e) => Response::Err(e),
        };
        tracing::debug!(%response, "reply");
        Some(response)
    }

    /// Run a parsed command against the device state.
    pub fn execute(&mut self, cmd: Command) -> Response {
        match cmd {
            Command::Ping => Response::Pong,
            Command::Info => Response::Info {
                vendor: self.identity.vendor.clone(),
                device: self.identity.device.clone(),
                fw: self.identity.fw.clone(),
            },
            Command::Load => match self.sampler.read_mass() {
                Ok(r) => Response::Load {
                    mass_g: r.mass_g,
                    raw: r.raw,
                    ts: self.time.now_ms(),
                },
                Err(e) => {
                    tracing::debug!(error = %e, "LOAD? acquisition failed");
                    Response::Err(ProtocolError::from(&e))
                }
            },
            Command::Tare => match self.sampler.tare(&mut self.store) {
                Ok(raw) => {
                    tracing::info!(tare = raw, "tared");
                    Response::Tare
                }
                Err(e) => {
                    tracing::debug!(error = %e, "TARE acquisition failed");
                    Response::Err(ProtocolError::from(&e))
                }
            },
            Command::Speed => {
                let snap = self.shared.tach().snapshot();
                let ppr = self.shared.ppr().get();
                Response::Speed {
                    rpm: snap.rpm(ppr),
                    period_ms: snap.period_ms(),
                    pulses: snap.pulses_total,
                    ts: self.time.now_ms(),
                }
            }
            Command::SetTime(unix_ms) => {
                self.time.set_epoch(unix_ms);
                Response::SetTime
            }
            Command::SetCal(cal) => {
                self.store.apply(cal);
                tracing::info!(slope = cal.slope, tare = cal.tare, "calibration set");
                Response::SetCal
            }
            Command::Cal => Response::Cal(self.store.live()),
            Command::ResetCal => {
                self.store.reset_to_defaults();
                tracing::info!("calibration reset to defaults");
                Response::ResetCal
            }
            Command::SetPpr(ppr) => {
                self.shared.ppr().set(ppr);
                Response::SetPpr
            }
            Command::Ppr => Response::Ppr(self.shared.ppr().get()),
        }
    }
}
