//! Line-oriented command protocol.
//!
//! - [`LineAssembler`] turns the inbound byte stream into complete lines.
//! - [`tokenize`] splits a line into borrowed, whitespace-delimited tokens.
//! - [`Command::parse`] validates a line against the command table.
//! - [`Response`] renders the single reply line (without terminator).

use core::fmt;

use crate::calibration::Calibration;
use crate::error::ProtocolError;

/// Appended to every response line.
pub const LINE_END: &str = "\r\n";
/// Default longest line in bytes, terminator excluded.
pub const DEFAULT_MAX_LINE_LEN: usize = 127;

// ── Line assembly ────────────────────────────────────────────────────────────

/// What a byte completed, if anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assembled {
    /// Bytes of a full line, terminator and `\r` removed.
    Line(Vec<u8>),
    /// The buffer overflowed; the rest of this line will be discarded.
    Overflow,
}

/// Accumulates bytes until `\n`.
///
/// `\r` is dropped wherever it appears. After an overflow every byte up to
/// and including the next `\n` is discarded silently.
#[derive(Debug)]
pub struct LineAssembler {
    buf: Vec<u8>,
    max_len: usize,
    discarding: bool,
}

impl LineAssembler {
    pub fn new(max_len: usize) -> Self {
        Self {
            buf: Vec::with_capacity(max_len),
            max_len,
            discarding: false,
        }
    }

    pub fn push(&mut self, byte: u8) -> Option<Assembled> {
        match byte {
            b'\r' => None,
            b'\n' if self.discarding => {
                self.discarding = false;
                None
            }
            b'\n' => Some(Assembled::Line(std::mem::take(&mut self.buf))),
            _ if self.discarding => None,
            _ if self.buf.len() >= self.max_len => {
                self.buf.clear();
                self.discarding = true;
                Some(Assembled::Overflow)
            }
            _ => {
                self.buf.push(byte);
                None
            }
        }
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }
}

impl Default for LineAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINE_LEN)
    }
}

// ── Parsing ──────────────────────────────────────────────────────────────────

/// Whitespace-delimited tokens of `line`, borrowed from it.
pub fn tokenize(line: &str) -> impl Iterator<Item = &str> {
    line.split_ascii_whitespace()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Ping,
    Info,
    Load,
    Tare,
    Speed,
    SetTime(u64),
    SetCal(Calibration),
    Cal,
    ResetCal,
    SetPpr(u32),
    Ppr,
}

impl Command {
    /// Parse a trimmed, non-empty line. Extra arguments are ignored.
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let mut tokens = tokenize(line);
        let name = tokens.next().ok_or(ProtocolError::UnknownCommand)?;
        let is = |s: &str| name.eq_ignore_ascii_case(s);

        if is("PING") {
            Ok(Self::Ping)
        } else if is("INFO") {
            Ok(Self::Info)
        } else if is("LOAD?") {
            Ok(Self::Load)
        } else if is("TARE") {
            Ok(Self::Tare)
        } else if is("SPEED?") {
            Ok(Self::Speed)
        } else if is("SETTIME") {
            let arg = tokens.next().ok_or(ProtocolError::MissingUnixMs)?;
            arg.parse::<u64>()
                .map(Self::SetTime)
                .map_err(|_| ProtocolError::InvalidUnixMs)
        } else if is("SETCAL") {
            let (Some(slope), Some(tare)) = (tokens.next(), tokens.next()) else {
                return Err(ProtocolError::MissingArgs);
            };
            let slope = slope
                .parse::<f32>()
                .ok()
                .filter(|s| s.is_finite())
                .ok_or(ProtocolError::InvalidArgs)?;
            let tare = tare
                .parse::<i32>()
                .map_err(|_| ProtocolError::InvalidArgs)?;
            Ok(Self::SetCal(Calibration::new(slope, tare)))
        } else if is("CAL?") {
            Ok(Self::Cal)
        } else if is("RESETCAL") {
            Ok(Self::ResetCal)
        } else if is("SETPPR") {
            let arg = tokens.next().ok_or(ProtocolError::MissingPpr)?;
            match arg.parse::<u32>() {
                Ok(ppr) if ppr > 0 => Ok(Self::SetPpr(ppr)),
                _ => Err(ProtocolError::InvalidPpr),
            }
        } else if is("PPR?") {
            Ok(Self::Ppr)
        } else {
            Err(ProtocolError::UnknownCommand)
        }
    }
}

// ── Responses ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Pong,
    Info {
        vendor: String,
        device: String,
        fw: String,
    },
    Load {
        mass_g: f32,
        raw: i32,
        ts: u64,
    },
    Tare,
    Speed {
        rpm: f32,
        period_ms: f32,
        pulses: u32,
        ts: u64,
    },
    SetTime,
    SetCal,
    Cal(Calibration),
    ResetCal,
    SetPpr,
    Ppr(u32),
    Err(ProtocolError),
}

impl Response {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Err(_))
    }
}

impl From<ProtocolError> for Response {
    fn from(e: ProtocolError) -> Self {
        Self::Err(e)
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pong => f.write_str("OK PONG"),
            Self::Info { vendor, device, fw } => {
                write!(f, "OK INFO vendor={vendor} device={device} fw={fw}")
            }
            Self::Load { mass_g, raw, ts } => {
                write!(f, "OK LOAD mass_g={mass_g:.3} raw={raw} ts={ts}")
            }
            Self::Tare => f.write_str("OK TARE"),
            Self::Speed {
                rpm,
                period_ms,
                pulses,
                ts,
            } => write!(
                f,
                "OK SPEED rpm={rpm:.2} period_ms={period_ms:.3} pulses={pulses} ts={ts}"
            ),
            Self::SetTime => f.write_str("OK SETTIME"),
            Self::SetCal => f.write_str("OK SETCAL"),
            Self::Cal(c) => write!(f, "OK CAL slope={:.9} tare={}", c.slope, c.tare),
            Self::ResetCal => f.write_str("OK RESETCAL"),
            Self::SetPpr => f.write_str("OK SETPPR"),
            Self::Ppr(p) => write!(f, "OK PPR ppr={p}"),
            Self::Err(e) => write!(f, "ERR {} {e}", e.code()),
        }
    }
}
