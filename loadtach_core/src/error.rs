use thiserror::Error;

/// Runtime failures of the device's collaborators.
#[derive(Debug, Error, Clone)]
pub enum DeviceError {
    #[error("timeout waiting for load cell")]
    Timeout,
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("invalid calibration record: {0}")]
    Record(#[from] RecordError),
}

/// Why a persisted calibration record was rejected.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RecordError {
    #[error("bad magic {found:#010x}")]
    BadMagic { found: u32 },
    #[error("unsupported version {found:#010x}")]
    BadVersion { found: u32 },
    #[error("crc mismatch (stored {stored:#010x}, computed {computed:#010x})")]
    BadCrc { stored: u32, computed: u32 },
}

/// Errors reported on the wire as `ERR <code> <message>`.
///
/// `Display` yields the wire message.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("unknown_command")]
    UnknownCommand,
    #[error("line_too_long")]
    LineTooLong,
    #[error("HX711_timeout")]
    AcquisitionTimeout,
    #[error("acquisition_fault")]
    AcquisitionFault,
    #[error("missing_unix_ms")]
    MissingUnixMs,
    #[error("invalid_unix_ms")]
    InvalidUnixMs,
    #[error("missing_args")]
    MissingArgs,
    #[error("invalid_args")]
    InvalidArgs,
    #[error("missing_ppr")]
    MissingPpr,
    #[error("invalid_ppr")]
    InvalidPpr,
}

impl ProtocolError {
    /// Numeric wire code.
    pub const fn code(self) -> u16 {
        match self {
            Self::UnknownCommand => 10,
            Self::LineTooLong => 11,
            Self::AcquisitionTimeout => 20,
            Self::AcquisitionFault => 21,
            Self::MissingUnixMs | Self::InvalidUnixMs => 30,
            Self::MissingArgs | Self::InvalidArgs => 31,
            Self::MissingPpr => 32,
            Self::InvalidPpr => 33,
        }
    }
}

impl From<&DeviceError> for ProtocolError {
    fn from(e: &DeviceError) -> Self {
        match e {
            DeviceError::Timeout => Self::AcquisitionTimeout,
            _ => Self::AcquisitionFault,
        }
    }
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing load cell")]
    MissingLoadCell,
    #[error("missing storage")]
    MissingStorage,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
