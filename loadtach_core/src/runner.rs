use std::sync::atomic::{AtomicBool, Ordering};

use loadtach_traits::Transport;

use crate::device::Device;
use crate::error::Result as CoreResult;
use crate::protocol::{LINE_END, Response};

/// Counters from one `serve` session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServeStats {
    pub bytes_in: u64,
    pub responses: u64,
    pub errors: u64,
}

/// Write one response line with its terminator.
pub fn write_response(transport: &mut dyn Transport, response: &Response) -> CoreResult<()> {
    let line = format!("{response}{LINE_END}");
    transport
        .write_bytes(line.as_bytes())
        .map_err(|e| eyre::eyre!("write response: {e}"))
}

/// Pump bytes from `transport` into `device` until the transport closes or
/// `shutdown` is raised. Every response is written back as one line.
///
/// Returns an error only when a response cannot be written.
pub fn serve(
    device: &mut Device<'_>,
    transport: &mut dyn Transport,
    shutdown: &AtomicBool,
) -> CoreResult<ServeStats> {
    let mut stats = ServeStats::default();
    while !shutdown.load(Ordering::Relaxed) {
        let byte = match transport.read_byte() {
            Ok(Some(b)) => b,
            Ok(None) => continue,
            Err(e) => {
                tracing::info!(reason = %e, "transport closed");
                break;
            }
        };
        stats.bytes_in += 1;
        if let Some(response) = device.feed(byte) {
            stats.responses += 1;
            if response.is_error() {
                stats.errors += 1;
            }
            write_response(transport, &response)?;
        }
    }
    tracing::info!(
        bytes_in = stats.bytes_in,
        responses = stats.responses,
        errors = stats.errors,
        "serve loop finished"
    );
    Ok(stats)
}
