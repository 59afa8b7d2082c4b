//! Byte-stream transports.

use std::collections::VecDeque;
use std::io::{Read, Write};
use std::time::Duration;

use crossbeam_channel as xch;
use loadtach_traits::{BoxError, Transport};

use crate::error::HwError;

/// Transport over any blocking reader/writer pair.
///
/// A background thread owns the reader and forwards bytes through a bounded
/// channel, so `read_byte` never blocks longer than `poll`. The thread exits
/// on EOF, on a read error, or once the transport is dropped.
pub struct StreamTransport<W: Write> {
    rx: xch::Receiver<u8>,
    writer: W,
    poll: Duration,
}

impl<W: Write> StreamTransport<W> {
    pub fn spawn<R: Read + Send + 'static>(mut reader: R, writer: W, poll: Duration) -> Self {
        let (tx, rx) = xch::bounded(1024);
        std::thread::spawn(move || {
            let mut chunk = [0u8; 256];
            loop {
                match reader.read(&mut chunk) {
                    Ok(0) => {
                        tracing::debug!("transport reader reached EOF");
                        break;
                    }
                    Ok(n) => {
                        if chunk[..n].iter().any(|b| tx.send(*b).is_err()) {
                            tracing::debug!("transport consumer gone, reader exiting");
                            break;
                        }
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        tracing::warn!(error = %e, "transport read failed");
                        break;
                    }
                }
            }
        });
        Self { rx, writer, poll }
    }
}

impl StreamTransport<std::io::Stdout> {
    /// Host link over the process's stdin/stdout.
    pub fn stdio(poll: Duration) -> Self {
        Self::spawn(std::io::stdin(), std::io::stdout(), poll)
    }
}

impl<W: Write> Transport for StreamTransport<W> {
    fn read_byte(&mut self) -> Result<Option<u8>, BoxError> {
        match self.rx.recv_timeout(self.poll) {
            Ok(b) => Ok(Some(b)),
            Err(xch::RecvTimeoutError::Timeout) => Ok(None),
            Err(xch::RecvTimeoutError::Disconnected) => Err(Box::new(HwError::Closed)),
        }
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), BoxError> {
        self.writer.write_all(bytes).map_err(HwError::from)?;
        self.writer.flush().map_err(HwError::from)?;
        Ok(())
    }
}

/// In-memory transport: replays a fixed input, then reports closed.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    input: VecDeque<u8>,
    output: Vec<u8>,
}

impl ScriptedTransport {
    pub fn new(input: impl AsRef<[u8]>) -> Self {
        Self {
            input: input.as_ref().iter().copied().collect(),
            output: Vec::new(),
        }
    }

    pub fn output(&self) -> &[u8] {
        &self.output
    }

    /// Output split into lines with the `\r\n` terminators removed.
    pub fn output_lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.output)
            .split("\r\n")
            .filter(|l| !l.is_empty())
            .map(str::to_owned)
            .collect()
    }
}

impl Transport for ScriptedTransport {
    fn read_byte(&mut self) -> Result<Option<u8>, BoxError> {
        self.input
            .pop_front()
            .map(Some)
            .ok_or_else(|| Box::new(HwError::Closed) as BoxError)
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), BoxError> {
        self.output.extend_from_slice(bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_transport_drains_then_closes() {
        let input: &'static [u8] = b"AB";
        let mut t = StreamTransport::spawn(input, Vec::new(), Duration::from_millis(200));
        let mut got = Vec::new();
        loop {
            match t.read_byte() {
                Ok(Some(b)) => got.push(b),
                Ok(None) => continue,
                Err(e) => {
                    assert!(e.to_string().contains("closed"));
                    break;
                }
            }
        }
        assert_eq!(got, b"AB");
        t.write_bytes(b"OK\r\n").unwrap();
        assert_eq!(t.writer, b"OK\r\n");
    }

    #[test]
    fn scripted_transport_collects_lines() {
        let mut t = ScriptedTransport::new("x");
        assert_eq!(t.read_byte().unwrap(), Some(b'x'));
        assert!(t.read_byte().is_err());
        t.write_bytes(b"OK PONG\r\nERR 10 unknown_command\r\n").unwrap();
        assert_eq!(t.output_lines(), vec!["OK PONG", "ERR 10 unknown_command"]);
    }
}
