//! Simulated tachometer: a thread standing in for the edge interrupt.
//!
//! Safety: each `SimulatedTach` owns exactly one thread, which is stopped and
//! joined when the handle is dropped.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

pub struct SimulatedTach {
    shutdown: Arc<AtomicBool>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl SimulatedTach {
    /// Emit a rising edge every `period`, passing the capture timestamp in
    /// microseconds (free-running, wraps at `u32::MAX`) to `on_edge`.
    pub fn spawn<F>(period: Duration, mut on_edge: F) -> Self
    where
        F: FnMut(u32) + Send + 'static,
    {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let join_handle = std::thread::spawn(move || {
            let origin = Instant::now();
            loop {
                std::thread::sleep(period);
                if shutdown_clone.load(Ordering::Relaxed) {
                    break;
                }
                let ts = crate::util::edge_timestamp_us(origin);
                on_edge(ts);
            }
            tracing::trace!("simulated tach thread exiting");
        });
        Self {
            shutdown,
            join_handle: Some(join_handle),
        }
    }

    /// Edge period for a shaft turning at `rpm` with `ppr` pulses per revolution.
    /// `None` when the shaft is stopped or the inputs are degenerate.
    pub fn period_for_rpm(rpm: f32, ppr: u32) -> Option<Duration> {
        if !(rpm.is_finite() && rpm > 0.0) || ppr == 0 {
            return None;
        }
        let secs = 60.0 / (f64::from(rpm) * f64::from(ppr));
        Duration::try_from_secs_f64(secs).ok()
    }
}

impl Drop for SimulatedTach {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.join_handle.take()
            && handle.join().is_err()
        {
            tracing::warn!("simulated tach thread panicked during shutdown");
        }
    }
}
