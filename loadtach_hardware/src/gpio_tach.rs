//! Tachometer input on a Raspberry Pi GPIO line.
//!
//! rppal runs the callback on its interrupt thread, which plays the role of
//! the edge interrupt context: the callback must stay short and non-blocking.

use std::time::Instant;

use rppal::gpio::{Gpio, InputPin, Trigger};

use crate::error::{HwError, Result};

pub struct GpioTach {
    _pin: InputPin,
}

impl GpioTach {
    /// Call `on_edge` with a free-running microsecond timestamp on every rising edge.
    pub fn new<F>(pin: u8, pullup: bool, mut on_edge: F) -> Result<Self>
    where
        F: FnMut(u32) + Send + 'static,
    {
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        let pin = gpio.get(pin).map_err(|e| HwError::Gpio(e.to_string()))?;
        let mut pin = if pullup {
            pin.into_input_pullup()
        } else {
            pin.into_input()
        };
        let origin = Instant::now();
        pin.set_async_interrupt(Trigger::RisingEdge, move |_level| {
            on_edge(crate::util::edge_timestamp_us(origin));
        })
        .map_err(|e| HwError::Gpio(e.to_string()))?;
        tracing::info!(pin = pin.pin(), pullup, "tach interrupt armed");
        Ok(Self { _pin: pin })
    }
}
