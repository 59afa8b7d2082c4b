use std::time::Duration;
use tracing::trace;

use crate::error::{HwError, Result};
use crate::util::wait_until_low_with_timeout;

/// Bit-banged HX711 24-bit ADC.
pub struct Hx711 {
    dt: rppal::gpio::InputPin,
    sck: rppal::gpio::OutputPin,
    gain_pulses: u8, // 25, 26, 27 based on gain/channel
}

impl Hx711 {
    pub fn new(
        dt_pin: rppal::gpio::InputPin,
        mut sck_pin: rppal::gpio::OutputPin,
        gain_pulses: u8,
    ) -> Result<Self> {
        if !(25..=27).contains(&gain_pulses) {
            return Err(HwError::Gpio(format!(
                "hx711 gain pulses must be 25..=27, got {gain_pulses}"
            )));
        }
        sck_pin.set_low(); // clock idle low
        Ok(Self {
            dt: dt_pin,
            sck: sck_pin,
            gain_pulses,
        })
    }

    pub fn read_with_timeout(&mut self, timeout: Duration) -> Result<i32> {
        // DT low signals a conversion is ready
        let dt = &self.dt;
        wait_until_low_with_timeout(|| dt.is_high(), timeout, Duration::from_micros(200))
            .map_err(|_| HwError::Timeout)?;

        let mut value: i32 = 0;
        for _ in 0..24 {
            self.sck.set_high();
            spin_delay_100ns();
            value = (value << 1) | i32::from(self.dt.is_high());
            self.sck.set_low();
            spin_delay_100ns();
        }

        // Remaining pulses select gain/channel for the next conversion;
        // 24 data bits are already clocked out.
        for _ in 24..self.gain_pulses {
            self.sck.set_high();
            spin_delay_100ns();
            self.sck.set_low();
            spin_delay_100ns();
        }

        trace!(raw = sign_extend_24(value), "hx711 raw read");
        Ok(sign_extend_24(value))
    }
}

#[inline]
fn sign_extend_24(value: i32) -> i32 {
    (value << 8) >> 8
}

#[inline(always)]
fn spin_delay_100ns() {
    std::hint::spin_loop();
}
