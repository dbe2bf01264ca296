//! Bus health check and stuck-bus recovery
//!
//! Neither operation is invoked automatically: callers decide whether a
//! failed idle check warrants a recovery attempt.

use embedded_hal::delay::DelayNs;

use super::bitbang::BitBangI2c;
use super::lines::LineDriver;
use crate::config::RECOVERY_CLOCK_PULSES;

impl<L: LineDriver, D: DelayNs> BitBangI2c<L, D> {
    /// Check that the bus is idle.
    ///
    /// Releases data, samples it after a half-period and combines it with
    /// the clock bit of the mirror register (the clock line itself cannot be
    /// sampled). The data line is taken back before returning.
    pub fn is_idle(&mut self) -> bool {
        self.lines.set_output_enable(false);
        self.half_period();

        let data = self.lines.read_data();
        let clock = self.lines.state().clock();

        self.lines.set_output_enable(true);

        data && clock
    }

    /// Free a target stuck mid-byte.
    ///
    /// Releases data and clocks nine pulses so a target holding data low can
    /// finish its byte, then takes data back low with the clock high and
    /// raises it, leaving the bus in STOP/idle. Best effort: the outcome is
    /// observed with [`is_idle`](Self::is_idle).
    pub fn recover_bus(&mut self) {
        warn!("I2C bus recovery: {} clock pulses + STOP", RECOVERY_CLOCK_PULSES);

        self.lines.set_output_enable(false);
        for _ in 0..RECOVERY_CLOCK_PULSES {
            self.lines.set_clock(false);
            self.half_period();
            self.lines.set_clock(true);
            self.half_period();
        }

        self.lines.set_data(false);
        self.lines.set_output_enable(true);
        self.half_period();
        self.lines.set_clock(true);
        self.half_period();
        self.lines.set_data(true);
        self.half_period();
    }
}
