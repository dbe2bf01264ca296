//! GPIO Abstractions
//!
//! Open-drain pin pair for the software I2C master plus the status LED.

use embassy_stm32::gpio::{Output, OutputOpenDrain};

use crate::bus::{LineDriver, LineState};

/// SCL/SDA pair on open-drain outputs
///
/// Writing high releases the line to the pull-up, so the "output enable"
/// flag is modelled by driving SDA high while the master is listening.
pub struct OpenDrainLines<'d> {
    scl: OutputOpenDrain<'d>,
    sda: OutputOpenDrain<'d>,
    state: LineState,
}

impl<'d> OpenDrainLines<'d> {
    /// Take both pins and release them
    pub fn new(scl: OutputOpenDrain<'d>, sda: OutputOpenDrain<'d>) -> Self {
        let mut lines = Self {
            scl,
            sda,
            state: LineState::released(),
        };
        lines.scl.set_high();
        lines.sda.set_high();
        lines
    }

    fn drive_sda(&mut self) {
        if !self.state.output_enable() || self.state.data() {
            self.sda.set_high();
        } else {
            self.sda.set_low();
        }
    }
}

impl LineDriver for OpenDrainLines<'_> {
    fn set_clock(&mut self, high: bool) {
        if high {
            self.scl.set_high();
        } else {
            self.scl.set_low();
        }
        self.state = self.state.with_clock(high);
    }

    fn set_data(&mut self, high: bool) {
        self.state = self.state.with_data(high);
        self.drive_sda();
    }

    fn set_output_enable(&mut self, enabled: bool) {
        self.state = self.state.with_output_enable(enabled);
        self.drive_sda();
    }

    fn read_data(&mut self) -> bool {
        self.sda.is_high()
    }

    fn state(&self) -> LineState {
        self.state
    }
}

/// Status LED state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LedState {
    /// LED is off
    #[default]
    Off,
    /// LED is on
    On,
}

/// Heartbeat LED
pub struct StatusLed<'d> {
    pin: Output<'d>,
    state: LedState,
}

impl<'d> StatusLed<'d> {
    /// Create a new status LED (initially off)
    #[must_use]
    pub fn new(mut pin: Output<'d>) -> Self {
        pin.set_low();
        Self {
            pin,
            state: LedState::Off,
        }
    }

    /// Drive the LED on or off
    pub fn show(&mut self, on: bool) {
        if on {
            self.pin.set_high();
            self.state = LedState::On;
        } else {
            self.pin.set_low();
            self.state = LedState::Off;
        }
    }

    /// Toggle LED state
    pub fn toggle(&mut self) {
        self.show(self.state == LedState::Off);
    }
}
