//! Bit-level and transaction engine
//!
//! Generates START/STOP conditions, shifts bytes MSB first and samples the
//! ACK slot, then composes addressed write and read transactions from those
//! primitives. Every line transition is followed by a busy-wait through the
//! injected [`DelayNs`], so the engine itself has no notion of wall time.
//!
//! A missing ACK aborts the transaction with STOP and is reported to the
//! caller; nothing here retries.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{ErrorType, I2c, Operation, SevenBitAddress};

use super::lines::LineDriver;
use crate::config;
use crate::error::{BusError, NackPhase};
use crate::types::{Direction, I2cAddress};

/// Bus timing parameters in microseconds
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BusTiming {
    /// Hold time after every line transition (half an SCL period)
    pub half_period_us: u32,
    /// Settle time after re-initialising the lines before each scan probe
    pub probe_settle_us: u32,
    /// Delay between the two probes that confirm an address
    pub probe_confirm_us: u32,
}

impl BusTiming {
    /// Timing of the reference board (~100 kHz SCL)
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            half_period_us: config::I2C_HALF_PERIOD_US,
            probe_settle_us: config::SCAN_SETTLE_US,
            probe_confirm_us: config::SCAN_CONFIRM_US,
        }
    }

    /// Approximate SCL frequency in Hz
    #[must_use]
    pub const fn scl_hz(&self) -> u32 {
        if self.half_period_us == 0 {
            0
        } else {
            1_000_000 / (2 * self.half_period_us)
        }
    }
}

impl Default for BusTiming {
    fn default() -> Self {
        Self::standard()
    }
}

/// Software I2C master
///
/// Owns its line driver exclusively; nothing else may touch the lines while
/// the engine exists.
pub struct BitBangI2c<L, D> {
    pub(super) lines: L,
    pub(super) delay: D,
    pub(super) timing: BusTiming,
}

impl<L: LineDriver, D: DelayNs> BitBangI2c<L, D> {
    /// Create the engine with standard timing and release the bus
    pub fn new(lines: L, delay: D) -> Self {
        Self::with_timing(lines, delay, BusTiming::standard())
    }

    /// Create the engine with custom timing and release the bus
    pub fn with_timing(lines: L, delay: D, timing: BusTiming) -> Self {
        let mut bus = Self {
            lines,
            delay,
            timing,
        };
        bus.release();
        bus
    }

    /// Take the data line and drive both lines high
    pub fn release(&mut self) {
        self.lines.set_output_enable(true);
        self.lines.set_data(true);
        self.lines.set_clock(true);
        self.half_period();
    }

    /// Line driver (read-only)
    pub fn lines(&self) -> &L {
        &self.lines
    }

    /// Line driver (mutable)
    pub fn lines_mut(&mut self) -> &mut L {
        &mut self.lines
    }

    /// Active timing
    pub const fn timing(&self) -> BusTiming {
        self.timing
    }

    /// Give back the line driver and delay
    pub fn into_parts(self) -> (L, D) {
        (self.lines, self.delay)
    }

    /// START condition: data falls while clock is high, then clock low.
    ///
    /// Also serves as a repeated START when issued with the clock low.
    pub fn start(&mut self) {
        self.lines.set_data(true);
        self.lines.set_clock(true);
        self.half_period();
        self.lines.set_data(false);
        self.half_period();
        self.lines.set_clock(false);
    }

    /// STOP condition: data rises while clock is high
    pub fn stop(&mut self) {
        self.lines.set_data(false);
        self.lines.set_clock(true);
        self.half_period();
        self.lines.set_data(true);
        self.half_period();
    }

    /// Shift one byte out MSB first and sample the ACK slot.
    ///
    /// Returns `true` when the target pulled data low (ACK).
    pub fn write_byte(&mut self, byte: u8) -> bool {
        for bit in (0..8).rev() {
            self.lines.set_data((byte >> bit) & 1 != 0);
            self.half_period();
            self.lines.set_clock(true);
            self.half_period();
            self.lines.set_clock(false);
        }

        self.lines.set_output_enable(false);
        self.half_period();
        self.lines.set_clock(true);
        self.half_period();
        let acked = !self.lines.read_data();
        self.lines.set_clock(false);
        self.lines.set_output_enable(true);

        acked
    }

    /// Shift one byte in MSB first, then answer with ACK (`true`) or NACK
    pub fn read_byte(&mut self, ack: bool) -> u8 {
        let mut byte = 0u8;

        self.lines.set_output_enable(false);
        for _ in 0..8 {
            self.lines.set_clock(true);
            self.half_period();
            byte = (byte << 1) | u8::from(self.lines.read_data());
            self.lines.set_clock(false);
            self.half_period();
        }

        self.lines.set_data(!ack);
        self.lines.set_output_enable(true);
        self.half_period();
        self.lines.set_clock(true);
        self.half_period();
        self.lines.set_clock(false);
        self.lines.set_data(true);

        byte
    }

    /// Addressed write: START, address+W, each byte, STOP.
    ///
    /// The first NACK aborts with STOP. An empty `bytes` is a presence probe.
    pub fn write(&mut self, address: I2cAddress, bytes: &[u8]) -> Result<(), BusError> {
        self.send_header(address, Direction::Write)?;
        self.write_payload(address, bytes)?;
        self.stop();
        Ok(())
    }

    /// Addressed read: START, address+R, ACK every byte but the last, STOP.
    ///
    /// An empty `buffer` leaves the bus untouched: without a NACKed byte the
    /// target would keep SDA and the STOP could not be driven.
    pub fn read(&mut self, address: I2cAddress, buffer: &mut [u8]) -> Result<(), BusError> {
        if buffer.is_empty() {
            return Ok(());
        }
        self.send_header(address, Direction::Read)?;
        let last = buffer.len().saturating_sub(1);
        for (index, slot) in buffer.iter_mut().enumerate() {
            *slot = self.read_byte(index < last);
        }
        self.stop();
        Ok(())
    }

    /// Zero-length write; `true` when the address acknowledged
    pub fn probe(&mut self, address: I2cAddress) -> bool {
        self.write(address, &[]).is_ok()
    }

    /// START (or repeated START) followed by the address byte
    fn send_header(&mut self, address: I2cAddress, direction: Direction) -> Result<(), BusError> {
        self.start();
        if self.write_byte(address.header(direction)) {
            Ok(())
        } else {
            self.stop();
            Err(BusError::Nack {
                address,
                phase: NackPhase::Address,
            })
        }
    }

    fn write_payload(&mut self, address: I2cAddress, bytes: &[u8]) -> Result<(), BusError> {
        for (index, &byte) in bytes.iter().enumerate() {
            if !self.write_byte(byte) {
                self.stop();
                return Err(BusError::Nack {
                    address,
                    phase: NackPhase::Data(index),
                });
            }
        }
        Ok(())
    }

    pub(super) fn half_period(&mut self) {
        self.delay.delay_us(self.timing.half_period_us);
    }
}

/// Empty reads put nothing on the wire and are skipped
fn is_empty_read(operation: &Operation<'_>) -> bool {
    matches!(operation, Operation::Read(buffer) if buffer.is_empty())
}

fn direction_of(operation: &Operation<'_>) -> Direction {
    match operation {
        Operation::Write(_) => Direction::Write,
        Operation::Read(_) => Direction::Read,
    }
}

impl<L, D> ErrorType for BitBangI2c<L, D> {
    type Error = BusError;
}

impl<L: LineDriver, D: DelayNs> I2c<SevenBitAddress> for BitBangI2c<L, D> {
    fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let address = I2cAddress::new(address).ok_or(BusError::InvalidAddress(address))?;
        if operations.is_empty() {
            return Ok(());
        }

        let mut current: Option<Direction> = None;
        for index in 0..operations.len() {
            if is_empty_read(&operations[index]) {
                continue;
            }
            let direction = direction_of(&operations[index]);
            // The final byte of a run of reads is NACKed, even across operations.
            let ends_run = operations[index + 1..]
                .iter()
                .find(|next| !is_empty_read(next))
                .map_or(true, |next| direction_of(next) != direction);

            if current != Some(direction) {
                self.send_header(address, direction)?;
                current = Some(direction);
            }

            match &mut operations[index] {
                Operation::Write(bytes) => self.write_payload(address, *bytes)?,
                Operation::Read(buffer) => {
                    let len = buffer.len();
                    for (i, slot) in buffer.iter_mut().enumerate() {
                        let last = ends_run && i + 1 == len;
                        *slot = self.read_byte(!last);
                    }
                }
            }
        }

        if current.is_none() {
            return Ok(());
        }
        self.stop();
        Ok(())
    }
}

impl<L, D: DelayNs> DelayNs for BitBangI2c<L, D> {
    fn delay_ns(&mut self, ns: u32) {
        self.delay.delay_ns(ns);
    }

    fn delay_us(&mut self, us: u32) {
        self.delay.delay_us(us);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }
}
