//! Error types for the bus engine and sensor drivers
//!
//! All errors are plain `Copy` enums so they can be logged, stored in
//! reports and returned from `no_std` code without allocation.

use core::fmt;

use embedded_hal::i2c::{self, ErrorKind, NoAcknowledgeSource};

use crate::types::I2cAddress;

/// Byte of a transaction that was not acknowledged
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NackPhase {
    /// The address byte sent after START
    Address,
    /// A data byte, by index within the transfer
    Data(usize),
}

/// Errors from the bit-banged bus
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BusError {
    /// Idle check failed: data or clock not high with the lines released
    NotIdle,
    /// Address outside `1..=126`
    InvalidAddress(u8),
    /// Target did not acknowledge; the transaction was aborted with STOP
    Nack {
        /// Target address of the aborted transaction
        address: I2cAddress,
        /// Which byte went unacknowledged
        phase: NackPhase,
    },
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotIdle => write!(f, "I2C bus not idle (floating or stuck)"),
            Self::InvalidAddress(addr) => write!(f, "invalid I2C address 0x{addr:02X}"),
            Self::Nack {
                address,
                phase: NackPhase::Address,
            } => write!(f, "no ACK from {address} on address byte"),
            Self::Nack {
                address,
                phase: NackPhase::Data(index),
            } => write!(f, "no ACK from {address} on data byte {index}"),
        }
    }
}

impl i2c::Error for BusError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::NotIdle => ErrorKind::Bus,
            Self::InvalidAddress(_) => ErrorKind::Other,
            Self::Nack {
                phase: NackPhase::Address,
                ..
            } => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address),
            Self::Nack {
                phase: NackPhase::Data(_),
                ..
            } => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data),
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for BusError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::NotIdle => defmt::write!(f, "NotIdle"),
            Self::InvalidAddress(addr) => defmt::write!(f, "InvalidAddress(0x{:02X})", addr),
            Self::Nack {
                address,
                phase: NackPhase::Address,
            } => defmt::write!(f, "Nack({}, addr)", address),
            Self::Nack {
                address,
                phase: NackPhase::Data(index),
            } => defmt::write!(f, "Nack({}, data {})", address, index),
        }
    }
}

/// Errors from sensor drivers
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverError {
    /// Underlying bus transfer failed
    Bus(ErrorKind),
    /// Device still busy after the polling budget was spent
    NotReady,
}

impl DriverError {
    /// Convert any `embedded-hal` I2C error
    pub fn bus<E: i2c::Error>(err: E) -> Self {
        Self::Bus(err.kind())
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus(kind) => write!(f, "bus error: {kind}"),
            Self::NotReady => write!(f, "device not ready"),
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for DriverError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Bus(kind) => defmt::write!(f, "Bus({})", kind),
            Self::NotReady => defmt::write!(f, "NotReady"),
        }
    }
}
