//! Hardware Abstraction Layer
//!
//! Binds the portable bus engine to STM32G474 pins and the embassy clock.
//! Nothing in here knows about I2C framing; that lives in [`crate::bus`].

pub mod gpio;
pub mod timer;
