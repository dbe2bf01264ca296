//! Sensor Drivers
//!
//! Register-level drivers for the parts the hub knows how to bring up.
//! Each driver is generic over `embedded_hal::i2c::I2c`, so it runs on the
//! bit-banged master on target and on the line simulator in host tests.

pub mod aht10;
pub mod max3010x;
