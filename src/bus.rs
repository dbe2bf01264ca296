//! Bit-banged I2C bus
//!
//! Everything above the line driver is hardware independent:
//! - `lines`: the line driver contract and its mirror register
//! - `bitbang`: START/STOP, byte shifting and addressed transactions
//! - `health`: idle detection and stuck-bus recovery
//! - `scan`: debounced probing of the 7-bit address space

pub mod bitbang;
pub mod health;
pub mod lines;
pub mod scan;

pub use bitbang::{BitBangI2c, BusTiming};
pub use lines::{LineDriver, LineState};
