//! Sensor Hub Firmware Library
//!
//! Core of a small sensor hub that talks to plug-in I2C sensors over two
//! GPIO lines. There is no I2C peripheral involved: the master is clocked
//! entirely in software, which lets the same code run against a line-level
//! simulator in host tests.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       POLL CYCLE                             │
//! │   scan  →  reconcile registry  →  read sensors  →  snapshot  │
//! ├─────────────────────────────────────────────────────────────┤
//! │          DRIVERS              │            DSP               │
//! │   MAX3010x  │  AHT10          │   moving average │ PPG beats │
//! ├─────────────────────────────────────────────────────────────┤
//! │                     BIT-BANGED I2C                           │
//! │   START/STOP │ byte I/O │ idle check │ recovery │ scanner    │
//! ├─────────────────────────────────────────────────────────────┤
//! │                 LINE DRIVER (SCL / SDA / OE)                 │
//! │        embassy GPIO on target, simulator on host             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Design Principles
//!
//! - **Single bus owner**: one poll loop owns the bus; no locking
//! - **Type-driven design**: addresses are validated once at the edge
//! - **No unsafe code**
//! - **Faults stay local**: a bad device or stuck bus never stops the loop

#![cfg_attr(feature = "embedded", no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

#[macro_use]
mod fmt;

// Re-export dependencies needed by applications (only in embedded mode)
#[cfg(feature = "embedded")]
pub use embassy_executor;
#[cfg(feature = "embedded")]
pub use embassy_stm32;
#[cfg(feature = "embedded")]
pub use embassy_sync;
#[cfg(feature = "embedded")]
pub use embassy_time;

/// Hardware Abstraction Layer
///
/// GPIO-backed line driver and timing helpers for the STM32G474.
#[cfg(feature = "embedded")]
pub mod hal;

/// Software I2C master
///
/// Line control, byte transfers, bus health and the address scanner.
pub mod bus;

/// Sensor drivers (MAX3010x, AHT10)
pub mod drivers;

/// Signal processing for the optical heart-rate sensor
pub mod dsp;

/// Error types
pub mod error;

/// Poll cycle and snapshot for the render consumer
pub mod poll;

/// Hot-plug sensor table
pub mod registry;

/// Shared types used across modules
pub mod types;

/// System configuration and constants
pub mod config;

/// Prelude module for common imports
pub mod prelude {
    //! Convenient re-exports for common types and traits.

    pub use crate::bus::{BitBangI2c, BusTiming, LineDriver, LineState};
    pub use crate::config::*;
    pub use crate::error::{BusError, DriverError, NackPhase};
    pub use crate::poll::{HubSnapshot, PollConfig, SensorHub};
    pub use crate::registry::{CapabilityMap, SensorDriver, SensorRegistry};
    pub use crate::types::*;

    // Common traits
    pub use embedded_hal::delay::DelayNs;
    pub use embedded_hal::i2c::I2c;

    // Embassy
    #[cfg(feature = "embedded")]
    pub use embassy_time::{Duration, Instant, Timer};
}
