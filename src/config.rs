//! System configuration and hardware constants
//!
//! Compile-time constants for the bus timing, the sensor table, the poll
//! cycle and the heart-rate pipeline. Pin mappings of the reference board
//! are centralized here as well.

use crate::types::I2cAddress;

/// Half of one SCL period in microseconds (~100 kHz bus)
pub const I2C_HALF_PERIOD_US: u32 = 5;

/// Settle time after re-initialising the lines before each scan probe
pub const SCAN_SETTLE_US: u32 = 50;

/// Delay before the confirming probe of an acknowledged address
pub const SCAN_CONFIRM_US: u32 = 10;

/// Consecutive ACKs required before the scanner accepts an address
pub const SCAN_PROBE_COUNT: u8 = 2;

/// Clock pulses issued by the stuck-bus recovery sequence
pub const RECOVERY_CLOCK_PULSES: u8 = 9;

/// Number of slots in the sensor table
pub const SENSOR_SLOTS: usize = 16;

/// Maximum number of drivers in the capability map
pub const MAX_DRIVERS: usize = 8;

/// Poll cycle period (scan, read, process, publish)
pub const POLL_PERIOD_MS: u64 = 100;

/// Samples taken per heart-rate burst in one poll cycle
pub const HEART_RATE_BURST_SAMPLES: u16 = 100;

/// Spacing of heart-rate samples within a burst (~100 Hz)
pub const HEART_RATE_SAMPLE_PERIOD_MS: u32 = 10;

/// PPG smoothing window (samples)
pub const PPG_SMOOTHING_WINDOW: usize = 8;

/// PPG RR-interval averaging window (beats)
pub const PPG_RR_WINDOW: usize = 5;

/// AC level that starts a peak
pub const PPG_PEAK_THRESHOLD: i32 = 800;

/// Hysteresis below the threshold that ends a peak
pub const PPG_PEAK_HYSTERESIS: i32 = 300;

/// Shortest plausible RR interval in ms (200 bpm)
pub const PPG_RR_MIN_MS: u32 = 300;

/// Longest plausible RR interval in ms (30 bpm)
pub const PPG_RR_MAX_MS: u32 = 2000;

/// Lowest BPM that is committed
pub const PPG_BPM_MIN: u16 = 30;

/// Highest BPM that is committed
pub const PPG_BPM_MAX: u16 = 200;

/// Raw IR count above which a finger is considered present
pub const PPG_FINGER_THRESHOLD: u32 = 50_000;

/// Known sensor addresses
pub mod addresses {
    //! 7-bit addresses of the sensors the firmware knows about

    use super::I2cAddress;

    /// BH1750 ambient light sensor
    pub const BH1750: I2cAddress = I2cAddress::BH1750;

    /// TCS34725 color sensor
    pub const TCS34725: I2cAddress = I2cAddress::TCS34725;

    /// AHT10 temperature / humidity sensor
    pub const AHT10: I2cAddress = I2cAddress::AHT10;

    /// MAX3010x heart-rate sensor
    pub const MAX3010X: I2cAddress = I2cAddress::MAX3010X;
}

/// Pin assignments for GPIO
pub mod pins {
    //! GPIO pin assignments of the reference board

    /// Status LED (directly on MCU)
    pub const LED_STATUS: &str = "PA5";

    /// Bit-banged I2C clock
    pub const I2C_SCL: &str = "PB8";

    /// Bit-banged I2C data
    pub const I2C_SDA: &str = "PB9";
}
