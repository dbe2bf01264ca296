//! Shared types used across the sensor hub firmware
//!
//! Addresses are validated once, at construction, so every layer above the
//! bit-level engine can rely on them being usable 7-bit targets.

use core::fmt;

/// 7-bit I2C target address in the usable range `1..=126`
///
/// Address 0 (general call) and 127 are reserved and never probed, so an
/// `I2cAddress` can never hold them.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct I2cAddress(u8);

impl I2cAddress {
    /// Lowest address the scanner probes
    pub const MIN: u8 = 1;

    /// Highest address the scanner probes
    pub const MAX: u8 = 126;

    /// Number of addresses in `MIN..=MAX`
    pub const COUNT: usize = (Self::MAX - Self::MIN + 1) as usize;

    /// BH1750 ambient light sensor (ADDR pin low)
    pub const BH1750: Self = Self(0x23);

    /// TCS34725 color sensor
    pub const TCS34725: Self = Self(0x29);

    /// AHT10/AHT20 temperature and humidity sensor
    pub const AHT10: Self = Self(0x38);

    /// MAX30102/MAX30105 pulse oximeter and heart-rate sensor
    pub const MAX3010X: Self = Self(0x57);

    /// Create from a 7-bit address, returns None for reserved addresses
    #[must_use]
    pub const fn new(addr: u8) -> Option<Self> {
        if addr >= Self::MIN && addr <= Self::MAX {
            Some(Self(addr))
        } else {
            None
        }
    }

    /// Get the 7-bit address
    #[must_use]
    pub const fn addr(self) -> u8 {
        self.0
    }

    /// Address byte sent after START for the given direction
    #[must_use]
    pub const fn header(self, direction: Direction) -> u8 {
        (self.0 << 1) | direction.rw_bit()
    }

    /// Iterate over every probeable address in ascending order
    pub fn all() -> impl Iterator<Item = Self> {
        (Self::MIN..=Self::MAX).map(Self)
    }
}

impl fmt::Debug for I2cAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "I2cAddress(0x{:02X})", self.0)
    }
}

impl fmt::Display for I2cAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X}", self.0)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for I2cAddress {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "0x{:02X}", self.0);
    }
}

impl TryFrom<u8> for I2cAddress {
    type Error = u8;

    fn try_from(addr: u8) -> Result<Self, Self::Error> {
        Self::new(addr).ok_or(addr)
    }
}

/// Transfer direction encoded in the R/W bit of the address byte
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Master writes to the target (R/W = 0)
    Write,
    /// Master reads from the target (R/W = 1)
    Read,
}

impl Direction {
    /// Value of the R/W bit
    #[must_use]
    pub const fn rw_bit(self) -> u8 {
        match self {
            Self::Write => 0,
            Self::Read => 1,
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Direction {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Write => defmt::write!(f, "W"),
            Self::Read => defmt::write!(f, "R"),
        }
    }
}

/// One heart-rate sensor FIFO sample (18-bit counts)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PpgReading {
    /// Red LED channel
    pub red: u32,
    /// Infrared LED channel
    pub ir: u32,
}

impl PpgReading {
    /// Mask applied to the 24-bit FIFO words
    pub const SAMPLE_MASK: u32 = 0x3_FFFF;

    /// Decode one FIFO slot (`RED[23:0]`, `IR[23:0]`, big endian)
    #[must_use]
    pub fn from_fifo(raw: &[u8; 6]) -> Self {
        let word = |b: &[u8]| {
            ((u32::from(b[0]) << 16) | (u32::from(b[1]) << 8) | u32::from(b[2])) & Self::SAMPLE_MASK
        };
        Self {
            red: word(&raw[0..3]),
            ir: word(&raw[3..6]),
        }
    }
}

/// Temperature and humidity reading in hundredths
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClimateReading {
    /// Temperature in 0.01 °C
    pub temperature_centi: i16,
    /// Relative humidity in 0.01 %RH
    pub humidity_centi: u16,
}

impl ClimateReading {
    /// Whole degrees Celsius (truncated toward zero)
    #[must_use]
    pub const fn celsius(&self) -> i16 {
        self.temperature_centi / 100
    }

    /// Whole percent relative humidity (truncated)
    #[must_use]
    pub const fn humidity_percent(&self) -> u16 {
        self.humidity_centi / 100
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for ClimateReading {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "{}.{:02}C {}.{:02}%RH",
            self.temperature_centi / 100,
            (self.temperature_centi % 100).unsigned_abs(),
            self.humidity_centi / 100,
            self.humidity_centi % 100
        );
    }
}
