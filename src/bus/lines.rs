//! Line Driver contract
//!
//! The bit-level engine never touches pins directly. It drives three logical
//! lines through a [`LineDriver`], which keeps the last written values in a
//! [`LineState`] mirror laid out like the SoC's I2C write register.

/// Mirror of the I2C write register
///
/// Bit layout: clock = bit 0, output-enable = bit 1, data = bit 2.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LineState(u8);

impl LineState {
    /// Clock (SCL) bit offset
    pub const SCL_OFFSET: u8 = 0;
    /// Output-enable bit offset (data driven by the master when set)
    pub const OE_OFFSET: u8 = 1;
    /// Data (SDA) bit offset
    pub const SDA_OFFSET: u8 = 2;

    /// Register value after boot: all bits clear
    #[must_use]
    pub const fn new() -> Self {
        Self(0)
    }

    /// Lines released: clock high, data high, master driving data
    #[must_use]
    pub const fn released() -> Self {
        Self((1 << Self::SCL_OFFSET) | (1 << Self::OE_OFFSET) | (1 << Self::SDA_OFFSET))
    }

    /// Build from a raw register word
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & 0b111)
    }

    /// Raw register word
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Clock bit
    #[must_use]
    pub const fn clock(self) -> bool {
        self.bit(Self::SCL_OFFSET)
    }

    /// Data bit (the value driven while output-enable is set)
    #[must_use]
    pub const fn data(self) -> bool {
        self.bit(Self::SDA_OFFSET)
    }

    /// Output-enable bit
    #[must_use]
    pub const fn output_enable(self) -> bool {
        self.bit(Self::OE_OFFSET)
    }

    /// Copy with the clock bit replaced
    #[must_use]
    pub const fn with_clock(self, high: bool) -> Self {
        self.with_bit(Self::SCL_OFFSET, high)
    }

    /// Copy with the data bit replaced
    #[must_use]
    pub const fn with_data(self, high: bool) -> Self {
        self.with_bit(Self::SDA_OFFSET, high)
    }

    /// Copy with the output-enable bit replaced
    #[must_use]
    pub const fn with_output_enable(self, enabled: bool) -> Self {
        self.with_bit(Self::OE_OFFSET, enabled)
    }

    const fn bit(self, offset: u8) -> bool {
        (self.0 >> offset) & 1 != 0
    }

    const fn with_bit(self, offset: u8, set: bool) -> Self {
        if set {
            Self(self.0 | (1 << offset))
        } else {
            Self(self.0 & !(1 << offset))
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for LineState {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "SCL={} SDA={} OE={}",
            self.clock(),
            self.data(),
            self.output_enable()
        );
    }
}

/// Access to the clock, data and output-enable lines
///
/// Implementations must update their [`LineState`] mirror on every call so
/// that `state()` always reflects the last written values. Only the data
/// line can be sampled; the clock is observed through the mirror.
pub trait LineDriver {
    /// Drive the clock line
    fn set_clock(&mut self, high: bool);

    /// Set the data value driven while output-enable is set
    fn set_data(&mut self, high: bool);

    /// Take (`true`) or release (`false`) the data line
    fn set_output_enable(&mut self, enabled: bool);

    /// Sample the data line as seen on the bus
    fn read_data(&mut self) -> bool;

    /// Current mirror register
    fn state(&self) -> LineState;
}

impl<T: LineDriver + ?Sized> LineDriver for &mut T {
    fn set_clock(&mut self, high: bool) {
        (**self).set_clock(high);
    }

    fn set_data(&mut self, high: bool) {
        (**self).set_data(high);
    }

    fn set_output_enable(&mut self, enabled: bool) {
        (**self).set_output_enable(enabled);
    }

    fn read_data(&mut self) -> bool {
        (**self).read_data()
    }

    fn state(&self) -> LineState {
        (**self).state()
    }
}
