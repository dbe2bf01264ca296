//! AHT10 / AHT20 Temperature and Humidity Sensor Driver

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::error::DriverError;
use crate::registry::SensorDriver;
use crate::types::{ClimateReading, I2cAddress};

/// Calibrate / initialise command (AHT20 sequence, accepted by AHT10)
const CMD_INIT: [u8; 3] = [0xBE, 0x08, 0x00];

/// Trigger measurement command
const CMD_MEASURE: [u8; 3] = [0xAC, 0x33, 0x00];

/// Busy flag in the status byte
const STATUS_BUSY: u8 = 0x80;

/// Power-up settle time
const POWER_UP_MS: u32 = 40;

/// Wait after the init command
const INIT_MS: u32 = 20;

/// Wait after the discarded first conversion
const FIRST_CONVERSION_MS: u32 = 80;

/// Interval between status polls while converting
const POLL_INTERVAL_MS: u32 = 10;

/// Status polls before giving up (~100 ms, conversion takes ~80 ms)
const MAX_POLLS: u8 = 10;

/// AHT10 driver
#[derive(Clone, Copy, Debug)]
pub struct Aht10 {
    address: I2cAddress,
    last: Option<ClimateReading>,
}

impl Aht10 {
    /// Create a driver at the default address
    #[must_use]
    pub const fn new() -> Self {
        Self {
            address: I2cAddress::AHT10,
            last: None,
        }
    }

    /// Send the calibration command and discard the first conversion
    pub fn init<B: I2c + DelayNs>(&mut self, bus: &mut B) -> Result<(), DriverError> {
        bus.delay_ms(POWER_UP_MS);
        bus.write(self.address.addr(), &CMD_INIT)
            .map_err(DriverError::bus)?;
        bus.delay_ms(INIT_MS);

        // First conversion after power-up is unreliable
        if let Err(err) = self.measure(bus) {
            debug!("AHT10 discarded first conversion: {:?}", err);
        }
        self.last = None;
        bus.delay_ms(FIRST_CONVERSION_MS);

        Ok(())
    }

    /// Trigger a conversion and poll until it completes
    pub fn measure<B: I2c + DelayNs>(&mut self, bus: &mut B) -> Result<ClimateReading, DriverError> {
        bus.write(self.address.addr(), &CMD_MEASURE)
            .map_err(DriverError::bus)?;

        let mut rx = [0u8; 7];
        for _ in 0..MAX_POLLS {
            bus.delay_ms(POLL_INTERVAL_MS);
            bus.read(self.address.addr(), &mut rx)
                .map_err(DriverError::bus)?;
            if rx[0] & STATUS_BUSY == 0 {
                break;
            }
        }

        if rx[0] & STATUS_BUSY != 0 {
            return Err(DriverError::NotReady);
        }

        let reading = Self::convert(&rx);
        self.last = Some(reading);
        Ok(reading)
    }

    /// Convert a 7-byte measurement frame (status, 20-bit RH, 20-bit T, CRC)
    #[must_use]
    pub fn convert(rx: &[u8; 7]) -> ClimateReading {
        let raw_humidity = (u32::from(rx[1]) << 12)
            | (u32::from(rx[2]) << 4)
            | (u32::from(rx[3] & 0xF0) >> 4);
        let raw_temperature = (u32::from(rx[3] & 0x0F) << 16)
            | (u32::from(rx[4]) << 8)
            | u32::from(rx[5]);

        // Both results are bounded: RH <= 10000, T in -5000..=15000
        let humidity = ((u64::from(raw_humidity) * 10_000) >> 20) as u16;
        let temperature = (((u64::from(raw_temperature) * 20_000) >> 20) as i32 - 5_000) as i16;

        ClimateReading {
            temperature_centi: temperature,
            humidity_centi: humidity,
        }
    }

    /// Latest successful reading
    #[must_use]
    pub const fn last_reading(&self) -> Option<ClimateReading> {
        self.last
    }
}

impl Default for Aht10 {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: I2c + DelayNs> SensorDriver<B> for Aht10 {
    fn address(&self) -> I2cAddress {
        self.address
    }

    fn name(&self) -> &'static str {
        "AHT10"
    }

    fn init(&mut self, bus: &mut B) -> Result<(), DriverError> {
        Aht10::init(self, bus)
    }
}
