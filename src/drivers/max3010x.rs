//! MAX3010x Pulse Oximeter / Heart-Rate Sensor Driver
//!
//! Configures the sensor for SpO2 mode (red + IR LEDs), reads FIFO samples
//! and feeds the IR channel into the PPG pipeline. The pipeline state lives
//! for as long as the driver does; re-initialising the device after a
//! hot-plug does not reset it.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::dsp::ppg::{Beat, PpgPipeline};
use crate::error::DriverError;
use crate::registry::SensorDriver;
use crate::types::{I2cAddress, PpgReading};

/// MAX3010x register addresses
mod reg {
    pub const FIFO_DATA: u8 = 0x07;
    pub const MODE_CONFIG: u8 = 0x09;
    pub const SPO2_CONFIG: u8 = 0x0A;
    pub const LED1_PA: u8 = 0x0C;
    pub const LED2_PA: u8 = 0x0D;
}

/// `MODE_CONFIG` values
mod mode {
    pub const RESET: u8 = 0x40;
    pub const SPO2: u8 = 0x03;
}

/// ADC range 4096 nA, 100 samples/s, 411 µs pulse width (18-bit)
const SPO2_CONFIG_VALUE: u8 = 0x27;

/// LED drive current (~7 mA)
const LED_CURRENT: u8 = 0x24;

/// Settle time before talking to the device
const POWER_UP_MS: u32 = 10;

/// Time the device needs after a soft reset
const RESET_MS: u32 = 100;

/// Result of one sampling burst
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BurstStats {
    /// FIFO reads attempted
    pub samples: u16,
    /// Reads that failed on the bus
    pub read_errors: u16,
    /// Peaks detected during the burst
    pub beats: u16,
}

/// MAX3010x driver with its heart-rate pipeline
#[derive(Clone, Copy, Debug)]
pub struct Max3010x {
    address: I2cAddress,
    reading: PpgReading,
    finger_detected: bool,
    ppg: PpgPipeline,
    /// Software clock advanced by the sample period
    elapsed_ms: u32,
}

impl Max3010x {
    /// Create a driver at the default address with a default pipeline
    #[must_use]
    pub fn new() -> Self {
        Self::with_pipeline(PpgPipeline::default())
    }

    /// Create a driver with a custom pipeline
    #[must_use]
    pub const fn with_pipeline(ppg: PpgPipeline) -> Self {
        Self {
            address: I2cAddress::MAX3010X,
            reading: PpgReading { red: 0, ir: 0 },
            finger_detected: false,
            ppg,
            elapsed_ms: 0,
        }
    }

    /// Reset the device and configure SpO2 mode.
    ///
    /// Leaves the PPG pipeline untouched.
    pub fn init<B: I2c + DelayNs>(&mut self, bus: &mut B) -> Result<(), DriverError> {
        bus.delay_ms(POWER_UP_MS);

        self.write_reg(bus, reg::MODE_CONFIG, mode::RESET)?;
        bus.delay_ms(RESET_MS);

        self.write_reg(bus, reg::MODE_CONFIG, mode::SPO2)?;
        self.write_reg(bus, reg::SPO2_CONFIG, SPO2_CONFIG_VALUE)?;
        self.write_reg(bus, reg::LED1_PA, LED_CURRENT)?;
        self.write_reg(bus, reg::LED2_PA, LED_CURRENT)?;

        Ok(())
    }

    /// Read one red/IR sample from the FIFO
    pub fn read_fifo<B: I2c>(&mut self, bus: &mut B) -> Result<PpgReading, DriverError> {
        let mut raw = [0u8; 6];
        bus.write(self.address.addr(), &[reg::FIFO_DATA])
            .map_err(DriverError::bus)?;
        bus.read(self.address.addr(), &mut raw)
            .map_err(DriverError::bus)?;

        self.reading = PpgReading::from_fifo(&raw);
        self.finger_detected = self.ppg.finger_present(self.reading.ir);
        Ok(self.reading)
    }

    /// Run the PPG pipeline on the latest IR sample
    pub fn update(&mut self, now_ms: u32) -> Option<Beat> {
        self.ppg.push_sample(self.reading.ir, now_ms)
    }

    /// Read `samples` FIFO samples `period_ms` apart, updating the pipeline.
    ///
    /// A failed read skips that tick's pipeline update; the software clock
    /// still advances so RR intervals stay in real time.
    pub fn sample_burst<B: I2c + DelayNs>(
        &mut self,
        bus: &mut B,
        samples: u16,
        period_ms: u32,
    ) -> BurstStats {
        let mut stats = BurstStats::default();

        for _ in 0..samples {
            stats.samples += 1;
            match self.read_fifo(bus) {
                Ok(_) => {
                    if self.update(self.elapsed_ms).is_some() {
                        stats.beats += 1;
                    }
                }
                Err(err) => {
                    debug!("MAX3010x read failed: {:?}", err);
                    stats.read_errors += 1;
                }
            }

            bus.delay_ms(period_ms);
            self.elapsed_ms = self.elapsed_ms.wrapping_add(period_ms);
        }

        stats
    }

    fn write_reg<B: I2c>(&self, bus: &mut B, reg: u8, value: u8) -> Result<(), DriverError> {
        bus.write(self.address.addr(), &[reg, value])
            .map_err(DriverError::bus)
    }

    /// Committed heart rate (0 when unknown or no finger)
    #[must_use]
    pub const fn bpm(&self) -> u16 {
        self.ppg.bpm()
    }

    /// Latest raw IR count
    #[must_use]
    pub const fn ir_value(&self) -> u32 {
        self.reading.ir
    }

    /// Latest raw red count
    #[must_use]
    pub const fn red_value(&self) -> u32 {
        self.reading.red
    }

    /// Smoothed IR value from the pipeline
    #[must_use]
    pub const fn smoothed_ir(&self) -> u32 {
        self.ppg.ir_value()
    }

    /// Whether the latest sample saw a finger on the sensor
    #[must_use]
    pub const fn finger_detected(&self) -> bool {
        self.finger_detected
    }

    /// Heart-rate pipeline (read-only)
    #[must_use]
    pub const fn pipeline(&self) -> &PpgPipeline {
        &self.ppg
    }

    /// Software clock in ms
    #[must_use]
    pub const fn elapsed_ms(&self) -> u32 {
        self.elapsed_ms
    }
}

impl Default for Max3010x {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: I2c + DelayNs> SensorDriver<B> for Max3010x {
    fn address(&self) -> I2cAddress {
        self.address
    }

    fn name(&self) -> &'static str {
        "MAX3010x"
    }

    fn init(&mut self, bus: &mut B) -> Result<(), DriverError> {
        Max3010x::init(self, bus)
    }
}
