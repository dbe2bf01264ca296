//! Poll cycle orchestration
//!
//! One cycle is: scan the bus, reconcile the sensor table (initialising new
//! devices), read the sensors that are present and publish a snapshot for
//! the render consumer. Faults stay local: a failed scan clears the table,
//! a failed init or read is logged and the cycle carries on.

use embedded_hal::delay::DelayNs;
use heapless::Vec;

use crate::bus::{BitBangI2c, LineDriver};
use crate::config::{self, MAX_DRIVERS, SENSOR_SLOTS};
use crate::drivers::aht10::Aht10;
use crate::drivers::max3010x::{BurstStats, Max3010x};
use crate::registry::{CapabilityMap, ReconcileReport, SensorRegistry};
use crate::types::{ClimateReading, I2cAddress};

/// Poll cycle policy
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollConfig {
    /// Maximum addresses taken from one scan
    pub scan_capacity: usize,
    /// Run the recovery sequence when the bus is found not idle
    pub recover_stuck_bus: bool,
    /// Heart-rate samples per cycle
    pub heart_rate_samples: u16,
    /// Spacing of heart-rate samples in ms
    pub heart_rate_period_ms: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            scan_capacity: SENSOR_SLOTS,
            recover_stuck_bus: false,
            heart_rate_samples: config::HEART_RATE_BURST_SAMPLES,
            heart_rate_period_ms: config::HEART_RATE_SAMPLE_PERIOD_MS,
        }
    }
}

/// Bus condition seen by the last scan
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BusStatus {
    /// Scan completed
    Ready {
        /// Devices that answered
        devices: usize,
    },
    /// Idle check failed; the table was reconciled against no devices
    Unusable {
        /// Whether the recovery sequence was run
        recovered: bool,
    },
}

impl BusStatus {
    /// True when the scan ran
    #[must_use]
    pub const fn is_usable(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for BusStatus {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Ready { devices } => defmt::write!(f, "Ready({})", devices),
            Self::Unusable { recovered } => defmt::write!(f, "Unusable(recovered={})", recovered),
        }
    }
}

/// Outcome of the discovery half of a poll cycle
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollReport<const S: usize = SENSOR_SLOTS> {
    /// Bus condition
    pub bus: BusStatus,
    /// Changes to the sensor table
    pub reconcile: ReconcileReport<S>,
}

/// Scan the bus and reconcile `registry` against the result.
///
/// A scan failure counts as "no devices", which empties the table. Recovery
/// only runs when `config.recover_stuck_bus` is set; the scan is not retried
/// within the same cycle either way.
pub fn discover<L, D, const S: usize, const M: usize>(
    bus: &mut BitBangI2c<L, D>,
    registry: &mut SensorRegistry<S>,
    drivers: &mut CapabilityMap<'_, BitBangI2c<L, D>, M>,
    config: &PollConfig,
) -> PollReport<S>
where
    L: LineDriver,
    D: DelayNs,
{
    let (scanned, status): (Vec<I2cAddress, S>, BusStatus) = match bus.scan::<S>(config.scan_capacity) {
        Ok(found) => {
            let devices = found.len();
            (found, BusStatus::Ready { devices })
        }
        Err(err) => {
            warn!("I2C scan failed ({:?}), assuming no devices", err);
            if config.recover_stuck_bus {
                bus.recover_bus();
            }
            (
                Vec::new(),
                BusStatus::Unusable {
                    recovered: config.recover_stuck_bus,
                },
            )
        }
    };

    let reconcile = registry.reconcile(&scanned, bus, drivers);
    if !reconcile.is_unchanged() {
        info!("I2C devices found: {}", scanned.len());
    }

    PollReport {
        bus: status,
        reconcile,
    }
}

/// Read-only view of the hub for the render consumer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HubSnapshot {
    /// Sensor table in slot order
    pub slots: [Option<I2cAddress>; SENSOR_SLOTS],
    /// Whether the last scan saw an idle bus
    pub bus_usable: bool,
    /// Heart rate (0 when unknown, absent or no finger)
    pub bpm: u16,
    /// Raw IR count
    pub ir_value: u32,
    /// Raw red count
    pub red_value: u32,
    /// Latest climate reading
    pub climate: Option<ClimateReading>,
}

impl HubSnapshot {
    /// Whether `address` is in the table
    #[must_use]
    pub fn contains(&self, address: I2cAddress) -> bool {
        self.slots.contains(&Some(address))
    }

    /// Number of occupied slots
    #[must_use]
    pub fn device_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for HubSnapshot {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "{} device(s) bus_ok={} BPM:{} IR:{} RED:{}",
            self.device_count(),
            self.bus_usable,
            self.bpm,
            self.ir_value,
            self.red_value
        );
    }
}

/// The bus, the sensor table and the drivers of the reference board
pub struct SensorHub<L, D> {
    bus: BitBangI2c<L, D>,
    registry: SensorRegistry<SENSOR_SLOTS>,
    heart: Max3010x,
    climate: Aht10,
    config: PollConfig,
    bus_usable: bool,
}

impl<L: LineDriver, D: DelayNs> SensorHub<L, D> {
    /// Create a hub with an empty sensor table
    pub fn new(bus: BitBangI2c<L, D>, config: PollConfig) -> Self {
        Self {
            bus,
            registry: SensorRegistry::new(),
            heart: Max3010x::new(),
            climate: Aht10::new(),
            config,
            bus_usable: false,
        }
    }

    /// Scan and reconcile, initialising newly found sensors
    pub fn discover(&mut self) -> PollReport {
        let mut drivers: CapabilityMap<'_, BitBangI2c<L, D>, MAX_DRIVERS> = CapabilityMap::new();
        let heart = drivers.register(&mut self.heart);
        let climate = drivers.register(&mut self.climate);
        debug_assert!(heart.is_ok() && climate.is_ok());

        let report = discover(&mut self.bus, &mut self.registry, &mut drivers, &self.config);
        self.bus_usable = report.bus.is_usable();
        report
    }

    /// Read every present sensor once (a sampling burst for heart rate)
    pub fn read_sensors(&mut self) -> Option<BurstStats> {
        let mut heart_stats = None;

        if self.registry.contains(I2cAddress::MAX3010X) {
            let stats = self.heart.sample_burst(
                &mut self.bus,
                self.config.heart_rate_samples,
                self.config.heart_rate_period_ms,
            );
            if stats.read_errors > 0 {
                warn!("MAX3010x: {} of {} reads failed", stats.read_errors, stats.samples);
            }
            info!(
                "IR:{} RED:{} BPM:{}",
                self.heart.ir_value(),
                self.heart.red_value(),
                self.heart.bpm()
            );
            heart_stats = Some(stats);
        }

        if self.registry.contains(I2cAddress::AHT10) {
            if let Err(err) = self.climate.measure(&mut self.bus) {
                warn!("AHT10 read failed: {:?}", err);
            }
        }

        heart_stats
    }

    /// Full cycle: discover, read, snapshot
    pub fn poll_cycle(&mut self) -> HubSnapshot {
        self.discover();
        self.read_sensors();
        self.snapshot()
    }

    /// Current state for the render consumer
    #[must_use]
    pub fn snapshot(&self) -> HubSnapshot {
        let heart_present = self.registry.contains(I2cAddress::MAX3010X);
        let climate_present = self.registry.contains(I2cAddress::AHT10);

        HubSnapshot {
            slots: *self.registry.slots(),
            bus_usable: self.bus_usable,
            bpm: if heart_present { self.heart.bpm() } else { 0 },
            ir_value: if heart_present { self.heart.ir_value() } else { 0 },
            red_value: if heart_present { self.heart.red_value() } else { 0 },
            climate: if climate_present {
                self.climate.last_reading()
            } else {
                None
            },
        }
    }

    /// Sensor table
    pub const fn registry(&self) -> &SensorRegistry<SENSOR_SLOTS> {
        &self.registry
    }

    /// Heart-rate driver
    pub const fn heart(&self) -> &Max3010x {
        &self.heart
    }

    /// Climate driver
    pub const fn climate(&self) -> &Aht10 {
        &self.climate
    }

    /// Bus engine, for recovery or direct transfers
    pub fn bus_mut(&mut self) -> &mut BitBangI2c<L, D> {
        &mut self.bus
    }
}
