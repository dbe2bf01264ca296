//! Hot-plug sensor registry
//!
//! Keeps a fixed table of occupied slots in sync with the addresses the
//! scanner reports. Devices that stop acknowledging are dropped on the next
//! reconciliation; newly seen devices take the first free slot and, when a
//! driver is registered for their address in the [`CapabilityMap`], that
//! driver's `init` runs exactly once per appearance.

use heapless::Vec;

use crate::config::SENSOR_SLOTS;
use crate::error::DriverError;
use crate::types::I2cAddress;

/// Sensor driver that can be dispatched on discovery
pub trait SensorDriver<B> {
    /// Address the driver answers for
    fn address(&self) -> I2cAddress;

    /// Human-readable part name for logs
    fn name(&self) -> &'static str;

    /// Bring a freshly discovered device into its operating mode
    fn init(&mut self, bus: &mut B) -> Result<(), DriverError>;
}

/// Drivers keyed by their address constant
///
/// Adding support for a device means registering one more driver here.
pub struct CapabilityMap<'a, B, const N: usize> {
    entries: Vec<&'a mut dyn SensorDriver<B>, N>,
}

impl<'a, B, const N: usize> CapabilityMap<'a, B, N> {
    /// Create an empty map
    #[must_use]
    pub const fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Register a driver under its own address.
    ///
    /// A driver already registered for the same address is replaced. When
    /// the map is full the driver is handed back.
    pub fn register(
        &mut self,
        driver: &'a mut dyn SensorDriver<B>,
    ) -> Result<(), &'a mut dyn SensorDriver<B>> {
        let address = driver.address();
        if let Some(slot) = self.entries.iter_mut().find(|d| d.address() == address) {
            *slot = driver;
            return Ok(());
        }
        self.entries.push(driver)
    }

    /// Driver for `address`, if any
    pub fn driver_mut(&mut self, address: I2cAddress) -> Option<&mut (dyn SensorDriver<B> + 'a)> {
        self.entries
            .iter_mut()
            .find(|d| d.address() == address)
            .map(|d| &mut **d)
    }

    /// Whether a driver is registered for `address`
    #[must_use]
    pub fn knows(&self, address: I2cAddress) -> bool {
        self.entries.iter().any(|d| d.address() == address)
    }

    /// Part name registered for `address`
    #[must_use]
    pub fn name_of(&self, address: I2cAddress) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|d| d.address() == address)
            .map(|d| d.name())
    }

    /// Number of registered drivers
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no driver is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<B, const N: usize> Default for CapabilityMap<'_, B, N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of one reconciliation of a `SensorRegistry<S>`.
///
/// At most `S` slots can change per call, so the per-slot lists never
/// overflow. Dropped addresses are distinct valid addresses.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport<const S: usize = SENSOR_SLOTS> {
    /// Addresses that took a slot this cycle
    pub added: Vec<I2cAddress, S>,
    /// Addresses whose slot was cleared this cycle
    pub removed: Vec<I2cAddress, S>,
    /// Added addresses whose driver `init` failed
    pub init_failed: Vec<(I2cAddress, DriverError), S>,
    /// Scanned addresses dropped because every slot was taken
    pub dropped: Vec<I2cAddress, { I2cAddress::COUNT }>,
}

impl<const S: usize> ReconcileReport<S> {
    /// True when the slot table did not change
    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Fixed-capacity table of present devices
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SensorRegistry<const S: usize = SENSOR_SLOTS> {
    slots: [Option<I2cAddress>; S],
}

impl<const S: usize> SensorRegistry<S> {
    /// Create a table with every slot empty
    #[must_use]
    pub const fn new() -> Self {
        Self { slots: [None; S] }
    }

    /// Reconcile the table against the latest scan.
    ///
    /// Pass an empty `scanned` list when the scan failed: every slot is
    /// then cleared. Driver `init` failures are logged and reported but do
    /// not stop the reconciliation; the address keeps its slot.
    pub fn reconcile<B, const N: usize>(
        &mut self,
        scanned: &[I2cAddress],
        bus: &mut B,
        drivers: &mut CapabilityMap<'_, B, N>,
    ) -> ReconcileReport<S> {
        let mut report = ReconcileReport::default();

        for slot in &mut self.slots {
            if let Some(address) = *slot {
                if !scanned.contains(&address) {
                    info!("Sensor removed: {}", address);
                    *slot = None;
                    let pushed = report.removed.push(address);
                    debug_assert!(pushed.is_ok());
                }
            }
        }

        for &address in scanned {
            if self.contains(address) || report.dropped.contains(&address) {
                continue;
            }

            let Some(slot) = self.slots.iter_mut().find(|s| s.is_none()) else {
                warn!("Sensor table full, ignoring {}", address);
                let pushed = report.dropped.push(address);
                debug_assert!(pushed.is_ok());
                continue;
            };
            *slot = Some(address);
            let pushed = report.added.push(address);
            debug_assert!(pushed.is_ok());

            match drivers.driver_mut(address) {
                Some(driver) => {
                    info!("New device: {} - {}", address, driver.name());
                    if let Err(err) = driver.init(bus) {
                        warn!("Init failed for {} ({}): {:?}", driver.name(), address, err);
                        let pushed = report.init_failed.push((address, err));
                        debug_assert!(pushed.is_ok());
                    }
                }
                None => info!("New device: {} - unknown", address),
            }
        }

        report
    }

    /// Whether `address` occupies a slot
    #[must_use]
    pub fn contains(&self, address: I2cAddress) -> bool {
        self.slots.contains(&Some(address))
    }

    /// Slot table in slot order (read-only)
    #[must_use]
    pub const fn slots(&self) -> &[Option<I2cAddress>; S] {
        &self.slots
    }

    /// Occupied addresses in slot order
    pub fn occupied(&self) -> impl Iterator<Item = I2cAddress> + '_ {
        self.slots.iter().filter_map(|s| *s)
    }

    /// Number of occupied slots
    #[must_use]
    pub fn len(&self) -> usize {
        self.occupied().count()
    }

    /// True when no slot is occupied
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Clear every slot (boot state)
    pub fn clear(&mut self) {
        self.slots = [None; S];
    }
}

impl<const S: usize> Default for SensorRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}
