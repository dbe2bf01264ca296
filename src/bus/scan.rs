//! Bus scanner
//!
//! Probes the 7-bit address space with zero-length writes. Each ACK is
//! confirmed by a second probe after a short delay before the address is
//! accepted, which rejects single glitched ACKs.

use embedded_hal::delay::DelayNs;
use heapless::Vec;

use super::bitbang::BitBangI2c;
use super::lines::LineDriver;
use crate::config::SCAN_PROBE_COUNT;
use crate::error::BusError;
use crate::types::I2cAddress;

impl<L: LineDriver, D: DelayNs> BitBangI2c<L, D> {
    /// Scan addresses `1..=126` in ascending order.
    ///
    /// Returns at most `min(capacity, N)` addresses and stops probing once
    /// that many were found. A bus that fails the idle check yields
    /// [`BusError::NotIdle`], which is distinct from `Ok` with no devices.
    pub fn scan<const N: usize>(&mut self, capacity: usize) -> Result<Vec<I2cAddress, N>, BusError> {
        if !self.is_idle() {
            warn!("I2C bus not idle (floating or stuck)");
            return Err(BusError::NotIdle);
        }

        let limit = capacity.min(N);
        let mut found = Vec::new();

        for address in I2cAddress::all() {
            if found.len() >= limit {
                break;
            }

            if self.probe_confirmed(address) {
                trace!("ACK from {}", address);
                // Cannot overflow: len < limit <= N
                let pushed = found.push(address);
                debug_assert!(pushed.is_ok());
            }
        }

        debug!("I2C scan found {} device(s)", found.len());
        Ok(found)
    }

    /// Probe `address` until [`SCAN_PROBE_COUNT`] consecutive ACKs are seen
    pub fn probe_confirmed(&mut self, address: I2cAddress) -> bool {
        self.release();
        self.delay.delay_us(self.timing.probe_settle_us);

        for attempt in 0..SCAN_PROBE_COUNT {
            if attempt > 0 {
                self.delay.delay_us(self.timing.probe_confirm_us);
            }
            if !self.probe(address) {
                return false;
            }
        }
        true
    }
}
