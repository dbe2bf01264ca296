//! Line-level I2C simulator for host tests
//!
//! `SimBus` implements `LineDriver` and resolves SDA as a wired-AND of the
//! master and every attached target. Targets run a small state machine on
//! SCL edges, so the real bit-banged engine is exercised end to end.

#![allow(dead_code)]

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use sensor_firmware::bus::{BitBangI2c, BusTiming, LineDriver, LineState};

/// Engine wired to the simulator
pub type TestBus = BitBangI2c<SimBus, SimDelay>;

/// Build an engine over `lines` with standard timing
pub fn bus_with(lines: SimBus) -> TestBus {
    BitBangI2c::new(lines, SimDelay::new())
}

/// Build an engine over `lines` and keep a handle on its delay
pub fn bus_with_delay(lines: SimBus) -> (TestBus, SimDelay) {
    let delay = SimDelay::new();
    let bus = BitBangI2c::with_timing(lines, delay.clone(), BusTiming::standard());
    (bus, delay)
}

// ============================================================================
// Delay
// ============================================================================

/// Delay that only accumulates the requested time
#[derive(Clone, Debug, Default)]
pub struct SimDelay {
    total_ns: Rc<Cell<u64>>,
}

impl SimDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_us(&self) -> u64 {
        self.total_ns.get() / 1_000
    }

    pub fn total_ms(&self) -> u64 {
        self.total_ns.get() / 1_000_000
    }

    fn add(&self, ns: u64) {
        self.total_ns.set(self.total_ns.get() + ns);
    }
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.add(u64::from(ns));
    }

    fn delay_us(&mut self, us: u32) {
        self.add(u64::from(us) * 1_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.add(u64::from(ms) * 1_000_000);
    }
}

// ============================================================================
// Target
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Idle,
    Address,
    AckOut,
    Receive,
    Transmit,
    AckIn,
    Ignore,
}

type FrameSource = Box<dyn FnMut() -> Vec<u8>>;

/// Simulated I2C target
pub struct SimDevice {
    address: u8,
    phase: Phase,
    shift: u8,
    bits: u8,
    reading: bool,
    drive_low: bool,
    tx_byte: u8,
    tx_bits: u8,
    master_acked: bool,
    segment: Vec<u8>,
    segment_open: bool,

    /// Answers its address at all
    pub present: bool,
    /// Remaining address ACKs before going silent (`None` = unlimited)
    pub ack_budget: Option<u32>,
    /// NACK the data byte at this index of each write
    pub nack_data_at: Option<usize>,
    /// Holds SDA low for this many SCL falling edges
    pub stuck_clocks: u32,
    /// Bytes returned by reads (0xFF once empty)
    pub read_queue: VecDeque<u8>,
    frames: Option<FrameSource>,

    /// Completed write payloads, one entry per addressed write
    pub writes: Vec<Vec<u8>>,
    /// Address bytes that matched this target
    pub address_hits: u32,
    /// Read headers acknowledged
    pub read_headers: u32,
    /// Bytes shifted out
    pub bytes_sent: u32,
}

impl SimDevice {
    pub fn new(address: u8) -> Self {
        Self {
            address,
            phase: Phase::Idle,
            shift: 0,
            bits: 0,
            reading: false,
            drive_low: false,
            tx_byte: 0xFF,
            tx_bits: 0,
            master_acked: false,
            segment: Vec::new(),
            segment_open: false,
            present: true,
            ack_budget: None,
            nack_data_at: None,
            stuck_clocks: 0,
            read_queue: VecDeque::new(),
            frames: None,
            writes: Vec::new(),
            address_hits: 0,
            read_headers: 0,
            bytes_sent: 0,
        }
    }

    pub fn with_reads(mut self, bytes: &[u8]) -> Self {
        self.read_queue.extend(bytes.iter().copied());
        self
    }

    pub fn with_ack_budget(mut self, acks: u32) -> Self {
        self.ack_budget = Some(acks);
        self
    }

    pub fn with_data_nack_at(mut self, index: usize) -> Self {
        self.nack_data_at = Some(index);
        self
    }

    pub fn stuck_for(mut self, clocks: u32) -> Self {
        self.stuck_clocks = clocks;
        self.drive_low = clocks > 0;
        self
    }

    /// Refill the read queue from `source` whenever a read starts on an
    /// empty queue
    pub fn with_frames(mut self, source: impl FnMut() -> Vec<u8> + 'static) -> Self {
        self.frames = Some(Box::new(source));
        self
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    fn pulls_low(&self) -> bool {
        self.drive_low
    }

    fn close_segment(&mut self) {
        if self.segment_open && !self.segment.is_empty() {
            self.writes.push(std::mem::take(&mut self.segment));
        }
        self.segment.clear();
        self.segment_open = false;
    }

    fn on_start(&mut self) {
        if self.stuck_clocks > 0 {
            return;
        }
        self.close_segment();
        self.phase = Phase::Address;
        self.shift = 0;
        self.bits = 0;
        self.drive_low = false;
    }

    fn on_stop(&mut self) {
        if self.stuck_clocks > 0 {
            return;
        }
        self.close_segment();
        self.phase = Phase::Idle;
        self.drive_low = false;
    }

    fn on_rise(&mut self, sda: bool) {
        if self.stuck_clocks > 0 {
            return;
        }
        match self.phase {
            Phase::Address | Phase::Receive => {
                self.shift = (self.shift << 1) | u8::from(sda);
                self.bits += 1;
            }
            Phase::AckIn => self.master_acked = !sda,
            _ => {}
        }
    }

    fn on_fall(&mut self) {
        if self.stuck_clocks > 0 {
            self.stuck_clocks -= 1;
            if self.stuck_clocks == 0 {
                self.drive_low = false;
                self.phase = Phase::Idle;
            }
            return;
        }

        match self.phase {
            Phase::Address if self.bits == 8 => self.match_address(),
            Phase::Receive if self.bits == 8 => {
                let index = self.segment.len();
                if self.nack_data_at == Some(index) {
                    self.phase = Phase::Ignore;
                } else {
                    self.segment.push(self.shift);
                    self.drive_low = true;
                    self.phase = Phase::AckOut;
                }
            }
            Phase::AckOut => {
                self.drive_low = false;
                if self.reading {
                    self.load_next_byte();
                } else {
                    self.phase = Phase::Receive;
                    self.shift = 0;
                    self.bits = 0;
                }
            }
            Phase::Transmit => {
                self.tx_bits += 1;
                if self.tx_bits == 8 {
                    self.drive_low = false;
                    self.phase = Phase::AckIn;
                } else {
                    self.drive_low = (self.tx_byte >> (7 - self.tx_bits)) & 1 == 0;
                }
            }
            Phase::AckIn => {
                if self.master_acked {
                    self.load_next_byte();
                } else {
                    self.phase = Phase::Ignore;
                }
            }
            _ => {}
        }
    }

    fn match_address(&mut self) {
        if self.shift >> 1 != self.address {
            self.phase = Phase::Ignore;
            return;
        }
        self.address_hits += 1;

        let budget_ok = self.ack_budget.map_or(true, |left| left > 0);
        if !self.present || !budget_ok {
            self.phase = Phase::Ignore;
            return;
        }
        if let Some(left) = self.ack_budget.as_mut() {
            *left -= 1;
        }

        self.reading = self.shift & 1 == 1;
        if self.reading {
            self.read_headers += 1;
            if self.read_queue.is_empty() {
                if let Some(source) = self.frames.as_mut() {
                    self.read_queue.extend(source());
                }
            }
        } else {
            self.segment_open = true;
        }
        self.drive_low = true;
        self.phase = Phase::AckOut;
    }

    fn load_next_byte(&mut self) {
        self.tx_byte = self.read_queue.pop_front().unwrap_or(0xFF);
        self.bytes_sent += 1;
        self.tx_bits = 0;
        self.drive_low = self.tx_byte & 0x80 == 0;
        self.phase = Phase::Transmit;
    }
}

// ============================================================================
// Bus
// ============================================================================

/// Wired-AND bus with any number of targets
pub struct SimBus {
    state: LineState,
    devices: Vec<SimDevice>,
    /// SCL low-to-high transitions
    pub rising_edges: u32,
    /// START conditions seen (repeated STARTs included)
    pub starts: u32,
    /// STOP conditions seen
    pub stops: u32,
    /// Forces SDA low (short to ground)
    pub sda_shorted: bool,
}

impl SimBus {
    pub fn new() -> Self {
        Self {
            state: LineState::released(),
            devices: Vec::new(),
            rising_edges: 0,
            starts: 0,
            stops: 0,
            sda_shorted: false,
        }
    }

    /// Bus with one well-behaved target per address
    pub fn with_addresses(addresses: &[u8]) -> Self {
        let mut bus = Self::new();
        for &address in addresses {
            bus.attach(SimDevice::new(address));
        }
        bus
    }

    pub fn attach(&mut self, device: SimDevice) {
        self.devices.push(device);
    }

    pub fn detach(&mut self, address: u8) {
        self.devices.retain(|d| d.address != address);
    }

    pub fn device(&self, address: u8) -> &SimDevice {
        self.devices
            .iter()
            .find(|d| d.address == address)
            .expect("no simulated device at address")
    }

    pub fn device_mut(&mut self, address: u8) -> &mut SimDevice {
        self.devices
            .iter_mut()
            .find(|d| d.address == address)
            .expect("no simulated device at address")
    }

    pub fn reset_counters(&mut self) {
        self.rising_edges = 0;
        self.starts = 0;
        self.stops = 0;
    }

    /// Resolved SDA level
    pub fn sda(&self) -> bool {
        let master = !self.state.output_enable() || self.state.data();
        master && !self.sda_shorted && !self.devices.iter().any(SimDevice::pulls_low)
    }

    fn after_data_change(&mut self, before: bool) {
        let after = self.sda();
        if !self.state.clock() || before == after {
            return;
        }
        if after {
            self.stops += 1;
            self.devices.iter_mut().for_each(SimDevice::on_stop);
        } else {
            self.starts += 1;
            self.devices.iter_mut().for_each(SimDevice::on_start);
        }
    }
}

impl Default for SimBus {
    fn default() -> Self {
        Self::new()
    }
}

impl LineDriver for SimBus {
    fn set_clock(&mut self, high: bool) {
        let was_high = self.state.clock();
        self.state = self.state.with_clock(high);

        if high && !was_high {
            self.rising_edges += 1;
            let sda = self.sda();
            self.devices.iter_mut().for_each(|d| d.on_rise(sda));
        } else if !high && was_high {
            self.devices.iter_mut().for_each(SimDevice::on_fall);
        }
    }

    fn set_data(&mut self, high: bool) {
        let before = self.sda();
        self.state = self.state.with_data(high);
        self.after_data_change(before);
    }

    fn set_output_enable(&mut self, enabled: bool) {
        let before = self.sda();
        self.state = self.state.with_output_enable(enabled);
        self.after_data_change(before);
    }

    fn read_data(&mut self) -> bool {
        self.sda()
    }

    fn state(&self) -> LineState {
        self.state
    }
}
