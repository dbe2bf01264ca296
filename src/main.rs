//! Sensor Hub Main Application
//!
//! Entry point for the STM32G474-based sensor hub firmware.
//! Initializes hardware and spawns the poll and report tasks.

#![no_std]
#![no_main]

use defmt::{debug, info, unwrap};
use embassy_executor::Spawner;
use embassy_stm32::gpio::{Level, Output, OutputOpenDrain, Speed};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::Delay;
use {defmt_rtt as _, panic_probe as _};

use sensor_firmware::hal::gpio::{OpenDrainLines, StatusLed};
use sensor_firmware::hal::timer::{PollClock, Stopwatch};
use sensor_firmware::prelude::*;

type Hub = SensorHub<OpenDrainLines<'static>, Delay>;

/// Latest hub state, overwritten every poll cycle
static SNAPSHOT: Signal<CriticalSectionRawMutex, HubSnapshot> = Signal::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Sensor Hub Firmware v{}", env!("CARGO_PKG_VERSION"));

    let config = embassy_stm32::Config::default();
    let p = embassy_stm32::init(config);

    info!("Peripherals initialized");

    // Status LED (PA5 on Nucleo boards)
    let led = StatusLed::new(Output::new(p.PA5, Level::Low, Speed::Low));

    // PB8 = SCL, PB9 = SDA, both open-drain with external pull-ups
    let scl = OutputOpenDrain::new(p.PB8, Level::High, Speed::VeryHigh);
    let sda = OutputOpenDrain::new(p.PB9, Level::High, Speed::VeryHigh);
    let bus = BitBangI2c::new(OpenDrainLines::new(scl, sda), Delay);

    info!(
        "Software I2C on {}/{} at ~{} Hz",
        pins::I2C_SCL,
        pins::I2C_SDA,
        bus.timing().scl_hz()
    );

    let hub = SensorHub::new(bus, PollConfig::default());

    unwrap!(spawner.spawn(poll_task(hub)));
    unwrap!(spawner.spawn(report_task(led)));

    info!("Tasks spawned");
}

/// Owns the bus: scan, reconcile, read, publish
#[embassy_executor::task]
async fn poll_task(mut hub: Hub) {
    let mut clock = PollClock::standard();
    let mut stopwatch = Stopwatch::new();

    info!("Polling every {}", clock);

    loop {
        stopwatch.start();
        let snapshot = hub.poll_cycle();
        debug!("Poll cycle took {} ms", stopwatch.elapsed_ms());

        SNAPSHOT.signal(snapshot);
        clock.tick().await;
    }
}

/// Render consumer: logs each snapshot and mirrors bus health on the LED
#[embassy_executor::task]
async fn report_task(mut led: StatusLed<'static>) {
    loop {
        let snapshot = SNAPSHOT.wait().await;

        if snapshot.bus_usable {
            led.toggle();
        } else {
            led.show(false);
        }

        info!("{}", snapshot);
        for (index, slot) in snapshot.slots.iter().enumerate() {
            if let Some(address) = slot {
                info!("  slot {}: {}", index, address);
            }
        }
        if let Some(climate) = snapshot.climate {
            info!("  T:{} C  RH:{} %", climate.celsius(), climate.humidity_percent());
        }
    }
}
