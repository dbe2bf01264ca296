//! Timer Abstractions
//!
//! Poll cadence and cycle timing on top of `embassy_time`.

use embassy_time::{Duration, Instant, Ticker};

use crate::config::POLL_PERIOD_MS;

/// Fixed-rate tick for the poll loop
///
/// Missed ticks are not replayed: a cycle that overruns (the heart-rate
/// burst alone takes about a second) simply starts the next one late.
pub struct PollClock {
    ticker: Ticker,
    period: Duration,
}

impl PollClock {
    /// Clock at the configured poll period
    #[must_use]
    pub fn standard() -> Self {
        Self::from_period_ms(POLL_PERIOD_MS)
    }

    /// Clock with an explicit period
    #[must_use]
    pub fn from_period_ms(period_ms: u64) -> Self {
        let period = Duration::from_millis(period_ms);
        Self {
            ticker: Ticker::every(period),
            period,
        }
    }

    /// Wait for the next cycle
    pub async fn tick(&mut self) {
        self.ticker.next().await;
    }
}

impl defmt::Format for PollClock {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "PollClock({}ms)", self.period.as_millis());
    }
}

/// Stopwatch for timing a poll cycle
#[derive(Clone, Copy, Debug)]
pub struct Stopwatch {
    start: Option<Instant>,
}

#[allow(clippy::new_without_default)]
impl Stopwatch {
    /// Create a new stopped stopwatch
    #[must_use]
    pub const fn new() -> Self {
        Self { start: None }
    }

    /// Start the stopwatch
    pub fn start(&mut self) {
        self.start = Some(Instant::now());
    }

    /// Get elapsed time (returns zero if not started)
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start
            .map_or(Duration::from_ticks(0), |s| Instant::now() - s)
    }

    /// Get elapsed time in milliseconds
    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed().as_millis()
    }
}
