//! Photoplethysmography heart-rate pipeline
//!
//! Turns raw infrared counts into a beats-per-minute estimate:
//!
//! ```text
//! raw IR ─► finger gate ─► 8-sample mean ─► DC tracker ─► AC ─► Schmitt peak
//!                                                               detector
//!                                                                  │
//!            committed BPM ◄─ range check ◄─ 60000 / mean(5 RR) ◄──┘ RR interval
//! ```
//!
//! While no finger is present the BPM reads 0 and nothing else advances.
//! The rings are never cleared, so the first readings after a finger is put
//! back are computed against stale contents until ~8 samples and ~5 beats
//! have refreshed them.

use super::moving_average::SampleRing;
use crate::config;
use crate::types::PpgReading;

/// PPG detector configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PpgConfig {
    /// AC level that starts a peak
    pub peak_threshold: i32,
    /// Distance below the threshold that ends a peak
    pub hysteresis: i32,
    /// Shortest RR interval kept, in ms
    pub rr_min_ms: u32,
    /// Longest RR interval kept, in ms
    pub rr_max_ms: u32,
    /// Lowest BPM committed
    pub bpm_min: u16,
    /// Highest BPM committed
    pub bpm_max: u16,
    /// Raw IR count above which a finger is present
    pub finger_threshold: u32,
}

impl PpgConfig {
    /// Level below which a peak ends
    #[must_use]
    pub const fn release_level(&self) -> i32 {
        self.peak_threshold - self.hysteresis
    }
}

impl Default for PpgConfig {
    fn default() -> Self {
        Self {
            peak_threshold: config::PPG_PEAK_THRESHOLD,
            hysteresis: config::PPG_PEAK_HYSTERESIS,
            rr_min_ms: config::PPG_RR_MIN_MS,
            rr_max_ms: config::PPG_RR_MAX_MS,
            bpm_min: config::PPG_BPM_MIN,
            bpm_max: config::PPG_BPM_MAX,
            finger_threshold: config::PPG_FINGER_THRESHOLD,
        }
    }
}

/// A detected pulse peak
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Beat {
    /// Time since the previous peak in ms
    pub rr_ms: u32,
    /// Whether the interval was plausible and entered the RR ring
    pub accepted: bool,
}

/// Heart-rate pipeline state for one sensor
#[derive(Clone, Copy, Debug)]
pub struct PpgPipeline {
    config: PpgConfig,
    /// Smoothing ring (low-pass)
    smoothing: SampleRing<{ config::PPG_SMOOTHING_WINDOW }>,
    /// DC (baseline) estimate
    dc: i32,
    /// Schmitt trigger state
    peak_high: bool,
    /// Timestamp of the previous peak
    last_peak_ms: u32,
    /// Recent plausible RR intervals
    rr: SampleRing<{ config::PPG_RR_WINDOW }>,
    /// Committed heart rate (0 = none)
    bpm: u16,
    /// Latest smoothed IR value
    ir_value: u32,
}

impl PpgPipeline {
    /// Create a pipeline with the given configuration
    #[must_use]
    pub const fn new(config: PpgConfig) -> Self {
        Self {
            config,
            smoothing: SampleRing::new(),
            dc: 0,
            peak_high: false,
            last_peak_ms: 0,
            rr: SampleRing::new(),
            bpm: 0,
            ir_value: 0,
        }
    }

    /// Finger detection on a raw IR count (bits above 18 are ignored)
    #[must_use]
    pub const fn finger_present(&self, raw_ir: u32) -> bool {
        raw_ir & PpgReading::SAMPLE_MASK > self.config.finger_threshold
    }

    /// Feed one raw IR sample taken at `now_ms`.
    ///
    /// Only the low 18 bits of `raw_ir` are used. Returns the beat when this
    /// sample started a new peak.
    pub fn push_sample(&mut self, raw_ir: u32, now_ms: u32) -> Option<Beat> {
        let raw_ir = raw_ir & PpgReading::SAMPLE_MASK;
        if !self.finger_present(raw_ir) {
            self.bpm = 0;
            return None;
        }

        let smoothed = self.smoothing.push_mean(raw_ir);
        self.ir_value = smoothed;

        let ac = self.track_dc(smoothed);
        if !self.detect_peak(ac) {
            return None;
        }

        let rr_ms = now_ms.wrapping_sub(self.last_peak_ms);
        self.last_peak_ms = now_ms;

        let accepted = self.accept_interval(rr_ms);
        trace!("PPG beat: rr={}ms accepted={} bpm={}", rr_ms, accepted, self.bpm);
        Some(Beat { rr_ms, accepted })
    }

    /// Update the DC estimate and return the AC component
    fn track_dc(&mut self, smoothed: u32) -> i32 {
        // Masked to 18 bits on entry: fits in i32 with room for the x31 product
        #[allow(clippy::cast_possible_wrap)]
        let sample = smoothed as i32;
        self.dc = (self.dc * 31 + sample) / 32;
        sample - self.dc
    }

    /// Schmitt trigger; true on the non-peak → peak transition only
    fn detect_peak(&mut self, ac: i32) -> bool {
        if !self.peak_high && ac > self.config.peak_threshold {
            self.peak_high = true;
            return true;
        }
        if self.peak_high && ac < self.config.release_level() {
            self.peak_high = false;
        }
        false
    }

    /// Store a plausible interval and recompute the BPM
    fn accept_interval(&mut self, rr_ms: u32) -> bool {
        if rr_ms < self.config.rr_min_ms || rr_ms > self.config.rr_max_ms {
            return false;
        }

        self.rr.push(rr_ms);
        if !self.rr.is_full() {
            return true;
        }

        let mean_rr = self.rr.mean();
        if mean_rr == 0 {
            return true;
        }
        let bpm = 60_000 / mean_rr;
        if bpm >= u32::from(self.config.bpm_min) && bpm <= u32::from(self.config.bpm_max) {
            // Bounded by bpm_max above
            self.bpm = bpm as u16;
        }
        true
    }

    /// Committed heart rate in beats per minute (0 when unknown)
    #[must_use]
    pub const fn bpm(&self) -> u16 {
        self.bpm
    }

    /// Latest smoothed IR value
    #[must_use]
    pub const fn ir_value(&self) -> u32 {
        self.ir_value
    }

    /// Current DC estimate
    #[must_use]
    pub const fn dc(&self) -> i32 {
        self.dc
    }

    /// Whether the detector is inside a peak
    #[must_use]
    pub const fn in_peak(&self) -> bool {
        self.peak_high
    }

    /// Plausible RR intervals collected so far (saturates at the window)
    #[must_use]
    pub const fn rr_count(&self) -> usize {
        self.rr.filled()
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &PpgConfig {
        &self.config
    }
}

impl Default for PpgPipeline {
    fn default() -> Self {
        Self::new(PpgConfig::default())
    }
}
