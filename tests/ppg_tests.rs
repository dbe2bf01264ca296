//! PPG Pipeline Tests
//!
//! Heart-rate estimation from synthetic pulse waveforms.
//! Run with: cargo test --no-default-features --features std --test ppg_tests

use sensor_firmware::config::{PPG_BPM_MAX, PPG_BPM_MIN, PPG_RR_WINDOW};
use sensor_firmware::dsp::moving_average::SampleRing;
use sensor_firmware::dsp::ppg::{Beat, PpgConfig, PpgPipeline};

const SAMPLE_PERIOD_MS: u32 = 10;
const BASELINE: u32 = 100_000;
const PULSE: u32 = 20_000;
const PULSE_WIDTH_MS: u32 = 150;
const NO_FINGER: u32 = 1_000;

/// Square pulse of `PULSE_WIDTH_MS` every `period_ms` on a steady baseline
fn waveform(t_ms: u32, period_ms: u32) -> u32 {
    if t_ms % period_ms < PULSE_WIDTH_MS {
        BASELINE + PULSE
    } else {
        BASELINE
    }
}

/// Feed the waveform from `from_ms` (inclusive) to `to_ms` (exclusive)
fn feed(ppg: &mut PpgPipeline, period_ms: u32, from_ms: u32, to_ms: u32) -> Vec<Beat> {
    let mut beats = Vec::new();
    for t in (from_ms..to_ms).step_by(SAMPLE_PERIOD_MS as usize) {
        if let Some(beat) = ppg.push_sample(waveform(t, period_ms), t) {
            beats.push(beat);
        }
    }
    beats
}

// =============================================================================
// Moving Average
// =============================================================================

#[test]
fn test_ring_mean_over_whole_window() {
    let mut ring: SampleRing<8> = SampleRing::new();
    for _ in 0..7 {
        ring.push(60_000);
    }
    assert_eq!(ring.push_mean(0), 52_500);
    assert!(ring.is_full());
}

#[test]
fn test_ring_counts_unwritten_slots_as_zero() {
    let mut ring: SampleRing<4> = SampleRing::new();
    assert_eq!(ring.push_mean(400), 100);
    assert_eq!(ring.filled(), 1);
    assert!(!ring.is_full());
}

#[test]
fn test_ring_overwrites_oldest() {
    let mut ring: SampleRing<3> = SampleRing::new();
    for sample in [1, 2, 3, 4] {
        ring.push(sample);
    }
    assert_eq!(ring.as_slice(), &[4, 2, 3]);
    assert_eq!(ring.sum(), 9);
    assert_eq!(ring.capacity(), 3);
}

#[test]
fn test_ring_mean_does_not_overflow() {
    let mut ring: SampleRing<8> = SampleRing::new();
    for _ in 0..8 {
        ring.push(u32::MAX);
    }
    assert_eq!(ring.mean(), u32::MAX);
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn test_default_config_matches_constants() {
    let config = PpgConfig::default();
    assert_eq!(config.peak_threshold, 800);
    assert_eq!(config.release_level(), 500);
    assert_eq!(config.rr_min_ms, 300);
    assert_eq!(config.rr_max_ms, 2000);
    assert_eq!(config.bpm_min, PPG_BPM_MIN);
    assert_eq!(config.bpm_max, PPG_BPM_MAX);
    assert_eq!(config.finger_threshold, 50_000);
}

// =============================================================================
// Heart Rate Estimation
// =============================================================================

#[test]
fn test_converges_to_pulse_rate() {
    for (period_ms, expected) in [(500, 120), (750, 80), (1000, 60), (1500, 40)] {
        let mut ppg = PpgPipeline::default();
        feed(&mut ppg, period_ms, 0, 15 * period_ms);
        assert_eq!(ppg.bpm(), expected, "period {period_ms} ms");
    }
}

#[test]
fn test_converges_at_range_edges() {
    // 200 BPM and 30 BPM are both inclusive
    let mut fast = PpgPipeline::default();
    feed(&mut fast, 300, 0, 15 * 300);
    assert_eq!(fast.bpm(), 200);

    let mut slow = PpgPipeline::default();
    feed(&mut slow, 2000, 0, 15 * 2000);
    assert_eq!(slow.bpm(), 30);
}

#[test]
fn test_bpm_zero_until_rr_window_full() {
    let mut ppg = PpgPipeline::default();

    for t in (0..10_000).step_by(SAMPLE_PERIOD_MS as usize) {
        ppg.push_sample(waveform(t, 1000), t);
        if ppg.rr_count() < PPG_RR_WINDOW {
            assert_eq!(ppg.bpm(), 0, "committed early at {t} ms");
        }
    }
    assert_eq!(ppg.rr_count(), PPG_RR_WINDOW);
    assert_ne!(ppg.bpm(), 0);
}

#[test]
fn test_bpm_always_zero_or_in_range() {
    for period_ms in (300..=2000).step_by(37) {
        let mut ppg = PpgPipeline::default();
        for t in (0..20 * period_ms).step_by(SAMPLE_PERIOD_MS as usize) {
            ppg.push_sample(waveform(t, period_ms), t);
            let bpm = ppg.bpm();
            assert!(
                bpm == 0 || (PPG_BPM_MIN..=PPG_BPM_MAX).contains(&bpm),
                "period {period_ms} ms gave {bpm} BPM"
            );
        }
    }
}

#[test]
fn test_too_fast_pulse_never_commits() {
    // 240 BPM: intervals below the plausible minimum
    let mut ppg = PpgPipeline::default();
    feed(&mut ppg, 250, 0, 10_000);
    assert_eq!(ppg.bpm(), 0);
}

#[test]
fn test_too_slow_pulse_never_commits() {
    let mut ppg = PpgPipeline::default();
    feed(&mut ppg, 2500, 0, 40_000);
    assert_eq!(ppg.bpm(), 0);
    assert_eq!(ppg.rr_count(), 0);
}

// =============================================================================
// Peak Detection
// =============================================================================

#[test]
fn test_first_peak_interval_rejected() {
    let mut ppg = PpgPipeline::default();
    let beats = feed(&mut ppg, 1000, 0, 1000);

    // The very first peak measures from time zero
    assert_eq!(beats.first(), Some(&Beat { rr_ms: 0, accepted: false }));
}

#[test]
fn test_beats_report_intervals() {
    let mut ppg = PpgPipeline::default();
    let beats = feed(&mut ppg, 1000, 0, 15_000);

    let tail: Vec<_> = beats.iter().rev().take(5).collect();
    assert!(tail.iter().all(|b| b.rr_ms == 1000 && b.accepted));
}

#[test]
fn test_peak_hysteresis() {
    let mut ppg = PpgPipeline::default();
    feed(&mut ppg, 1000, 0, 10_000);

    // Inside a pulse the detector stays latched
    let mut t = 10_000;
    ppg.push_sample(waveform(t, 1000), t);
    t += SAMPLE_PERIOD_MS;
    let again = ppg.push_sample(waveform(t, 1000), t);
    assert!(ppg.in_peak());
    assert!(again.is_none());
}

// =============================================================================
// Finger Detection
// =============================================================================

#[test]
fn test_no_finger_forces_zero_and_freezes_state() {
    let mut ppg = PpgPipeline::default();
    feed(&mut ppg, 1000, 0, 15_000);
    assert_eq!(ppg.bpm(), 60);

    let ir = ppg.ir_value();
    let dc = ppg.dc();
    let rr = ppg.rr_count();

    for t in (15_000..18_000).step_by(SAMPLE_PERIOD_MS as usize) {
        assert!(ppg.push_sample(NO_FINGER, t).is_none());
        assert_eq!(ppg.bpm(), 0);
    }

    assert_eq!(ppg.ir_value(), ir);
    assert_eq!(ppg.dc(), dc);
    assert_eq!(ppg.rr_count(), rr);
}

#[test]
fn test_finger_threshold_is_exclusive() {
    let ppg = PpgPipeline::default();
    assert!(!ppg.finger_present(50_000));
    assert!(ppg.finger_present(50_001));
}

#[test]
fn test_bits_above_sample_width_are_ignored() {
    let mut plain = PpgPipeline::default();
    let mut noisy = PpgPipeline::default();

    for t in (0..15_000).step_by(SAMPLE_PERIOD_MS as usize) {
        let sample = waveform(t, 1000);
        assert_eq!(
            plain.push_sample(sample, t),
            noisy.push_sample(sample | 0xFFFC_0000, t)
        );
    }

    assert_eq!(noisy.bpm(), 60);
    assert_eq!(noisy.ir_value(), plain.ir_value());
    assert_eq!(noisy.dc(), plain.dc());
    assert!(!noisy.finger_present(0x0004_0000));
}

#[test]
fn test_recovers_after_finger_returns() {
    let mut ppg = PpgPipeline::default();
    feed(&mut ppg, 1000, 0, 15_000);

    for t in (15_000..18_000).step_by(SAMPLE_PERIOD_MS as usize) {
        ppg.push_sample(NO_FINGER, t);
    }
    assert_eq!(ppg.bpm(), 0);

    let beats = feed(&mut ppg, 1000, 18_000, 25_000);

    // The gap itself is too long to be an RR interval
    assert!(!beats[0].accepted);
    assert_eq!(ppg.bpm(), 60);
}

#[test]
fn test_custom_config() {
    let config = PpgConfig {
        finger_threshold: 10,
        ..PpgConfig::default()
    };
    let mut ppg = PpgPipeline::new(config);

    assert!(ppg.finger_present(NO_FINGER));
    ppg.push_sample(NO_FINGER, 0);
    assert_eq!(ppg.ir_value(), NO_FINGER / 8);
}
