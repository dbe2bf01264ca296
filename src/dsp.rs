//! Digital Signal Processing
//!
//! Integer-only signal processing for the sensor readings:
//! - Ring buffer with window mean (low-pass smoothing)
//! - PPG heart-rate pipeline (DC tracking, peak detection, BPM estimation)

pub mod moving_average;
pub mod ppg;
