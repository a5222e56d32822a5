//! Timing utilities for stream synchronization and playback rate.
//!
//! Thermal-camera and sensor timestamps are both expressed in seconds on a
//! common monotonic axis. This module provides utilities for:
//! - Checking that a timestamp stream never regresses
//! - Measuring lag between a frame and the reading attributed to it
//! - Deriving export frame rates from playback speed

/// Seconds on the shared capture axis.
pub type TimestampSecs = f64;

/// Count the positions where a timestamp stream goes backwards.
///
/// A non-decreasing stream returns zero. Equal neighbours are not regressions.
pub fn count_regressions(timestamps: &[TimestampSecs]) -> usize {
    timestamps
        .windows(2)
        .filter(|pair| pair[1] < pair[0])
        .count()
}

/// Lag between a frame's capture time and the sensor reading attributed to it.
#[derive(Debug, Clone, Copy)]
pub struct DriftMeasurement {
    /// Timestamp in the reference stream (sensor reading).
    pub reference_secs: TimestampSecs,
    /// Timestamp in the measured stream (thermal frame).
    pub measured_secs: TimestampSecs,
}

impl DriftMeasurement {
    /// Drift in seconds (positive = measured is later than the reference).
    pub fn drift_secs(&self) -> f64 {
        self.measured_secs - self.reference_secs
    }

    /// Whether the measured sample precedes the reference.
    pub fn is_leading(&self) -> bool {
        self.drift_secs() < 0.0
    }
}

/// Export frame rate derived from capture rate and playback speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRate {
    /// Playback speed multiplier relative to realtime.
    pub playback_speed: u32,
    /// Rate at which the camera captured frames (Hz).
    pub realtime_framerate: u32,
}

impl FrameRate {
    pub fn new(playback_speed: u32, realtime_framerate: u32) -> Self {
        Self {
            playback_speed,
            realtime_framerate,
        }
    }

    /// Frames per second written to the output: `speed × realtime`.
    pub fn fps(&self) -> u32 {
        self.playback_speed.saturating_mul(self.realtime_framerate)
    }

    /// Duration of `frames` frames at this rate, in seconds.
    pub fn duration_secs(&self, frames: usize) -> f64 {
        match self.fps() {
            0 => 0.0,
            fps => frames as f64 / fps as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regression_count() {
        assert_eq!(count_regressions(&[0.0, 0.0, 1.0, 2.5]), 0);
        assert_eq!(count_regressions(&[]), 0);
        assert_eq!(count_regressions(&[0.0, 2.0, 1.0, 3.0, 2.9]), 2);
    }

    #[test]
    fn test_drift_measurement() {
        let drift = DriftMeasurement {
            reference_secs: 1.0,
            measured_secs: 1.05,
        };
        assert!((drift.drift_secs() - 0.05).abs() < 1e-9);
        assert!(!drift.is_leading());
    }

    #[test]
    fn test_leading_frame() {
        let drift = DriftMeasurement {
            reference_secs: 2.0,
            measured_secs: 1.5,
        };
        assert!(drift.is_leading());
    }

    #[test]
    fn test_frame_rate_product() {
        let rate = FrameRate::new(15, 4);
        assert_eq!(rate.fps(), 60);
        assert!((rate.duration_secs(120) - 2.0).abs() < 1e-12);
        assert_eq!(FrameRate::new(0, 4).duration_secs(10), 0.0);
    }
}
