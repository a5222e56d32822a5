//! Matched per-frame records and reflection bounds.

use serde::{Deserialize, Serialize};

use meltview_common::clock::{DriftMeasurement, TimestampSecs};
use meltview_common::error::{MeltviewError, MeltviewResult};

use crate::sensor::SensorReading;

/// The sensor reading considered current for one thermal frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchedRecord {
    /// Index of the thermal frame.
    pub frame_index: usize,

    /// Capture time of the thermal frame.
    pub video_timestamp: TimestampSecs,

    /// Index of the sensor reading attributed to this frame.
    pub sensor_index: usize,

    /// Capture time of that sensor reading.
    pub sensor_timestamp: TimestampSecs,

    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub area: f64,

    /// Highest finite temperature in the frame.
    pub max_temperature: f32,
}

impl MatchedRecord {
    pub fn new(
        frame_index: usize,
        video_timestamp: TimestampSecs,
        sensor_index: usize,
        reading: &SensorReading,
        max_temperature: f32,
    ) -> Self {
        Self {
            frame_index,
            video_timestamp,
            sensor_index,
            sensor_timestamp: reading.timestamp,
            x: reading.x,
            y: reading.y,
            z: reading.z,
            area: reading.area,
            max_temperature,
        }
    }

    /// Lag between the frame and its reading.
    pub fn lag(&self) -> DriftMeasurement {
        DriftMeasurement {
            reference_secs: self.sensor_timestamp,
            measured_secs: self.video_timestamp,
        }
    }

    /// `video_timestamp - sensor_timestamp`; negative only for frames captured
    /// before the first reading.
    pub fn lag_secs(&self) -> f64 {
        self.lag().drift_secs()
    }

    /// One-line description for console output.
    pub fn summary_line(&self) -> String {
        format!(
            "Frame: {} | TC time: {:.3} | MP time: {:.3} | MP X: {} | MP Y: {} | MP Z: {} | MP Area: {} | Max Temp: {}",
            self.frame_index,
            self.video_timestamp,
            self.sensor_timestamp,
            self.x,
            self.y,
            self.z,
            self.area,
            self.max_temperature,
        )
    }
}

/// Per-column lower boundary of the part.
///
/// Entry `c` is the first row of column `c` that lies below the part; rows
/// from there to the bottom of the frame are masked. A value equal to the
/// frame height masks nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReflectionBounds(Vec<usize>);

impl ReflectionBounds {
    pub fn new(rows: Vec<usize>) -> Self {
        Self(rows)
    }

    /// A single boundary row repeated across `width` columns.
    pub fn uniform(row: usize, width: usize) -> Self {
        Self(vec![row; width])
    }

    /// Number of columns covered.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, column: usize) -> Option<usize> {
        self.0.get(column).copied()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    /// Check the bounds cover exactly one frame width.
    pub fn check_width(&self, width: usize) -> MeltviewResult<()> {
        if self.len() != width {
            return Err(MeltviewError::shape_mismatch(format!(
                "reflection bounds cover {} columns, frame has {width}",
                self.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_copies_reading_fields() {
        let reading = SensorReading::new(2.0, 1.0, 2.0, 3.0, 0.5);
        let record = MatchedRecord::new(4, 2.5, 1, &reading, 812.0);
        assert_eq!(record.sensor_timestamp, 2.0);
        assert_eq!(record.z, 3.0);
        assert!((record.lag_secs() - 0.5).abs() < 1e-12);
        assert!(!record.lag().is_leading());
    }

    #[test]
    fn test_summary_line_mentions_frame_and_area() {
        let reading = SensorReading::new(0.0, 1.0, 2.0, 3.0, 0.25);
        let line = MatchedRecord::new(12, 0.0, 0, &reading, 700.0).summary_line();
        assert!(line.starts_with("Frame: 12"));
        assert!(line.contains("MP Area: 0.25"));
    }

    #[test]
    fn test_bounds_width_check() {
        let bounds = ReflectionBounds::uniform(50, 8);
        assert!(bounds.check_width(8).is_ok());
        assert!(matches!(
            bounds.check_width(9),
            Err(MeltviewError::ShapeMismatch { .. })
        ));
    }
}
