//! Meltpool sensor readings and the thermal-camera timestamp stream.

use serde::{Deserialize, Serialize};

use meltview_common::clock::TimestampSecs;

/// Number of fields in a raw sensor row: `(t, x, y, z, area)`.
pub const SENSOR_FIELDS: usize = 5;

/// A single process-sensor sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Capture time in seconds.
    #[serde(rename = "t")]
    pub timestamp: TimestampSecs,

    /// Meltpool position.
    pub x: f64,
    pub y: f64,
    pub z: f64,

    /// Measured meltpool area.
    pub area: f64,
}

impl SensorReading {
    pub fn new(timestamp: TimestampSecs, x: f64, y: f64, z: f64, area: f64) -> Self {
        Self {
            timestamp,
            x,
            y,
            z,
            area,
        }
    }

    /// Build a reading from a raw `(t, x, y, z, area)` row.
    pub fn from_row(row: &[f64]) -> Option<Self> {
        match row {
            [t, x, y, z, area] => Some(Self::new(*t, *x, *y, *z, *area)),
            _ => None,
        }
    }
}

/// Per-frame capture times of the thermal camera.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimestampStream(Vec<TimestampSecs>);

impl TimestampStream {
    pub fn new(timestamps: Vec<TimestampSecs>) -> Self {
        Self(timestamps)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<TimestampSecs> {
        self.0.get(index).copied()
    }

    pub fn as_slice(&self) -> &[TimestampSecs] {
        &self.0
    }
}

impl From<Vec<TimestampSecs>> for TimestampStream {
    fn from(timestamps: Vec<TimestampSecs>) -> Self {
        Self::new(timestamps)
    }
}

/// Timestamps of a reading sequence, in order.
pub fn sensor_timestamps(readings: &[SensorReading]) -> Vec<TimestampSecs> {
    readings.iter().map(|r| r.timestamp).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_from_row() {
        let reading = SensorReading::from_row(&[1.5, 10.0, 20.0, 0.3, 0.02]).unwrap();
        assert_eq!(reading.timestamp, 1.5);
        assert_eq!(reading.area, 0.02);
        assert!(SensorReading::from_row(&[1.0, 2.0, 3.0]).is_none());
    }

    #[test]
    fn test_reading_serializes_with_short_timestamp_key() {
        let reading = SensorReading::new(2.0, 1.0, 2.0, 3.0, 4.0);
        let json = serde_json::to_value(reading).unwrap();
        assert_eq!(json["t"], 2.0);
        assert_eq!(json["area"], 4.0);
    }

    #[test]
    fn test_timestamp_stream_is_transparent_json() {
        let stream: TimestampStream = serde_json::from_str("[0.0, 0.25, 0.5]").unwrap();
        assert_eq!(stream.len(), 3);
        assert_eq!(stream.get(2), Some(0.5));
    }
}
