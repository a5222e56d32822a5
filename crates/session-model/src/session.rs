//! A loaded session: raw frames, timestamps and readings.

use meltview_common::error::MeltviewResult;

use crate::label::BuildLabel;
use crate::sensor::{SensorReading, TimestampStream};
use crate::source::InputSource;
use crate::thermal::ThermalStack;

/// Immutable raw inputs of one capture session.
#[derive(Debug, Clone)]
pub struct Session {
    pub frames: ThermalStack,
    pub timestamps: TimestampStream,
    pub readings: Vec<SensorReading>,
    pub build: Option<BuildLabel>,
}

impl Session {
    /// Load every input from a source; the first failure aborts the load.
    pub fn load(source: &dyn InputSource) -> MeltviewResult<Self> {
        let started = std::time::Instant::now();
        let frames = source.thermal_frames()?;
        let timestamps = source.video_timestamps()?;
        let readings = source.sensor_readings()?;
        let build = source.build_label();

        tracing::info!(
            source = %source.describe(),
            build = build.as_ref().map(BuildLabel::as_str).unwrap_or("-"),
            frames = frames.len(),
            height = frames.height(),
            width = frames.width(),
            timestamps = timestamps.len(),
            readings = readings.len(),
            load_ms = started.elapsed().as_millis(),
            "Session inputs loaded"
        );

        Ok(Self {
            frames,
            timestamps,
            readings,
            build,
        })
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Frame size as `(width, height)`.
    pub fn frame_size(&self) -> (usize, usize) {
        (self.frames.width(), self.frames.height())
    }
}
