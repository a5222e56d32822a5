//! Input sources: resolve the three named session inputs to loaded data.
//!
//! The core never chooses files itself. Callers hand it an [`InputSource`],
//! which may read from disk ([`FileInputSource`]) or hold data already in
//! memory ([`MemoryInputSource`]).

use std::path::{Path, PathBuf};

use meltview_common::error::MeltviewResult;

use crate::label::BuildLabel;
use crate::loader;
use crate::sensor::{SensorReading, TimestampStream};
use crate::thermal::ThermalStack;

/// Default file name for video timestamps next to the temperature data.
pub const DEFAULT_TIMESTAMPS_FILE: &str = "video_timestamps.npy";

/// Capability that resolves the session inputs.
pub trait InputSource {
    /// Load the thermal frame stack.
    fn thermal_frames(&self) -> MeltviewResult<ThermalStack>;

    /// Load the per-frame camera timestamps.
    fn video_timestamps(&self) -> MeltviewResult<TimestampStream>;

    /// Load the meltpool sensor readings.
    fn sensor_readings(&self) -> MeltviewResult<Vec<SensorReading>>;

    /// Optional label of the build the inputs came from.
    fn build_label(&self) -> Option<BuildLabel> {
        None
    }

    /// Short description for logs.
    fn describe(&self) -> String;
}

/// Paths of the three on-disk inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputPaths {
    pub temperature: PathBuf,
    pub timestamps: PathBuf,
    pub sensor: PathBuf,
}

impl InputPaths {
    /// Resolve paths; timestamps default to [`DEFAULT_TIMESTAMPS_FILE`]
    /// beside the temperature data.
    pub fn new(temperature: PathBuf, sensor: PathBuf, timestamps: Option<PathBuf>) -> Self {
        let timestamps = timestamps.unwrap_or_else(|| default_timestamps_path(&temperature));
        Self {
            temperature,
            timestamps,
            sensor,
        }
    }
}

fn default_timestamps_path(temperature: &Path) -> PathBuf {
    temperature
        .parent()
        .map(|dir| dir.join(DEFAULT_TIMESTAMPS_FILE))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_TIMESTAMPS_FILE))
}

/// Input source backed by files on disk.
#[derive(Debug, Clone)]
pub struct FileInputSource {
    paths: InputPaths,
    build: Option<BuildLabel>,
}

impl FileInputSource {
    /// Create a source; without an explicit label, one is derived from the
    /// temperature file's build folder.
    pub fn new(paths: InputPaths, build: Option<BuildLabel>) -> Self {
        let build = build.or_else(|| BuildLabel::from_temperature_path(&paths.temperature));
        Self { paths, build }
    }

    pub fn paths(&self) -> &InputPaths {
        &self.paths
    }
}

impl InputSource for FileInputSource {
    fn thermal_frames(&self) -> MeltviewResult<ThermalStack> {
        loader::read_thermal_frames(&self.paths.temperature)
    }

    fn video_timestamps(&self) -> MeltviewResult<TimestampStream> {
        loader::read_timestamps(&self.paths.timestamps)
    }

    fn sensor_readings(&self) -> MeltviewResult<Vec<SensorReading>> {
        loader::read_sensor_readings(&self.paths.sensor)
    }

    fn build_label(&self) -> Option<BuildLabel> {
        self.build.clone()
    }

    fn describe(&self) -> String {
        self.paths.temperature.display().to_string()
    }
}

/// Input source holding data already in memory.
#[derive(Debug, Clone)]
pub struct MemoryInputSource {
    pub frames: ThermalStack,
    pub timestamps: TimestampStream,
    pub readings: Vec<SensorReading>,
    pub build: Option<BuildLabel>,
}

impl MemoryInputSource {
    pub fn new(
        frames: ThermalStack,
        timestamps: TimestampStream,
        readings: Vec<SensorReading>,
    ) -> Self {
        Self {
            frames,
            timestamps,
            readings,
            build: None,
        }
    }
}

impl InputSource for MemoryInputSource {
    fn thermal_frames(&self) -> MeltviewResult<ThermalStack> {
        Ok(self.frames.clone())
    }

    fn video_timestamps(&self) -> MeltviewResult<TimestampStream> {
        Ok(self.timestamps.clone())
    }

    fn sensor_readings(&self) -> MeltviewResult<Vec<SensorReading>> {
        Ok(self.readings.clone())
    }

    fn build_label(&self) -> Option<BuildLabel> {
        self.build.clone()
    }

    fn describe(&self) -> String {
        format!("in-memory ({} frames)", self.frames.len())
    }
}
