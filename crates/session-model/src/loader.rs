//! On-disk readers for the three session inputs.
//!
//! Thermal frames are NumPy `.npy` arrays of shape `(frames, height, width)`.
//! Timestamps and sensor readings are either `.npy` arrays or JSON
//! (`.json` arrays, or `.jsonl` with one reading per line).

use std::path::Path;

use meltview_common::error::{MeltviewError, MeltviewResult};
use ndarray::{Array, Array2, Array3, Dimension, Ix1, Ix2, Ix3};
use ndarray_npy::{read_npy, ReadNpyError, ReadableElement};

use crate::sensor::{SensorReading, TimestampStream, SENSOR_FIELDS};
use crate::thermal::ThermalStack;

/// Read the thermal frame stack.
pub fn read_thermal_frames(path: &Path) -> MeltviewResult<ThermalStack> {
    ensure_exists(path)?;
    match extension(path).as_deref() {
        Some("npy") => read_thermal_npy(path).map(ThermalStack::new),
        _ => Err(MeltviewError::load(
            path,
            "thermal frames must be a .npy array",
        )),
    }
}

/// Read the per-frame camera timestamps.
pub fn read_timestamps(path: &Path) -> MeltviewResult<TimestampStream> {
    ensure_exists(path)?;
    let timestamps = match extension(path).as_deref() {
        Some("npy") => read_npy_as_f64::<Ix1>(path)?.to_vec(),
        Some("json") => {
            let content = read_text(path)?;
            serde_json::from_str::<Vec<f64>>(&content)
                .map_err(|e| MeltviewError::load(path, format!("invalid timestamp JSON: {e}")))?
        }
        _ => {
            return Err(MeltviewError::load(
                path,
                "timestamps must be .npy or .json",
            ))
        }
    };
    tracing::debug!(path = %path.display(), count = timestamps.len(), "Read video timestamps");
    Ok(TimestampStream::new(timestamps))
}

/// Read the meltpool sensor readings.
pub fn read_sensor_readings(path: &Path) -> MeltviewResult<Vec<SensorReading>> {
    ensure_exists(path)?;
    let readings = match extension(path).as_deref() {
        Some("npy") => sensor_rows_to_readings(&read_npy_as_f64::<Ix2>(path)?)?,
        Some("json") => {
            let content = read_text(path)?;
            serde_json::from_str(&content)
                .map_err(|e| MeltviewError::load(path, format!("invalid sensor JSON: {e}")))?
        }
        Some("jsonl") => parse_sensor_jsonl(&read_text(path)?)
            .map_err(|e| MeltviewError::load(path, format!("invalid sensor JSONL: {e}")))?,
        _ => {
            return Err(MeltviewError::load(
                path,
                "sensor readings must be .npy, .json or .jsonl",
            ))
        }
    };
    tracing::debug!(path = %path.display(), count = readings.len(), "Read sensor readings");
    Ok(readings)
}

/// Parse readings from JSONL content (one JSON object per line).
pub fn parse_sensor_jsonl(jsonl: &str) -> Result<Vec<SensorReading>, serde_json::Error> {
    jsonl
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(serde_json::from_str)
        .collect()
}

/// Convert an `(M, 5)` matrix of `(t, x, y, z, area)` rows into readings.
pub fn sensor_rows_to_readings(rows: &Array2<f64>) -> MeltviewResult<Vec<SensorReading>> {
    if rows.ncols() != SENSOR_FIELDS {
        return Err(MeltviewError::shape_mismatch(format!(
            "sensor rows have {} fields, expected {SENSOR_FIELDS} (t, x, y, z, area)",
            rows.ncols()
        )));
    }

    Ok(rows
        .outer_iter()
        .map(|row| SensorReading::new(row[0], row[1], row[2], row[3], row[4]))
        .collect())
}

fn read_thermal_npy(path: &Path) -> MeltviewResult<Array3<f32>> {
    if let Some(data) = try_read_npy::<f32, Ix3>(path)? {
        return Ok(data);
    }
    if let Some(data) = try_read_npy::<f64, Ix3>(path)? {
        return Ok(data.mapv(|v| v as f32));
    }
    if let Some(data) = try_read_npy::<u16, Ix3>(path)? {
        return Ok(data.mapv(f32::from));
    }
    if let Some(data) = try_read_npy::<i16, Ix3>(path)? {
        return Ok(data.mapv(f32::from));
    }
    Err(MeltviewError::load(
        path,
        "unsupported dtype; expected f32, f64, u16 or i16",
    ))
}

fn read_npy_as_f64<D: Dimension>(path: &Path) -> MeltviewResult<Array<f64, D>> {
    if let Some(data) = try_read_npy::<f64, D>(path)? {
        return Ok(data);
    }
    if let Some(data) = try_read_npy::<f32, D>(path)? {
        return Ok(data.mapv(f64::from));
    }
    Err(MeltviewError::load(
        path,
        "unsupported dtype; expected f64 or f32",
    ))
}

/// Read an array of element type `A`, or `None` when the file holds another dtype.
fn try_read_npy<A, D>(path: &Path) -> MeltviewResult<Option<Array<A, D>>>
where
    A: ReadableElement,
    D: Dimension,
{
    match read_npy::<_, Array<A, D>>(path) {
        Ok(data) => Ok(Some(data)),
        Err(ReadNpyError::WrongDescriptor(_)) => Ok(None),
        Err(e) => Err(MeltviewError::load(path, e.to_string())),
    }
}

fn ensure_exists(path: &Path) -> MeltviewResult<()> {
    if !path.exists() {
        return Err(MeltviewError::load(path, "file not found"));
    }
    Ok(())
}

fn read_text(path: &Path) -> MeltviewResult<String> {
    std::fs::read_to_string(path).map_err(|e| MeltviewError::load(path, e.to_string()))
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}
