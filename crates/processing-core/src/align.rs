//! Sample alignment: attach the current sensor reading to every thermal frame.
//!
//! Both streams are assumed monotonic, so alignment is a single forward sweep
//! with a sensor pointer that never moves backward. A reading is in effect
//! from the instant it is recorded: when a frame's timestamp equals the next
//! reading's timestamp, the pointer advances.

use serde::{Deserialize, Serialize};

use meltview_common::clock::{count_regressions, TimestampSecs};
use meltview_common::error::{MeltviewError, MeltviewResult};
use meltview_session_model::record::MatchedRecord;
use meltview_session_model::sensor::{sensor_timestamps, SensorReading, TimestampStream};
use meltview_session_model::thermal::{frame_max, ThermalStack};

/// Sensor index used for each video timestamp.
///
/// Returns one index per entry of `video_ts`. With no sensor timestamps
/// every frame gets index 0; callers that need a reading must reject the
/// empty case first.
pub fn match_indices(video_ts: &[TimestampSecs], sensor_ts: &[TimestampSecs]) -> Vec<usize> {
    let mut pointer = 0usize;
    video_ts
        .iter()
        .map(|&t| {
            while pointer + 1 < sensor_ts.len() && t >= sensor_ts[pointer + 1] {
                pointer += 1;
            }
            pointer
        })
        .collect()
}

/// Build one [`MatchedRecord`] per thermal frame.
pub fn align(
    stack: &ThermalStack,
    timestamps: &TimestampStream,
    readings: &[SensorReading],
) -> MeltviewResult<Vec<MatchedRecord>> {
    if readings.is_empty() {
        return Err(MeltviewError::EmptySensorStream);
    }
    if stack.len() != timestamps.len() {
        return Err(MeltviewError::shape_mismatch(format!(
            "{} thermal frames but {} video timestamps",
            stack.len(),
            timestamps.len()
        )));
    }

    let sensor_ts = sensor_timestamps(readings);
    warn_on_regressions("video", timestamps.as_slice());
    warn_on_regressions("sensor", &sensor_ts);

    let indices = match_indices(timestamps.as_slice(), &sensor_ts);
    let records: Vec<MatchedRecord> = stack
        .frames()
        .zip(timestamps.as_slice())
        .zip(indices)
        .enumerate()
        .map(|(frame_index, ((frame, &video_ts), sensor_index))| {
            MatchedRecord::new(
                frame_index,
                video_ts,
                sensor_index,
                &readings[sensor_index],
                frame_max(&frame),
            )
        })
        .collect();

    let summary = AlignmentSummary::from_records(&records);
    if summary.leading_frames > 0 {
        tracing::warn!(
            leading_frames = summary.leading_frames,
            first_reading_secs = sensor_ts[0],
            "Frames captured before the first sensor reading reuse reading 0"
        );
    }
    tracing::info!(
        frames = summary.frames,
        readings = readings.len(),
        readings_used = summary.readings_used,
        max_lag_secs = summary.max_lag_secs,
        "Aligned thermal frames to sensor readings"
    );

    Ok(records)
}

fn warn_on_regressions(stream: &str, timestamps: &[TimestampSecs]) {
    let regressions = count_regressions(timestamps);
    if regressions > 0 {
        tracing::warn!(stream, regressions, "Timestamp stream is not monotonic");
    }
}

/// Aggregate view of an alignment result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlignmentSummary {
    /// Number of matched frames.
    pub frames: usize,

    /// Distinct sensor readings attributed to at least one frame.
    pub readings_used: usize,

    /// Frames captured before the first sensor reading.
    pub leading_frames: usize,

    /// Largest non-negative `video - sensor` lag, in seconds.
    pub max_lag_secs: f64,
}

impl AlignmentSummary {
    pub fn from_records(records: &[MatchedRecord]) -> Self {
        let mut readings_used = 0;
        let mut last_index = None;
        let mut leading_frames = 0;
        let mut max_lag_secs: f64 = 0.0;

        for record in records {
            if last_index != Some(record.sensor_index) {
                readings_used += 1;
                last_index = Some(record.sensor_index);
            }
            let lag = record.lag();
            if lag.is_leading() {
                leading_frames += 1;
            } else {
                max_lag_secs = max_lag_secs.max(lag.drift_secs());
            }
        }

        Self {
            frames: records.len(),
            readings_used,
            leading_frames,
            max_lag_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;
    use proptest::prelude::*;

    fn reading(t: f64) -> SensorReading {
        SensorReading::new(t, t * 10.0, t * 20.0, 1.0, 0.5)
    }

    #[test]
    fn test_tie_advances_pointer() {
        assert_eq!(match_indices(&[0.0, 1.0, 2.0], &[0.0, 1.0]), vec![0, 1, 1]);
    }

    #[test]
    fn test_pointer_skips_several_readings_in_one_frame() {
        let sensor = [0.0, 0.1, 0.2, 0.3, 5.0];
        assert_eq!(match_indices(&[0.0, 0.35, 4.9, 5.1], &sensor), vec![0, 3, 3, 4]);
    }

    #[test]
    fn test_leading_frames_use_first_reading() {
        let stack = ThermalStack::new(Array3::zeros((3, 2, 2)));
        let ts = TimestampStream::new(vec![0.0, 0.5, 1.5]);
        let records = align(&stack, &ts, &[reading(1.0), reading(2.0)]).unwrap();

        assert_eq!(records[0].sensor_index, 0);
        assert!(records[0].lag().is_leading());
        let summary = AlignmentSummary::from_records(&records);
        assert_eq!(summary.leading_frames, 2);
        assert_eq!(summary.readings_used, 1);
        assert!((summary.max_lag_secs - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_frame_count_mismatch_is_rejected() {
        let stack = ThermalStack::new(Array3::zeros((3, 2, 2)));
        let ts = TimestampStream::new(vec![0.0, 1.0]);
        let err = align(&stack, &ts, &[reading(0.0)]).unwrap_err();
        assert!(matches!(err, MeltviewError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_max_temperature_ignores_nan() {
        let mut data = Array3::from_elem((1, 2, 2), 300.0f32);
        data[[0, 0, 0]] = f32::NAN;
        data[[0, 1, 1]] = 950.0;
        let stack = ThermalStack::new(data);
        let records = align(&stack, &TimestampStream::new(vec![0.0]), &[reading(0.0)]).unwrap();
        assert_eq!(records[0].max_temperature, 950.0);
    }

    fn sorted(mut values: Vec<f64>) -> Vec<f64> {
        values.sort_by(f64::total_cmp);
        values
    }

    proptest! {
        #[test]
        fn one_index_per_frame(
            video in prop::collection::vec(0.0f64..100.0, 0..64).prop_map(sorted),
            sensor in prop::collection::vec(0.0f64..100.0, 1..32).prop_map(sorted),
        ) {
            let indices = match_indices(&video, &sensor);
            prop_assert_eq!(indices.len(), video.len());
        }

        #[test]
        fn pointer_never_decreases(
            video in prop::collection::vec(0.0f64..100.0, 0..64).prop_map(sorted),
            sensor in prop::collection::vec(0.0f64..100.0, 1..32).prop_map(sorted),
        ) {
            let indices = match_indices(&video, &sensor);
            for pair in indices.windows(2) {
                prop_assert!(pair[0] <= pair[1]);
            }
        }

        #[test]
        fn matched_reading_is_never_in_the_future(
            video in prop::collection::vec(0.0f64..100.0, 0..64).prop_map(sorted),
            sensor in prop::collection::vec(0.0f64..100.0, 1..32).prop_map(sorted),
        ) {
            let indices = match_indices(&video, &sensor);
            for (&t, &p) in video.iter().zip(&indices) {
                prop_assert!(p < sensor.len());
                // Only frames before the first reading may precede their reading.
                prop_assert!(sensor[p] <= t || p == 0);
                // The next reading, if any, has not started yet.
                if p + 1 < sensor.len() {
                    prop_assert!(t < sensor[p + 1]);
                }
            }
        }
    }
}
