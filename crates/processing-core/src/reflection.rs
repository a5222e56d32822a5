//! Reflection suppression.
//!
//! Optical reflections off the powder bed and build plate show up as
//! spurious hot or cold regions. Top reflections are removed per frame;
//! bottom reflections use per-column bounds computed once from the whole
//! session.

use ndarray::{s, Array2, Axis, Zip};

use meltview_common::error::MeltviewResult;
use meltview_session_model::record::ReflectionBounds;
use meltview_session_model::thermal::{ThermalFrame, ThermalStack};

/// Thresholds for top-reflection suppression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TopReflection {
    /// Values at or below this are treated as background.
    pub zero_level: f32,

    /// Values at or above this are treated as saturated reflections.
    pub max_temperature: f32,
}

impl Default for TopReflection {
    fn default() -> Self {
        Self {
            zero_level: 180.0,
            max_temperature: 700.0,
        }
    }
}

/// Parameters for locating the bottom of the part.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Persistence {
    /// Temperature a pixel must reach to count as hot in a frame.
    pub hot_threshold: f32,

    /// Fraction of frames, in `[0, 1]`, a pixel must be hot in.
    pub min_fraction: f64,
}

impl Default for Persistence {
    fn default() -> Self {
        Self {
            hot_threshold: 180.0,
            min_fraction: 0.25,
        }
    }
}

/// Zero out-of-range pixels above the meltpool.
///
/// Reflections of the meltpool land above it in the image, so the meltpool
/// is taken to be the lowest row reaching `max_temperature`. The region is
/// every row strictly above it. A frame with no saturated pixel anchors on the
/// first row holding its peak finite value instead. Frames without finite
/// values are returned unchanged.
pub fn remove_top(frame: &ThermalFrame<'_>, thresholds: TopReflection) -> Array2<f32> {
    let mut out = frame.to_owned();
    let Some(meltpool_row) = meltpool_row(frame, thresholds.max_temperature) else {
        return out;
    };

    out.slice_mut(s![..meltpool_row, ..]).mapv_inplace(|v| {
        if v <= thresholds.zero_level || v >= thresholds.max_temperature {
            0.0
        } else {
            v
        }
    });
    out
}

fn meltpool_row(frame: &ThermalFrame<'_>, max_temperature: f32) -> Option<usize> {
    frame
        .axis_iter(Axis(0))
        .enumerate()
        .rev()
        .find(|(_, values)| values.iter().any(|&v| v >= max_temperature))
        .map(|(row, _)| row)
        .or_else(|| peak_row(frame))
}

/// First row containing the highest finite value.
fn peak_row(frame: &ThermalFrame<'_>) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (row, values) in frame.axis_iter(Axis(0)).enumerate() {
        for &v in values.iter().filter(|v| v.is_finite()) {
            if best.map_or(true, |(_, max)| v > max) {
                best = Some((row, v));
            }
        }
    }
    best.map(|(row, _)| row)
}

/// Compute the per-column lower boundary of the part across all frames.
///
/// A pixel is persistently hot when it reaches `hot_threshold` in at least
/// `min_fraction` of the frames. Each column's boundary is one past its
/// lowest persistently hot row, or the frame height when it has none.
pub fn find_lower_bounds(stack: &ThermalStack, params: Persistence) -> ReflectionBounds {
    let (height, width) = (stack.height(), stack.width());
    if stack.is_empty() {
        return ReflectionBounds::uniform(height, width);
    }

    let mut hot_counts = Array2::<u32>::zeros((height, width));
    for frame in stack.frames() {
        Zip::from(&mut hot_counts)
            .and(&frame)
            .for_each(|count, &v| {
                if v >= params.hot_threshold {
                    *count += 1;
                }
            });
    }

    let required = params.min_fraction.clamp(0.0, 1.0) * stack.len() as f64;
    let bounds: Vec<usize> = hot_counts
        .axis_iter(Axis(1))
        .map(|column| {
            column
                .iter()
                .rposition(|&count| count as f64 >= required)
                .map_or(height, |row| row + 1)
        })
        .collect();

    let masked_columns = bounds.iter().filter(|&&b| b < height).count();
    tracing::debug!(
        frames = stack.len(),
        masked_columns,
        "Computed bottom reflection bounds"
    );
    ReflectionBounds::new(bounds)
}

/// Zero every pixel at or below its column's boundary row.
pub fn remove_bottom(
    frame: &ThermalFrame<'_>,
    bounds: &ReflectionBounds,
) -> MeltviewResult<Array2<f32>> {
    bounds.check_width(frame.ncols())?;

    let mut out = frame.to_owned();
    let height = out.nrows();
    for (mut column, &boundary) in out.axis_iter_mut(Axis(1)).zip(bounds.as_slice()) {
        column
            .slice_mut(s![boundary.min(height)..])
            .fill(0.0);
    }
    Ok(out)
}
