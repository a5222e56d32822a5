//! Raw thermal-camera frames.

use meltview_common::error::{MeltviewError, MeltviewResult};
use ndarray::{Array2, Array3, ArrayView2, Axis};

/// One raw temperature matrix, borrowed from its stack.
///
/// Frames are read-only; transforms copy before they mutate.
pub type ThermalFrame<'a> = ArrayView2<'a, f32>;

/// All thermal frames of a session, shape `(frames, height, width)`.
#[derive(Debug, Clone)]
pub struct ThermalStack {
    data: Array3<f32>,
}

impl ThermalStack {
    /// Wrap an already-shaped `(frames, height, width)` array.
    pub fn new(data: Array3<f32>) -> Self {
        Self { data }
    }

    /// Build a stack from individual frames, which must all share one shape.
    pub fn from_frames(frames: Vec<Array2<f32>>) -> MeltviewResult<Self> {
        let Some(first) = frames.first() else {
            return Ok(Self::new(Array3::zeros((0, 0, 0))));
        };

        let dim = first.dim();
        if let Some((index, frame)) = frames.iter().enumerate().find(|(_, f)| f.dim() != dim) {
            return Err(MeltviewError::shape_mismatch(format!(
                "frame {index} is {:?}, expected {:?}",
                frame.dim(),
                dim
            )));
        }

        let views: Vec<ArrayView2<'_, f32>> = frames.iter().map(|f| f.view()).collect();
        let data = ndarray::stack(Axis(0), &views)
            .map_err(|e| MeltviewError::shape_mismatch(e.to_string()))?;
        Ok(Self::new(data))
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Frame height in rows.
    pub fn height(&self) -> usize {
        self.data.len_of(Axis(1))
    }

    /// Frame width in columns.
    pub fn width(&self) -> usize {
        self.data.len_of(Axis(2))
    }

    /// Borrow a frame, or `None` past the end.
    pub fn get(&self, index: usize) -> Option<ThermalFrame<'_>> {
        (index < self.len()).then(|| self.data.index_axis(Axis(0), index))
    }

    /// Iterate frames in capture order.
    pub fn frames(&self) -> impl ExactSizeIterator<Item = ThermalFrame<'_>> {
        self.data.outer_iter()
    }

    /// The underlying `(frames, height, width)` array.
    pub fn data(&self) -> &Array3<f32> {
        &self.data
    }
}

/// Highest finite temperature in a frame, `0.0` when there is none.
pub fn frame_max(frame: &ThermalFrame<'_>) -> f32 {
    frame
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<f32>, v| Some(acc.map_or(v, |m| m.max(v))))
        .unwrap_or(0.0)
}
