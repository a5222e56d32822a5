//! Random-access sources of rendered frames for playback.

use image::RgbImage;

use meltview_common::error::{MeltviewError, MeltviewResult};

use crate::export::ProgressCallback;
use crate::render::RenderSession;

/// Rendered frames addressable by position.
pub trait FrameSource {
    /// Number of frames.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The frame at `index`, which must be below [`FrameSource::len`].
    fn frame(&mut self, index: usize) -> MeltviewResult<&RgbImage>;
}

/// Every frame rendered up front; seeking is free.
#[derive(Debug, Clone, Default)]
pub struct FrameBuffer {
    frames: Vec<RgbImage>,
}

impl FrameBuffer {
    pub fn new(frames: Vec<RgbImage>) -> Self {
        Self { frames }
    }

    /// Render the whole session into memory.
    pub fn render(session: &RenderSession, progress: Option<&ProgressCallback>) -> MeltviewResult<Self> {
        session.render_all(progress).map(Self::new)
    }

    pub fn frames(&self) -> &[RgbImage] {
        &self.frames
    }

    pub fn into_frames(self) -> Vec<RgbImage> {
        self.frames
    }
}

impl FrameSource for FrameBuffer {
    fn len(&self) -> usize {
        self.frames.len()
    }

    fn frame(&mut self, index: usize) -> MeltviewResult<&RgbImage> {
        let len = self.frames.len();
        self.frames
            .get(index)
            .ok_or_else(|| out_of_range(index, len))
    }
}

/// Renders on demand, keeping only the most recent frame.
#[derive(Debug)]
pub struct LazyFrames<'a> {
    session: &'a RenderSession,
    cached: Option<(usize, RgbImage)>,
    renders: usize,
}

impl<'a> LazyFrames<'a> {
    pub fn new(session: &'a RenderSession) -> Self {
        Self {
            session,
            cached: None,
            renders: 0,
        }
    }

    /// Number of frames rendered so far.
    pub fn renders(&self) -> usize {
        self.renders
    }
}

impl FrameSource for LazyFrames<'_> {
    fn len(&self) -> usize {
        self.session.len()
    }

    fn frame(&mut self, index: usize) -> MeltviewResult<&RgbImage> {
        if index >= self.len() {
            return Err(out_of_range(index, self.len()));
        }
        if self.cached.as_ref().map(|(cached, _)| *cached) != Some(index) {
            let image = self.session.render_frame(index)?;
            self.renders += 1;
            self.cached = Some((index, image));
        }
        self.cached
            .as_ref()
            .map(|(_, image)| image)
            .ok_or_else(|| out_of_range(index, self.session.len()))
    }
}

fn out_of_range(index: usize, len: usize) -> MeltviewError {
    MeltviewError::shape_mismatch(format!("frame {index} is outside a sequence of {len} frames"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use meltview_processing_core::pipeline::PipelineConfig;
    use meltview_session_model::label::BuildLabel;
    use meltview_session_model::sensor::{SensorReading, TimestampStream};
    use meltview_session_model::session::Session;
    use meltview_session_model::thermal::ThermalStack;
    use ndarray::Array3;

    fn prepared() -> RenderSession {
        let session = Session {
            frames: ThermalStack::new(Array3::from_shape_fn((3, 4, 4), |(f, r, c)| {
                (f * 100 + r * 4 + c) as f32
            })),
            timestamps: TimestampStream::new(vec![0.0, 1.0, 2.0]),
            readings: vec![SensorReading::new(0.0, 0.0, 0.0, 0.0, 0.0)],
            build: BuildLabel::new("lazy"),
        };
        RenderSession::prepare(session, PipelineConfig::default()).unwrap()
    }

    #[test]
    fn test_lazy_frames_match_buffer() {
        let session = prepared();
        let mut buffer = FrameBuffer::render(&session, None).unwrap();
        let mut lazy = LazyFrames::new(&session);

        for index in [2, 0, 1] {
            let expected = buffer.frame(index).unwrap().clone();
            assert_eq!(lazy.frame(index).unwrap().as_raw(), expected.as_raw());
        }
    }

    #[test]
    fn test_lazy_frames_cache_last_render() {
        let session = prepared();
        let mut lazy = LazyFrames::new(&session);
        lazy.frame(1).unwrap();
        lazy.frame(1).unwrap();
        assert_eq!(lazy.renders(), 1);
        lazy.frame(2).unwrap();
        assert_eq!(lazy.renders(), 2);
        assert!(lazy.frame(3).is_err());
    }
}
