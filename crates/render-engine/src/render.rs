//! Batch rendering of a prepared session.

use image::RgbImage;

use meltview_common::error::{MeltviewError, MeltviewResult};
use meltview_processing_core::align::{align, AlignmentSummary};
use meltview_processing_core::pipeline::{FrameTransformPipeline, PipelineConfig};
use meltview_session_model::label::BuildLabel;
use meltview_session_model::record::MatchedRecord;
use meltview_session_model::session::Session;

use crate::export::{ExportProgress, ExportStage, ProgressCallback};

/// A session with its matched records and a configured pipeline.
///
/// Everything here is immutable once prepared; playback and export only
/// read from it.
#[derive(Debug, Clone)]
pub struct RenderSession {
    session: Session,
    records: Vec<MatchedRecord>,
    pipeline: FrameTransformPipeline,
}

impl RenderSession {
    /// Align the session and prepare the pipeline.
    ///
    /// Fails before any frame is rendered when the inputs are inconsistent.
    pub fn prepare(session: Session, config: PipelineConfig) -> MeltviewResult<Self> {
        let records = align(&session.frames, &session.timestamps, &session.readings)?;
        let pipeline = FrameTransformPipeline::prepare(config, &session.frames)?;
        Ok(Self {
            session,
            records,
            pipeline,
        })
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[MatchedRecord] {
        &self.records
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn pipeline(&self) -> &FrameTransformPipeline {
        &self.pipeline
    }

    pub fn build(&self) -> Option<&BuildLabel> {
        self.session.build.as_ref()
    }

    pub fn summary(&self) -> AlignmentSummary {
        AlignmentSummary::from_records(&self.records)
    }

    /// Size `(width, height)` of every rendered frame.
    pub fn output_size(&self) -> (u32, u32) {
        let (width, height) = self.session.frame_size();
        self.pipeline.output_size(width, height)
    }

    /// Render one frame.
    pub fn render_frame(&self, index: usize) -> MeltviewResult<RgbImage> {
        let (Some(frame), Some(record)) = (self.session.frames.get(index), self.records.get(index))
        else {
            return Err(MeltviewError::shape_mismatch(format!(
                "frame {index} is outside a session of {} frames",
                self.len()
            )));
        };
        self.pipeline.render(frame, record)
    }

    /// Render every frame in order.
    pub fn render_all(&self, progress: Option<&ProgressCallback>) -> MeltviewResult<Vec<RgbImage>> {
        let total = self.len() as u64;
        let started = std::time::Instant::now();
        let mut frames = Vec::with_capacity(self.len());

        for index in 0..self.len() {
            frames.push(self.render_frame(index)?);
            if let Some(cb) = progress {
                cb(ExportProgress::frames(
                    ExportStage::Rendering,
                    index as u64 + 1,
                    total,
                    started.elapsed().as_secs_f64(),
                ));
            }
        }

        tracing::info!(
            frames = frames.len(),
            elapsed_ms = started.elapsed().as_millis(),
            "Rendered all frames"
        );
        Ok(frames)
    }
}
