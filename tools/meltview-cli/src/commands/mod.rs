//! Subcommands and the arguments they share.

use std::path::PathBuf;

use clap::Args;

use meltview_common::config::RenderDefaults;
use meltview_processing_core::pipeline::PipelineConfig;
use meltview_render_engine::export::ExportProgress;
use meltview_render_engine::render::RenderSession;
use meltview_session_model::label::BuildLabel;
use meltview_session_model::session::Session;
use meltview_session_model::source::{FileInputSource, InputPaths};

pub mod check;
pub mod export;
pub mod info;
pub mod play;

/// The three session inputs.
#[derive(Debug, Args)]
pub struct InputArgs {
    /// Thermal camera temperatures (.npy, frames x height x width)
    pub temperature: PathBuf,

    /// Meltpool sensor readings (.npy rows of t,x,y,z,area, .json or .jsonl)
    pub sensor: PathBuf,

    /// Video timestamps [default: video_timestamps.npy next to TEMPERATURE]
    #[arg(long)]
    pub timestamps: Option<PathBuf>,

    /// Build label for logs, titles and output names
    #[arg(long)]
    pub build: Option<String>,
}

impl InputArgs {
    pub fn source(&self) -> FileInputSource {
        let paths = InputPaths::new(
            self.temperature.clone(),
            self.sensor.clone(),
            self.timestamps.clone(),
        );
        FileInputSource::new(paths, self.build.clone().and_then(BuildLabel::new))
    }

    pub fn load_session(&self) -> anyhow::Result<Session> {
        Session::load(&self.source()).map_err(|e| anyhow::anyhow!("Failed to load session: {e}"))
    }
}

/// Optional pipeline steps.
#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Integer upscale factor
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub scale: Option<u32>,

    /// Draw sensor values onto each frame
    #[arg(long)]
    pub overlay: bool,

    /// Remove reflections above the meltpool
    #[arg(long)]
    pub top: bool,

    /// Remove reflections below the part
    #[arg(long)]
    pub bottom: bool,
}

impl RenderArgs {
    pub fn pipeline_config(&self, defaults: &RenderDefaults) -> PipelineConfig {
        let mut config = PipelineConfig::from_defaults(defaults, self.top, self.bottom, self.overlay);
        if let Some(scale) = self.scale {
            config.scale = scale;
        }
        config
    }
}

/// Load, align and configure a session for rendering.
pub fn prepare(
    inputs: &InputArgs,
    render: &RenderArgs,
    defaults: &RenderDefaults,
) -> anyhow::Result<RenderSession> {
    let session = inputs.load_session()?;
    let config = render.pipeline_config(defaults);
    let prepared = RenderSession::prepare(session, config)
        .map_err(|e| anyhow::anyhow!("Failed to prepare session: {e}"))?;

    let summary = prepared.summary();
    println!(
        "Session: {} frames, {} of {} readings used",
        summary.frames,
        summary.readings_used,
        prepared.session().readings.len()
    );
    if summary.leading_frames > 0 {
        println!(
            "  {} frames precede the first sensor reading",
            summary.leading_frames
        );
    }
    Ok(prepared)
}

/// Console progress line in the style of a progress bar.
pub fn progress_printer(label: &'static str) -> Box<dyn Fn(ExportProgress) + Send> {
    Box::new(move |p| {
        eprint!(
            "\r  {label}: {:.1}% ({}/{} frames, ETA: {:.0}s)  ",
            p.progress * 100.0,
            p.frames_done,
            p.total_frames,
            p.eta_secs,
        );
    })
}
