//! Render a session to a video file.

use std::path::{Path, PathBuf};

use meltview_common::clock::FrameRate;
use meltview_common::config::AppConfig;
use meltview_render_engine::export::{probe_video, ExportSettings, VideoExporter, VideoFormat};
use meltview_session_model::label::BuildLabel;

use super::{prepare, progress_printer, InputArgs, RenderArgs};

/// Export-only options; unset values fall back to the config file.
pub struct ExportArgs {
    pub output: Option<PathBuf>,
    pub speed: Option<u32>,
    pub realtime_fps: Option<u32>,
    pub format: Option<String>,
    pub verify: bool,
}

pub fn run(
    inputs: &InputArgs,
    render: &RenderArgs,
    args: ExportArgs,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let format: VideoFormat = args
        .format
        .as_deref()
        .unwrap_or(&config.export.format)
        .parse()?;
    let frame_rate = FrameRate::new(
        args.speed.unwrap_or(config.export.playback_speed),
        args.realtime_fps.unwrap_or(config.export.realtime_framerate),
    );
    if frame_rate.fps() == 0 {
        anyhow::bail!("Export frame rate must be greater than zero");
    }

    let exporter = VideoExporter::ffmpeg();
    println!("Exporting session: {}", inputs.temperature.display());

    let session = prepare(inputs, render, &config.render)?;
    let output = args
        .output
        .unwrap_or_else(|| default_output_path(&inputs.temperature, session.build(), format));

    let (width, height) = session.output_size();
    println!("  Output: {}", output.display());
    println!("  Format: {}", format.as_str());
    println!("  Resolution: {width}x{height}");
    println!(
        "  Frame rate: {} fps ({}x speed of {} fps capture)",
        frame_rate.fps(),
        frame_rate.playback_speed,
        frame_rate.realtime_framerate
    );
    println!(
        "  Duration: {:.1}s",
        frame_rate.duration_secs(session.len())
    );

    let frames = session.render_all(Some(&progress_printer("Rendering")))?;
    eprintln!();

    let mut settings = ExportSettings::new(output.clone(), frame_rate, format);
    settings.build = session.build().cloned();

    let report = match exporter.export(&frames, &settings, Some(&progress_printer("Encoding"))) {
        Ok(report) => {
            eprintln!();
            println!("Export complete: {}", output.display());
            report
        }
        Err(e) => {
            eprintln!();
            return Err(anyhow::anyhow!("Export failed: {e}"));
        }
    };

    if args.verify {
        let probe = probe_video(&output)?;
        println!(
            "  Verified: {} frames at {:.2} fps, {}x{}",
            probe.frames, probe.fps, probe.width, probe.height
        );
        if probe.frames != report.frames || (probe.fps - report.fps as f64).abs() > 0.01 {
            anyhow::bail!(
                "Verification failed: expected {} frames at {} fps",
                report.frames,
                report.fps
            );
        }
    }

    Ok(())
}

/// `<temperature dir>/<build>_thermal.<ext>`
fn default_output_path(temperature: &Path, build: Option<&BuildLabel>, format: VideoFormat) -> PathBuf {
    let stem = build.map_or_else(|| "meltview".to_string(), BuildLabel::file_safe);
    let name = format!("{stem}_thermal.{}", format.extension());
    temperature
        .parent()
        .map(|dir| dir.join(&name))
        .unwrap_or_else(|| PathBuf::from(name))
}
