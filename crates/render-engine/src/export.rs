//! Video export: persist a rendered frame sequence at a target frame rate.

use std::ffi::OsString;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use chrono::{DateTime, Utc};
use image::RgbImage;
use serde::{Deserialize, Serialize};

use meltview_common::clock::FrameRate;
use meltview_common::error::{MeltviewError, MeltviewResult};
use meltview_session_model::label::BuildLabel;

/// Progress callback for rendering and export.
pub type ProgressCallback = Box<dyn Fn(ExportProgress) + Send>;

/// Export progress report.
#[derive(Debug, Clone)]
pub struct ExportProgress {
    /// Current progress [0.0, 1.0].
    pub progress: f64,

    /// Frames processed so far in the current stage.
    pub frames_done: u64,

    /// Total frames to process.
    pub total_frames: u64,

    /// Estimated time remaining in seconds.
    pub eta_secs: f64,

    /// Current stage.
    pub stage: ExportStage,
}

impl ExportProgress {
    /// Report for `done` of `total` frames, `elapsed_secs` into the stage.
    pub fn frames(stage: ExportStage, done: u64, total: u64, elapsed_secs: f64) -> Self {
        let progress = if total == 0 {
            0.0
        } else {
            (done as f64 / total as f64).clamp(0.0, 1.0)
        };
        let eta_secs = if progress > 0.0 {
            (elapsed_secs / progress) - elapsed_secs
        } else {
            0.0
        }
        .max(0.0);

        Self {
            progress,
            frames_done: done,
            total_frames: total,
            eta_secs,
            stage,
        }
    }
}

/// Stages of the render and export process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStage {
    Preparing,
    Rendering,
    Encoding,
    Finalizing,
    Complete,
    Failed,
}

/// Container and codec of the exported video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoFormat {
    /// Lossless FFV1 in Matroska; keeps exact frame dimensions.
    #[default]
    Ffv1,
    /// H.264 in MP4; odd dimensions are padded to even.
    H264,
    /// MPEG-4 Part 2 in AVI.
    Mpeg4,
}

impl VideoFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ffv1 => "ffv1",
            Self::H264 => "h264",
            Self::Mpeg4 => "mpeg4",
        }
    }

    /// Conventional file extension.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Ffv1 => "mkv",
            Self::H264 => "mp4",
            Self::Mpeg4 => "avi",
        }
    }

    /// Encoder arguments placed after the rawvideo input.
    fn codec_args(self) -> Vec<String> {
        match self {
            Self::Ffv1 => vec![
                "-c:v".to_string(),
                "ffv1".to_string(),
                "-level".to_string(),
                "3".to_string(),
                "-pix_fmt".to_string(),
                "bgr0".to_string(),
            ],
            Self::H264 => vec![
                "-vf".to_string(),
                "pad=ceil(iw/2)*2:ceil(ih/2)*2".to_string(),
                "-c:v".to_string(),
                "libx264".to_string(),
                "-preset".to_string(),
                "medium".to_string(),
                "-pix_fmt".to_string(),
                "yuv420p".to_string(),
                "-movflags".to_string(),
                "+faststart".to_string(),
            ],
            Self::Mpeg4 => vec![
                "-c:v".to_string(),
                "mpeg4".to_string(),
                "-q:v".to_string(),
                "2".to_string(),
            ],
        }
    }
}

impl FromStr for VideoFormat {
    type Err = MeltviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ffv1" | "mkv" => Ok(Self::Ffv1),
            "h264" | "mp4" => Ok(Self::H264),
            "mpeg4" | "avi" => Ok(Self::Mpeg4),
            other => Err(MeltviewError::config(format!(
                "unknown video format '{other}', expected ffv1, h264 or mpeg4"
            ))),
        }
    }
}

/// Everything a backend needs to open a destination.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoSpec {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub format: VideoFormat,
}

/// An open video destination.
///
/// Dropping a sink without calling [`VideoSink::finish`] still finalizes it,
/// so an error mid-write never leaves the destination open.
pub trait VideoSink {
    /// Append one frame; its size must match the [`VideoSpec`].
    fn write_frame(&mut self, frame: &RgbImage) -> MeltviewResult<()>;

    /// Flush and close the destination, returning the frames written.
    fn finish(self: Box<Self>) -> MeltviewResult<u64>;
}

/// Trait for export backends.
pub trait VideoBackend {
    /// Open a destination for the given spec.
    fn open(&self, spec: &VideoSpec) -> MeltviewResult<Box<dyn VideoSink>>;

    /// Check if this backend is available on the system.
    fn is_available(&self) -> bool;

    /// Backend name.
    fn name(&self) -> &str;
}

/// Parameters of one export.
#[derive(Debug, Clone)]
pub struct ExportSettings {
    /// Output file path.
    pub output: PathBuf,

    /// Playback speed multiplier and capture rate.
    pub frame_rate: FrameRate,

    pub format: VideoFormat,

    /// Recorded in the export report.
    pub build: Option<BuildLabel>,
}

impl ExportSettings {
    pub fn new(output: PathBuf, frame_rate: FrameRate, format: VideoFormat) -> Self {
        Self {
            output,
            frame_rate,
            format,
            build: None,
        }
    }
}

/// Summary written next to every exported video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportReport {
    pub output: PathBuf,
    pub frames: u64,
    pub fps: u32,
    pub playback_speed: u32,
    pub realtime_framerate: u32,
    pub width: u32,
    pub height: u32,
    pub format: VideoFormat,
    pub backend: String,
    pub build: Option<BuildLabel>,
    pub created_at: DateTime<Utc>,
}

impl ExportReport {
    /// `<output>.export.json`
    pub fn path_for(output: &Path) -> PathBuf {
        let mut name: OsString = output.as_os_str().to_owned();
        name.push(".export.json");
        PathBuf::from(name)
    }

    pub fn load(path: &Path) -> MeltviewResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| MeltviewError::load(path, e.to_string()))?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Writes frame sequences through a [`VideoBackend`].
pub struct VideoExporter {
    backend: Box<dyn VideoBackend>,
}

impl VideoExporter {
    pub fn new(backend: Box<dyn VideoBackend>) -> Self {
        Self { backend }
    }

    /// Exporter using ffmpeg.
    pub fn ffmpeg() -> Self {
        Self::new(Box::new(FfmpegBackend::new()))
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Export every frame in order and write the report.
    ///
    /// The destination is finalized on every path; a failure mid-write
    /// closes it before the error is returned.
    pub fn export(
        &self,
        frames: &[RgbImage],
        settings: &ExportSettings,
        progress: Option<&ProgressCallback>,
    ) -> MeltviewResult<ExportReport> {
        let fps = settings.frame_rate.fps();
        let Some(first) = frames.first() else {
            return Err(MeltviewError::export("no frames to export"));
        };
        if fps == 0 {
            return Err(MeltviewError::export("frame rate must be greater than zero"));
        }
        if !self.backend.is_available() {
            return Err(MeltviewError::unsupported(format!(
                "export backend '{}' is not available",
                self.backend.name()
            )));
        }

        if let Some(parent) = settings.output.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let spec = VideoSpec {
            path: settings.output.clone(),
            width: first.width(),
            height: first.height(),
            fps,
            format: settings.format,
        };
        tracing::info!(
            output = %spec.path.display(),
            frames = frames.len(),
            fps,
            width = spec.width,
            height = spec.height,
            format = spec.format.as_str(),
            backend = self.backend.name(),
            "Starting export"
        );

        if let Some(cb) = progress {
            cb(ExportProgress::frames(ExportStage::Preparing, 0, frames.len() as u64, 0.0));
        }

        let started = std::time::Instant::now();
        let written = match self.write_all(&spec, frames, progress, started) {
            Ok(written) => written,
            Err(err) => {
                if let Some(cb) = progress {
                    cb(ExportProgress::frames(ExportStage::Failed, 0, frames.len() as u64, 0.0));
                }
                return Err(err);
            }
        };

        let report = ExportReport {
            output: spec.path.clone(),
            frames: written,
            fps,
            playback_speed: settings.frame_rate.playback_speed,
            realtime_framerate: settings.frame_rate.realtime_framerate,
            width: spec.width,
            height: spec.height,
            format: spec.format,
            backend: self.backend.name().to_string(),
            build: settings.build.clone(),
            created_at: Utc::now(),
        };
        let report_path = ExportReport::path_for(&spec.path);
        std::fs::write(&report_path, serde_json::to_string_pretty(&report)?)?;

        if let Some(cb) = progress {
            cb(ExportProgress::frames(
                ExportStage::Complete,
                written,
                written,
                started.elapsed().as_secs_f64(),
            ));
        }
        tracing::info!(
            report = %report_path.display(),
            elapsed_secs = started.elapsed().as_secs_f64(),
            "Export finished"
        );
        Ok(report)
    }

    fn write_all(
        &self,
        spec: &VideoSpec,
        frames: &[RgbImage],
        progress: Option<&ProgressCallback>,
        started: std::time::Instant,
    ) -> MeltviewResult<u64> {
        let total = frames.len() as u64;
        let mut sink = self.backend.open(spec)?;

        for (index, frame) in frames.iter().enumerate() {
            if frame.dimensions() != (spec.width, spec.height) {
                return Err(MeltviewError::export(format!(
                    "frame {index} is {}x{}, expected {}x{}",
                    frame.width(),
                    frame.height(),
                    spec.width,
                    spec.height
                )));
            }
            sink.write_frame(frame)?;

            if let Some(cb) = progress {
                cb(ExportProgress::frames(
                    ExportStage::Encoding,
                    index as u64 + 1,
                    total,
                    started.elapsed().as_secs_f64(),
                ));
            }
        }

        if let Some(cb) = progress {
            cb(ExportProgress::frames(
                ExportStage::Finalizing,
                total,
                total,
                started.elapsed().as_secs_f64(),
            ));
        }
        sink.finish()
    }
}

/// Backend that pipes raw RGB frames into an `ffmpeg` child process.
#[derive(Debug, Default)]
pub struct FfmpegBackend;

impl FfmpegBackend {
    pub fn new() -> Self {
        Self
    }

    fn ffmpeg_args(spec: &VideoSpec) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-f".to_string(),
            "rawvideo".to_string(),
            "-pixel_format".to_string(),
            "rgb24".to_string(),
            "-video_size".to_string(),
            format!("{}x{}", spec.width, spec.height),
            "-framerate".to_string(),
            spec.fps.to_string(),
            "-i".to_string(),
            "-".to_string(),
        ];
        args.extend(spec.format.codec_args());
        args.push(spec.path.to_string_lossy().into_owned());
        args
    }
}

impl VideoBackend for FfmpegBackend {
    fn open(&self, spec: &VideoSpec) -> MeltviewResult<Box<dyn VideoSink>> {
        let args = Self::ffmpeg_args(spec);
        tracing::debug!(args = ?args, "Running ffmpeg");

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| MeltviewError::export(format!("Failed to start ffmpeg: {e}")))?;

        tracing::info!(pid = child.id(), "ffmpeg process started");

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| MeltviewError::export("Failed to capture ffmpeg stdin"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| MeltviewError::export("Failed to capture ffmpeg stderr"))?;

        // Drain stderr concurrently to avoid ffmpeg blocking on a full stderr pipe.
        let stderr_task = std::thread::spawn(move || -> String {
            let mut reader = BufReader::new(stderr);
            let mut output = String::new();
            match reader.read_to_string(&mut output) {
                Ok(_) => output,
                Err(err) => format!("<failed to read ffmpeg stderr: {err}>"),
            }
        });

        Ok(Box::new(FfmpegSink {
            child: Some(child),
            stdin: Some(stdin),
            stderr_task: Some(stderr_task),
            width: spec.width,
            height: spec.height,
            frames_written: 0,
        }))
    }

    fn is_available(&self) -> bool {
        command_exists("ffmpeg")
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

struct FfmpegSink {
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_task: Option<JoinHandle<String>>,
    width: u32,
    height: u32,
    frames_written: u64,
}

impl FfmpegSink {
    /// Close stdin and wait for ffmpeg. Safe to call more than once.
    fn finalize(&mut self) -> MeltviewResult<()> {
        drop(self.stdin.take());
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };

        let status = child
            .wait()
            .map_err(|e| MeltviewError::export(format!("Failed to wait on ffmpeg: {e}")))?;
        let stderr_output = self
            .stderr_task
            .take()
            .map(|task| {
                task.join()
                    .unwrap_or_else(|_| "<failed to join stderr reader>".to_string())
            })
            .unwrap_or_default();

        if !status.success() {
            return Err(MeltviewError::export(format!(
                "ffmpeg export failed (status {}): {}",
                status,
                stderr_output.trim()
            )));
        }
        Ok(())
    }
}

impl VideoSink for FfmpegSink {
    fn write_frame(&mut self, frame: &RgbImage) -> MeltviewResult<()> {
        if frame.dimensions() != (self.width, self.height) {
            return Err(MeltviewError::export(format!(
                "frame is {}x{}, sink expects {}x{}",
                frame.width(),
                frame.height(),
                self.width,
                self.height
            )));
        }
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| MeltviewError::export("ffmpeg input already closed"))?;
        stdin
            .write_all(frame.as_raw())
            .map_err(|e| MeltviewError::export(format!("Failed writing frame to ffmpeg: {e}")))?;
        self.frames_written += 1;
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> MeltviewResult<u64> {
        self.finalize()?;
        Ok(self.frames_written)
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        if self.child.is_some() {
            if let Err(err) = self.finalize() {
                tracing::warn!(error = %err, "ffmpeg did not finalize cleanly");
            }
        }
    }
}

/// A video captured by [`MemoryBackend`].
#[derive(Debug, Clone)]
pub struct RecordedVideo {
    pub spec: VideoSpec,
    pub frames: Vec<RgbImage>,
    pub finalized: bool,
}

/// Backend that keeps videos in memory; useful for tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    videos: Arc<Mutex<Vec<RecordedVideo>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every video opened so far.
    pub fn videos(&self) -> Vec<RecordedVideo> {
        self.videos
            .lock()
            .map(|videos| videos.clone())
            .unwrap_or_default()
    }
}

impl VideoBackend for MemoryBackend {
    fn open(&self, spec: &VideoSpec) -> MeltviewResult<Box<dyn VideoSink>> {
        let mut videos = self
            .videos
            .lock()
            .map_err(|_| MeltviewError::export("memory backend lock poisoned"))?;
        videos.push(RecordedVideo {
            spec: spec.clone(),
            frames: Vec::new(),
            finalized: false,
        });
        Ok(Box::new(MemorySink {
            videos: Arc::clone(&self.videos),
            index: videos.len() - 1,
        }))
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "memory"
    }
}

struct MemorySink {
    videos: Arc<Mutex<Vec<RecordedVideo>>>,
    index: usize,
}

impl MemorySink {
    fn with_video<T>(&self, f: impl FnOnce(&mut RecordedVideo) -> T) -> MeltviewResult<T> {
        let mut videos = self
            .videos
            .lock()
            .map_err(|_| MeltviewError::export("memory backend lock poisoned"))?;
        let video = videos
            .get_mut(self.index)
            .ok_or_else(|| MeltviewError::export("memory video vanished"))?;
        Ok(f(video))
    }
}

impl VideoSink for MemorySink {
    fn write_frame(&mut self, frame: &RgbImage) -> MeltviewResult<()> {
        self.with_video(|video| {
            if frame.dimensions() != (video.spec.width, video.spec.height) {
                return Err(MeltviewError::export("frame size does not match the video"));
            }
            video.frames.push(frame.clone());
            Ok(())
        })?
    }

    fn finish(self: Box<Self>) -> MeltviewResult<u64> {
        self.with_video(|video| {
            video.finalized = true;
            video.frames.len() as u64
        })
    }
}

impl Drop for MemorySink {
    fn drop(&mut self) {
        let _ = self.with_video(|video| video.finalized = true);
    }
}

/// What `ffprobe` reports about an exported video.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoProbe {
    pub width: u32,
    pub height: u32,
    pub frames: u64,
    pub fps: f64,
}

/// Read back an exported video's dimensions, frame count and rate.
pub fn probe_video(path: &Path) -> MeltviewResult<VideoProbe> {
    if !command_exists("ffprobe") {
        return Err(MeltviewError::unsupported("ffprobe not found in PATH"));
    }

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-count_frames",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,nb_read_frames,r_frame_rate",
            "-of",
            "default=noprint_wrappers=1",
        ])
        .arg(path)
        .output()
        .map_err(|e| MeltviewError::export(format!("Failed to run ffprobe: {e}")))?;

    if !output.status.success() {
        return Err(MeltviewError::export(format!(
            "ffprobe failed on {}: {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    parse_probe_output(&String::from_utf8_lossy(&output.stdout)).ok_or_else(|| {
        MeltviewError::export(format!("unexpected ffprobe output for {}", path.display()))
    })
}

fn parse_probe_output(raw: &str) -> Option<VideoProbe> {
    let mut width = None;
    let mut height = None;
    let mut frames = None;
    let mut fps = None;

    for line in raw.lines() {
        let Some((key, value)) = line.trim().split_once('=') else {
            continue;
        };
        match key {
            "width" => width = value.parse::<u32>().ok(),
            "height" => height = value.parse::<u32>().ok(),
            "nb_read_frames" => frames = value.parse::<u64>().ok(),
            "r_frame_rate" => fps = parse_rational(value),
            _ => {}
        }
    }

    Some(VideoProbe {
        width: width?,
        height: height?,
        frames: frames?,
        fps: fps?,
    })
}

fn parse_rational(value: &str) -> Option<f64> {
    match value.split_once('/') {
        Some((num, den)) => {
            let den = den.parse::<f64>().ok()?;
            (den != 0.0).then_some(num.parse::<f64>().ok()? / den)
        }
        None => value.parse::<f64>().ok(),
    }
}

/// Whether `binary` is on `PATH`.
pub fn command_exists(binary: &str) -> bool {
    Command::new("sh")
        .arg("-c")
        .arg(format!("command -v {binary} >/dev/null 2>&1"))
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames(count: usize, width: u32, height: u32) -> Vec<RgbImage> {
        (0..count)
            .map(|i| RgbImage::from_pixel(width, height, image::Rgb([i as u8, 0, 0])))
            .collect()
    }

    fn settings(dir: &Path) -> ExportSettings {
        ExportSettings::new(
            dir.join("out.mkv"),
            FrameRate::new(15, 4),
            VideoFormat::Ffv1,
        )
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("FFV1".parse::<VideoFormat>().unwrap(), VideoFormat::Ffv1);
        assert_eq!("mp4".parse::<VideoFormat>().unwrap(), VideoFormat::H264);
        assert_eq!(VideoFormat::Mpeg4.extension(), "avi");
        assert!("gif".parse::<VideoFormat>().is_err());
    }

    #[test]
    fn test_ffmpeg_args_stream_rawvideo() {
        let spec = VideoSpec {
            path: PathBuf::from("/tmp/out.mp4"),
            width: 33,
            height: 21,
            fps: 60,
            format: VideoFormat::H264,
        };
        let args = FfmpegBackend::ffmpeg_args(&spec);
        let joined = args.join(" ");
        assert!(joined.contains("-f rawvideo -pixel_format rgb24 -video_size 33x21 -framerate 60 -i -"));
        assert!(joined.contains("pad=ceil(iw/2)*2:ceil(ih/2)*2"));
        assert_eq!(args.last().map(String::as_str), Some("/tmp/out.mp4"));
    }

    #[test]
    fn test_report_path_appends_suffix() {
        assert_eq!(
            ExportReport::path_for(Path::new("/out/build.mkv")),
            PathBuf::from("/out/build.mkv.export.json")
        );
    }

    #[test]
    fn test_export_writes_every_frame_and_report() {
        let dir = tempfile::tempdir().unwrap();
        let backend = MemoryBackend::new();
        let exporter = VideoExporter::new(Box::new(backend.clone()));

        let report = exporter
            .export(&frames(5, 8, 6), &settings(dir.path()), None)
            .unwrap();

        assert_eq!(report.frames, 5);
        assert_eq!(report.fps, 60);
        let videos = backend.videos();
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].frames.len(), 5);
        assert!(videos[0].finalized);
        assert_eq!(videos[0].frames[3].get_pixel(0, 0).0, [3, 0, 0]);

        let saved = ExportReport::load(&ExportReport::path_for(&report.output)).unwrap();
        assert_eq!(saved, report);
    }

    #[test]
    fn test_size_change_mid_export_finalizes_sink() {
        let dir = tempfile::tempdir().unwrap();
        let backend = MemoryBackend::new();
        let exporter = VideoExporter::new(Box::new(backend.clone()));

        let mut sequence = frames(3, 8, 6);
        sequence.push(RgbImage::new(4, 4));
        let err = exporter
            .export(&sequence, &settings(dir.path()), None)
            .unwrap_err();

        assert!(matches!(err, MeltviewError::Export { .. }));
        let videos = backend.videos();
        assert_eq!(videos[0].frames.len(), 3);
        assert!(videos[0].finalized);
        assert!(!ExportReport::path_for(&dir.path().join("out.mkv")).exists());
    }

    #[test]
    fn test_empty_sequence_and_zero_rate_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let backend = MemoryBackend::new();
        let exporter = VideoExporter::new(Box::new(backend.clone()));

        let err = exporter.export(&[], &settings(dir.path()), None).unwrap_err();
        assert!(matches!(err, MeltviewError::Export { .. }));

        let mut zero = settings(dir.path());
        zero.frame_rate = FrameRate::new(0, 4);
        let err = exporter.export(&frames(2, 4, 4), &zero, None).unwrap_err();
        assert!(matches!(err, MeltviewError::Export { .. }));
        assert!(backend.videos().is_empty());
    }

    #[test]
    fn test_progress_reaches_complete() {
        let dir = tempfile::tempdir().unwrap();
        let stages = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&stages);
        let callback: ProgressCallback = Box::new(move |p: ExportProgress| {
            seen.lock().unwrap().push((p.stage, p.frames_done));
        });

        VideoExporter::new(Box::new(MemoryBackend::new()))
            .export(&frames(2, 4, 4), &settings(dir.path()), Some(&callback))
            .unwrap();

        let stages = stages.lock().unwrap();
        assert_eq!(stages.first(), Some(&(ExportStage::Preparing, 0)));
        assert!(stages.contains(&(ExportStage::Encoding, 2)));
        assert_eq!(stages.last(), Some(&(ExportStage::Complete, 2)));
    }

    #[test]
    fn test_parse_probe_output() {
        let raw = "width=320\nheight=240\nr_frame_rate=60/1\nnb_read_frames=12\n";
        let probe = parse_probe_output(raw).unwrap();
        assert_eq!(probe.frames, 12);
        assert_eq!((probe.width, probe.height), (320, 240));
        assert!((probe.fps - 60.0).abs() < 1e-9);

        assert!(parse_probe_output("width=320\n").is_none());
        assert_eq!(parse_rational("0/0"), None);
    }
}
