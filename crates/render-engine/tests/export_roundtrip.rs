use meltview_common::clock::FrameRate;
use meltview_processing_core::pipeline::PipelineConfig;
use meltview_render_engine::export::{
    command_exists, probe_video, ExportReport, ExportSettings, FfmpegBackend, MemoryBackend,
    VideoExporter, VideoFormat,
};
use meltview_render_engine::render::RenderSession;
use meltview_session_model::label::BuildLabel;
use meltview_session_model::sensor::{SensorReading, TimestampStream};
use meltview_session_model::session::Session;
use meltview_session_model::thermal::ThermalStack;
use ndarray::Array3;

const FRAMES: usize = 12;

fn prepared_session(config: PipelineConfig) -> RenderSession {
    let frames = ThermalStack::new(Array3::from_shape_fn((FRAMES, 24, 32), |(f, r, c)| {
        let hot = (r as i64 - 12).abs() + (c as i64 - (f as i64 * 2)).abs();
        (1200 - hot * 40).max(150) as f32
    }));
    let timestamps = TimestampStream::new((0..FRAMES).map(|i| i as f64 * 0.25).collect());
    let readings = vec![
        SensorReading::new(0.0, 1.0, 1.0, 0.1, 0.4),
        SensorReading::new(1.0, 2.0, 1.0, 0.1, 0.5),
        SensorReading::new(2.0, 3.0, 1.0, 0.1, 0.6),
    ];
    let session = Session {
        frames,
        timestamps,
        readings,
        build: BuildLabel::new("4312"),
    };
    RenderSession::prepare(session, config).expect("session should prepare")
}

fn settings(output: std::path::PathBuf, format: VideoFormat) -> ExportSettings {
    let mut settings = ExportSettings::new(output, FrameRate::new(15, 4), format);
    settings.build = BuildLabel::new("4312");
    settings
}

#[test]
fn rendered_sequence_round_trips_through_memory_backend() {
    let config = PipelineConfig {
        overlay: true,
        scale: 2,
        ..PipelineConfig::default()
    };
    let session = prepared_session(config);
    let frames = session.render_all(None).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let backend = MemoryBackend::new();
    let exporter = VideoExporter::new(Box::new(backend.clone()));
    let report = exporter
        .export(&frames, &settings(dir.path().join("cube.mkv"), VideoFormat::Ffv1), None)
        .unwrap();

    assert_eq!(report.frames, FRAMES as u64);
    assert_eq!(report.fps, 60);
    assert_eq!((report.width, report.height), session.output_size());
    assert_eq!(report.build.as_ref().map(BuildLabel::as_str), Some("4312"));

    let videos = backend.videos();
    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0].spec.fps, 60);
    assert_eq!(videos[0].frames.len(), FRAMES);
    assert!(videos[0].finalized);
    for (written, rendered) in videos[0].frames.iter().zip(&frames) {
        assert_eq!(written.as_raw(), rendered.as_raw());
    }
}

#[test]
fn ffmpeg_export_reads_back_frame_count_and_rate() {
    if !command_exists("ffmpeg") || !command_exists("ffprobe") {
        eprintln!("skipping: ffmpeg/ffprobe not installed");
        return;
    }

    let session = prepared_session(PipelineConfig::default());
    let frames = session.render_all(None).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("cube.mkv");
    let exporter = VideoExporter::new(Box::new(FfmpegBackend::new()));
    let report = exporter
        .export(&frames, &settings(output.clone(), VideoFormat::Ffv1), None)
        .unwrap();

    let probe = probe_video(&output).unwrap();
    assert_eq!(probe.frames, FRAMES as u64);
    assert!((probe.fps - 60.0).abs() < 1e-6);
    assert_eq!((probe.width, probe.height), (32, 24));

    let saved = ExportReport::load(&ExportReport::path_for(&output)).unwrap();
    assert_eq!(saved.frames, report.frames);
    assert_eq!(saved.backend, "ffmpeg");
}
