//! Meltview CLI — Command-line interface for thermal session playback and export.
//!
//! Usage:
//!   meltview play <TEMPERATURE> <SENSOR>     Play a session in an ffplay window
//!   meltview export <TEMPERATURE> <SENSOR>   Render a session to a video file
//!   meltview info <TEMPERATURE> <SENSOR>     Print matched per-frame records
//!   meltview check                           Check for ffmpeg, ffplay and ffprobe

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use meltview_common::config::AppConfig;

mod commands;

use commands::{InputArgs, RenderArgs};

#[derive(Parser)]
#[command(
    name = "meltview",
    about = "Time-aligned playback and export of thermal camera and meltpool data",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a session interactively (q quit, k pause, l/j seek ±10 frames)
    Play {
        #[command(flatten)]
        inputs: InputArgs,

        #[command(flatten)]
        render: RenderArgs,

        /// Delay per frame in milliseconds, also the key poll interval
        #[arg(long)]
        delay: Option<u64>,

        /// Render frames on demand instead of up front
        #[arg(long)]
        lazy: bool,
    },

    /// Render a session to a video file
    Export {
        #[command(flatten)]
        inputs: InputArgs,

        #[command(flatten)]
        render: RenderArgs,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Playback speed multiplier
        #[arg(long)]
        speed: Option<u32>,

        /// Frame rate the camera captured at
        #[arg(long)]
        realtime_fps: Option<u32>,

        /// Output format: ffv1|h264|mpeg4
        #[arg(long)]
        format: Option<String>,

        /// Read the output back with ffprobe
        #[arg(long)]
        verify: bool,
    },

    /// Print matched per-frame records
    Info {
        #[command(flatten)]
        inputs: InputArgs,

        /// Only print this frame
        #[arg(long)]
        frame: Option<usize>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Check for external tools
    Check,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load();

    // Initialize logging
    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    meltview_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Play {
            inputs,
            render,
            delay,
            lazy,
        } => commands::play::run(&inputs, &render, delay, lazy, &config),
        Commands::Export {
            inputs,
            render,
            output,
            speed,
            realtime_fps,
            format,
            verify,
        } => commands::export::run(
            &inputs,
            &render,
            commands::export::ExportArgs {
                output,
                speed,
                realtime_fps,
                format,
                verify,
            },
            &config,
        ),
        Commands::Info {
            inputs,
            frame,
            json,
        } => commands::info::run(&inputs, frame, json),
        Commands::Check => commands::check::run(),
    }
}
