//! Meltview Render Engine
//!
//! Drives prepared sessions through the frame pipeline, either into an
//! interactive playback loop or out to a video file.
//!
//! # Pipeline Architecture
//!
//! ```text
//! temperatures ──┐
//! timestamps ────┼── align ── RenderSession
//! meltpool ──────┘                │
//!                                 ├── FrameBuffer / LazyFrames ── PlaybackController ── ffplay
//!                                 │
//!                                 └── render_all ── VideoExporter ── ffmpeg ── output.mkv
//! ```

pub mod display;
pub mod export;
pub mod frames;
pub mod playback;
pub mod render;

pub use export::*;
pub use frames::{FrameBuffer, FrameSource, LazyFrames};
pub use playback::{
    DisplayStatus, FrameDisplay, KeyBindings, KeySource, PlaybackController, PlaybackInput, PlaybackMode,
    PlaybackState,
};
pub use render::RenderSession;
