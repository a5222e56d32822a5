//! Play a session interactively.

use std::time::Duration;

use meltview_common::config::AppConfig;
use meltview_common::error::MeltviewError;
use meltview_render_engine::display::{FfplayDisplay, StdinKeys};
use meltview_render_engine::frames::{FrameBuffer, LazyFrames};
use meltview_render_engine::playback::{KeyBindings, PlaybackController};

use super::{prepare, progress_printer, InputArgs, RenderArgs};

pub fn run(
    inputs: &InputArgs,
    render: &RenderArgs,
    delay: Option<u64>,
    lazy: bool,
    config: &AppConfig,
) -> anyhow::Result<()> {
    if !FfplayDisplay::is_available() {
        return Err(MeltviewError::unsupported("ffplay not found in PATH; run `meltview check`").into());
    }

    let session = prepare(inputs, render, &config.render)?;
    let delay_ms = delay.unwrap_or(config.playback.frame_delay_ms);
    let lazy = lazy || !config.playback.preload;

    let title = match session.build() {
        Some(build) => format!("meltview - build {build}"),
        None => "meltview".to_string(),
    };
    let fps = (1000 / delay_ms.max(1)).clamp(1, 1000) as u32;
    let mut display = FfplayDisplay::new(title, fps);

    let bindings = KeyBindings::default();
    let mut keys = StdinKeys::spawn(bindings)?;
    println!(
        "Keys (then Enter): {} quit, {} pause/resume, {} forward, {} back",
        bindings.quit, bindings.toggle_pause, bindings.seek_forward, bindings.seek_backward
    );

    let controller = PlaybackController::new(Duration::from_millis(delay_ms));
    let outcome = if lazy {
        controller.run(&mut LazyFrames::new(&session), &mut display, &mut keys)?
    } else {
        let mut buffer = FrameBuffer::render(&session, Some(&progress_printer("Rendering")))?;
        eprintln!();
        controller.run(&mut buffer, &mut display, &mut keys)?
    };
    if let Some(state) = outcome.final_state {
        println!("Stopped at frame {} of {}", state.position, state.len());
    }
    Ok(())
}
