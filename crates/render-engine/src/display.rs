//! Terminal playback collaborators: an `ffplay` window and stdin keys.

use std::io::{Read, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use image::RgbImage;

use meltview_common::error::{MeltviewError, MeltviewResult};

use crate::export::command_exists;
use crate::playback::{DisplayStatus, FrameDisplay, KeyBindings, KeySource, PlaybackInput};

/// Shows frames in an `ffplay` window fed raw RGB over stdin.
///
/// The window opens on the first presented frame, sized to that frame.
pub struct FfplayDisplay {
    title: String,
    fps: u32,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    size: Option<(u32, u32)>,
}

impl FfplayDisplay {
    pub fn new(title: impl Into<String>, fps: u32) -> Self {
        Self {
            title: title.into(),
            fps: fps.max(1),
            child: None,
            stdin: None,
            size: None,
        }
    }

    pub fn is_available() -> bool {
        command_exists("ffplay")
    }

    fn spawn(&mut self, width: u32, height: u32) -> MeltviewResult<()> {
        let mut child = Command::new("ffplay")
            .args([
                "-hide_banner",
                "-loglevel",
                "error",
                "-fflags",
                "nobuffer",
                "-f",
                "rawvideo",
                "-pixel_format",
                "rgb24",
            ])
            .arg("-video_size")
            .arg(format!("{width}x{height}"))
            .arg("-framerate")
            .arg(self.fps.to_string())
            .arg("-window_title")
            .arg(&self.title)
            .args(["-i", "-"])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| MeltviewError::display(format!("Failed to start ffplay: {e}")))?;

        tracing::info!(pid = child.id(), width, height, title = %self.title, "ffplay window opened");
        self.stdin = child.stdin.take();
        self.child = Some(child);
        self.size = Some((width, height));
        Ok(())
    }
}

impl FrameDisplay for FfplayDisplay {
    fn present(&mut self, frame: &RgbImage, _position: usize) -> MeltviewResult<DisplayStatus> {
        match self.size {
            None => self.spawn(frame.width(), frame.height())?,
            Some(size) if size != frame.dimensions() => {
                return Err(MeltviewError::display(format!(
                    "frame is {}x{}, window is {}x{}",
                    frame.width(),
                    frame.height(),
                    size.0,
                    size.1
                )));
            }
            Some(_) => {}
        }

        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| MeltviewError::display("ffplay input is closed"))?;
        let status = write_frame(stdin, frame)?;
        if status == DisplayStatus::Closed {
            tracing::info!("ffplay window closed");
            self.stdin = None;
        }
        Ok(status)
    }

    fn close(&mut self) -> MeltviewResult<()> {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            // ffplay keeps its window open at end of input; stop it explicitly.
            if let Err(err) = child.kill() {
                tracing::debug!(error = %err, "ffplay already exited");
            }
            child
                .wait()
                .map_err(|e| MeltviewError::display(format!("Failed to wait on ffplay: {e}")))?;
            tracing::debug!("ffplay window closed");
        }
        Ok(())
    }
}

impl Drop for FfplayDisplay {
    fn drop(&mut self) {
        if self.child.is_some() {
            if let Err(err) = self.close() {
                tracing::warn!(error = %err, "ffplay did not close cleanly");
            }
        }
    }
}

/// Write one raw frame. A broken pipe means the viewer closed its window.
fn write_frame(out: &mut impl Write, frame: &RgbImage) -> MeltviewResult<DisplayStatus> {
    match out.write_all(frame.as_raw()).and_then(|()| out.flush()) {
        Ok(()) => Ok(DisplayStatus::Open),
        Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => Ok(DisplayStatus::Closed),
        Err(e) => Err(MeltviewError::display(format!("Failed to write to ffplay: {e}"))),
    }
}

/// Reads playback keys from stdin on a helper thread.
///
/// Each character is one key. Line-buffered terminals deliver keys when
/// Enter is pressed.
pub struct StdinKeys {
    keys: Receiver<char>,
    bindings: KeyBindings,
    closed: bool,
}

impl StdinKeys {
    pub fn spawn(bindings: KeyBindings) -> MeltviewResult<Self> {
        let (tx, rx) = mpsc::channel();
        std::thread::Builder::new()
            .name("meltview-keys".into())
            .spawn(move || {
                let mut byte = [0u8; 1];
                let mut stdin = std::io::stdin().lock();
                while let Ok(1) = stdin.read(&mut byte) {
                    if tx.send(byte[0] as char).is_err() {
                        break;
                    }
                }
            })
            .map_err(|e| MeltviewError::display(format!("Failed to spawn key reader: {e}")))?;

        Ok(Self {
            keys: rx,
            bindings,
            closed: false,
        })
    }

    pub fn from_receiver(keys: Receiver<char>, bindings: KeyBindings) -> Self {
        Self {
            keys,
            bindings,
            closed: false,
        }
    }
}

impl KeySource for StdinKeys {
    fn poll(&mut self, timeout: Duration) -> MeltviewResult<Option<PlaybackInput>> {
        if self.closed {
            std::thread::sleep(timeout);
            return Ok(None);
        }

        match self.keys.recv_timeout(timeout) {
            Ok(key) => Ok(self.bindings.input_for(key.to_ascii_lowercase())),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => {
                tracing::debug!("Key input closed; playback continues until the window is closed");
                self.closed = true;
                Ok(None)
            }
        }
    }
}
