//! Interactive playback: a two-state machine driven by polled key input.
//!
//! Each tick presents the frame at the current position, waits up to the
//! frame delay for one input, then applies it. The wait is the only place
//! the loop blocks.

use std::time::Duration;

use image::RgbImage;

use meltview_common::error::MeltviewResult;

use crate::frames::FrameSource;

/// Frames skipped by one seek.
pub const SEEK_STEP: usize = 10;

/// Discrete playback inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackInput {
    Quit,
    TogglePause,
    SeekForward,
    SeekBackward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackMode {
    Playing,
    Paused,
}

/// Current position and mode. Positions are always within `[0, len - 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackState {
    pub position: usize,
    pub mode: PlaybackMode,
    len: usize,
}

/// Result of applying one input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Continue(PlaybackState),
    Quit,
}

impl PlaybackState {
    /// Initial state: playing from frame 0.
    pub fn new(len: usize) -> Self {
        Self {
            position: 0,
            mode: PlaybackMode::Playing,
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_playing(&self) -> bool {
        self.mode == PlaybackMode::Playing
    }

    /// Apply the input polled during one tick; `None` means no key was pressed.
    pub fn apply(self, input: Option<PlaybackInput>) -> Transition {
        let last = self.len.saturating_sub(1);
        let next = match input {
            Some(PlaybackInput::Quit) => return Transition::Quit,
            Some(PlaybackInput::TogglePause) => Self {
                mode: match self.mode {
                    PlaybackMode::Playing => PlaybackMode::Paused,
                    PlaybackMode::Paused => PlaybackMode::Playing,
                },
                ..self
            },
            Some(PlaybackInput::SeekForward) => Self {
                position: self.position.saturating_add(SEEK_STEP).min(last),
                ..self
            },
            Some(PlaybackInput::SeekBackward) => Self {
                position: self.position.saturating_sub(SEEK_STEP),
                ..self
            },
            None if self.is_playing() => Self {
                position: self.position.saturating_add(1).min(last),
                ..self
            },
            None => self,
        };
        Transition::Continue(next)
    }
}

/// Key-to-input mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBindings {
    pub quit: char,
    pub toggle_pause: char,
    pub seek_forward: char,
    pub seek_backward: char,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            quit: 'q',
            toggle_pause: 'k',
            seek_forward: 'l',
            seek_backward: 'j',
        }
    }
}

impl KeyBindings {
    pub fn input_for(&self, key: char) -> Option<PlaybackInput> {
        match key {
            k if k == self.quit => Some(PlaybackInput::Quit),
            k if k == self.toggle_pause => Some(PlaybackInput::TogglePause),
            k if k == self.seek_forward => Some(PlaybackInput::SeekForward),
            k if k == self.seek_backward => Some(PlaybackInput::SeekBackward),
            _ => None,
        }
    }
}

/// Whether a display can take more frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayStatus {
    Open,
    /// The viewer went away on its own; playback stops like a quit.
    Closed,
}

/// Where frames are shown.
///
/// The controller always calls [`FrameDisplay::close`] once playback ends,
/// whatever the reason.
pub trait FrameDisplay {
    fn present(&mut self, frame: &RgbImage, position: usize) -> MeltviewResult<DisplayStatus>;

    fn close(&mut self) -> MeltviewResult<()>;
}

/// Where inputs come from.
pub trait KeySource {
    /// Wait up to `timeout` for one input.
    fn poll(&mut self, timeout: Duration) -> MeltviewResult<Option<PlaybackInput>>;
}

/// How a playback run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackOutcome {
    /// State when playback stopped; `None` for an empty source.
    pub final_state: Option<PlaybackState>,

    /// Frames presented.
    pub ticks: u64,
}

/// Runs the playback loop.
#[derive(Debug, Clone, Copy)]
pub struct PlaybackController {
    delay: Duration,
}

impl PlaybackController {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Play until a quit input or until the display closes. The display is
    /// closed on every exit path.
    pub fn run(
        &self,
        frames: &mut dyn FrameSource,
        display: &mut dyn FrameDisplay,
        keys: &mut dyn KeySource,
    ) -> MeltviewResult<PlaybackOutcome> {
        let result = self.run_loop(frames, display, keys);
        let closed = display.close();

        match (result, closed) {
            (Ok(outcome), Ok(())) => {
                tracing::info!(
                    ticks = outcome.ticks,
                    position = outcome.final_state.map(|s| s.position),
                    "Playback finished"
                );
                Ok(outcome)
            }
            (Ok(_), Err(close_err)) => Err(close_err),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(close_err)) => {
                tracing::warn!(error = %close_err, "Display failed to close after playback error");
                Err(err)
            }
        }
    }

    fn run_loop(
        &self,
        frames: &mut dyn FrameSource,
        display: &mut dyn FrameDisplay,
        keys: &mut dyn KeySource,
    ) -> MeltviewResult<PlaybackOutcome> {
        if frames.is_empty() {
            tracing::warn!("Nothing to play: no frames");
            return Ok(PlaybackOutcome {
                final_state: None,
                ticks: 0,
            });
        }

        let mut state = PlaybackState::new(frames.len());
        let mut ticks = 0u64;
        tracing::info!(frames = state.len(), delay_ms = self.delay.as_millis(), "Playback started");

        loop {
            let status = display.present(frames.frame(state.position)?, state.position)?;
            if status == DisplayStatus::Closed {
                tracing::info!(position = state.position, "Display closed by viewer");
                return Ok(PlaybackOutcome {
                    final_state: Some(state),
                    ticks,
                });
            }
            ticks += 1;

            let input = keys.poll(self.delay)?;
            if let Some(input) = input {
                tracing::debug!(?input, position = state.position, "Playback input");
            }
            state = match state.apply(input) {
                Transition::Continue(next) => next,
                Transition::Quit => {
                    return Ok(PlaybackOutcome {
                        final_state: Some(state),
                        ticks,
                    })
                }
            };
        }
    }
}

/// Replays a fixed list of per-tick inputs, then quits.
#[derive(Debug, Clone, Default)]
pub struct ScriptedKeys {
    script: std::collections::VecDeque<Option<PlaybackInput>>,
}

impl ScriptedKeys {
    pub fn new(script: impl IntoIterator<Item = Option<PlaybackInput>>) -> Self {
        Self {
            script: script.into_iter().collect(),
        }
    }
}

impl KeySource for ScriptedKeys {
    fn poll(&mut self, _timeout: Duration) -> MeltviewResult<Option<PlaybackInput>> {
        Ok(self
            .script
            .pop_front()
            .unwrap_or(Some(PlaybackInput::Quit)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::FrameBuffer;
    use meltview_common::error::MeltviewError;
    use proptest::prelude::*;

    #[derive(Default)]
    struct RecordingDisplay {
        presented: Vec<usize>,
        closed: bool,
        fail_at: Option<usize>,
        gone_at: Option<usize>,
    }

    impl FrameDisplay for RecordingDisplay {
        fn present(&mut self, _frame: &RgbImage, position: usize) -> MeltviewResult<DisplayStatus> {
            if self.fail_at == Some(self.presented.len()) {
                return Err(MeltviewError::display("window closed"));
            }
            if self.gone_at == Some(self.presented.len()) {
                return Ok(DisplayStatus::Closed);
            }
            self.presented.push(position);
            Ok(DisplayStatus::Open)
        }

        fn close(&mut self) -> MeltviewResult<()> {
            self.closed = true;
            Ok(())
        }
    }

    fn buffer(len: usize) -> FrameBuffer {
        FrameBuffer::new((0..len).map(|_| RgbImage::new(2, 2)).collect())
    }

    fn state_at(position: usize, len: usize) -> PlaybackState {
        PlaybackState {
            position,
            ..PlaybackState::new(len)
        }
    }

    fn next(state: PlaybackState, input: Option<PlaybackInput>) -> PlaybackState {
        match state.apply(input) {
            Transition::Continue(next) => next,
            Transition::Quit => panic!("unexpected quit"),
        }
    }

    #[test]
    fn test_seek_backward_from_three_clamps_to_zero() {
        let state = next(state_at(3, 50), Some(PlaybackInput::SeekBackward));
        assert_eq!(state.position, 0);
    }

    #[test]
    fn test_seek_forward_near_end_clamps_to_last() {
        let state = next(state_at(45, 50), Some(PlaybackInput::SeekForward));
        assert_eq!(state.position, 49);
    }

    #[test]
    fn test_pause_holds_position_and_seek_still_works() {
        let paused = next(state_at(5, 50), Some(PlaybackInput::TogglePause));
        assert_eq!(paused.mode, PlaybackMode::Paused);
        assert_eq!(next(paused, None).position, 5);

        let seeked = next(paused, Some(PlaybackInput::SeekForward));
        assert_eq!(seeked.position, 15);
        assert_eq!(seeked.mode, PlaybackMode::Paused);

        let resumed = next(paused, Some(PlaybackInput::TogglePause));
        assert_eq!(next(resumed, None).position, 6);
    }

    #[test]
    fn test_quit_is_terminal() {
        assert_eq!(state_at(0, 3).apply(Some(PlaybackInput::Quit)), Transition::Quit);
    }

    #[test]
    fn test_default_bindings() {
        let keys = KeyBindings::default();
        assert_eq!(keys.input_for('q'), Some(PlaybackInput::Quit));
        assert_eq!(keys.input_for('k'), Some(PlaybackInput::TogglePause));
        assert_eq!(keys.input_for('l'), Some(PlaybackInput::SeekForward));
        assert_eq!(keys.input_for('j'), Some(PlaybackInput::SeekBackward));
        assert_eq!(keys.input_for('x'), None);
    }

    #[test]
    fn test_run_presents_then_applies_input() {
        let mut frames = buffer(30);
        let mut display = RecordingDisplay::default();
        let mut keys = ScriptedKeys::new([
            None,
            None,
            Some(PlaybackInput::SeekForward),
            Some(PlaybackInput::TogglePause),
            None,
            Some(PlaybackInput::SeekBackward),
            Some(PlaybackInput::Quit),
        ]);

        let outcome = PlaybackController::new(Duration::ZERO)
            .run(&mut frames, &mut display, &mut keys)
            .unwrap();

        assert_eq!(display.presented, vec![0, 1, 2, 12, 12, 12, 2]);
        assert!(display.closed);
        assert_eq!(outcome.ticks, 7);
        assert_eq!(outcome.final_state.map(|s| s.mode), Some(PlaybackMode::Paused));
    }

    #[test]
    fn test_display_is_closed_after_error() {
        let mut frames = buffer(5);
        let mut display = RecordingDisplay {
            fail_at: Some(2),
            ..RecordingDisplay::default()
        };
        let mut keys = ScriptedKeys::new(std::iter::repeat(None).take(10));

        let err = PlaybackController::new(Duration::ZERO)
            .run(&mut frames, &mut display, &mut keys)
            .unwrap_err();

        assert!(matches!(err, MeltviewError::Display { .. }));
        assert!(display.closed);
    }

    #[test]
    fn test_viewer_closing_the_window_stops_like_quit() {
        let mut frames = buffer(20);
        let mut display = RecordingDisplay {
            gone_at: Some(3),
            ..RecordingDisplay::default()
        };
        let mut keys = ScriptedKeys::new(std::iter::repeat(None).take(50));

        let outcome = PlaybackController::new(Duration::ZERO)
            .run(&mut frames, &mut display, &mut keys)
            .unwrap();

        assert_eq!(display.presented, vec![0, 1, 2]);
        assert_eq!(outcome.ticks, 3);
        assert_eq!(outcome.final_state.map(|s| s.position), Some(3));
        assert!(display.closed);
    }

    #[test]
    fn test_empty_source_returns_immediately() {
        let mut frames = buffer(0);
        let mut display = RecordingDisplay::default();
        let mut keys = ScriptedKeys::default();

        let outcome = PlaybackController::new(Duration::ZERO)
            .run(&mut frames, &mut display, &mut keys)
            .unwrap();

        assert_eq!(outcome.ticks, 0);
        assert!(display.presented.is_empty());
        assert!(display.closed);
    }

    fn input_strategy() -> impl Strategy<Value = Option<PlaybackInput>> {
        prop_oneof![
            Just(None),
            Just(Some(PlaybackInput::TogglePause)),
            Just(Some(PlaybackInput::SeekForward)),
            Just(Some(PlaybackInput::SeekBackward)),
        ]
    }

    proptest! {
        #[test]
        fn position_stays_in_range(
            len in 1usize..40,
            inputs in prop::collection::vec(input_strategy(), 0..200),
        ) {
            let mut state = PlaybackState::new(len);
            for input in inputs {
                state = next(state, input);
                prop_assert!(state.position < len);
            }
        }
    }
}
