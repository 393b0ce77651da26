//! View model handed to the UI
//!
//! [`ViewState`] is derived from the playback and recording sessions on every
//! refresh. Nothing in it is stored between refreshes.

use crate::error::ControllerError;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum PlayButton {
    Play,
    Pause,
}

impl PlayButton {
    pub fn label(&self) -> &'static str {
        match self {
            PlayButton::Play => "Play",
            PlayButton::Pause => "Pause",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum RecordButton {
    Record,
    Stop,
}

impl RecordButton {
    pub fn label(&self) -> &'static str {
        match self {
            RecordButton::Record => "Record",
            RecordButton::Stop => "Stop",
        }
    }
}

/// Scrub slider bounds and position, in seconds
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SliderState {
    pub min: f32,
    pub max: f32,
    pub value: f32,
}

/// Snapshot rendered by a [`ViewSink`]
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ViewState {
    pub play_button: PlayButton,
    pub record_button: RecordButton,
    pub elapsed: String,
    pub remaining: String,
    pub slider: SliderState,
}

impl ViewState {
    /// Derive the view from the current playhead, duration and session flags
    pub fn new(position: f64, duration: f64, is_playing: bool, is_recording: bool) -> Self {
        let duration = duration.max(0.0);
        let position = position.clamp(0.0, duration);

        Self {
            play_button: if is_playing {
                PlayButton::Pause
            } else {
                PlayButton::Play
            },
            record_button: if is_recording {
                RecordButton::Stop
            } else {
                RecordButton::Record
            },
            elapsed: format_time(position),
            remaining: format_remaining(position, duration),
            slider: SliderState {
                min: 0.0,
                max: duration as f32,
                value: position as f32,
            },
        }
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(0.0, 0.0, false, false)
    }
}

/// Amplitude data for the waveform visualizer
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct VisualizerFeed {
    /// Level at the playhead, or the live input level while recording
    pub level: f32,
    /// Overview bars of the loaded asset
    pub waveform: Vec<f32>,
}

/// Receives rendered state. Rendering itself is up to the implementation.
pub trait ViewSink {
    fn render(&mut self, state: &ViewState, feed: &VisualizerFeed);

    /// Show a failed user action
    fn show_error(&mut self, _error: &ControllerError) {}
}

/// Format seconds as zero-padded `mm:ss`
///
/// Minutes are not wrapped into hours and fractional seconds are dropped.
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// Format the time left as `-mm:ss`
pub fn format_remaining(position: f64, duration: f64) -> String {
    format!("-{}", format_time((duration - position).max(0.0)))
}
