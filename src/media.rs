//! Contracts for the playback and capture collaborators
//!
//! The controller never touches samples itself. It opens sessions through a
//! backend, drives them with play/pause/start/stop, and learns about natural or
//! erroneous termination through [`MediaEvent`]s delivered on an [`EventSender`].

use crate::error::Result;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Logical identifier of an audio asset
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AssetRef {
    /// Read-only resource packaged with the application
    Bundled(String),
    /// A file on disk, typically a previous recording
    File(PathBuf),
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetRef::Bundled(name) => write!(f, "bundle:{}", name),
            AssetRef::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Capture format requested from the recorder
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaptureFormat {
    pub channels: u16,
    pub sample_rate: u32,
}

impl Default for CaptureFormat {
    fn default() -> Self {
        Self {
            channels: 1,
            sample_rate: 44_100,
        }
    }
}

/// Completion callbacks from the media collaborators
#[derive(Clone, Debug, PartialEq)]
pub enum MediaEvent {
    /// Playback reached the end of the asset, or failed mid-stream
    PlaybackFinished { success: bool },
    /// The encoded recording was finalized (or failed to be)
    RecordingFinished { success: bool, destination: PathBuf },
}

/// Thread-safe handle collaborators use to report completion
#[derive(Clone)]
pub struct EventSender {
    deliver: Arc<dyn Fn(MediaEvent) + Send + Sync>,
}

impl EventSender {
    pub fn new(deliver: impl Fn(MediaEvent) + Send + Sync + 'static) -> Self {
        Self {
            deliver: Arc::new(deliver),
        }
    }

    pub fn send(&self, event: MediaEvent) {
        (self.deliver)(event);
    }
}

impl fmt::Debug for EventSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSender").finish_non_exhaustive()
    }
}

/// Opens assets for playback
pub trait PlaybackBackend {
    type Session: PlaybackSession;

    /// Open an asset. Fails with `AssetUnavailable` or `DecodeError`.
    fn open(&mut self, asset: &AssetRef, events: EventSender) -> Result<Self::Session>;
}

/// A loaded asset that can be played
///
/// Implementations report the end of the stream with
/// [`MediaEvent::PlaybackFinished`]; pausing never produces a finish event.
pub trait PlaybackSession {
    fn asset(&self) -> &AssetRef;

    /// Start or resume output. Restarts from zero if the playhead is at the end.
    fn play(&mut self) -> Result<()>;

    fn pause(&mut self);

    /// Move the playhead, clamped to `[0, duration]`
    fn seek(&mut self, seconds: f64);

    /// Current playhead in seconds
    fn current_time(&self) -> f64;

    /// Total duration in seconds
    fn duration(&self) -> f64;

    fn is_playing(&self) -> bool;

    /// Amplitude around the playhead (0.0 - 1.0)
    fn level(&self) -> f32;

    /// Overview of the whole asset for the visualizer
    fn waveform(&self) -> Vec<f32>;
}

/// Opens capture sessions
pub trait CaptureBackend {
    type Session: RecordingSession;

    /// Open a capture writing to `destination`. Fails with `RecorderUnavailable`.
    fn open(
        &mut self,
        destination: &Path,
        format: CaptureFormat,
        events: EventSender,
    ) -> Result<Self::Session>;
}

/// An in-progress capture
///
/// Every session that was started delivers exactly one
/// [`MediaEvent::RecordingFinished`], either after `stop` or as soon as the
/// input fails. `is_recording` turns false at that point.
pub trait RecordingSession {
    fn destination(&self) -> &Path;

    fn start(&mut self) -> Result<()>;

    fn stop(&mut self);

    fn is_recording(&self) -> bool;

    /// Current input level (0.0 - 1.0)
    fn level(&self) -> f32;

    /// Recent input levels, oldest first
    fn waveform(&self) -> Vec<f32>;
}
