//! WAV playback backend
//!
//! Decodes the whole asset up front, then streams it from a shared buffer
//! whose read position doubles as the playhead reported to the view.

use crate::assets;
use crate::audio::device::{self, DeviceStream};
use crate::audio::wav::{self, DecodedAudio};
use crate::error::{ControllerError, Result};
use crate::media::{AssetRef, EventSender, MediaEvent, PlaybackBackend, PlaybackSession};
use log::{debug, info};
use std::sync::{Arc, Mutex, MutexGuard};

/// Number of bars in the visualizer overview
const WAVEFORM_BARS: usize = 96;

/// Window used for the level at the playhead (in samples at 44.1 kHz, ~23 ms)
const LEVEL_WINDOW: usize = 1024;

/// Shared state for audio playback - thread-safe
#[derive(Clone)]
pub struct SharedPlaybackState {
    inner: Arc<Mutex<PlaybackStateInner>>,
}

struct PlaybackStateInner {
    /// Audio samples to play
    samples: Vec<f32>,
    /// Sample rate
    sample_rate: u32,
    /// Current playback position (sample index)
    position: usize,
    /// Total duration in seconds
    duration: f64,
    /// Is playback active
    is_playing: bool,
    /// Pre-computed waveform samples for visualization (RMS values)
    waveform: Vec<f32>,
}

impl SharedPlaybackState {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(PlaybackStateInner {
                samples: Vec::new(),
                sample_rate: 44_100,
                position: 0,
                duration: 0.0,
                is_playing: false,
                waveform: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PlaybackStateInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Load audio samples for playback
    pub fn load(&self, audio: DecodedAudio) {
        let waveform = overview(&audio.samples, WAVEFORM_BARS);
        let mut inner = self.lock();
        inner.duration = audio.duration();
        inner.waveform = waveform;
        inner.samples = audio.samples;
        inner.sample_rate = audio.sample_rate;
        inner.position = 0;
        inner.is_playing = false;
    }

    /// Get current playback position in seconds
    pub fn current_time(&self) -> f64 {
        let inner = self.lock();
        wav::duration_seconds(inner.position, inner.sample_rate)
    }

    /// Get total duration in seconds
    pub fn duration(&self) -> f64 {
        self.lock().duration
    }

    pub fn sample_rate(&self) -> u32 {
        self.lock().sample_rate
    }

    /// Check if playback is active
    pub fn is_playing(&self) -> bool {
        self.lock().is_playing
    }

    /// Get pre-computed waveform samples
    pub fn waveform(&self) -> Vec<f32> {
        self.lock().waveform.clone()
    }

    /// RMS of the samples just behind the playhead
    pub fn level(&self) -> f32 {
        let inner = self.lock();
        let end = inner.position.min(inner.samples.len());
        let start = end.saturating_sub(LEVEL_WINDOW);
        calculate_rms(&inner.samples[start..end])
    }

    /// Check whether the playhead is at the end of the buffer
    pub fn at_end(&self) -> bool {
        let inner = self.lock();
        inner.position >= inner.samples.len()
    }

    pub(crate) fn set_playing(&self, playing: bool) {
        self.lock().is_playing = playing;
    }

    /// Reset playback position to start
    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.position = 0;
        inner.is_playing = false;
    }

    /// Seek to a position in seconds, clamped to the buffer
    pub fn seek(&self, seconds: f64) {
        let mut inner = self.lock();
        let target = (seconds.max(0.0) * inner.sample_rate as f64) as usize;
        inner.position = target.min(inner.samples.len());
    }

    /// Get samples for playback (advances position)
    pub(crate) fn get_samples(&self, count: usize) -> Option<Vec<f32>> {
        let mut inner = self.lock();
        if inner.position >= inner.samples.len() {
            inner.is_playing = false;
            return None;
        }

        let end = (inner.position + count).min(inner.samples.len());
        let samples = inner.samples[inner.position..end].to_vec();
        inner.position = end;

        if inner.position >= inner.samples.len() {
            inner.is_playing = false;
        }

        Some(samples)
    }
}

impl Default for SharedPlaybackState {
    fn default() -> Self {
        Self::new()
    }
}

/// Opens bundled or recorded WAV assets
#[derive(Debug, Default)]
pub struct WavPlayback;

impl WavPlayback {
    pub fn new() -> Self {
        Self
    }

    /// Resolve and decode an asset
    pub fn decode(asset: &AssetRef) -> Result<DecodedAudio> {
        match asset {
            AssetRef::Bundled(name) => {
                let bytes = assets::bundled(name).ok_or_else(|| {
                    ControllerError::AssetUnavailable(format!("No bundled asset named {}", name))
                })?;
                wav::decode_bytes(&bytes).map_err(ControllerError::DecodeError)
            }
            AssetRef::File(path) => {
                if !path.is_file() {
                    return Err(ControllerError::AssetUnavailable(format!(
                        "File not found: {}",
                        path.display()
                    )));
                }
                wav::decode_file(path)
                    .map_err(|e| ControllerError::DecodeError(format!("{} (path: {:?})", e, path)))
            }
        }
    }
}

impl PlaybackBackend for WavPlayback {
    type Session = WavSession;

    fn open(&mut self, asset: &AssetRef, events: EventSender) -> Result<WavSession> {
        let audio = Self::decode(asset)?;
        info!(
            "Opened {} ({}Hz, {:.2}s)",
            asset,
            audio.sample_rate,
            audio.duration()
        );

        let state = SharedPlaybackState::new();
        state.load(audio);

        Ok(WavSession {
            asset: asset.clone(),
            state,
            output: None,
            events,
        })
    }
}

/// A decoded asset bound to an output stream while playing
pub struct WavSession {
    asset: AssetRef,
    state: SharedPlaybackState,
    output: Option<DeviceStream>,
    events: EventSender,
}

impl WavSession {
    fn stop_output(&mut self) {
        if let Some(mut output) = self.output.take() {
            output.stop();
        }
    }
}

impl PlaybackSession for WavSession {
    fn asset(&self) -> &AssetRef {
        &self.asset
    }

    fn play(&mut self) -> Result<()> {
        if self.state.is_playing() {
            return Ok(());
        }

        // A stream that ran dry has already exited; reap it
        self.stop_output();

        if self.state.at_end() {
            debug!("Rewinding {} before replay", self.asset);
            self.state.reset();
        }

        self.state.set_playing(true);

        let state = self.state.clone();
        let events = self.events.clone();
        let on_end = Box::new(move |success: bool| {
            state.set_playing(false);
            events.send(MediaEvent::PlaybackFinished { success });
        });

        match device::open_output(self.state.clone(), on_end) {
            Ok(stream) => {
                self.output = Some(stream);
                Ok(())
            }
            Err(e) => {
                self.state.set_playing(false);
                Err(ControllerError::OutputUnavailable(e))
            }
        }
    }

    fn pause(&mut self) {
        self.stop_output();
        self.state.set_playing(false);
    }

    fn seek(&mut self, seconds: f64) {
        self.state.seek(seconds);
    }

    fn current_time(&self) -> f64 {
        self.state.current_time()
    }

    fn duration(&self) -> f64 {
        self.state.duration()
    }

    fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    fn level(&self) -> f32 {
        self.state.level()
    }

    fn waveform(&self) -> Vec<f32> {
        self.state.waveform()
    }
}

impl Drop for WavSession {
    fn drop(&mut self) {
        self.stop_output();
    }
}

/// RMS per bar across the whole buffer
fn overview(samples: &[f32], num_bars: usize) -> Vec<f32> {
    let samples_per_bar = samples.len() / num_bars;
    let mut waveform = Vec::with_capacity(num_bars);

    for i in 0..num_bars {
        let start = i * samples_per_bar;
        let end = ((i + 1) * samples_per_bar).min(samples.len());
        if start < end {
            waveform.push(calculate_rms(&samples[start..end]));
        } else {
            waveform.push(0.0);
        }
    }

    waveform
}

/// Calculate RMS volume from samples
pub fn calculate_rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}
