//! WAV capture backend
//!
//! The input callback only meters samples and queues them for a writer
//! thread, which owns the destination file. Stopping, or losing the input
//! device, closes the file and reports the outcome with a single
//! `RecordingFinished` event.

use crate::audio::device::{self, DeviceStream, FailureCallback};
use crate::audio::playback::calculate_rms;
use crate::audio::wav::WavFileWriter;
use crate::error::{ControllerError, Result};
use crate::media::{CaptureBackend, CaptureFormat, EventSender, MediaEvent, RecordingSession};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

/// Number of recent levels kept for the live waveform
const WAVEFORM_HISTORY: usize = 96;

/// Samples written, or why the file could not be completed
type WriterResult = std::result::Result<usize, String>;

/// Current state of audio capture
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Capturing,
    Error,
}

/// Shared state for audio capture - thread-safe
#[derive(Clone)]
pub struct SharedCaptureState {
    inner: Arc<Mutex<CaptureStateInner>>,
}

struct CaptureStateInner {
    /// Smoothed RMS level (0.0 - 1.0)
    volume_level: f32,
    /// Recent levels for waveform display
    waveform_samples: Vec<f32>,
    /// Samples handed to the writer thread
    samples_captured: usize,
    /// Sample rate of the destination file
    sample_rate: u32,
    state: CaptureState,
    error: Option<String>,
    /// Feeds the writer thread; dropping it lets the file be finalized
    sink: Option<Sender<Vec<f32>>>,
    rate_mismatch_logged: bool,
}

impl SharedCaptureState {
    pub fn new(sink: Sender<Vec<f32>>, sample_rate: u32) -> Self {
        Self {
            inner: Arc::new(Mutex::new(CaptureStateInner {
                volume_level: 0.0,
                waveform_samples: Vec::with_capacity(WAVEFORM_HISTORY),
                samples_captured: 0,
                sample_rate,
                state: CaptureState::Idle,
                error: None,
                sink: Some(sink),
                rate_mismatch_logged: false,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CaptureStateInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn volume_level(&self) -> f32 {
        self.lock().volume_level
    }

    pub fn waveform_samples(&self) -> Vec<f32> {
        self.lock().waveform_samples.clone()
    }

    pub fn state(&self) -> CaptureState {
        self.lock().state
    }

    pub fn samples_captured(&self) -> usize {
        self.lock().samples_captured
    }

    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    pub fn set_state(&self, state: CaptureState) {
        self.lock().state = state;
    }

    pub fn set_error(&self, error: String) {
        let mut inner = self.lock();
        inner.error = Some(error);
        inner.state = CaptureState::Error;
    }

    /// Meter incoming samples and queue them for the writer thread
    ///
    /// Runs on the realtime input thread, so it never touches the file.
    pub fn process_samples(&self, samples: &[f32], sample_rate: u32) {
        let mut inner = self.lock();

        if samples.is_empty() || inner.error.is_some() {
            return;
        }

        if sample_rate != 0 && sample_rate != inner.sample_rate && !inner.rate_mismatch_logged {
            warn!(
                "Capture delivers {}Hz but the recording is written at {}Hz",
                sample_rate, inner.sample_rate
            );
            inner.rate_mismatch_logged = true;
        }

        let rms = calculate_rms(samples);
        inner.volume_level = inner.volume_level * 0.7 + rms * 0.3;

        inner.waveform_samples.push(rms);
        if inner.waveform_samples.len() > WAVEFORM_HISTORY {
            inner.waveform_samples.remove(0);
        }

        let Some(sink) = inner.sink.as_ref() else {
            return;
        };
        if sink.send(samples.to_vec()).is_ok() {
            inner.samples_captured += samples.len();
        } else {
            inner.error = Some("Recording writer stopped".to_string());
            inner.state = CaptureState::Error;
        }
    }

    /// Stop queueing samples; the writer finalizes once the queue drains
    pub fn close(&self) {
        self.lock().sink = None;
    }
}

/// Write queued samples until the queue closes, then finalize the file
fn spawn_writer(
    mut writer: WavFileWriter,
    samples: Receiver<Vec<f32>>,
) -> std::io::Result<JoinHandle<WriterResult>> {
    thread::Builder::new()
        .name("taperoll-writer".to_string())
        .spawn(move || {
            for chunk in samples {
                writer.write(&chunk)?;
            }
            let written = writer.samples_written();
            writer.finalize()?;
            Ok(written)
        })
}

fn join_writer(writer: Option<JoinHandle<WriterResult>>) -> WriterResult {
    match writer {
        Some(handle) => handle
            .join()
            .unwrap_or_else(|_| Err("Recording writer panicked".to_string())),
        None => Err("Recording already finalized".to_string()),
    }
}

/// Closes one recording and reports it, at most once
#[derive(Clone)]
struct Completion {
    state: SharedCaptureState,
    writer: Arc<Mutex<Option<JoinHandle<WriterResult>>>>,
    destination: PathBuf,
    events: EventSender,
    done: Arc<AtomicBool>,
}

impl Completion {
    fn is_done(&self) -> bool {
        self.done.load(Ordering::SeqCst)
    }

    fn take_writer(&self) -> Option<JoinHandle<WriterResult>> {
        self.writer.lock().unwrap_or_else(|e| e.into_inner()).take()
    }

    /// Finalize the file in the background, then send `RecordingFinished`
    fn finish(&self, failure: Option<String>) {
        if self.done.swap(true, Ordering::SeqCst) {
            return;
        }
        self.state.close();

        let writer = self.take_writer();
        let state = self.state.clone();
        let destination = self.destination.clone();
        let events = self.events.clone();
        thread::spawn(move || {
            let written = join_writer(writer);
            let result = match failure.or_else(|| state.error()) {
                Some(e) => Err(e),
                None => written,
            };
            let success = match result {
                Ok(samples) => {
                    info!("Recording saved to {:?} ({} samples)", destination, samples);
                    true
                }
                Err(e) => {
                    error!("Failed to save recording {:?}: {}", destination, e);
                    false
                }
            };
            events.send(MediaEvent::RecordingFinished {
                success,
                destination,
            });
        });
    }

    /// Close and delete a recording that never started, without reporting
    fn discard(&self) {
        if self.done.swap(true, Ordering::SeqCst) {
            return;
        }
        self.state.close();
        let _ = join_writer(self.take_writer());
        if let Err(e) = std::fs::remove_file(&self.destination) {
            warn!("Failed to remove unused recording {:?}: {}", self.destination, e);
        }
    }
}

/// Opens WAV recordings fed by the default input device
#[derive(Debug, Default)]
pub struct WavCapture;

impl WavCapture {
    pub fn new() -> Self {
        Self
    }
}

impl CaptureBackend for WavCapture {
    type Session = WavRecording;

    fn open(
        &mut self,
        destination: &Path,
        format: CaptureFormat,
        events: EventSender,
    ) -> Result<WavRecording> {
        let writer = WavFileWriter::create(destination, format)
            .map_err(ControllerError::RecorderUnavailable)?;
        let (sink, samples) = mpsc::channel();
        let writer = spawn_writer(writer, samples).map_err(|e| {
            let _ = std::fs::remove_file(destination);
            ControllerError::RecorderUnavailable(format!("Failed to spawn writer thread: {}", e))
        })?;

        let state = SharedCaptureState::new(sink, format.sample_rate);
        Ok(WavRecording {
            destination: destination.to_path_buf(),
            format,
            state: state.clone(),
            stream: None,
            completion: Completion {
                state,
                writer: Arc::new(Mutex::new(Some(writer))),
                destination: destination.to_path_buf(),
                events,
                done: Arc::new(AtomicBool::new(false)),
            },
            started: false,
        })
    }
}

/// One capture into one destination file
pub struct WavRecording {
    destination: PathBuf,
    format: CaptureFormat,
    state: SharedCaptureState,
    stream: Option<DeviceStream>,
    completion: Completion,
    started: bool,
}

impl WavRecording {
    /// Get shared capture state for UI updates
    pub fn shared_state(&self) -> SharedCaptureState {
        self.state.clone()
    }

    /// Ends the recording when the input stream dies on its own
    fn failure_handler(&self) -> FailureCallback {
        let completion = self.completion.clone();
        Box::new(move |e: String| {
            warn!("Input lost while recording {:?}: {}", completion.destination, e);
            completion.state.set_error(e.clone());
            completion.finish(Some(e));
        })
    }
}

impl RecordingSession for WavRecording {
    fn destination(&self) -> &Path {
        &self.destination
    }

    fn start(&mut self) -> Result<()> {
        if self.started {
            return Ok(());
        }
        if self.completion.is_done() {
            return Err(ControllerError::RecorderUnavailable(
                "Recording already closed".to_string(),
            ));
        }

        let state = self.state.clone();
        let on_samples = Box::new(move |samples: &[f32], sample_rate: u32| {
            state.process_samples(samples, sample_rate);
        });

        match device::open_input(self.format, on_samples, self.failure_handler()) {
            Ok(stream) => {
                self.stream = Some(stream);
                self.started = true;
                self.state.set_state(CaptureState::Capturing);
                info!("Recording to {:?}", self.destination);
                Ok(())
            }
            Err(e) => {
                self.state.set_error(e.clone());
                self.completion.discard();
                Err(ControllerError::RecorderUnavailable(e))
            }
        }
    }

    fn stop(&mut self) {
        if !self.started {
            return;
        }

        if let Some(mut stream) = self.stream.take() {
            stream.stop();
        }
        if self.state.state() == CaptureState::Capturing {
            self.state.set_state(CaptureState::Idle);
        }
        self.completion.finish(None);
    }

    fn is_recording(&self) -> bool {
        self.started && !self.completion.is_done()
    }

    fn level(&self) -> f32 {
        self.state.volume_level()
    }

    fn waveform(&self) -> Vec<f32> {
        self.state.waveform_samples()
    }
}

impl Drop for WavRecording {
    fn drop(&mut self) {
        if self.started {
            self.stop();
        } else {
            self.completion.discard();
        }
    }
}
