//! Audio backends for the controller
//!
//! This module provides:
//! - WAV decoding/encoding and recording file naming via hound
//! - A playback backend with position tracking and waveform data
//! - A capture backend with real-time volume metering
//! - Output/input streams (PipeWire with the `pipewire` feature)

pub mod capture;
pub mod device;
pub mod playback;
pub mod wav;

pub use capture::{CaptureState, SharedCaptureState, WavCapture, WavRecording};
pub use playback::{SharedPlaybackState, WavPlayback, WavSession};
pub use wav::{list_recordings, recording_destination, DecodedAudio};
