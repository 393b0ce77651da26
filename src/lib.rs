//! Taperoll - a single-asset audio player and recorder
//!
//! The [`controller`] mediates play/pause and record/stop intents into calls on
//! pluggable playback and capture backends and renders a [`view::ViewState`]
//! after every change. The [`dispatch`] loop serializes intents, refresh ticks
//! and completion callbacks onto one control flow.

pub mod assets;
pub mod audio;
pub mod config;
pub mod controller;
pub mod dispatch;
pub mod error;
pub mod media;
pub mod timer;
pub mod view;

pub use config::ControllerConfig;
pub use controller::PlaybackRecordingController;
pub use dispatch::{ControllerHandle, Dispatcher, Event, Intent};
pub use error::{ControllerError, Result};
pub use media::{AssetRef, CaptureFormat, MediaEvent};
pub use view::{ViewSink, ViewState, VisualizerFeed};
