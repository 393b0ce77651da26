//! Single-queue event loop
//!
//! User intents, refresh ticks and completion callbacks all travel through one
//! unbounded channel and are applied to the controller one at a time, so a tick
//! can never observe a half-applied intent.

use crate::config::ControllerConfig;
use crate::controller::PlaybackRecordingController;
use crate::error::{ControllerError, Result};
use crate::media::{AssetRef, CaptureBackend, MediaEvent, PlaybackBackend};
use crate::view::ViewSink;
use log::{debug, error, info};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Something the user asked for
#[derive(Clone, Debug, PartialEq)]
pub enum Intent {
    TogglePlayback,
    ToggleRecording,
    Play,
    Pause,
    Seek(f64),
    Load(AssetRef),
    Shutdown,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    Intent(Intent),
    /// Refresh tick stamped with the generation of the timer that sent it
    Tick(u64),
    Media(MediaEvent),
}

/// Cloneable handle for submitting intents from any thread
#[derive(Clone, Debug)]
pub struct ControllerHandle {
    tx: UnboundedSender<Event>,
}

impl ControllerHandle {
    /// Queue an intent; returns `false` once the loop has exited
    pub fn send(&self, intent: Intent) -> bool {
        self.tx.send(Event::Intent(intent)).is_ok()
    }
}

pub struct Dispatcher<P, C, V>
where
    P: PlaybackBackend,
    C: CaptureBackend,
    V: ViewSink,
{
    controller: PlaybackRecordingController<P, C, V>,
    rx: UnboundedReceiver<Event>,
    shutting_down: bool,
}

impl<P, C, V> Dispatcher<P, C, V>
where
    P: PlaybackBackend,
    C: CaptureBackend,
    V: ViewSink,
{
    pub fn new(
        playback: P,
        capture: C,
        view: V,
        config: ControllerConfig,
    ) -> (Self, ControllerHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let controller =
            PlaybackRecordingController::new(playback, capture, view, config, tx.clone());
        (
            Self {
                controller,
                rx,
                shutting_down: false,
            },
            ControllerHandle { tx },
        )
    }

    pub fn controller(&self) -> &PlaybackRecordingController<P, C, V> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut PlaybackRecordingController<P, C, V> {
        &mut self.controller
    }

    /// Apply one event. Returns `false` when the loop should exit.
    pub fn dispatch(&mut self, event: Event) -> bool {
        match event {
            Event::Intent(intent) => self.apply(intent),
            Event::Tick(generation) => self.controller.on_tick(generation),
            Event::Media(MediaEvent::PlaybackFinished { success }) => {
                self.controller.on_playback_finished(success)
            }
            Event::Media(MediaEvent::RecordingFinished {
                success,
                destination,
            }) => {
                let result = self.controller.on_recording_finished(success, destination);
                self.report("Loading the new recording", result);
            }
        }

        !(self.shutting_down && self.controller.pending_recording().is_none())
    }

    fn apply(&mut self, intent: Intent) {
        debug!("Intent: {:?}", intent);
        match intent {
            Intent::TogglePlayback => {
                let result = self.controller.toggle_playback();
                self.report("Toggling playback", result);
            }
            Intent::ToggleRecording => {
                let result = self.controller.toggle_recording();
                self.report("Toggling recording", result);
            }
            Intent::Play => {
                let result = self.controller.play();
                self.report("Starting playback", result);
            }
            Intent::Pause => self.controller.pause(),
            Intent::Seek(seconds) => self.controller.seek(seconds),
            Intent::Load(asset) => {
                let result = self.controller.load(asset);
                self.report("Loading asset", result);
            }
            Intent::Shutdown => {
                info!("Shutting down");
                self.controller.shutdown();
                self.shutting_down = true;
            }
        }
    }

    fn report(&mut self, action: &str, result: Result<()>) {
        if let Err(e) = result {
            error!("{} failed: {}", action, e);
            self.controller.view_mut().show_error(&e);
        }
    }

    /// Surface a failure that happened outside the loop, e.g. at startup
    pub fn report_error(&mut self, error: &ControllerError) {
        self.controller.view_mut().show_error(error);
    }

    /// Apply every event already queued without waiting for more
    pub fn drain(&mut self) -> bool {
        while let Ok(event) = self.rx.try_recv() {
            if !self.dispatch(event) {
                return false;
            }
        }
        true
    }

    /// Run until a shutdown intent has been applied and any stopped
    /// recording has been finalized
    pub async fn run(mut self) -> PlaybackRecordingController<P, C, V> {
        while let Some(event) = self.rx.recv().await {
            if !self.dispatch(event) {
                break;
            }
        }
        self.controller
    }
}
