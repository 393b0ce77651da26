//! Playback/recording controller
//!
//! Owns at most one playback session and one recording session, turns user
//! intents into calls on them, and pushes a fresh [`ViewState`] to the view
//! after every state change and on every refresh tick while playing.
//!
//! All methods run on one control flow. Completion callbacks and timer ticks
//! arrive as [`Event`]s on the channel handed to [`PlaybackRecordingController::new`]
//! and are fed back in by the [`Dispatcher`](crate::dispatch::Dispatcher).

use crate::audio::wav;
use crate::config::ControllerConfig;
use crate::dispatch::Event;
use crate::error::Result;
use crate::media::{
    AssetRef, CaptureBackend, EventSender, PlaybackBackend, PlaybackSession, RecordingSession,
};
use crate::timer::RefreshTimer;
use crate::view::{ViewSink, ViewState, VisualizerFeed};
use log::{debug, info, warn};
use std::path::PathBuf;
use tokio::sync::mpsc::UnboundedSender;

pub struct PlaybackRecordingController<P, C, V>
where
    P: PlaybackBackend,
    C: CaptureBackend,
    V: ViewSink,
{
    playback: P,
    capture: C,
    view: V,
    config: ControllerConfig,
    events: UnboundedSender<Event>,
    session: Option<P::Session>,
    recorder: Option<C::Session>,
    timer: Option<RefreshTimer>,
    timer_generation: u64,
    /// A stopped recording whose finish callback has not arrived yet
    pending_recording: Option<PathBuf>,
}

impl<P, C, V> PlaybackRecordingController<P, C, V>
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
        events: UnboundedSender<Event>,
    ) -> Self {
        Self {
            playback,
            capture,
            view,
            config,
            events,
            session: None,
            recorder: None,
            timer: None,
            timer_generation: 0,
            pending_recording: None,
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn session(&self) -> Option<&P::Session> {
        self.session.as_ref()
    }

    pub fn current_asset(&self) -> Option<&AssetRef> {
        self.session.as_ref().map(|s| s.asset())
    }

    pub fn is_playing(&self) -> bool {
        self.session.as_ref().map(|s| s.is_playing()).unwrap_or(false)
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_some()
    }

    pub fn current_time(&self) -> f64 {
        self.session.as_ref().map(|s| s.current_time()).unwrap_or(0.0)
    }

    pub fn duration(&self) -> f64 {
        self.session.as_ref().map(|s| s.duration()).unwrap_or(0.0)
    }

    pub fn timer_active(&self) -> bool {
        self.timer.is_some()
    }

    /// Destination of a stopped recording that is still being finalized
    pub fn pending_recording(&self) -> Option<&PathBuf> {
        self.pending_recording.as_ref()
    }

    fn media_events(&self) -> EventSender {
        let tx = self.events.clone();
        EventSender::new(move |event| {
            let _ = tx.send(Event::Media(event));
        })
    }

    // Playback

    /// Open an asset as the current playback session
    ///
    /// On failure the previous session is kept exactly as it was.
    pub fn load(&mut self, asset: AssetRef) -> Result<()> {
        let events = self.media_events();
        let session = self.playback.open(&asset, events)?;

        if let Some(mut previous) = self.session.take() {
            debug!("Replacing {}", previous.asset());
            previous.pause();
        }
        self.cancel_timer();

        info!("Loaded {} ({:.2}s)", asset, session.duration());
        self.session = Some(session);
        self.refresh_view();
        Ok(())
    }

    /// Load the asset shipped with the application
    pub fn load_bundled(&mut self) -> Result<()> {
        let asset = AssetRef::Bundled(self.config.bundled_asset.clone());
        self.load(asset)
    }

    pub fn play(&mut self) -> Result<()> {
        if self.recorder.is_some() {
            debug!("Ignoring play while recording");
            return Ok(());
        }
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        if session.is_playing() {
            return Ok(());
        }

        session.play()?;
        info!("Playing {}", session.asset());
        self.refresh_view();
        self.start_timer();
        Ok(())
    }

    pub fn pause(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !session.is_playing() {
            return;
        }

        session.pause();
        info!("Paused at {:.2}s", session.current_time());
        self.cancel_timer();
        self.refresh_view();
    }

    pub fn toggle_playback(&mut self) -> Result<()> {
        if self.is_playing() {
            self.pause();
            Ok(())
        } else {
            self.play()
        }
    }

    /// Move the playhead, e.g. from the scrub slider
    pub fn seek(&mut self, seconds: f64) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let target = seconds.clamp(0.0, session.duration());
        session.seek(target);
        self.refresh_view();
    }

    /// Completion callback from the playback session
    pub fn on_playback_finished(&mut self, success: bool) {
        if self.is_playing() {
            // Left over from a session that was replaced while finishing
            debug!("Ignoring finish event, current session is still playing");
            return;
        }

        if success {
            info!("Playback finished");
        } else {
            warn!("Playback stopped on a decode error");
            if let Some(session) = self.session.as_mut() {
                session.pause();
            }
        }

        self.cancel_timer();
        self.refresh_view();
    }

    // Recording

    pub fn start_recording(&mut self) -> Result<()> {
        if self.recorder.is_some() {
            return Ok(());
        }
        self.pause();

        let destination =
            wav::recording_destination(&self.config.recordings_dir, chrono::Utc::now());
        let events = self.media_events();
        let mut recorder = self
            .capture
            .open(&destination, self.config.capture_format, events)?;
        recorder.start()?;

        info!("Recording started: {:?}", destination);
        self.recorder = Some(recorder);
        self.refresh_view();
        Ok(())
    }

    pub fn stop_recording(&mut self) {
        let Some(mut recorder) = self.recorder.take() else {
            return;
        };

        recorder.stop();
        info!("Recording stopped: {:?}", recorder.destination());
        self.pending_recording = Some(recorder.destination().to_path_buf());
        drop(recorder);
        self.refresh_view();
    }

    pub fn toggle_recording(&mut self) -> Result<()> {
        if self.recorder.is_some() {
            self.stop_recording();
            Ok(())
        } else {
            self.start_recording()
        }
    }

    /// Completion callback from the recording session
    ///
    /// Also arrives unprompted when the live recording fails. A successful
    /// recording becomes the current playback session.
    pub fn on_recording_finished(&mut self, success: bool, destination: PathBuf) -> Result<()> {
        if self.pending_recording.as_ref() == Some(&destination) {
            self.pending_recording = None;
        }
        let live = self.recorder.as_ref().map(|r| r.destination() == destination.as_path());
        if live == Some(true) {
            debug!("Recording {:?} ended on its own", destination);
            self.recorder = None;
        }

        if !success {
            warn!("Recording {:?} failed, keeping the current session", destination);
            self.refresh_view();
            return Ok(());
        }

        self.load(AssetRef::File(destination))
    }

    // Refresh

    /// Timer tick; ticks from a cancelled timer are dropped
    pub fn on_tick(&mut self, generation: u64) {
        let current = self.timer.as_ref().map(|t| t.generation());
        if current == Some(generation) {
            self.refresh_view();
        } else {
            debug!("Dropping stale refresh tick {}", generation);
        }
    }

    /// Current view, derived from the sessions without changing them
    pub fn view_state(&self) -> ViewState {
        match &self.session {
            Some(session) => ViewState::new(
                session.current_time(),
                session.duration(),
                session.is_playing(),
                self.recorder.is_some(),
            ),
            None => ViewState::new(0.0, 0.0, false, self.recorder.is_some()),
        }
    }

    fn visualizer_feed(&self) -> VisualizerFeed {
        match (&self.recorder, &self.session) {
            (Some(recorder), _) => VisualizerFeed {
                level: recorder.level(),
                waveform: recorder.waveform(),
            },
            (None, Some(session)) => VisualizerFeed {
                level: session.level(),
                waveform: session.waveform(),
            },
            (None, None) => VisualizerFeed::default(),
        }
    }

    /// Render the current state to the view
    pub fn refresh_view(&mut self) {
        let state = self.view_state();
        let feed = self.visualizer_feed();
        self.view.render(&state, &feed);
    }

    fn start_timer(&mut self) {
        self.cancel_timer();
        self.timer_generation += 1;

        let tx = self.events.clone();
        let timer = RefreshTimer::start(
            self.timer_generation,
            self.config.refresh_interval,
            move |generation| tx.send(Event::Tick(generation)).is_ok(),
        );
        debug!("Refresh timer {} started", timer.generation());
        self.timer = Some(timer);
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            debug!("Refresh timer {} cancelled", timer.generation());
            timer.cancel();
        }
    }

    /// Stop recording and playback before exit
    pub fn shutdown(&mut self) {
        self.stop_recording();
        self.pause();
        self.cancel_timer();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ControllerError;
    use crate::media::{CaptureFormat, MediaEvent};
    use crate::view::{PlayButton, RecordButton};
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::{Arc, Mutex};
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

    #[derive(Debug, Default)]
    struct FakeState {
        position: f64,
        duration: f64,
        playing: bool,
        plays: usize,
    }

    struct FakeSession {
        asset: AssetRef,
        state: Arc<Mutex<FakeState>>,
    }

    impl PlaybackSession for FakeSession {
        fn asset(&self) -> &AssetRef {
            &self.asset
        }

        fn play(&mut self) -> Result<()> {
            let mut state = self.state.lock().unwrap();
            if state.position >= state.duration {
                state.position = 0.0;
            }
            state.playing = true;
            state.plays += 1;
            Ok(())
        }

        fn pause(&mut self) {
            self.state.lock().unwrap().playing = false;
        }

        fn seek(&mut self, seconds: f64) {
            self.state.lock().unwrap().position = seconds;
        }

        fn current_time(&self) -> f64 {
            self.state.lock().unwrap().position
        }

        fn duration(&self) -> f64 {
            self.state.lock().unwrap().duration
        }

        fn is_playing(&self) -> bool {
            self.state.lock().unwrap().playing
        }

        fn level(&self) -> f32 {
            0.25
        }

        fn waveform(&self) -> Vec<f32> {
            vec![0.1, 0.2]
        }
    }

    #[derive(Default)]
    struct FakePlayback {
        durations: HashMap<AssetRef, f64>,
        opened: Vec<Arc<Mutex<FakeState>>>,
    }

    impl FakePlayback {
        fn with(mut self, asset: AssetRef, duration: f64) -> Self {
            self.durations.insert(asset, duration);
            self
        }
    }

    impl PlaybackBackend for FakePlayback {
        type Session = FakeSession;

        fn open(&mut self, asset: &AssetRef, _events: EventSender) -> Result<FakeSession> {
            let duration = self
                .durations
                .get(asset)
                .copied()
                .ok_or_else(|| ControllerError::AssetUnavailable(asset.to_string()))?;
            let state = Arc::new(Mutex::new(FakeState {
                duration,
                ..Default::default()
            }));
            self.opened.push(state.clone());
            Ok(FakeSession {
                asset: asset.clone(),
                state,
            })
        }
    }

    struct FakeRecording {
        destination: PathBuf,
        recording: bool,
        events: EventSender,
    }

    impl RecordingSession for FakeRecording {
        fn destination(&self) -> &Path {
            &self.destination
        }

        fn start(&mut self) -> Result<()> {
            self.recording = true;
            Ok(())
        }

        fn stop(&mut self) {
            if self.recording {
                self.recording = false;
                self.events.send(MediaEvent::RecordingFinished {
                    success: true,
                    destination: self.destination.clone(),
                });
            }
        }

        fn is_recording(&self) -> bool {
            self.recording
        }

        fn level(&self) -> f32 {
            0.75
        }

        fn waveform(&self) -> Vec<f32> {
            vec![0.5, 0.75]
        }
    }

    #[derive(Default)]
    struct FakeCapture {
        unavailable: bool,
        opened: Vec<(PathBuf, CaptureFormat)>,
    }

    impl CaptureBackend for FakeCapture {
        type Session = FakeRecording;

        fn open(
            &mut self,
            destination: &Path,
            format: CaptureFormat,
            events: EventSender,
        ) -> Result<FakeRecording> {
            if self.unavailable {
                return Err(ControllerError::RecorderUnavailable("permission denied".into()));
            }
            self.opened.push((destination.to_path_buf(), format));
            Ok(FakeRecording {
                destination: destination.to_path_buf(),
                recording: false,
                events,
            })
        }
    }

    #[derive(Default)]
    struct FakeView {
        renders: Vec<(ViewState, VisualizerFeed)>,
    }

    impl ViewSink for FakeView {
        fn render(&mut self, state: &ViewState, feed: &VisualizerFeed) {
            self.renders.push((state.clone(), feed.clone()));
        }
    }

    impl FakeView {
        fn last(&self) -> &ViewState {
            &self.renders.last().unwrap().0
        }
    }

    type TestController = PlaybackRecordingController<FakePlayback, FakeCapture, FakeView>;

    fn bundled() -> AssetRef {
        AssetRef::Bundled("piano.wav".into())
    }

    fn controller_with(capture: FakeCapture) -> (TestController, UnboundedReceiver<Event>) {
        let (tx, rx) = unbounded_channel();
        let playback = FakePlayback::default().with(bundled(), 120.0);
        let config = ControllerConfig::new().with_recordings_dir("/tmp/taperoll-test");
        (
            PlaybackRecordingController::new(playback, capture, FakeView::default(), config, tx),
            rx,
        )
    }

    fn controller() -> (TestController, UnboundedReceiver<Event>) {
        controller_with(FakeCapture::default())
    }

    fn next_media_event(rx: &mut UnboundedReceiver<Event>) -> Option<MediaEvent> {
        while let Ok(event) = rx.try_recv() {
            if let Event::Media(media) = event {
                return Some(media);
            }
        }
        None
    }

    #[tokio::test]
    async fn test_play_pause_toggle() {
        let (mut controller, _rx) = controller();
        controller.load(bundled()).unwrap();

        controller.toggle_playback().unwrap();
        assert!(controller.is_playing());
        assert!(controller.timer_active());
        assert_eq!(controller.view().last().play_button, PlayButton::Pause);

        controller.toggle_playback().unwrap();
        assert!(!controller.is_playing());
        assert!(!controller.timer_active());
        assert_eq!(controller.view().last().play_button, PlayButton::Play);
    }

    #[tokio::test]
    async fn test_repeated_play_keeps_single_timer() {
        let (mut controller, _rx) = controller();
        controller.load(bundled()).unwrap();

        controller.play().unwrap();
        let generation = controller.timer.as_ref().unwrap().generation();
        controller.play().unwrap();
        assert_eq!(controller.timer.as_ref().unwrap().generation(), generation);
        assert_eq!(controller.playback.opened[0].lock().unwrap().plays, 1);

        controller.pause();
        controller.pause();
        assert!(!controller.is_playing());
        controller.play().unwrap();
        assert!(controller.timer.as_ref().unwrap().generation() > generation);
    }

    #[tokio::test]
    async fn test_play_without_session_is_noop() {
        let (mut controller, _rx) = controller();
        controller.play().unwrap();
        assert!(!controller.is_playing());
        assert!(!controller.timer_active());
        assert!(controller.view().renders.is_empty());
    }

    #[tokio::test]
    async fn test_pause_when_idle_changes_nothing() {
        let (mut controller, _rx) = controller();
        controller.load(bundled()).unwrap();
        controller.seek(12.0);
        let renders = controller.view().renders.len();
        let before = controller.view_state();

        controller.pause();

        assert_eq!(controller.view().renders.len(), renders);
        assert_eq!(controller.view_state(), before);
        assert_eq!(controller.current_time(), 12.0);
    }

    #[tokio::test]
    async fn test_stale_tick_after_pause() {
        let (mut controller, _rx) = controller();
        controller.load(bundled()).unwrap();
        controller.play().unwrap();
        let generation = controller.timer.as_ref().unwrap().generation();

        controller.pause();
        let renders = controller.view().renders.len();
        controller.on_tick(generation);

        assert_eq!(controller.view().renders.len(), renders);
        assert_eq!(controller.view().last().play_button, PlayButton::Play);
    }

    #[tokio::test]
    async fn test_tick_refreshes_while_playing() {
        let (mut controller, _rx) = controller();
        controller.load(bundled()).unwrap();
        controller.play().unwrap();
        controller.playback.opened[0].lock().unwrap().position = 61.0;

        let generation = controller.timer.as_ref().unwrap().generation();
        controller.on_tick(generation);

        let view = controller.view().last();
        assert_eq!(view.elapsed, "01:01");
        assert_eq!(view.remaining, "-00:59");
        assert_eq!(view.slider.max, 120.0);
    }

    #[tokio::test]
    async fn test_load_failure_keeps_session() {
        let (mut controller, _rx) = controller();
        controller.load(bundled()).unwrap();
        controller.play().unwrap();

        let err = controller
            .load(AssetRef::File(PathBuf::from("/missing.wav")))
            .unwrap_err();

        assert!(matches!(err, ControllerError::AssetUnavailable(_)));
        assert_eq!(controller.current_asset(), Some(&bundled()));
        assert!(controller.is_playing());
        assert!(controller.timer_active());
    }

    #[tokio::test]
    async fn test_playback_finished_cancels_timer() {
        let (mut controller, _rx) = controller();
        controller.load(bundled()).unwrap();
        controller.play().unwrap();
        {
            let mut state = controller.playback.opened[0].lock().unwrap();
            state.position = 120.0;
            state.playing = false;
        }

        controller.on_playback_finished(true);
        assert!(!controller.timer_active());
        assert_eq!(controller.view().last().elapsed, "02:00");

        // No auto-restart; the next play rewinds
        assert!(!controller.is_playing());
        controller.play().unwrap();
        assert_eq!(controller.current_time(), 0.0);
    }

    #[tokio::test]
    async fn test_playback_error_keeps_position() {
        let (mut controller, _rx) = controller();
        controller.load(bundled()).unwrap();
        controller.play().unwrap();
        {
            let mut state = controller.playback.opened[0].lock().unwrap();
            state.position = 30.0;
            state.playing = false;
        }

        controller.on_playback_finished(false);
        assert!(!controller.is_playing());
        assert!(!controller.timer_active());
        assert_eq!(controller.current_time(), 30.0);
    }

    #[tokio::test]
    async fn test_finish_event_for_playing_session_is_ignored() {
        let (mut controller, _rx) = controller();
        controller.load(bundled()).unwrap();
        controller.play().unwrap();

        controller.on_playback_finished(true);
        assert!(controller.is_playing());
        assert!(controller.timer_active());
    }

    #[tokio::test]
    async fn test_seek_clamps() {
        let (mut controller, _rx) = controller();
        controller.seek(5.0);
        assert!(controller.view().renders.is_empty());

        controller.load(bundled()).unwrap();
        controller.seek(500.0);
        assert_eq!(controller.current_time(), 120.0);
        controller.seek(-2.0);
        assert_eq!(controller.current_time(), 0.0);
    }

    #[tokio::test]
    async fn test_start_recording_pauses_playback() {
        let (mut controller, _rx) = controller();
        controller.load(bundled()).unwrap();
        controller.play().unwrap();

        controller.start_recording().unwrap();

        assert!(controller.is_recording());
        assert!(!controller.is_playing());
        assert!(!controller.timer_active());
        let view = controller.view().last();
        assert_eq!(view.play_button, PlayButton::Play);
        assert_eq!(view.record_button, RecordButton::Stop);
        let feed = &controller.view().renders.last().unwrap().1;
        assert_eq!(feed.level, 0.75);
        assert_eq!(feed.waveform, vec![0.5, 0.75]);

        let (destination, format) = &controller.capture.opened[0];
        assert!(destination.starts_with("/tmp/taperoll-test"));
        assert_eq!(destination.extension().unwrap(), "wav");
        assert_eq!(*format, CaptureFormat { channels: 1, sample_rate: 44_100 });

        // Playback stays off while recording
        controller.play().unwrap();
        assert!(!controller.is_playing());
    }

    #[tokio::test]
    async fn test_start_stop_produces_one_completion() {
        let (mut controller, mut rx) = controller();

        controller.toggle_recording().unwrap();
        controller.toggle_recording().unwrap();
        controller.stop_recording();
        assert!(!controller.is_recording());
        assert_eq!(controller.capture.opened.len(), 1);

        let first = next_media_event(&mut rx);
        assert!(matches!(first, Some(MediaEvent::RecordingFinished { success: true, .. })));
        assert!(next_media_event(&mut rx).is_none());
        assert!(controller.pending_recording().is_some());
    }

    #[tokio::test]
    async fn test_recording_becomes_next_playback() {
        let (mut controller, mut rx) = controller();
        controller.load(bundled()).unwrap();
        assert_eq!(controller.duration(), 120.0);

        controller.start_recording().unwrap();
        controller.stop_recording();
        let Some(MediaEvent::RecordingFinished { success, destination }) = next_media_event(&mut rx)
        else {
            panic!("expected a recording finish event");
        };
        let recorded = AssetRef::File(destination.clone());
        controller.playback.durations.insert(recorded.clone(), 4.0);

        controller.on_recording_finished(success, destination).unwrap();
        assert!(controller.pending_recording().is_none());

        controller.play().unwrap();
        assert_eq!(controller.current_asset(), Some(&recorded));
        assert_eq!(controller.duration(), 4.0);
        assert!(controller.is_playing());
    }

    #[tokio::test]
    async fn test_failed_recording_keeps_session() {
        let (mut controller, _rx) = controller();
        controller.load(bundled()).unwrap();

        controller
            .on_recording_finished(false, PathBuf::from("/tmp/taperoll-test/x.wav"))
            .unwrap();

        assert_eq!(controller.current_asset(), Some(&bundled()));
        assert_eq!(controller.duration(), 120.0);
    }

    #[tokio::test]
    async fn test_recording_failure_returns_to_idle() {
        let (mut controller, mut rx) = controller();
        controller.load(bundled()).unwrap();
        controller.start_recording().unwrap();
        let destination = controller.capture.opened[0].0.clone();

        // The recorder gave up without a stop request
        controller.on_recording_finished(false, destination).unwrap();

        assert!(!controller.is_recording());
        assert!(controller.pending_recording().is_none());
        assert_eq!(controller.view().last().record_button, RecordButton::Record);
        assert_eq!(controller.current_asset(), Some(&bundled()));
        assert!(next_media_event(&mut rx).is_none());

        controller.play().unwrap();
        assert!(controller.is_playing());
    }

    #[tokio::test]
    async fn test_recording_ended_on_its_own_is_loaded() {
        let (mut controller, _rx) = controller();
        controller.start_recording().unwrap();
        let destination = controller.capture.opened[0].0.clone();
        let recorded = AssetRef::File(destination.clone());
        controller.playback.durations.insert(recorded.clone(), 2.0);

        controller.on_recording_finished(true, destination).unwrap();

        assert!(!controller.is_recording());
        assert_eq!(controller.current_asset(), Some(&recorded));
        let view = controller.view().last();
        assert_eq!(view.record_button, RecordButton::Record);
        assert_eq!(view.play_button, PlayButton::Play);
    }

    #[tokio::test]
    async fn test_new_recording_replaces_playing_session() {
        let (mut controller, mut rx) = controller();
        controller.load(bundled()).unwrap();
        controller.start_recording().unwrap();
        controller.stop_recording();
        let Some(MediaEvent::RecordingFinished { destination, .. }) = next_media_event(&mut rx)
        else {
            panic!("expected a recording finish event");
        };
        let recorded = AssetRef::File(destination.clone());
        controller.playback.durations.insert(recorded.clone(), 4.0);

        // Playing the old asset while the take is being finalized
        controller.play().unwrap();
        let old_generation = controller.timer.as_ref().unwrap().generation();

        controller.on_recording_finished(true, destination).unwrap();

        assert!(!controller.playback.opened[0].lock().unwrap().playing);
        assert_eq!(controller.current_asset(), Some(&recorded));
        assert!(!controller.is_playing());
        assert!(!controller.timer_active());

        let renders = controller.view().renders.len();
        controller.on_tick(old_generation);
        assert_eq!(controller.view().renders.len(), renders);
        assert_eq!(controller.view().last().slider.max, 4.0);
    }

    #[tokio::test]
    async fn test_recorder_unavailable_is_surfaced() {
        let (mut controller, _rx) = controller_with(FakeCapture {
            unavailable: true,
            ..Default::default()
        });
        controller.load(bundled()).unwrap();

        let err = controller.toggle_recording().unwrap_err();
        assert!(matches!(err, ControllerError::RecorderUnavailable(_)));
        assert!(!controller.is_recording());
        assert_eq!(controller.view().last().record_button, RecordButton::Record);
    }

    #[tokio::test]
    async fn test_shutdown_stops_everything() {
        let (mut controller, mut rx) = controller();
        controller.load(bundled()).unwrap();
        controller.start_recording().unwrap();

        controller.shutdown();
        assert!(!controller.is_recording());
        assert!(!controller.is_playing());
        assert!(!controller.timer_active());
        assert!(next_media_event(&mut rx).is_some());
    }
}
