//! Audio output and input streams
//!
//! With the `pipewire` feature both directions run a PipeWire main loop on a
//! dedicated thread. Without it, output is paced by a wall clock (no sound is
//! produced) and no input device exists, so capture cannot be opened.

use crate::audio::playback::SharedPlaybackState;
use crate::media::CaptureFormat;
use std::thread::JoinHandle;

/// Receives captured mono samples together with the negotiated sample rate
pub type SampleCallback = Box<dyn FnMut(&[f32], u32) + Send>;

/// Called once when an output stream runs dry (`true`) or fails (`false`).
/// Never called for a stream stopped through [`DeviceStream::stop`].
pub type EndCallback = Box<dyn FnOnce(bool) + Send>;

/// Called once if an input stream fails after it was opened
pub type FailureCallback = Box<dyn FnOnce(String) + Send>;

/// A running stream thread
pub struct DeviceStream {
    stop: Option<Box<dyn FnOnce()>>,
    thread: Option<JoinHandle<()>>,
}

impl DeviceStream {
    fn new(stop: Box<dyn FnOnce()>, thread: JoinHandle<()>) -> Self {
        Self {
            stop: Some(stop),
            thread: Some(thread),
        }
    }

    /// Stop the stream and wait for its thread to exit
    pub fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            stop();
        }
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for DeviceStream {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Whether real output and input devices are compiled in
pub const HAS_DEVICES: bool = cfg!(feature = "pipewire");

#[cfg(not(feature = "pipewire"))]
pub use headless::{open_input, open_output};
#[cfg(feature = "pipewire")]
pub use pw_stream::{open_input, open_output};

#[cfg(not(feature = "pipewire"))]
mod headless {
    use super::*;
    use std::sync::mpsc::{self, RecvTimeoutError};
    use std::thread;
    use std::time::{Duration, Instant};

    const PACE: Duration = Duration::from_millis(10);

    /// Consume samples in real time without an audio device
    pub fn open_output(
        state: SharedPlaybackState,
        on_end: EndCallback,
    ) -> Result<DeviceStream, String> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let handle = thread::Builder::new()
            .name("taperoll-output".to_string())
            .spawn(move || {
                let sample_rate = state.sample_rate().max(1) as f64;
                let started = Instant::now();
                let mut consumed = 0usize;

                loop {
                    match stop_rx.recv_timeout(PACE) {
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
                        Err(RecvTimeoutError::Timeout) => {}
                    }

                    let owed = (started.elapsed().as_secs_f64() * sample_rate) as usize;
                    let count = owed.saturating_sub(consumed);
                    if count == 0 {
                        continue;
                    }
                    consumed += count;

                    if state.get_samples(count).is_none() {
                        on_end(true);
                        return;
                    }
                }
            })
            .map_err(|e| format!("Failed to spawn output thread: {}", e))?;

        Ok(DeviceStream::new(
            Box::new(move || {
                let _ = stop_tx.send(());
            }),
            handle,
        ))
    }

    pub fn open_input(
        _format: CaptureFormat,
        _on_samples: SampleCallback,
        _on_failure: FailureCallback,
    ) -> Result<DeviceStream, String> {
        Err("No capture device available: built without PipeWire support".to_string())
    }
}

#[cfg(feature = "pipewire")]
mod pw_stream {
    use super::*;
    use log::{error, warn};
    use pipewire as pw;
    use pw::spa;
    use pw::spa::param::format::{MediaSubtype, MediaType};
    use pw::spa::param::format_utils;
    use pw::spa::pod::Pod;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;

    enum StreamCommand {
        Stop,
    }

    /// Play the shared samples through the default PipeWire sink
    pub fn open_output(
        state: SharedPlaybackState,
        on_end: EndCallback,
    ) -> Result<DeviceStream, String> {
        let (sender, receiver) = pw::channel::channel::<StreamCommand>();
        let stopped = Arc::new(AtomicBool::new(false));

        let handle = thread::Builder::new()
            .name("taperoll-output".to_string())
            .spawn({
                let stopped = stopped.clone();
                move || {
                    let result = run_playback_loop(state, receiver);
                    if stopped.load(Ordering::SeqCst) {
                        return;
                    }
                    match result {
                        Ok(()) => on_end(true),
                        Err(e) => {
                            error!("Playback stream failed: {}", e);
                            on_end(false);
                        }
                    }
                }
            })
            .map_err(|e| format!("Failed to spawn output thread: {}", e))?;

        Ok(DeviceStream::new(
            Box::new(move || {
                stopped.store(true, Ordering::SeqCst);
                let _ = sender.send(StreamCommand::Stop);
            }),
            handle,
        ))
    }

    /// Capture mono samples from the default PipeWire source
    pub fn open_input(
        format: CaptureFormat,
        on_samples: SampleCallback,
        on_failure: FailureCallback,
    ) -> Result<DeviceStream, String> {
        let (sender, receiver) = pw::channel::channel::<StreamCommand>();

        let handle = thread::Builder::new()
            .name("taperoll-capture".to_string())
            .spawn(move || {
                if let Err(e) = run_capture_loop(format, on_samples, receiver) {
                    error!("Capture stream failed: {}", e);
                    on_failure(e);
                }
            })
            .map_err(|e| format!("Failed to spawn capture thread: {}", e))?;

        Ok(DeviceStream::new(
            Box::new(move || {
                let _ = sender.send(StreamCommand::Stop);
            }),
            handle,
        ))
    }

    fn format_params(audio_info: spa::param::audio::AudioInfoRaw) -> Result<Vec<u8>, String> {
        let obj = spa::pod::Object {
            type_: spa::utils::SpaTypes::ObjectParamFormat.as_raw(),
            id: spa::param::ParamType::EnumFormat.as_raw(),
            properties: audio_info.into(),
        };

        Ok(spa::pod::serialize::PodSerializer::serialize(
            std::io::Cursor::new(Vec::new()),
            &spa::pod::Value::Object(obj),
        )
        .map_err(|e| format!("Failed to serialize audio format: {:?}", e))?
        .0
        .into_inner())
    }

    fn parse_raw_format(
        format: &mut spa::param::audio::AudioInfoRaw,
        id: u32,
        param: Option<&Pod>,
    ) {
        let Some(param) = param else { return };
        if id != spa::param::ParamType::Format.as_raw() {
            return;
        }

        let (media_type, media_subtype) = match format_utils::parse_format(param) {
            Ok(v) => v,
            Err(_) => return,
        };

        if media_type != MediaType::Audio || media_subtype != MediaSubtype::Raw {
            return;
        }

        if let Err(e) = format.parse(param) {
            warn!("Failed to parse negotiated audio format: {:?}", e);
        }
    }

    fn run_playback_loop(
        state: SharedPlaybackState,
        receiver: pw::channel::Receiver<StreamCommand>,
    ) -> Result<(), String> {
        pw::init();

        let mainloop = pw::main_loop::MainLoopRc::new(None)
            .map_err(|e| format!("Failed to create PipeWire main loop: {}", e))?;

        let context = pw::context::ContextRc::new(&mainloop, None)
            .map_err(|e| format!("Failed to create PipeWire context: {}", e))?;

        let core = context
            .connect_rc(None)
            .map_err(|e| format!("Failed to connect to PipeWire: {}", e))?;

        let mainloop_weak = mainloop.downgrade();
        let _receiver = receiver.attach(mainloop.loop_(), move |cmd| match cmd {
            StreamCommand::Stop => {
                if let Some(mainloop) = mainloop_weak.upgrade() {
                    mainloop.quit();
                }
            }
        });

        struct UserData {
            format: spa::param::audio::AudioInfoRaw,
            state: SharedPlaybackState,
            mainloop_weak: pw::main_loop::MainLoopWeak,
        }

        let sample_rate = state.sample_rate();
        let user_data = UserData {
            format: Default::default(),
            state,
            mainloop_weak: mainloop.downgrade(),
        };

        let props = pw::properties::properties! {
            *pw::keys::MEDIA_TYPE => "Audio",
            *pw::keys::MEDIA_CATEGORY => "Playback",
            *pw::keys::MEDIA_ROLE => "Music",
            *pw::keys::APP_NAME => "Taperoll",
        };

        let stream = pw::stream::StreamBox::new(&core, "taperoll-playback", props)
            .map_err(|e| format!("Failed to create PipeWire stream: {}", e))?;

        let _listener = stream
            .add_local_listener_with_user_data(user_data)
            .param_changed(|_, user_data, id, param| {
                parse_raw_format(&mut user_data.format, id, param);
            })
            .process(|stream, user_data| {
                let Some(mut buffer) = stream.dequeue_buffer() else {
                    return;
                };

                let datas = buffer.datas_mut();
                if datas.is_empty() {
                    return;
                }

                let data = &mut datas[0];
                let n_channels = user_data.format.channels().max(1) as usize;
                let sample_size = std::mem::size_of::<f32>();
                let stride = sample_size * n_channels;

                let Some(slice) = data.data() else {
                    return;
                };

                let n_frames = slice.len() / stride;

                match user_data.state.get_samples(n_frames) {
                    Some(samples) => {
                        // Mono source: same sample on every channel
                        for (i, &sample) in samples.iter().enumerate() {
                            let bytes = sample.to_le_bytes();
                            for channel in 0..n_channels {
                                let offset = i * stride + channel * sample_size;
                                if offset + sample_size <= slice.len() {
                                    slice[offset..offset + sample_size].copy_from_slice(&bytes);
                                }
                            }
                        }
                        let written = samples.len() * stride;
                        if written < slice.len() {
                            slice[written..].fill(0);
                        }

                        let chunk = data.chunk_mut();
                        *chunk.offset_mut() = 0;
                        *chunk.stride_mut() = stride as i32;
                        *chunk.size_mut() = written as u32;
                    }
                    None => {
                        if let Some(mainloop) = user_data.mainloop_weak.upgrade() {
                            mainloop.quit();
                        }
                    }
                }
            })
            .register()
            .map_err(|e| format!("Failed to register stream listener: {}", e))?;

        let mut audio_info = spa::param::audio::AudioInfoRaw::new();
        audio_info.set_format(spa::param::audio::AudioFormat::F32LE);
        audio_info.set_rate(sample_rate);

        let values = format_params(audio_info)?;
        let pod = Pod::from_bytes(&values).ok_or_else(|| "Invalid audio format pod".to_string())?;
        let mut params = [pod];

        stream
            .connect(
                spa::utils::Direction::Output,
                None,
                pw::stream::StreamFlags::AUTOCONNECT
                    | pw::stream::StreamFlags::MAP_BUFFERS
                    | pw::stream::StreamFlags::RT_PROCESS,
                &mut params,
            )
            .map_err(|e| format!("Failed to connect stream: {}", e))?;

        mainloop.run();

        Ok(())
    }

    fn run_capture_loop(
        format: CaptureFormat,
        on_samples: SampleCallback,
        receiver: pw::channel::Receiver<StreamCommand>,
    ) -> Result<(), String> {
        pw::init();

        let mainloop = pw::main_loop::MainLoopRc::new(None)
            .map_err(|e| format!("Failed to create PipeWire main loop: {}", e))?;

        let context = pw::context::ContextRc::new(&mainloop, None)
            .map_err(|e| format!("Failed to create PipeWire context: {}", e))?;

        let core = context
            .connect_rc(None)
            .map_err(|e| format!("Failed to connect to PipeWire: {}", e))?;

        let mainloop_weak = mainloop.downgrade();
        let _receiver = receiver.attach(mainloop.loop_(), move |cmd| match cmd {
            StreamCommand::Stop => {
                if let Some(mainloop) = mainloop_weak.upgrade() {
                    mainloop.quit();
                }
            }
        });

        struct UserData {
            format: spa::param::audio::AudioInfoRaw,
            on_samples: SampleCallback,
        }

        let user_data = UserData {
            format: Default::default(),
            on_samples,
        };

        let props = pw::properties::properties! {
            *pw::keys::MEDIA_TYPE => "Audio",
            *pw::keys::MEDIA_CATEGORY => "Capture",
            *pw::keys::MEDIA_ROLE => "Communication",
            *pw::keys::APP_NAME => "Taperoll",
        };

        let stream = pw::stream::StreamBox::new(&core, "taperoll-capture", props)
            .map_err(|e| format!("Failed to create PipeWire stream: {}", e))?;

        let _listener = stream
            .add_local_listener_with_user_data(user_data)
            .param_changed(|_, user_data, id, param| {
                parse_raw_format(&mut user_data.format, id, param);
            })
            .process(|stream, user_data| {
                let Some(mut buffer) = stream.dequeue_buffer() else {
                    return;
                };

                let datas = buffer.datas_mut();
                if datas.is_empty() {
                    return;
                }

                let data = &mut datas[0];
                let n_channels = user_data.format.channels().max(1);
                let sample_rate = user_data.format.rate();
                let n_samples = data.chunk().size() / (std::mem::size_of::<f32>() as u32);

                if let Some(raw_samples) = data.data() {
                    // Keep the first channel of every frame
                    let mut mono_samples = Vec::with_capacity((n_samples / n_channels) as usize);

                    for i in (0..n_samples).step_by(n_channels as usize) {
                        let start = i as usize * std::mem::size_of::<f32>();
                        let end = start + std::mem::size_of::<f32>();
                        if end <= raw_samples.len() {
                            let sample = f32::from_le_bytes(
                                raw_samples[start..end].try_into().unwrap_or([0; 4]),
                            );
                            mono_samples.push(sample);
                        }
                    }

                    (user_data.on_samples)(&mono_samples, sample_rate);
                }
            })
            .register()
            .map_err(|e| format!("Failed to register stream listener: {}", e))?;

        let mut audio_info = spa::param::audio::AudioInfoRaw::new();
        audio_info.set_format(spa::param::audio::AudioFormat::F32LE);
        audio_info.set_rate(format.sample_rate);
        audio_info.set_channels(format.channels as u32);

        let values = format_params(audio_info)?;
        let pod = Pod::from_bytes(&values).ok_or_else(|| "Invalid audio format pod".to_string())?;
        let mut params = [pod];

        stream
            .connect(
                spa::utils::Direction::Input,
                None,
                pw::stream::StreamFlags::AUTOCONNECT
                    | pw::stream::StreamFlags::MAP_BUFFERS
                    | pw::stream::StreamFlags::RT_PROCESS,
                &mut params,
            )
            .map_err(|e| format!("Failed to connect stream: {}", e))?;

        mainloop.run();

        Ok(())
    }
}
