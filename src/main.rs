//! Taperoll - plays a bundled audio asset and records new takes
//!
//! This is the terminal entry point. Single-letter commands on stdin stand in
//! for the play/pause and record/stop buttons.

mod cli;

use anyhow::Context;
use clap::Parser;
use log::{error, info, trace, warn};
use std::io::BufRead;
use std::path::PathBuf;
use taperoll::audio::{device, list_recordings, WavCapture, WavPlayback};
use taperoll::{
    AssetRef, ControllerError, ControllerHandle, Dispatcher, Intent, ViewSink, ViewState,
    VisualizerFeed,
};

const HELP: &str = "commands: p = play/pause, r = record/stop, s <seconds> = seek, \
                    o <file> = open, l = list recordings, q = quit";

/// Prints the view to the terminal whenever its text changes
#[derive(Default)]
struct TerminalView {
    last: Option<ViewState>,
}

impl ViewSink for TerminalView {
    fn render(&mut self, state: &ViewState, feed: &VisualizerFeed) {
        if let Ok(json) = serde_json::to_string(state) {
            trace!("view {} level {:.3}", json, feed.level);
        }
        if self.last.as_ref() == Some(state) {
            return;
        }

        println!(
            "[{}] [{}] {} {} ({:.0}/{:.0}s)",
            state.play_button.label(),
            state.record_button.label(),
            state.elapsed,
            state.remaining,
            state.slider.value,
            state.slider.max,
        );
        self.last = Some(state.clone());
    }

    fn show_error(&mut self, error: &ControllerError) {
        eprintln!("error: {}", error);
    }
}

/// Map one line of input to an intent
fn parse_command(line: &str) -> Option<Intent> {
    let line = line.trim();
    let (command, arg) = match line.split_once(char::is_whitespace) {
        Some((command, arg)) => (command, arg.trim()),
        None => (line, ""),
    };

    match command {
        "p" => Some(Intent::TogglePlayback),
        "r" => Some(Intent::ToggleRecording),
        "s" => arg.parse().ok().map(Intent::Seek),
        "o" if !arg.is_empty() => Some(Intent::Load(AssetRef::File(PathBuf::from(arg)))),
        "q" => Some(Intent::Shutdown),
        _ => None,
    }
}

/// Read commands from stdin on a dedicated thread
fn spawn_input(handle: ControllerHandle, recordings_dir: PathBuf) -> anyhow::Result<()> {
    std::thread::Builder::new()
        .name("taperoll-input".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if line.trim() == "l" {
                    match list_recordings(&recordings_dir) {
                        Ok(recordings) => {
                            for path in recordings {
                                println!("{}", path.display());
                            }
                        }
                        Err(e) => eprintln!("error: {}", e),
                    }
                    continue;
                }

                match parse_command(&line) {
                    Some(intent) => {
                        let quit = intent == Intent::Shutdown;
                        if !handle.send(intent) || quit {
                            return;
                        }
                    }
                    None => println!("{}", HELP),
                }
            }
            // End of input
            handle.send(Intent::Shutdown);
        })
        .context("Failed to spawn input thread")?;
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments and initialize logging
    let args = cli::Args::parse();
    cli::init_logging(&args);

    info!("Starting Taperoll");
    if !device::HAS_DEVICES {
        warn!(
            "Built without PipeWire: playback is silent and recording is unavailable \
             (rebuild with --features pipewire)"
        );
    }

    let config = args.config();
    let recordings_dir = config.recordings_dir.clone();
    let (mut dispatcher, handle) = Dispatcher::new(
        WavPlayback::new(),
        WavCapture::new(),
        TerminalView::default(),
        config,
    );

    // A missing asset leaves the player empty but still able to record
    let loaded = match args.file.clone() {
        Some(path) => dispatcher.controller_mut().load(AssetRef::File(path)),
        None => dispatcher.controller_mut().load_bundled(),
    };
    if let Err(e) = loaded {
        error!("Failed to load startup asset: {}", e);
        dispatcher.report_error(&e);
        dispatcher.controller_mut().refresh_view();
    }

    println!("{}", HELP);
    spawn_input(handle.clone(), recordings_dir)?;

    tokio::spawn({
        let handle = handle.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                handle.send(Intent::Shutdown);
            }
        }
    });

    dispatcher.run().await;
    info!("Taperoll stopped");
    Ok(())
}
