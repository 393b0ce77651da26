//! Controller configuration
//!
//! Fixed defaults for the refresh cadence, capture format and storage locations.

use crate::media::CaptureFormat;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Interval between view refreshes while playing
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_millis(30);

/// Logical name of the asset shipped with the application
pub const DEFAULT_BUNDLED_ASSET: &str = "piano.wav";

#[derive(Clone, Debug)]
pub struct ControllerConfig {
    pub refresh_interval: Duration,
    pub capture_format: CaptureFormat,
    pub recordings_dir: PathBuf,
    pub bundled_asset: String,
}

impl ControllerConfig {
    pub fn new() -> Self {
        Self {
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            capture_format: CaptureFormat::default(),
            recordings_dir: default_recordings_dir(),
            bundled_asset: DEFAULT_BUNDLED_ASSET.to_string(),
        }
    }

    /// Set the recordings directory
    pub fn with_recordings_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.recordings_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Set the refresh timer interval
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Set the bundled asset name loaded at startup
    pub fn with_bundled_asset(mut self, name: impl Into<String>) -> Self {
        self.bundled_asset = name.into();
        self
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Application-private, persistent directory for recordings
pub fn default_recordings_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("taperoll")
        .join("recordings")
}
