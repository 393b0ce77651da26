//! Error taxonomy for the player/recorder controller

use thiserror::Error;

/// Failures surfaced by controller operations and media collaborators
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    /// The asset reference could not be resolved (missing bundle entry or file)
    #[error("asset unavailable: {0}")]
    AssetUnavailable(String),
    /// The container was found but could not be parsed or decoded
    #[error("decode error: {0}")]
    DecodeError(String),
    /// The capture device or destination could not be opened
    #[error("recorder unavailable: {0}")]
    RecorderUnavailable(String),
    /// The captured audio could not be written out
    #[error("encode error: {0}")]
    EncodeError(String),
    /// No audio output stream could be started for playback
    #[error("output unavailable: {0}")]
    OutputUnavailable(String),
}

pub type Result<T> = std::result::Result<T, ControllerError>;
