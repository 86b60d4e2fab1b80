//! Error types for playback control

use karaoke_core::{KaraokeError, TrackId};
use thiserror::Error;

/// Errors reported by a playback engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Engine not connected yet, or mid-reconnect
    #[error("Engine unavailable")]
    Unavailable,

    /// Media index outside the loaded list
    #[error("Media index out of bounds: {0}")]
    IndexOutOfBounds(usize),

    /// Engine rejected the command
    #[error("Engine command failed: {0}")]
    Command(String),
}

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Track has no audio URL
    #[error("No audio URL available for track {0}")]
    UnplayableTrack(TrackId),

    /// Engine error
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Repository or store error
    #[error(transparent)]
    Repository(#[from] KaraokeError),

    /// Audio effect backend error
    #[error("Audio effect error: {0}")]
    Effects(String),

    /// The controller task has shut down
    #[error("Playback controller is not running")]
    ControllerClosed,
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
