/// Core error types for the karaoke player
use crate::types::PlaylistId;
use thiserror::Error;

/// Result type alias using `KaraokeError`
pub type Result<T> = std::result::Result<T, KaraokeError>;

/// Failures crossing the collaborator seams
#[derive(Error, Debug)]
pub enum KaraokeError {
    /// Local playlist catalog could not be read or written
    #[error("Storage error: {0}")]
    Storage(String),

    /// Remote API unreachable or returned garbage
    #[error("Network error: {0}")]
    Network(String),

    #[error("Playlist not found: {0}")]
    PlaylistNotFound(PlaylistId),
}

impl KaraokeError {
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_context() {
        assert_eq!(
            KaraokeError::network("HTTP error 404").to_string(),
            "Network error: HTTP error 404"
        );
        assert_eq!(
            KaraokeError::PlaylistNotFound(PlaylistId::new("p1")).to_string(),
            "Playlist not found: p1"
        );
    }
}
