//! Playback engine capability contract
//!
//! The controller never decodes audio. It drives a black-box streaming engine
//! through this narrow interface and folds the engine's push events back into
//! session state. Buffering, the on-disk byte cache and DSP are the engine's
//! concern.

use crate::error::EngineError;
use crate::types::{EngineState, RepeatMode};
use async_trait::async_trait;
use karaoke_core::{Track, TrackId};

/// Result type for engine commands
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// One entry of the engine's media list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    pub id: TrackId,
    pub uri: String,
    pub title: String,
    /// "artist • performer"
    pub artist_label: String,
    pub artwork_uri: String,
}

impl From<&Track> for MediaItem {
    fn from(track: &Track) -> Self {
        Self {
            id: track.id.clone(),
            uri: track.audio_url.clone(),
            title: track.title.clone(),
            artist_label: track.artist_label(),
            artwork_uri: track.cover_url.clone(),
        }
    }
}

/// Point-in-time reading of the engine
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EngineStatus {
    pub is_playing: bool,
    pub state: EngineState,
    /// Current position; may be negative while nothing is loaded
    pub position_ms: i64,
    /// Duration of the current item; negative when unknown
    pub duration_ms: i64,
    pub current_item_id: Option<TrackId>,
    pub item_count: usize,
    pub has_next: bool,
    pub has_previous: bool,
    pub shuffle_enabled: bool,
    pub repeat_mode: RepeatMode,
}

/// Events pushed by the engine
///
/// Engines may emit these from any context. The controller funnels them into
/// its single ordered message stream before touching state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    IsPlayingChanged(bool),
    StateChanged(EngineState),
    /// The engine moved to a different media item (native next, shuffle,
    /// auto-advance). `None` when the list was cleared.
    MediaItemTransition(Option<TrackId>),
    ShuffleModeChanged(bool),
    RepeatModeChanged(RepeatMode),
    /// The engine (re)created its audio output session
    AudioSessionChanged(i32),
}

/// Streaming playback engine
///
/// Every method is a potential suspension point. `EngineError::Unavailable`
/// means the engine is not connected yet; callers treat it as transient.
#[async_trait]
pub trait PlaybackEngine: Send + Sync {
    /// Replace the media list and position the cursor
    async fn load(
        &self,
        items: Vec<MediaItem>,
        start_index: usize,
        start_position_ms: u64,
    ) -> EngineResult<()>;

    async fn play(&self) -> EngineResult<()>;

    async fn pause(&self) -> EngineResult<()>;

    /// Seek within the current item
    async fn seek_to(&self, position_ms: u64) -> EngineResult<()>;

    /// Jump to another item of the loaded list
    async fn seek_to_index(&self, index: usize, position_ms: u64) -> EngineResult<()>;

    async fn advance_to_next(&self) -> EngineResult<()>;

    async fn advance_to_previous(&self) -> EngineResult<()>;

    async fn set_shuffle_enabled(&self, enabled: bool) -> EngineResult<()>;

    async fn set_repeat_mode(&self, mode: RepeatMode) -> EngineResult<()>;

    async fn status(&self) -> EngineResult<EngineStatus>;

    /// Release the engine connection/session handle
    async fn release(&self) -> EngineResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use karaoke_core::Singer;

    #[test]
    fn media_item_carries_combined_artist_label() {
        let track = Track::new("pl_2", "Subways", "FEX")
            .with_audio_url("https://storage.example.com/audio/FEX - Subways.mp3")
            .with_cover_url("https://storage.example.com/images/FEX - Subways.jpg")
            .with_singer(Singer::Evil);

        let item = MediaItem::from(&track);

        assert_eq!(item.id, track.id);
        assert_eq!(item.uri, track.audio_url);
        assert_eq!(item.artist_label, "FEX • Evil Neuro");
        assert_eq!(item.artwork_uri, track.cover_url);
    }
}
