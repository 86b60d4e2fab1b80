//! Session state snapshot published to the UI

use crate::types::{EngineState, RepeatMode};
use karaoke_core::{Playlist, PlaylistId, Track};
use std::sync::Arc;

/// Renderable snapshot of playback truth
///
/// Produced only by the controller; the UI reads it through a
/// `tokio::sync::watch` receiver. Track lists are behind `Arc` so that the
/// frequent progress publications stay cheap.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// Tracks the engine was last loaded with (playback order before shuffle)
    pub queue: Arc<Vec<Track>>,

    /// Tracks of the currently opened playlist
    pub playlist_tracks: Arc<Vec<Track>>,

    /// Deduplicated union of every known playlist's tracks
    pub catalog_tracks: Arc<Vec<Track>>,
    pub is_catalog_loading: bool,
    pub catalog_loaded: bool,

    pub current_track: Option<Track>,
    pub is_playing: bool,

    /// position / duration, always in [0, 1]
    pub progress: f32,
    pub position_ms: u64,
    pub duration_ms: u64,

    pub is_shuffle_enabled: bool,
    pub repeat_mode: RepeatMode,
    pub engine_state: EngineState,

    pub available_playlists: Vec<Playlist>,
    pub current_playlist_id: Option<PlaylistId>,
    pub current_playlist: Option<Playlist>,
    /// A playlist fetch is in flight
    pub is_loading: bool,

    /// Last user-visible error; overwritten, never queued
    pub last_error: Option<String>,
}

impl SessionState {
    /// Reset position and progress to the start of the current track
    pub(crate) fn rewind(&mut self) {
        self.position_ms = 0;
        self.progress = 0.0;
    }

    /// Store a position/duration pair and derive progress from it
    pub(crate) fn set_position(&mut self, position_ms: u64, duration_ms: u64) {
        self.position_ms = position_ms;
        self.duration_ms = duration_ms;
        self.progress = progress_fraction(position_ms as i64, duration_ms as i64);
    }
}

/// Clamped playback progress
///
/// Returns `position / duration` clamped to `[0, 1]`; an unknown or
/// non-positive duration yields 0.
pub fn progress_fraction(position_ms: i64, duration_ms: i64) -> f32 {
    if duration_ms <= 0 {
        return 0.0;
    }
    let position = position_ms.max(0) as f64;
    (position / duration_ms as f64).clamp(0.0, 1.0) as f32
}
