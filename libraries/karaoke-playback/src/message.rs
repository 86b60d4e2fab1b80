//! Messages consumed by the controller task
//!
//! Everything that can change session state arrives here, on one ordered
//! channel: user intents, engine events, progress samples and the results of
//! background work.

use crate::catalog::CatalogFetch;
use crate::engine::EngineEvent;
use karaoke_core::{Playlist, PlaylistId, Track, TrackId};

/// A user action
#[derive(Debug, Clone)]
pub enum Intent {
    /// Read the playlist catalog and refresh incomplete entries
    LoadAvailablePlaylists,
    LoadPlaylist(PlaylistId),
    SelectPlaylist(Playlist),
    /// Play a track of the opened playlist, with the playlist as queue
    PlayTrackById(TrackId),
    /// Play a track found through the full catalog, with the catalog as queue
    PlayTrackFromCatalog(TrackId),
    PlayTrackWithQueue { track: Track, queue: Vec<Track> },
    TogglePlayPause,
    Previous,
    Next,
    SeekToFraction(f32),
    ToggleShuffle,
    CycleRepeatMode,
    LoadFullCatalog,
    AddPlaylistById(PlaylistId),
    AddPlaylist(Playlist),
    RemovePlaylist(PlaylistId),
    ClearError,
}

/// One reading from the progress ticker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSample {
    /// Ticker generation that produced the sample
    pub generation: u64,
    pub position_ms: i64,
    pub duration_ms: i64,
}

/// Input to the controller task
#[derive(Debug)]
pub enum ControllerMessage {
    Intent(Intent),
    Engine(EngineEvent),
    Progress(ProgressSample),
    PlaylistsLoaded(Result<Vec<Playlist>, String>),
    PlaylistLoaded {
        playlist_id: PlaylistId,
        result: Result<Vec<Track>, String>,
    },
    CatalogLoaded(CatalogFetch),
    /// A bounded autoplay wait ran out
    AutoplayExpired(u64),
    /// Background work failed with a user-visible message
    Failed(String),
    Shutdown,
}

impl From<Intent> for ControllerMessage {
    fn from(intent: Intent) -> Self {
        ControllerMessage::Intent(intent)
    }
}

impl From<EngineEvent> for ControllerMessage {
    fn from(event: EngineEvent) -> Self {
        ControllerMessage::Engine(event)
    }
}
