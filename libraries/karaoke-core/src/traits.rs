//! Collaborator traits for the karaoke player
//!
//! The playback controller depends only on these seams; concrete
//! implementations live in `karaoke-api-client` (HTTP) and
//! `karaoke-storage` (JSON file).

use crate::error::Result;
use crate::types::{Playlist, PlaylistId, PlaylistInfo, Track};
use async_trait::async_trait;

/// Resolves playlists to ordered lists of playable tracks
///
/// Network and cache details are the implementer's concern. Every call is a
/// suspension point and callers must tolerate arbitrary delay.
#[async_trait]
pub trait TrackRepository: Send + Sync {
    /// Fetch the ordered tracks of a playlist
    async fn fetch_tracks(&self, playlist_id: &PlaylistId) -> Result<Vec<Track>>;

    /// Fetch remote summary info (name, cover, preview covers)
    async fn fetch_playlist_info(&self, playlist_id: &PlaylistId) -> Result<PlaylistInfo>;
}

/// Local catalog of known playlists
#[async_trait]
pub trait PlaylistStore: Send + Sync {
    /// All known playlists, in catalog order
    async fn playlists(&self) -> Result<Vec<Playlist>>;

    /// Add a playlist. Returns `false` if the id is already present.
    async fn add(&self, playlist: Playlist) -> Result<bool>;

    /// Replace an existing playlist. Returns `false` if the id is unknown.
    async fn update(&self, playlist: Playlist) -> Result<bool>;

    /// Remove a playlist. Returns `false` if the id is unknown.
    async fn remove(&self, playlist_id: &PlaylistId) -> Result<bool>;

    /// Whether the catalog contains the id
    async fn contains(&self, playlist_id: &PlaylistId) -> Result<bool> {
        Ok(self.playlists().await?.iter().any(|p| &p.id == playlist_id))
    }
}
