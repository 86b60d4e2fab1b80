//! Playlist API wire types and their mapping onto domain types.

use karaoke_core::{PlaylistId, PlaylistInfo, Singer, Track, TrackId};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Production playlist API host
pub const DEFAULT_BASE_URL: &str = "https://idk.neurokaraoke.com";

/// Host serving cover images and audio
pub const DEFAULT_STORAGE_URL: &str = "https://storage.neurokaraoke.com";

const PREVIEW_COVER_LIMIT: usize = 4;
const PREVIEW_SCAN_LIMIT: usize = 20;

/// Configuration for the playlist API client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the playlist API
    pub base_url: String,
    /// Base URL relative playlist covers are resolved against
    pub storage_url: String,
    /// Whole-request timeout in seconds
    pub timeout_secs: u64,
    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
    /// User agent sent with every request
    pub user_agent: String,
}

impl ApiConfig {
    /// Default configuration pointed at another API host.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_storage_url(mut self, storage_url: impl Into<String>) -> Self {
        self.storage_url = storage_url.into();
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            storage_url: DEFAULT_STORAGE_URL.to_string(),
            timeout_secs: 10,
            connect_timeout_secs: 10,
            user_agent: format!("KaraokePlayer/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

// =============================================================================
// Wire Types
// =============================================================================

/// `GET /public/playlist/{id}` response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiPlaylist {
    pub name: Option<String>,
    pub description: Option<String>,
    /// Playlist cover, absolute or relative to the storage host
    pub cover: Option<String>,
    pub songs: Option<Vec<ApiSong>>,
}

/// One song entry of a playlist response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApiSong {
    pub title: Option<String>,
    pub original_artists: Option<String>,
    /// Free-form performer credit, e.g. "Neuro-sama" or "Evil Neuro"
    pub cover_artists: Option<String>,
    pub cover_art: Option<String>,
    pub audio_url: Option<String>,
    pub art_credit: Option<String>,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

impl ApiSong {
    /// Explicit cover art, else the cover derived from the audio URL
    pub fn cover_art_url(&self) -> Option<String> {
        if let Some(cover) = non_blank(self.cover_art.as_deref()) {
            return Some(cover.to_string());
        }
        non_blank(self.audio_url.as_deref()).map(derive_cover_url)
    }

    /// Domain track for the `index`-th song of `playlist_id`
    pub fn to_track(&self, playlist_id: &PlaylistId, index: usize) -> Track {
        let title = self.title.clone().unwrap_or_else(|| "Unknown".to_string());
        let artist = non_blank(self.original_artists.as_deref()).unwrap_or("Unknown Artist");

        let mut track = Track::new(TrackId::for_playlist_entry(playlist_id, index), title, artist)
            .with_audio_url(self.audio_url.clone().unwrap_or_default())
            .with_cover_url(self.cover_art_url().unwrap_or_default())
            .with_singer(Singer::from_cover_artists(self.cover_artists.as_deref()));
        track.art_credit = non_blank(self.art_credit.as_deref()).map(str::to_string);
        track
    }
}

impl ApiPlaylist {
    fn songs(&self) -> &[ApiSong] {
        self.songs.as_deref().unwrap_or_default()
    }

    /// Tracks in playlist order
    pub fn tracks(&self, playlist_id: &PlaylistId) -> Vec<Track> {
        self.songs()
            .iter()
            .enumerate()
            .map(|(index, song)| song.to_track(playlist_id, index))
            .collect()
    }

    /// Summary with an absolute cover and a preview grid of song covers
    pub fn info(&self, playlist_id: &PlaylistId, storage_url: &str) -> PlaylistInfo {
        let mut preview_covers: Vec<String> = Vec::new();
        for cover in self
            .songs()
            .iter()
            .take(PREVIEW_SCAN_LIMIT)
            .filter_map(ApiSong::cover_art_url)
        {
            if preview_covers.len() >= PREVIEW_COVER_LIMIT {
                break;
            }
            if !preview_covers.contains(&cover) {
                preview_covers.push(cover);
            }
        }

        PlaylistInfo {
            id: playlist_id.clone(),
            name: self
                .name
                .clone()
                .unwrap_or_else(|| "Unknown Playlist".to_string()),
            cover_url: absolute_cover_url(self.cover.as_deref().unwrap_or_default(), storage_url),
            preview_covers,
        }
    }
}

/// Cover image URL for an audio URL
///
/// `.../audio/Name.v2).mp3` becomes `.../images/Name.jpg`.
pub fn derive_cover_url(audio_url: &str) -> String {
    let url = audio_url.replace("/audio/", "/images/");
    match url.strip_suffix(".mp3") {
        Some(stem) => format!("{}.jpg", strip_version_suffix(stem)),
        None => url,
    }
}

/// Drop a trailing `.vN` or `.vN)` upload version
fn strip_version_suffix(stem: &str) -> &str {
    let inner = stem.strip_suffix(')').unwrap_or(stem);
    let without_digits = inner.trim_end_matches(|c: char| c.is_ascii_digit());
    if without_digits.len() == inner.len() {
        return stem;
    }
    without_digits.strip_suffix(".v").unwrap_or(stem)
}

/// Resolve a playlist cover against the storage host
pub fn absolute_cover_url(cover: &str, storage_url: &str) -> String {
    let storage_url = storage_url.trim_end_matches('/');
    if cover.is_empty() || cover.starts_with("http") {
        cover.to_string()
    } else if cover.starts_with('/') {
        format!("{storage_url}{cover}")
    } else {
        format!("{storage_url}/{cover}")
    }
}
