/// Playlist domain types
use crate::types::PlaylistId;
use serde::{Deserialize, Serialize};

/// A known playlist in the local catalog
///
/// Only metadata is stored locally; tracks are fetched on demand through a
/// `TrackRepository`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    /// Remote playlist identifier
    pub id: PlaylistId,

    /// Display name (may be empty until refreshed from the API)
    #[serde(rename = "name", default)]
    pub title: String,

    /// Free-form description
    #[serde(default)]
    pub description: String,

    /// Playlist cover
    #[serde(rename = "coverUrl", default)]
    pub cover_url: String,

    /// Up to four song covers for a preview grid
    #[serde(rename = "previewCovers", default)]
    pub preview_covers: Vec<String>,
}

impl Playlist {
    /// Create a playlist entry with a title and no artwork
    pub fn new(id: impl Into<PlaylistId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            cover_url: String::new(),
            preview_covers: Vec::new(),
        }
    }

    /// Whether the entry lacks a name or preview covers and should be
    /// refreshed from the remote API
    pub fn needs_refresh(&self) -> bool {
        self.title.is_empty() || self.preview_covers.is_empty()
    }

    /// Fill in missing fields from remote playlist info
    ///
    /// Fields already set locally win.
    #[must_use]
    pub fn merged_with(&self, info: &PlaylistInfo) -> Self {
        Self {
            id: self.id.clone(),
            title: if self.title.is_empty() {
                info.name.clone()
            } else {
                self.title.clone()
            },
            description: self.description.clone(),
            cover_url: if self.cover_url.is_empty() {
                info.cover_url.clone()
            } else {
                self.cover_url.clone()
            },
            preview_covers: if self.preview_covers.is_empty() {
                info.preview_covers.clone()
            } else {
                self.preview_covers.clone()
            },
        }
    }
}

/// Remote playlist summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistInfo {
    /// Remote playlist identifier
    pub id: PlaylistId,
    /// Playlist name
    pub name: String,
    /// Absolute cover URL (may be empty)
    pub cover_url: String,
    /// Up to four unique song covers
    pub preview_covers: Vec<String>,
}

impl From<PlaylistInfo> for Playlist {
    fn from(info: PlaylistInfo) -> Self {
        Self {
            id: info.id,
            title: info.name,
            description: String::new(),
            cover_url: info.cover_url,
            preview_covers: info.preview_covers,
        }
    }
}
