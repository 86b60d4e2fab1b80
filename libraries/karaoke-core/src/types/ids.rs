/// ID types for karaoke entities
use serde::{Deserialize, Serialize};
use std::fmt;

/// Track identifier
///
/// Tracks fetched from the playlist API get synthesized ids of the form
/// `"{playlistId}_{index}"`, so an id is only guaranteed unique within the
/// playlist fetch that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    /// Create a new track ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Synthesize the id of the `index`-th track of a playlist
    pub fn for_playlist_entry(playlist_id: &PlaylistId, index: usize) -> Self {
        Self(format!("{}_{}", playlist_id, index))
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TrackId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TrackId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Playlist identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaylistId(String);

impl PlaylistId {
    /// Create a new playlist ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlaylistId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PlaylistId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PlaylistId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn playlist_entry_ids_are_scoped_by_playlist() {
        let a = TrackId::for_playlist_entry(&PlaylistId::new("abc"), 3);
        let b = TrackId::for_playlist_entry(&PlaylistId::new("xyz"), 3);

        assert_eq!(a.as_str(), "abc_3");
        assert_ne!(a, b);
    }

    #[test]
    fn ids_serialize_transparently() {
        let id = TrackId::new("abc_0");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"abc_0\"");

        let back: TrackId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
