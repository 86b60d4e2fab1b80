/// Track domain type
use crate::types::TrackId;
use serde::{Deserialize, Serialize};

/// Who performed a karaoke cover
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Singer {
    /// Neuro-sama solo
    #[default]
    Neuro,
    /// Evil Neuro solo
    Evil,
    /// Both singers
    Duet,
    /// Anyone else
    Other,
}

impl Singer {
    /// Display name of the cover artist
    pub fn cover_artist(self) -> &'static str {
        match self {
            Singer::Neuro | Singer::Other => "Neuro-sama",
            Singer::Evil => "Evil Neuro",
            Singer::Duet => "Neuro & Evil",
        }
    }

    /// Classify from the API's free-form `coverArtists` field
    ///
    /// Matching is case-insensitive. Both names present means a duet.
    pub fn from_cover_artists(cover_artists: Option<&str>) -> Self {
        let Some(raw) = cover_artists else {
            return Singer::Neuro;
        };
        let lower = raw.to_lowercase();
        let evil = lower.contains("evil");
        let neuro = lower.contains("neuro");

        match (evil, neuro) {
            (true, true) => Singer::Duet,
            (true, false) => Singer::Evil,
            _ => Singer::Neuro,
        }
    }
}

/// A playable karaoke track
///
/// Immutable value. `duration_ms` is 0 until the engine reports the real
/// duration; the playlist API does not provide one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Identifier, unique within the queue it was loaded with
    pub id: TrackId,

    /// Song title
    pub title: String,

    /// Original artist display name
    pub artist: String,

    /// Cover art URL (may be empty)
    pub cover_url: String,

    /// Streamable audio URL (empty means unplayable)
    #[serde(default)]
    pub audio_url: String,

    /// Known duration in milliseconds (0 = unknown)
    #[serde(default)]
    pub duration_ms: u64,

    /// Who sang the cover
    #[serde(default)]
    pub singer: Singer,

    /// Credit for the cover art
    #[serde(default)]
    pub art_credit: Option<String>,
}

impl Track {
    /// Create a track with minimal metadata and no audio
    pub fn new(id: impl Into<TrackId>, title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            cover_url: String::new(),
            audio_url: String::new(),
            duration_ms: 0,
            singer: Singer::default(),
            art_credit: None,
        }
    }

    /// Set the audio URL
    #[must_use]
    pub fn with_audio_url(mut self, url: impl Into<String>) -> Self {
        self.audio_url = url.into();
        self
    }

    /// Set the cover art URL
    #[must_use]
    pub fn with_cover_url(mut self, url: impl Into<String>) -> Self {
        self.cover_url = url.into();
        self
    }

    /// Set the singer
    #[must_use]
    pub fn with_singer(mut self, singer: Singer) -> Self {
        self.singer = singer;
        self
    }

    /// Copy of this track with a known duration
    #[must_use]
    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    /// Whether the track has a non-blank audio URL
    pub fn is_playable(&self) -> bool {
        !self.audio_url.trim().is_empty()
    }

    /// Cover artist display name
    pub fn cover_artist(&self) -> &'static str {
        self.singer.cover_artist()
    }

    /// Combined "artist • performer" label shown by media sessions
    pub fn artist_label(&self) -> String {
        format!("{} • {}", self.artist, self.cover_artist())
    }
}
