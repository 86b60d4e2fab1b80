//! Queue resolution and the engine media mirror

use crate::engine::MediaItem;
use crate::error::{PlaybackError, Result};
use karaoke_core::{Track, TrackId};

/// A queue ready to hand to the engine
///
/// `tracks` is what the session shows as the queue. Only playable tracks
/// become media items, so `start_index` points into `items`, not `tracks`.
#[derive(Debug, Clone)]
pub struct QueueLoad {
    pub target: Track,
    pub tracks: Vec<Track>,
    pub items: Vec<MediaItem>,
    pub start_index: usize,
}

impl QueueLoad {
    /// Resolve `target` against a candidate queue
    ///
    /// Fails when the target has no audio URL. A target whose id is not in
    /// `candidates` plays as a queue of one.
    pub fn prepare(target: Track, candidates: Vec<Track>) -> Result<Self> {
        if !target.is_playable() {
            return Err(PlaybackError::UnplayableTrack(target.id));
        }

        let tracks = if candidates.iter().any(|t| t.id == target.id) {
            candidates
        } else {
            vec![target.clone()]
        };

        let items = media_items(&tracks);
        match items.iter().position(|item| item.id == target.id) {
            Some(start_index) => Ok(Self {
                target,
                tracks,
                items,
                start_index,
            }),
            // The queue's copy of the target is unplayable; fall back to the
            // target alone
            None => Ok(Self {
                items: vec![MediaItem::from(&target)],
                tracks: vec![target.clone()],
                target,
                start_index: 0,
            }),
        }
    }

    /// Ids of the media items, in load order
    pub fn item_ids(&self) -> Vec<TrackId> {
        self.items.iter().map(|item| item.id.clone()).collect()
    }
}

/// Media items for every playable track, in order
pub fn media_items(tracks: &[Track]) -> Vec<MediaItem> {
    tracks
        .iter()
        .filter(|t| t.is_playable())
        .map(MediaItem::from)
        .collect()
}

/// First track with the given id
pub fn find_track<'a>(tracks: &'a [Track], id: &TrackId) -> Option<&'a Track> {
    tracks.iter().find(|t| &t.id == id)
}

/// First playable track with the given id
///
/// Engine items are only ever built from playable tracks, so this is the
/// copy an engine item id refers to.
pub fn find_playable<'a>(tracks: &'a [Track], id: &TrackId) -> Option<&'a Track> {
    tracks.iter().find(|t| &t.id == id && t.is_playable())
}
