//! Full track catalog: the deduplicated union of every known playlist

use futures_util::future::join_all;
use karaoke_core::{Playlist, PlaylistId, Track, TrackId, TrackRepository};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of fetching every playlist for the catalog
#[derive(Debug, Clone, Default)]
pub struct CatalogFetch {
    /// Tracks in playlist order, not yet deduplicated
    pub tracks: Vec<Track>,
    /// Number of playlists that were requested
    pub attempted: usize,
    /// Playlists whose fetch failed, with the error text
    pub failures: Vec<(PlaylistId, String)>,
}

impl CatalogFetch {
    /// Every requested playlist failed
    pub fn all_failed(&self) -> bool {
        self.attempted > 0 && self.failures.len() == self.attempted
    }
}

/// Fetch every playlist's tracks concurrently
///
/// Results are concatenated in playlist order regardless of completion
/// order, so merging stays deterministic. Individual failures are collected,
/// never propagated.
pub async fn fetch_catalog(
    repository: Arc<dyn TrackRepository>,
    playlists: Vec<Playlist>,
) -> CatalogFetch {
    let fetches = playlists.iter().map(|playlist| {
        let repository = Arc::clone(&repository);
        async move { repository.fetch_tracks(&playlist.id).await }
    });
    let results = join_all(fetches).await;

    let mut fetch = CatalogFetch {
        attempted: playlists.len(),
        ..CatalogFetch::default()
    };
    for (playlist, result) in playlists.iter().zip(results) {
        match result {
            Ok(tracks) => {
                debug!(playlist_id = %playlist.id, count = tracks.len(), "Fetched catalog playlist");
                fetch.tracks.extend(tracks);
            }
            Err(e) => {
                warn!(playlist_id = %playlist.id, error = %e, "Failed to fetch catalog playlist");
                fetch.failures.push((playlist.id.clone(), e.to_string()));
            }
        }
    }
    fetch
}

/// Merge `incoming` into `existing`; the first track seen with an id wins
pub fn merge_tracks(existing: &[Track], incoming: impl IntoIterator<Item = Track>) -> Vec<Track> {
    let mut seen: HashSet<TrackId> = existing.iter().map(|t| t.id.clone()).collect();
    let mut merged = existing.to_vec();
    for track in incoming {
        if seen.insert(track.id.clone()) {
            merged.push(track);
        }
    }
    merged
}

/// Uniformly random playable track, excluding `exclude` when given
pub fn pick_random<'a, R: Rng + ?Sized>(
    tracks: &'a [Track],
    exclude: Option<&TrackId>,
    rng: &mut R,
) -> Option<&'a Track> {
    let candidates: Vec<&Track> = tracks
        .iter()
        .filter(|t| t.is_playable() && Some(&t.id) != exclude)
        .collect();
    candidates.choose(rng).copied()
}
