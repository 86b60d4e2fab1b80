//! Playlist API client.

use crate::error::{ApiError, Result};
use crate::types::{ApiConfig, ApiPlaylist};
use async_trait::async_trait;
use karaoke_core::{PlaylistId, PlaylistInfo, Track, TrackRepository};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;

/// Client for the public playlist API.
///
/// Successful playlist responses are cached for the life of the client, so
/// a playlist is fetched from the network at most once.
///
/// # Example
///
/// ```no_run
/// use karaoke_api_client::{ApiConfig, KaraokeApiClient};
/// use karaoke_core::{PlaylistId, TrackRepository};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let client = KaraokeApiClient::new(ApiConfig::default())?;
/// let tracks = client.fetch_tracks(&PlaylistId::new("b2a1c7d0")).await?;
/// println!("{} songs", tracks.len());
/// # Ok(())
/// # }
/// ```
pub struct KaraokeApiClient {
    http: Client,
    base_url: Url,
    config: ApiConfig,
    cache: RwLock<HashMap<PlaylistId, Arc<ApiPlaylist>>>,
}

impl KaraokeApiClient {
    /// Create a client with the given configuration.
    pub fn new(config: ApiConfig) -> Result<Self> {
        if config.base_url.is_empty() {
            return Err(ApiError::InvalidUrl("URL cannot be empty".into()));
        }
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {e}", config.base_url)))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ApiError::InvalidUrl(
                "URL must start with http:// or https://".into(),
            ));
        }
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(config.base_url.clone()));
        }

        let http = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            http,
            base_url,
            config,
            cache: RwLock::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// `{base}/public/playlist/{id}`
    pub fn playlist_url(&self, playlist_id: &PlaylistId) -> Url {
        let mut url = self.base_url.clone();
        // new() rejects cannot-be-a-base URLs
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["public", "playlist", playlist_id.as_str()]);
        }
        url
    }

    /// Fetch a playlist, from the cache when possible.
    pub async fn fetch_playlist(&self, playlist_id: &PlaylistId) -> Result<Arc<ApiPlaylist>> {
        if let Some(playlist) = self.cache.read().await.get(playlist_id) {
            debug!(playlist_id = %playlist_id, "Playlist served from cache");
            return Ok(Arc::clone(playlist));
        }

        let url = self.playlist_url(playlist_id);
        debug!(url = %url, "Fetching playlist");

        let response = self.http.get(url.clone()).send().await.map_err(|e| {
            warn!(playlist_id = %playlist_id, error = %e, "Playlist request failed");
            ApiError::Request(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(playlist_id = %playlist_id, status = status.as_u16(), "Playlist request rejected");
            return Err(ApiError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        let playlist: ApiPlaylist = serde_json::from_str(&body)
            .map_err(|e| ApiError::Parse(format!("Failed to parse playlist {playlist_id}: {e}")))?;
        let playlist = Arc::new(playlist);

        info!(
            playlist_id = %playlist_id,
            songs = playlist.songs.as_ref().map_or(0, Vec::len),
            "Fetched playlist"
        );

        self.cache
            .write()
            .await
            .insert(playlist_id.clone(), Arc::clone(&playlist));
        Ok(playlist)
    }

    /// Drop every cached playlist.
    pub async fn clear_cache(&self) {
        self.cache.write().await.clear();
    }

    /// Number of cached playlists.
    pub async fn cached_playlists(&self) -> usize {
        self.cache.read().await.len()
    }
}

#[async_trait]
impl TrackRepository for KaraokeApiClient {
    async fn fetch_tracks(&self, playlist_id: &PlaylistId) -> karaoke_core::Result<Vec<Track>> {
        let playlist = self.fetch_playlist(playlist_id).await?;
        Ok(playlist.tracks(playlist_id))
    }

    async fn fetch_playlist_info(&self, playlist_id: &PlaylistId) -> karaoke_core::Result<PlaylistInfo> {
        let playlist = self.fetch_playlist(playlist_id).await?;
        Ok(playlist.info(playlist_id, &self.config.storage_url))
    }
}
