//! Karaoke Player API Client
//!
//! HTTP `TrackRepository` for the public karaoke playlist API.
//!
//! # Features
//!
//! - **Playlists**: fetch a playlist's songs as domain `Track`s
//! - **Playlist info**: name, absolute cover, and a preview grid of song covers
//! - **Caching**: successful responses are kept in memory per playlist
//!
//! # Example
//!
//! ```no_run
//! use karaoke_api_client::{ApiConfig, KaraokeApiClient};
//! use karaoke_core::{PlaylistId, TrackRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = KaraokeApiClient::new(ApiConfig::default())?;
//!
//!     let info = client.fetch_playlist_info(&PlaylistId::new("b2a1c7d0")).await?;
//!     println!("{} ({} preview covers)", info.name, info.preview_covers.len());
//!
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod types;

pub use client::KaraokeApiClient;
pub use error::{ApiError, Result};
pub use types::{
    absolute_cover_url, derive_cover_url, ApiConfig, ApiPlaylist, ApiSong, DEFAULT_BASE_URL,
    DEFAULT_STORAGE_URL,
};
