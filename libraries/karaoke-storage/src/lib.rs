//! Karaoke Player Storage
//!
//! Local catalog of known playlists. Only playlist metadata is stored; songs
//! are always fetched from the remote API.
//!
//! # Example
//!
//! ```rust,no_run
//! use karaoke_core::{Playlist, PlaylistStore};
//! use karaoke_storage::JsonPlaylistStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = JsonPlaylistStore::open("playlists.json").await?;
//! store.add(Playlist::new("b2a1c7d0", "")).await?;
//!
//! for playlist in store.playlists().await? {
//!     println!("{} {}", playlist.id, playlist.title);
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod playlists;

pub use error::{Result, StorageError};
pub use playlists::JsonPlaylistStore;
