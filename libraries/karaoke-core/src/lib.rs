//! Karaoke Player Core
//!
//! Platform-agnostic domain types, traits, and error handling shared by the
//! playback controller, the HTTP repository, and the local playlist store.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Track`, `Playlist`, `PlaylistInfo`, `Singer`, ids
//! - **Collaborator Traits**: `TrackRepository`, `PlaylistStore`
//! - **Error Handling**: Unified `KaraokeError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use karaoke_core::types::{Playlist, Singer, Track};
//!
//! let playlist = Playlist::new("pl-1", "Karaoke Night");
//!
//! let track = Track::new("pl-1_0", "Never Gonna Give You Up", "Rick Astley")
//!     .with_audio_url("https://storage.example.com/audio/song.mp3")
//!     .with_singer(Singer::Evil);
//!
//! assert!(track.is_playable());
//! assert_eq!(track.artist_label(), "Rick Astley • Evil Neuro");
//! assert_eq!(playlist.title, "Karaoke Night");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{KaraokeError, Result};
pub use traits::{PlaylistStore, TrackRepository};
pub use types::{Playlist, PlaylistId, PlaylistInfo, Singer, Track, TrackId};
