//! Karaoke Player - Playback Control
//!
//! Queue and session state for a streaming karaoke player.
//!
//! This crate provides:
//! - A single-owner controller that folds user intents and engine events
//!   into one published session state
//! - Queue resolution against a black-box streaming engine
//! - Previous/next policy (restart threshold, wrap-around with repeat all)
//! - Fallback autoplay from the full track catalog when a queue runs out
//! - Periodic progress sampling while playing
//! - Equalizer and bass boost that follow the engine's audio session
//! - A headless simulated engine for tools and tests
//!
//! # Architecture
//!
//! `karaoke-playback` never decodes audio. The engine is reached through the
//! [`PlaybackEngine`] trait; tracks and playlists come from the
//! `karaoke_core` traits. Everything that mutates session state is serialized
//! through the controller task, and the UI observes it via a `watch`
//! channel.
//!
//! # Example: Progress
//!
//! ```rust
//! use karaoke_playback::{progress_fraction, RepeatMode};
//!
//! assert_eq!(progress_fraction(30_000, 120_000), 0.25);
//! // Unknown duration never divides
//! assert_eq!(progress_fraction(30_000, -1), 0.0);
//!
//! assert_eq!(RepeatMode::Off.cycle(), RepeatMode::All);
//! ```
//!
//! # Example: Driving a player
//!
//! ```rust,no_run
//! use karaoke_core::{PlaylistStore, TrackRepository};
//! use karaoke_playback::{ControllerConfig, PlayerHandle, SimulatedEngine};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! async fn play(
//!     repository: Arc<dyn TrackRepository>,
//!     store: Arc<dyn PlaylistStore>,
//! ) -> karaoke_playback::Result<()> {
//!     let (engine, events) = SimulatedEngine::new(Duration::from_secs(180));
//!     let player = PlayerHandle::start(
//!         Arc::new(engine),
//!         events,
//!         repository,
//!         store,
//!         ControllerConfig::default(),
//!         None,
//!     );
//!
//!     player.load_playlist("b2a1c7d0")?;
//!     player.wait_for(|s| !s.playlist_tracks.is_empty()).await?;
//!     player.play_track_by_id("b2a1c7d0_0")?;
//!
//!     let state = player.wait_for(|s| s.is_playing).await?;
//!     println!("Now playing {:?}", state.current_track.map(|t| t.title));
//!
//!     player.shutdown().await;
//!     Ok(())
//! }
//! ```

mod autoplay;
pub mod catalog;
mod controller;
pub mod effects;
pub mod engine;
mod error;
mod handle;
mod message;
mod progress;
pub mod queue;
mod session;
pub mod simulated;
pub mod types;

// Public exports
pub use controller::PlayerController;
pub use effects::{AudioEffectsManager, AudioEffectsState, SharedEffects, SimulatedEffectsBackend};
pub use engine::{EngineEvent, EngineResult, EngineStatus, MediaItem, PlaybackEngine};
pub use error::{EngineError, PlaybackError, Result};
pub use handle::PlayerHandle;
pub use message::{ControllerMessage, Intent, ProgressSample};
pub use progress::ProgressTicker;
pub use session::{progress_fraction, SessionState};
pub use simulated::{EngineCommand, SimulatedEngine};
pub use types::{ControllerConfig, EngineState, RepeatMode};
