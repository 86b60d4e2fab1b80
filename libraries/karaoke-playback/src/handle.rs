//! UI-facing handle to a running controller

use crate::controller::PlayerController;
use crate::effects::SharedEffects;
use crate::engine::{EngineEvent, PlaybackEngine};
use crate::error::{PlaybackError, Result};
use crate::message::{ControllerMessage, Intent};
use crate::session::SessionState;
use crate::types::ControllerConfig;
use karaoke_core::{Playlist, PlaylistId, PlaylistStore, Track, TrackId, TrackRepository};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Handle to a controller task
///
/// Intent methods never block: they enqueue and return. Dropping the handle
/// shuts the controller down.
pub struct PlayerHandle {
    tx: mpsc::UnboundedSender<ControllerMessage>,
    state: watch::Receiver<SessionState>,
    task: Option<JoinHandle<()>>,
    forwarder: Option<JoinHandle<()>>,
}

impl PlayerHandle {
    /// Build a controller around `engine` and start it
    ///
    /// `engine_events` is the engine's push event stream. The playlist
    /// catalog is loaded immediately.
    pub fn start(
        engine: Arc<dyn PlaybackEngine>,
        engine_events: mpsc::UnboundedReceiver<EngineEvent>,
        repository: Arc<dyn TrackRepository>,
        store: Arc<dyn PlaylistStore>,
        config: ControllerConfig,
        effects: Option<SharedEffects>,
    ) -> Self {
        let (mut controller, messages) = PlayerController::new(engine, repository, store, config);
        if let Some(effects) = effects {
            controller = controller.with_effects(effects);
        }
        let handle = Self::spawn(controller, messages, engine_events);
        // Cannot fail: the controller task holds the receiver
        let _ = handle.send(Intent::LoadAvailablePlaylists);
        handle
    }

    /// Run an already built controller
    pub fn spawn(
        controller: PlayerController,
        messages: mpsc::UnboundedReceiver<ControllerMessage>,
        mut engine_events: mpsc::UnboundedReceiver<EngineEvent>,
    ) -> Self {
        let tx = controller.sender();
        let state = controller.subscribe();

        let events_tx = tx.clone();
        let forwarder = tokio::spawn(async move {
            while let Some(event) = engine_events.recv().await {
                if events_tx.send(ControllerMessage::Engine(event)).is_err() {
                    break;
                }
            }
        });
        let task = tokio::spawn(controller.run(messages));

        Self {
            tx,
            state,
            task: Some(task),
            forwarder: Some(forwarder),
        }
    }

    /// Latest published state
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state publication
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    fn send(&self, intent: Intent) -> Result<()> {
        self.tx
            .send(ControllerMessage::Intent(intent))
            .map_err(|_| PlaybackError::ControllerClosed)
    }

    pub fn load_available_playlists(&self) -> Result<()> {
        self.send(Intent::LoadAvailablePlaylists)
    }

    pub fn load_playlist(&self, id: impl Into<PlaylistId>) -> Result<()> {
        self.send(Intent::LoadPlaylist(id.into()))
    }

    pub fn select_playlist(&self, playlist: Playlist) -> Result<()> {
        self.send(Intent::SelectPlaylist(playlist))
    }

    pub fn play_track_by_id(&self, id: impl Into<TrackId>) -> Result<()> {
        self.send(Intent::PlayTrackById(id.into()))
    }

    pub fn play_track_from_catalog(&self, id: impl Into<TrackId>) -> Result<()> {
        self.send(Intent::PlayTrackFromCatalog(id.into()))
    }

    /// Play `track` with `queue` as the new queue
    ///
    /// A track without an audio URL is rejected here as well as in the
    /// session's `last_error`.
    pub fn play_track_with_queue(&self, track: Track, queue: Vec<Track>) -> Result<()> {
        let unplayable = !track.is_playable();
        let id = track.id.clone();
        self.send(Intent::PlayTrackWithQueue { track, queue })?;
        if unplayable {
            return Err(PlaybackError::UnplayableTrack(id));
        }
        Ok(())
    }

    pub fn toggle_play_pause(&self) -> Result<()> {
        self.send(Intent::TogglePlayPause)
    }

    pub fn previous(&self) -> Result<()> {
        self.send(Intent::Previous)
    }

    pub fn next(&self) -> Result<()> {
        self.send(Intent::Next)
    }

    /// Seek to a fraction of the current track, clamped to [0, 1]
    pub fn seek_to_fraction(&self, fraction: f32) -> Result<()> {
        self.send(Intent::SeekToFraction(fraction))
    }

    pub fn toggle_shuffle(&self) -> Result<()> {
        self.send(Intent::ToggleShuffle)
    }

    pub fn cycle_repeat_mode(&self) -> Result<()> {
        self.send(Intent::CycleRepeatMode)
    }

    pub fn load_full_catalog(&self) -> Result<()> {
        self.send(Intent::LoadFullCatalog)
    }

    pub fn add_playlist_by_id(&self, id: impl Into<PlaylistId>) -> Result<()> {
        self.send(Intent::AddPlaylistById(id.into()))
    }

    pub fn add_playlist(&self, playlist: Playlist) -> Result<()> {
        self.send(Intent::AddPlaylist(playlist))
    }

    pub fn remove_playlist(&self, id: impl Into<PlaylistId>) -> Result<()> {
        self.send(Intent::RemovePlaylist(id.into()))
    }

    pub fn clear_error(&self) -> Result<()> {
        self.send(Intent::ClearError)
    }

    /// Wait until the published state satisfies `predicate`
    pub async fn wait_for<F>(&self, mut predicate: F) -> Result<SessionState>
    where
        F: FnMut(&SessionState) -> bool,
    {
        let mut rx = self.state.clone();
        let state = rx
            .wait_for(|state| predicate(state))
            .await
            .map_err(|_| PlaybackError::ControllerClosed)?;
        Ok(state.clone())
    }

    /// Stop the controller and wait for teardown to finish
    pub async fn shutdown(mut self) {
        let _ = self.tx.send(ControllerMessage::Shutdown);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
        if let Some(forwarder) = self.forwarder.take() {
            forwarder.abort();
        }
    }
}

impl Drop for PlayerHandle {
    fn drop(&mut self) {
        if self.task.is_some() {
            let _ = self.tx.send(ControllerMessage::Shutdown);
        }
        if let Some(forwarder) = self.forwarder.take() {
            forwarder.abort();
        }
    }
}
