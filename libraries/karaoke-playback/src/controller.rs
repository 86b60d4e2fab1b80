//! Playback controller
//!
//! Single owner of the session state. Every input (user intents, engine
//! events, progress samples, finished background work) arrives as a
//! [`ControllerMessage`] on one ordered channel and is applied by exactly one
//! task, so there are no interleaved mutations to reason about. The state is
//! republished through a `watch` channel after every message.

use crate::autoplay::{Autoplay, AutoplayPlan};
use crate::catalog::{self, CatalogFetch};
use crate::effects::SharedEffects;
use crate::engine::{EngineEvent, EngineStatus, PlaybackEngine};
use crate::error::Result;
use crate::message::{ControllerMessage, Intent, ProgressSample};
use crate::progress::ProgressTicker;
use crate::queue::{self, QueueLoad};
use crate::session::SessionState;
use crate::types::{ControllerConfig, EngineState, RepeatMode};
use karaoke_core::{Playlist, PlaylistId, PlaylistStore, Track, TrackId, TrackRepository};
use std::future::Future;
use std::sync::{Arc, PoisonError};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Owns session state and drives the engine
pub struct PlayerController {
    config: ControllerConfig,
    engine: Arc<dyn PlaybackEngine>,
    repository: Arc<dyn TrackRepository>,
    store: Arc<dyn PlaylistStore>,
    effects: Option<SharedEffects>,
    state: SessionState,
    /// Ids of the items the engine was last loaded with, in list order
    engine_items: Vec<TrackId>,
    autoplay: Autoplay,
    ticker: ProgressTicker,
    background: Vec<JoinHandle<()>>,
    tx: mpsc::UnboundedSender<ControllerMessage>,
    publisher: watch::Sender<SessionState>,
}

impl PlayerController {
    /// Create a controller and the receiving end of its message channel
    pub fn new(
        engine: Arc<dyn PlaybackEngine>,
        repository: Arc<dyn TrackRepository>,
        store: Arc<dyn PlaylistStore>,
        config: ControllerConfig,
    ) -> (Self, mpsc::UnboundedReceiver<ControllerMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let state = SessionState {
            repeat_mode: config.repeat,
            ..SessionState::default()
        };
        let (publisher, _) = watch::channel(state.clone());

        let controller = Self {
            config,
            engine,
            repository,
            store,
            effects: None,
            state,
            engine_items: Vec::new(),
            autoplay: Autoplay::default(),
            ticker: ProgressTicker::new(),
            background: Vec::new(),
            tx,
            publisher,
        };
        (controller, rx)
    }

    /// Attach audio effects that follow the engine's audio session
    #[must_use]
    pub fn with_effects(mut self, effects: SharedEffects) -> Self {
        self.effects = Some(effects);
        self
    }

    /// Sender for messages into this controller
    pub fn sender(&self) -> mpsc::UnboundedSender<ControllerMessage> {
        self.tx.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.publisher.subscribe()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Process messages until shutdown, then tear down
    pub async fn run(mut self, mut messages: mpsc::UnboundedReceiver<ControllerMessage>) {
        if self.state.repeat_mode != RepeatMode::Off {
            let mode = self.state.repeat_mode;
            self.command("set_repeat_mode", self.engine.set_repeat_mode(mode))
                .await;
        }
        while let Some(message) = messages.recv().await {
            if !self.handle(message).await {
                break;
            }
        }
        self.shutdown().await;
    }

    /// Apply one message and publish the resulting state
    ///
    /// Returns `false` once the controller has been asked to shut down.
    pub async fn handle(&mut self, message: ControllerMessage) -> bool {
        match message {
            ControllerMessage::Intent(intent) => self.handle_intent(intent).await,
            ControllerMessage::Engine(event) => self.handle_engine_event(event).await,
            ControllerMessage::Progress(sample) => self.apply_progress(sample),
            ControllerMessage::PlaylistsLoaded(result) => self.apply_playlists(result),
            ControllerMessage::PlaylistLoaded {
                playlist_id,
                result,
            } => self.apply_playlist_tracks(playlist_id, result),
            ControllerMessage::CatalogLoaded(fetch) => self.apply_catalog(fetch).await,
            ControllerMessage::AutoplayExpired(token) => {
                if self.autoplay.expire(token) {
                    info!("Gave up waiting for the catalog to autoplay");
                }
            }
            ControllerMessage::Failed(message) => {
                warn!(error = %message, "Background operation failed");
                self.state.last_error = Some(message);
            }
            ControllerMessage::Shutdown => return false,
        }
        self.publish();
        true
    }

    /// Stop the ticker, cancel background work, release engine and effects
    pub async fn shutdown(&mut self) {
        self.ticker.stop();
        self.autoplay.cancel();
        for task in self.background.drain(..) {
            task.abort();
        }
        if let Err(e) = self.engine.release().await {
            warn!(error = %e, "Failed to release engine");
        }
        if let Some(effects) = &self.effects {
            effects
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .release();
        }
        self.state.is_playing = false;
        self.publish();
        info!("Playback controller stopped");
    }

    fn publish(&self) {
        self.publisher.send_replace(self.state.clone());
    }

    // ===== Intents =====

    async fn handle_intent(&mut self, intent: Intent) {
        debug!(?intent, "Handling intent");
        match intent {
            Intent::LoadAvailablePlaylists => self.load_available_playlists(),
            Intent::LoadPlaylist(id) => self.load_playlist(id),
            Intent::SelectPlaylist(playlist) => {
                let id = playlist.id.clone();
                self.state.current_playlist = Some(playlist);
                self.load_playlist(id);
            }
            Intent::PlayTrackById(id) => self.play_track_by_id(&id).await,
            Intent::PlayTrackFromCatalog(id) => self.play_track_from_catalog(&id).await,
            Intent::PlayTrackWithQueue { track, queue } => {
                // Failure is already recorded in last_error
                let _ = self.play_track_with_queue(track, queue).await;
            }
            Intent::TogglePlayPause => self.toggle_play_pause().await,
            Intent::Previous => self.previous().await,
            Intent::Next => {
                let wrap = self.state.repeat_mode == RepeatMode::All;
                self.advance(wrap).await;
            }
            Intent::SeekToFraction(fraction) => self.seek_to_fraction(fraction).await,
            Intent::ToggleShuffle => self.toggle_shuffle().await,
            Intent::CycleRepeatMode => self.cycle_repeat_mode().await,
            Intent::LoadFullCatalog => self.start_catalog_load(),
            Intent::AddPlaylistById(id) => self.add_playlist_by_id(id),
            Intent::AddPlaylist(playlist) => self.add_playlist(playlist),
            Intent::RemovePlaylist(id) => self.remove_playlist(id),
            Intent::ClearError => self.state.last_error = None,
        }
    }

    /// Replace the queue, start `track`, and play
    #[instrument(skip(self, track, queue), fields(track_id = %track.id, queue_len = queue.len()))]
    async fn play_track_with_queue(&mut self, track: Track, queue: Vec<Track>) -> Result<()> {
        let load = match QueueLoad::prepare(track, queue) {
            Ok(load) => load,
            Err(e) => {
                warn!(error = %e, "Refusing to play track");
                self.state.last_error = Some(e.to_string());
                return Err(e);
            }
        };

        self.autoplay.cancel();
        self.engine_items = load.item_ids();
        self.state.queue = Arc::new(load.tracks);
        self.state.duration_ms = load.target.duration_ms;
        self.state.current_track = Some(load.target);
        self.state.rewind();
        self.state.last_error = None;

        info!(
            start_index = load.start_index,
            items = load.items.len(),
            "Loading queue into engine"
        );
        if !self
            .command("load", self.engine.load(load.items, load.start_index, 0))
            .await
        {
            return Ok(());
        }
        self.command("play", self.engine.play()).await;
        Ok(())
    }

    async fn play_track_by_id(&mut self, id: &TrackId) {
        let tracks = Arc::clone(&self.state.playlist_tracks);
        match queue::find_track(&tracks, id) {
            Some(track) => {
                let _ = self.play_track_with_queue(track.clone(), tracks.to_vec()).await;
            }
            None => warn!(track_id = %id, "Track not in the opened playlist"),
        }
    }

    async fn play_track_from_catalog(&mut self, id: &TrackId) {
        let catalog = Arc::clone(&self.state.catalog_tracks);
        let playlist = Arc::clone(&self.state.playlist_tracks);
        let (track, queue) = if let Some(track) = queue::find_track(&catalog, id) {
            (track.clone(), catalog.to_vec())
        } else if let Some(track) = queue::find_track(&playlist, id) {
            (track.clone(), playlist.to_vec())
        } else {
            warn!(track_id = %id, "Track not in the catalog");
            return;
        };
        let _ = self.play_track_with_queue(track, queue).await;
    }

    async fn toggle_play_pause(&mut self) {
        let Some(current) = self.state.current_track.clone() else {
            debug!("Nothing to play or pause");
            return;
        };
        let Some(status) = self.engine_status().await else {
            return;
        };

        if status.is_playing {
            self.command("pause", self.engine.pause()).await;
            return;
        }
        self.autoplay.cancel();
        if status.state == EngineState::Ended {
            self.restart_current().await;
            self.command("play", self.engine.play()).await;
        } else if status.state == EngineState::Idle || status.item_count == 0 {
            // Engine lost its media (fresh start or released); reload it
            let queue = self.state.queue.to_vec();
            let _ = self.play_track_with_queue(current, queue).await;
        } else {
            self.command("play", self.engine.play()).await;
        }
    }

    async fn previous(&mut self) {
        if self.state.current_track.is_none() {
            return;
        }
        let Some(status) = self.engine_status().await else {
            return;
        };

        self.autoplay.cancel();
        let threshold = i64::try_from(self.config.restart_threshold.as_millis()).unwrap_or(i64::MAX);
        if status.position_ms > threshold {
            self.restart_current().await;
        } else if status.has_previous {
            self.command("advance_to_previous", self.engine.advance_to_previous())
                .await;
        } else if self.state.repeat_mode == RepeatMode::All && status.item_count > 0 {
            self.seek_to_engine_index(status.item_count - 1).await;
        } else {
            self.restart_current().await;
        }
    }

    /// Move forward, wrapping or falling back to autoplay at the end
    async fn advance(&mut self, wrap: bool) {
        let Some(status) = self.engine_status().await else {
            return;
        };

        if status.has_next {
            self.autoplay.cancel();
            self.command("advance_to_next", self.engine.advance_to_next())
                .await;
        } else if wrap && status.item_count > 0 {
            self.autoplay.cancel();
            self.seek_to_engine_index(0).await;
        } else {
            self.start_autoplay().await;
        }
    }

    async fn seek_to_fraction(&mut self, fraction: f32) {
        if !fraction.is_finite() {
            return;
        }
        let fraction = f64::from(fraction.clamp(0.0, 1.0));
        let Some(status) = self.engine_status().await else {
            return;
        };
        let Ok(duration) = u64::try_from(status.duration_ms) else {
            return;
        };
        if duration == 0 {
            debug!("Ignoring seek with unknown duration");
            return;
        }

        self.autoplay.cancel();
        let position = (fraction * duration as f64) as u64;
        if self.command("seek_to", self.engine.seek_to(position)).await {
            self.state.set_position(position, duration);
        }
    }

    async fn toggle_shuffle(&mut self) {
        let Some(status) = self.engine_status().await else {
            return;
        };
        let enabled = !status.shuffle_enabled;
        self.command("set_shuffle_enabled", self.engine.set_shuffle_enabled(enabled))
            .await;
    }

    async fn cycle_repeat_mode(&mut self) {
        let mode = self.state.repeat_mode.cycle();
        self.state.repeat_mode = mode;
        self.command("set_repeat_mode", self.engine.set_repeat_mode(mode))
            .await;
    }

    async fn restart_current(&mut self) {
        if self.command("seek_to", self.engine.seek_to(0)).await {
            self.state.rewind();
        }
    }

    /// Jump to an engine item and reflect it without waiting for the
    /// transition event
    async fn seek_to_engine_index(&mut self, index: usize) {
        if !self
            .command("seek_to_index", self.engine.seek_to_index(index, 0))
            .await
        {
            return;
        }
        let Some(id) = self.engine_items.get(index).cloned() else {
            return;
        };
        if let Some(track) = self.resolve_track(&id) {
            self.state.duration_ms = track.duration_ms;
            self.state.current_track = Some(track);
            self.state.rewind();
        }
    }

    // ===== Engine events =====

    async fn handle_engine_event(&mut self, event: EngineEvent) {
        debug!(?event, "Engine event");
        match event {
            EngineEvent::IsPlayingChanged(playing) => {
                if playing && self.state.current_track.is_none() {
                    self.adopt_engine_item().await;
                }
                if playing && self.state.current_track.is_none() {
                    warn!("Engine is playing an unknown item");
                }
                self.state.is_playing = playing && self.state.current_track.is_some();
                if self.state.is_playing {
                    self.ticker.start(
                        Arc::clone(&self.engine),
                        self.tx.clone(),
                        self.config.progress_interval,
                    );
                } else {
                    self.ticker.stop();
                }
            }
            EngineEvent::StateChanged(state) => {
                self.state.engine_state = state;
                match state {
                    EngineState::Ready => self.latch_duration().await,
                    EngineState::Ended => self.handle_end_of_queue().await,
                    EngineState::Idle | EngineState::Buffering => {}
                }
            }
            EngineEvent::MediaItemTransition(Some(id)) => {
                let changed = self.state.current_track.as_ref().map(|t| &t.id) != Some(&id);
                if changed {
                    match self.resolve_track(&id) {
                        Some(track) => {
                            debug!(track_id = %id, "Engine moved to track");
                            self.state.duration_ms = track.duration_ms;
                            self.state.current_track = Some(track);
                            self.state.rewind();
                        }
                        None => warn!(track_id = %id, "Engine moved to an unknown track"),
                    }
                }
            }
            EngineEvent::MediaItemTransition(None) => {}
            EngineEvent::ShuffleModeChanged(enabled) => self.state.is_shuffle_enabled = enabled,
            EngineEvent::RepeatModeChanged(mode) => self.state.repeat_mode = mode,
            EngineEvent::AudioSessionChanged(session_id) => {
                if let Some(effects) = &self.effects {
                    effects
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .initialize(session_id);
                }
            }
        }
    }

    /// Take the engine's current item as the current track
    async fn adopt_engine_item(&mut self) {
        let Some(status) = self.engine_status().await else {
            return;
        };
        if let Some(track) = status.current_item_id.and_then(|id| self.resolve_track(&id)) {
            self.state.current_track = Some(track);
        }
    }

    /// Record the engine's duration on the session and the current track
    async fn latch_duration(&mut self) {
        let Some(status) = self.engine_status().await else {
            return;
        };
        let duration = u64::try_from(status.duration_ms).unwrap_or(0);
        self.state.duration_ms = duration;
        if duration > 0 {
            if let Some(track) = self.state.current_track.take() {
                self.state.current_track = Some(track.with_duration_ms(duration));
            }
        }
    }

    async fn handle_end_of_queue(&mut self) {
        match self.state.repeat_mode {
            RepeatMode::One => {
                if self.command("seek_to", self.engine.seek_to(0)).await {
                    self.state.rewind();
                    self.command("play", self.engine.play()).await;
                }
            }
            RepeatMode::All => self.advance(true).await,
            RepeatMode::Off => self.advance(false).await,
        }
    }

    fn apply_progress(&mut self, sample: ProgressSample) {
        if !self.ticker.accepts(&sample) {
            return;
        }
        let position = u64::try_from(sample.position_ms).unwrap_or(0);
        let duration = u64::try_from(sample.duration_ms).unwrap_or(0);
        self.state.set_position(position, duration);
    }

    // ===== Fallback autoplay =====

    async fn start_autoplay(&mut self) {
        match AutoplayPlan::for_catalog(self.state.catalog_loaded, self.state.is_catalog_loading) {
            AutoplayPlan::Pick => self.play_random_from_catalog().await,
            AutoplayPlan::LoadCatalog => {
                info!("Queue exhausted, loading catalog for autoplay");
                self.autoplay.arm();
                self.start_catalog_load();
            }
            AutoplayPlan::AwaitCatalog => {
                info!("Queue exhausted, waiting for catalog to autoplay");
                let token = self.autoplay.arm();
                let timeout = self.config.autoplay_wait_timeout;
                self.spawn_background(async move {
                    tokio::time::sleep(timeout).await;
                    ControllerMessage::AutoplayExpired(token)
                });
            }
        }
    }

    async fn play_random_from_catalog(&mut self) {
        let exclude = self.state.current_track.as_ref().map(|t| t.id.clone());
        let pick = {
            let mut rng = rand::thread_rng();
            catalog::pick_random(&self.state.catalog_tracks, exclude.as_ref(), &mut rng).cloned()
        };
        match pick {
            Some(track) => {
                info!(track_id = %track.id, title = %track.title, "Autoplaying random track");
                let queue = self.state.queue.to_vec();
                let _ = self.play_track_with_queue(track, queue).await;
            }
            None => info!("No other track to autoplay"),
        }
    }

    // ===== Catalog and playlists =====

    fn start_catalog_load(&mut self) {
        if self.state.catalog_loaded || self.state.is_catalog_loading {
            return;
        }
        self.state.is_catalog_loading = true;
        let repository = Arc::clone(&self.repository);
        let playlists = self.state.available_playlists.clone();
        info!(playlists = playlists.len(), "Loading full catalog");
        self.spawn_background(async move {
            ControllerMessage::CatalogLoaded(catalog::fetch_catalog(repository, playlists).await)
        });
    }

    async fn apply_catalog(&mut self, fetch: CatalogFetch) {
        self.state.is_catalog_loading = false;
        // Nothing fetched (no playlists, or every fetch failed): allow a retry
        self.state.catalog_loaded = fetch.attempted > 0 && !fetch.all_failed();
        if fetch.all_failed() {
            if let Some((_, error)) = fetch.failures.first() {
                self.state.last_error = Some(format!("Failed to load songs: {error}"));
            }
        }

        let merged = catalog::merge_tracks(&self.state.catalog_tracks, fetch.tracks);
        info!(
            tracks = merged.len(),
            failures = fetch.failures.len(),
            "Catalog loaded"
        );
        self.state.catalog_tracks = Arc::new(merged);

        if self.autoplay.take() {
            self.play_random_from_catalog().await;
        }
    }

    fn load_available_playlists(&mut self) {
        let store = Arc::clone(&self.store);
        let repository = Arc::clone(&self.repository);
        let tx = self.tx.clone();
        self.track_background(tokio::spawn(async move {
            let _ = tx.send(reload_playlists(store.as_ref()).await);
            if refresh_playlist_info(store.as_ref(), repository.as_ref()).await {
                let _ = tx.send(reload_playlists(store.as_ref()).await);
            }
        }));
    }

    fn apply_playlists(&mut self, result: std::result::Result<Vec<Playlist>, String>) {
        match result {
            Ok(playlists) => {
                if let Some(current) = &self.state.current_playlist {
                    if let Some(fresh) = playlists.iter().find(|p| p.id == current.id) {
                        self.state.current_playlist = Some(fresh.clone());
                    }
                }
                self.state.available_playlists = playlists;
            }
            Err(e) => self.state.last_error = Some(format!("Failed to load playlists: {e}")),
        }
    }

    fn load_playlist(&mut self, id: PlaylistId) {
        if self.state.current_playlist_id.as_ref() == Some(&id)
            && !self.state.playlist_tracks.is_empty()
        {
            debug!(playlist_id = %id, "Playlist already loaded");
            return;
        }
        self.state.is_loading = true;
        self.state.last_error = None;

        let repository = Arc::clone(&self.repository);
        self.spawn_background(async move {
            let result = repository
                .fetch_tracks(&id)
                .await
                .map_err(|e| e.to_string());
            ControllerMessage::PlaylistLoaded {
                playlist_id: id,
                result,
            }
        });
    }

    fn apply_playlist_tracks(
        &mut self,
        playlist_id: PlaylistId,
        result: std::result::Result<Vec<Track>, String>,
    ) {
        self.state.is_loading = false;
        match result {
            Ok(tracks) => {
                info!(playlist_id = %playlist_id, tracks = tracks.len(), "Playlist loaded");
                let tracks = Arc::new(tracks);
                if self.state.current_track.is_none() {
                    self.state.current_track = tracks.first().cloned();
                    self.state.queue = Arc::clone(&tracks);
                }
                if self.state.current_playlist.as_ref().map(|p| &p.id) != Some(&playlist_id) {
                    self.state.current_playlist = self
                        .state
                        .available_playlists
                        .iter()
                        .find(|p| p.id == playlist_id)
                        .cloned();
                }
                self.state.playlist_tracks = tracks;
                self.state.current_playlist_id = Some(playlist_id);
            }
            Err(e) => {
                warn!(playlist_id = %playlist_id, error = %e, "Failed to load playlist");
                self.state.last_error = Some(format!("Failed to load playlist: {e}"));
            }
        }
    }

    fn add_playlist_by_id(&mut self, id: PlaylistId) {
        let store = Arc::clone(&self.store);
        let repository = Arc::clone(&self.repository);
        self.spawn_background(async move {
            match store.contains(&id).await {
                Ok(true) => return ControllerMessage::Failed("Playlist already exists".to_string()),
                Ok(false) => {}
                Err(e) => return ControllerMessage::Failed(format!("Failed to add playlist: {e}")),
            }
            let info = match repository.fetch_playlist_info(&id).await {
                Ok(info) => info,
                Err(e) => return ControllerMessage::Failed(format!("Failed to fetch playlist: {e}")),
            };
            match store.add(Playlist::from(info)).await {
                Ok(true) => reload_playlists(store.as_ref()).await,
                Ok(false) => ControllerMessage::Failed("Playlist already exists".to_string()),
                Err(e) => ControllerMessage::Failed(format!("Failed to add playlist: {e}")),
            }
        });
    }

    fn add_playlist(&mut self, playlist: Playlist) {
        let store = Arc::clone(&self.store);
        self.spawn_background(async move {
            match store.add(playlist).await {
                Ok(true) => reload_playlists(store.as_ref()).await,
                Ok(false) => ControllerMessage::Failed("Playlist already exists".to_string()),
                Err(e) => ControllerMessage::Failed(format!("Failed to add playlist: {e}")),
            }
        });
    }

    fn remove_playlist(&mut self, id: PlaylistId) {
        let store = Arc::clone(&self.store);
        self.spawn_background(async move {
            match store.remove(&id).await {
                Ok(_) => reload_playlists(store.as_ref()).await,
                Err(e) => ControllerMessage::Failed(format!("Failed to remove playlist: {e}")),
            }
        });
    }

    // ===== Helpers =====

    fn resolve_track(&self, id: &TrackId) -> Option<Track> {
        queue::find_playable(&self.state.queue, id)
            .or_else(|| queue::find_playable(&self.state.catalog_tracks, id))
            .or_else(|| queue::find_playable(&self.state.playlist_tracks, id))
            .cloned()
    }

    async fn engine_status(&self) -> Option<EngineStatus> {
        match self.engine.status().await {
            Ok(status) => Some(status),
            Err(e) => {
                warn!(error = %e, "Engine status unavailable");
                None
            }
        }
    }

    /// Await an engine command, logging and dropping failures
    async fn command<F>(&self, name: &'static str, command: F) -> bool
    where
        F: Future<Output = crate::engine::EngineResult<()>>,
    {
        match command.await {
            Ok(()) => true,
            Err(e) => {
                warn!(command = name, error = %e, "Engine command dropped");
                false
            }
        }
    }

    fn spawn_background<F>(&mut self, task: F)
    where
        F: Future<Output = ControllerMessage> + Send + 'static,
    {
        let tx = self.tx.clone();
        self.track_background(tokio::spawn(async move {
            let _ = tx.send(task.await);
        }));
    }

    fn track_background(&mut self, handle: JoinHandle<()>) {
        self.background.retain(|task| !task.is_finished());
        self.background.push(handle);
    }
}

async fn reload_playlists(store: &dyn PlaylistStore) -> ControllerMessage {
    ControllerMessage::PlaylistsLoaded(store.playlists().await.map_err(|e| e.to_string()))
}

/// Fill in names and preview covers of incomplete catalog entries
///
/// Returns whether any entry changed.
async fn refresh_playlist_info(store: &dyn PlaylistStore, repository: &dyn TrackRepository) -> bool {
    let playlists = match store.playlists().await {
        Ok(playlists) => playlists,
        Err(e) => {
            warn!(error = %e, "Failed to read playlists for refresh");
            return false;
        }
    };

    let mut changed = false;
    for playlist in playlists.iter().filter(|p| p.needs_refresh()) {
        match repository.fetch_playlist_info(&playlist.id).await {
            Ok(info) => {
                let merged = playlist.merged_with(&info);
                if &merged != playlist {
                    match store.update(merged).await {
                        Ok(updated) => changed |= updated,
                        Err(e) => warn!(playlist_id = %playlist.id, error = %e, "Failed to store refreshed playlist"),
                    }
                }
            }
            Err(e) => debug!(playlist_id = %playlist.id, error = %e, "Playlist info refresh failed"),
        }
    }
    changed
}
