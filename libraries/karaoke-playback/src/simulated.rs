//! Headless engine that plays silence on a virtual clock
//!
//! Mirrors the observable behavior of a streaming media engine closely enough
//! to drive the controller without audio hardware: items advance on their own
//! when they run out, native shuffle and repeat are honored, and `Ended` is
//! only reached at the end of the list with repeat off. Time comes from
//! `tokio::time`, so tests can run it under a paused clock.

use crate::engine::{EngineEvent, EngineResult, EngineStatus, MediaItem, PlaybackEngine};
use crate::error::EngineError;
use crate::types::{EngineState, RepeatMode};
use async_trait::async_trait;
use karaoke_core::TrackId;
use rand::seq::SliceRandom;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Commands received by the simulated engine, in arrival order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    Load {
        ids: Vec<TrackId>,
        start_index: usize,
        start_position_ms: u64,
    },
    Play,
    Pause,
    SeekTo(u64),
    SeekToIndex(usize, u64),
    Next,
    Previous,
    SetShuffle(bool),
    SetRepeat(RepeatMode),
    Release,
}

struct SimState {
    connected: bool,
    items: Vec<MediaItem>,
    /// Play order as indices into `items`
    order: Vec<usize>,
    /// Position inside `order`
    cursor: usize,
    play_when_ready: bool,
    state: EngineState,
    /// Position at `anchor`
    position_ms: u64,
    /// Set while the clock is running
    anchor: Option<Instant>,
    shuffle: bool,
    repeat: RepeatMode,
    default_length: Duration,
    lengths: HashMap<TrackId, Duration>,
    session_id: i32,
    next_session_id: i32,
    /// Bumped whenever a scheduled item end becomes stale
    generation: u64,
    commands: Vec<EngineCommand>,
}

impl SimState {
    fn current(&self) -> Option<&MediaItem> {
        self.order.get(self.cursor).and_then(|&i| self.items.get(i))
    }

    fn current_id(&self) -> Option<TrackId> {
        self.current().map(|item| item.id.clone())
    }

    fn current_length(&self) -> Option<Duration> {
        self.current()
            .map(|item| self.lengths.get(&item.id).copied().unwrap_or(self.default_length))
    }

    fn is_playing(&self) -> bool {
        self.anchor.is_some()
    }

    fn position(&self) -> u64 {
        let elapsed = self
            .anchor
            .map_or(0, |anchor| anchor.elapsed().as_millis() as u64);
        let length = self.current_length().map_or(0, |d| d.as_millis() as u64);
        (self.position_ms + elapsed).min(length)
    }

    /// Freeze the clock at the current position
    fn freeze(&mut self) {
        self.position_ms = self.position();
        self.anchor = None;
    }

    fn has_next(&self) -> bool {
        !self.order.is_empty()
            && (self.cursor + 1 < self.order.len() || self.repeat == RepeatMode::All)
    }

    fn has_previous(&self) -> bool {
        !self.order.is_empty() && (self.cursor > 0 || self.repeat == RepeatMode::All)
    }

    fn build_order(&mut self, keep_first: Option<usize>) {
        let mut order: Vec<usize> = (0..self.items.len()).collect();
        if self.shuffle {
            order.shuffle(&mut rand::thread_rng());
            if let Some(first) = keep_first {
                if let Some(pos) = order.iter().position(|&i| i == first) {
                    order.swap(0, pos);
                }
            }
        }
        self.cursor = keep_first
            .and_then(|first| order.iter().position(|&i| i == first))
            .unwrap_or(0);
        self.order = order;
    }
}

/// Virtual-clock playback engine
///
/// Cheap to clone; clones share the same player.
#[derive(Clone)]
pub struct SimulatedEngine {
    inner: Arc<Mutex<SimState>>,
    events: mpsc::UnboundedSender<EngineEvent>,
}

impl SimulatedEngine {
    /// Create an engine whose items all last `default_length`
    ///
    /// Returns the engine and the receiving end of its event stream.
    pub fn new(default_length: Duration) -> (Self, mpsc::UnboundedReceiver<EngineEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let engine = Self {
            inner: Arc::new(Mutex::new(SimState {
                connected: true,
                items: Vec::new(),
                order: Vec::new(),
                cursor: 0,
                play_when_ready: false,
                state: EngineState::Idle,
                position_ms: 0,
                anchor: None,
                shuffle: false,
                repeat: RepeatMode::Off,
                default_length,
                lengths: HashMap::new(),
                session_id: 0,
                next_session_id: 1,
                generation: 0,
                commands: Vec::new(),
            })),
            events,
        };
        (engine, rx)
    }

    /// Override the length of a single item
    pub fn set_track_length(&self, id: impl Into<TrackId>, length: Duration) {
        self.lock().lengths.insert(id.into(), length);
    }

    /// Simulate the engine connection dropping or coming back
    pub fn set_connected(&self, connected: bool) {
        self.lock().connected = connected;
    }

    /// Commands received so far
    pub fn commands(&self) -> Vec<EngineCommand> {
        self.lock().commands.clone()
    }

    pub fn clear_commands(&self) {
        self.lock().commands.clear();
    }

    /// Ids of the loaded items in list order
    pub fn item_ids(&self) -> Vec<TrackId> {
        self.lock().items.iter().map(|item| item.id.clone()).collect()
    }

    /// Run the current item out immediately
    pub fn finish_current_item(&self) {
        let mut st = self.lock();
        self.item_ended(&mut st);
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: EngineEvent) {
        // Nobody listening is fine; the engine keeps running headless
        let _ = self.events.send(event);
    }

    fn check_connected(st: &SimState) -> EngineResult<()> {
        if st.connected {
            Ok(())
        } else {
            Err(EngineError::Unavailable)
        }
    }

    /// Start the clock if the player wants to play and can
    fn resume_if_ready(&self, st: &mut SimState) {
        if st.play_when_ready && st.state == EngineState::Ready && !st.is_playing() {
            st.anchor = Some(Instant::now());
            self.emit(EngineEvent::IsPlayingChanged(true));
        }
        self.schedule_end(st);
    }

    /// Stop the clock, keeping the position
    fn halt(&self, st: &mut SimState) {
        if st.is_playing() {
            st.freeze();
            self.emit(EngineEvent::IsPlayingChanged(false));
        }
        st.generation += 1;
    }

    fn move_to(&self, st: &mut SimState, cursor: usize, position_ms: u64) {
        let previous = st.current_id();
        let was_playing = st.is_playing();
        st.cursor = cursor;
        st.position_ms = position_ms;
        if was_playing {
            st.anchor = Some(Instant::now());
        }
        if st.state == EngineState::Ended {
            st.state = EngineState::Ready;
            self.emit(EngineEvent::StateChanged(EngineState::Ready));
        }
        let current = st.current_id();
        if current != previous {
            self.emit(EngineEvent::MediaItemTransition(current));
        }
        self.resume_if_ready(st);
    }

    fn item_ended(&self, st: &mut SimState) {
        if st.order.is_empty() || st.state != EngineState::Ready {
            return;
        }
        if st.repeat == RepeatMode::One {
            st.position_ms = 0;
            if st.is_playing() {
                st.anchor = Some(Instant::now());
            }
            self.schedule_end(st);
        } else if st.cursor + 1 < st.order.len() {
            let next = st.cursor + 1;
            self.move_to(st, next, 0);
        } else if st.repeat == RepeatMode::All {
            self.move_to(st, 0, 0);
        } else {
            st.freeze();
            st.position_ms = st.current_length().map_or(0, |d| d.as_millis() as u64);
            st.generation += 1;
            st.state = EngineState::Ended;
            self.emit(EngineEvent::IsPlayingChanged(false));
            self.emit(EngineEvent::StateChanged(EngineState::Ended));
        }
    }

    /// Arm a timer for the end of the current item
    fn schedule_end(&self, st: &mut SimState) {
        st.generation += 1;
        if !st.is_playing() {
            return;
        }
        let generation = st.generation;
        let length = st.current_length().map_or(0, |d| d.as_millis() as u64);
        let remaining = Duration::from_millis(length.saturating_sub(st.position()));
        let engine = self.clone();

        tokio::spawn(async move {
            tokio::time::sleep(remaining).await;
            let mut st = engine.lock();
            if st.generation == generation {
                engine.item_ended(&mut st);
            }
        });
    }
}

#[async_trait]
impl PlaybackEngine for SimulatedEngine {
    async fn load(
        &self,
        items: Vec<MediaItem>,
        start_index: usize,
        start_position_ms: u64,
    ) -> EngineResult<()> {
        let mut st = self.lock();
        Self::check_connected(&st)?;
        st.commands.push(EngineCommand::Load {
            ids: items.iter().map(|item| item.id.clone()).collect(),
            start_index,
            start_position_ms,
        });
        if !items.is_empty() && start_index >= items.len() {
            return Err(EngineError::IndexOutOfBounds(start_index));
        }

        let was_playing = st.is_playing();
        let previous = st.current_id();
        st.anchor = None;
        st.generation += 1;
        st.items = items;
        st.build_order(Some(start_index));
        st.position_ms = start_position_ms;

        if st.session_id == 0 {
            st.session_id = st.next_session_id;
            st.next_session_id += 1;
            self.emit(EngineEvent::AudioSessionChanged(st.session_id));
        }

        let current = st.current_id();
        if current != previous {
            self.emit(EngineEvent::MediaItemTransition(current));
        }

        if st.items.is_empty() {
            st.state = EngineState::Idle;
            if was_playing {
                self.emit(EngineEvent::IsPlayingChanged(false));
            }
            self.emit(EngineEvent::StateChanged(EngineState::Idle));
            return Ok(());
        }

        st.state = EngineState::Ready;
        self.emit(EngineEvent::StateChanged(EngineState::Ready));
        if was_playing {
            // Clock restarts on the new item without a playing flip
            st.anchor = Some(Instant::now());
            self.schedule_end(&mut st);
        } else {
            self.resume_if_ready(&mut st);
        }
        Ok(())
    }

    async fn play(&self) -> EngineResult<()> {
        let mut st = self.lock();
        Self::check_connected(&st)?;
        st.commands.push(EngineCommand::Play);
        st.play_when_ready = true;
        self.resume_if_ready(&mut st);
        Ok(())
    }

    async fn pause(&self) -> EngineResult<()> {
        let mut st = self.lock();
        Self::check_connected(&st)?;
        st.commands.push(EngineCommand::Pause);
        st.play_when_ready = false;
        self.halt(&mut st);
        Ok(())
    }

    async fn seek_to(&self, position_ms: u64) -> EngineResult<()> {
        let mut st = self.lock();
        Self::check_connected(&st)?;
        st.commands.push(EngineCommand::SeekTo(position_ms));
        if st.order.is_empty() {
            return Ok(());
        }
        let length = st.current_length().map_or(0, |d| d.as_millis() as u64);
        let cursor = st.cursor;
        self.move_to(&mut st, cursor, position_ms.min(length));
        Ok(())
    }

    async fn seek_to_index(&self, index: usize, position_ms: u64) -> EngineResult<()> {
        let mut st = self.lock();
        Self::check_connected(&st)?;
        st.commands.push(EngineCommand::SeekToIndex(index, position_ms));
        let cursor = st
            .order
            .iter()
            .position(|&i| i == index)
            .ok_or(EngineError::IndexOutOfBounds(index))?;
        self.move_to(&mut st, cursor, position_ms);
        Ok(())
    }

    async fn advance_to_next(&self) -> EngineResult<()> {
        let mut st = self.lock();
        Self::check_connected(&st)?;
        st.commands.push(EngineCommand::Next);
        if !st.has_next() {
            return Ok(());
        }
        let next = (st.cursor + 1) % st.order.len();
        self.move_to(&mut st, next, 0);
        Ok(())
    }

    async fn advance_to_previous(&self) -> EngineResult<()> {
        let mut st = self.lock();
        Self::check_connected(&st)?;
        st.commands.push(EngineCommand::Previous);
        if !st.has_previous() {
            return Ok(());
        }
        let previous = st.cursor.checked_sub(1).unwrap_or(st.order.len() - 1);
        self.move_to(&mut st, previous, 0);
        Ok(())
    }

    async fn set_shuffle_enabled(&self, enabled: bool) -> EngineResult<()> {
        let mut st = self.lock();
        Self::check_connected(&st)?;
        st.commands.push(EngineCommand::SetShuffle(enabled));
        if st.shuffle == enabled {
            return Ok(());
        }
        st.shuffle = enabled;
        let current = st.order.get(st.cursor).copied();
        st.build_order(current);
        self.emit(EngineEvent::ShuffleModeChanged(enabled));
        Ok(())
    }

    async fn set_repeat_mode(&self, mode: RepeatMode) -> EngineResult<()> {
        let mut st = self.lock();
        Self::check_connected(&st)?;
        st.commands.push(EngineCommand::SetRepeat(mode));
        if st.repeat != mode {
            st.repeat = mode;
            self.emit(EngineEvent::RepeatModeChanged(mode));
        }
        Ok(())
    }

    async fn status(&self) -> EngineResult<EngineStatus> {
        let st = self.lock();
        Self::check_connected(&st)?;
        let duration_ms = st
            .current_length()
            .map_or(-1, |d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX));
        Ok(EngineStatus {
            is_playing: st.is_playing(),
            state: st.state,
            position_ms: i64::try_from(st.position()).unwrap_or(i64::MAX),
            duration_ms,
            current_item_id: st.current_id(),
            item_count: st.items.len(),
            has_next: st.has_next(),
            has_previous: st.has_previous(),
            shuffle_enabled: st.shuffle,
            repeat_mode: st.repeat,
        })
    }

    async fn release(&self) -> EngineResult<()> {
        let mut st = self.lock();
        st.commands.push(EngineCommand::Release);
        st.play_when_ready = false;
        self.halt(&mut st);
        st.items.clear();
        st.order.clear();
        st.cursor = 0;
        st.position_ms = 0;
        st.state = EngineState::Idle;
        st.session_id = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use karaoke_core::Track;

    fn items(ids: &[&str]) -> Vec<MediaItem> {
        ids.iter()
            .map(|id| {
                MediaItem::from(
                    &Track::new(*id, format!("Song {id}"), "Artist")
                        .with_audio_url(format!("https://example.com/{id}.mp3")),
                )
            })
            .collect()
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<EngineEvent>) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test(start_paused = true)]
    async fn load_and_play_emits_transition_and_playing() {
        let (engine, mut rx) = SimulatedEngine::new(Duration::from_secs(60));

        engine.load(items(&["a", "b"]), 1, 0).await.unwrap();
        engine.play().await.unwrap();

        let events = drain(&mut rx);
        assert!(events.contains(&EngineEvent::AudioSessionChanged(1)));
        assert!(events.contains(&EngineEvent::MediaItemTransition(Some("b".into()))));
        assert!(events.contains(&EngineEvent::IsPlayingChanged(true)));

        let status = engine.status().await.unwrap();
        assert_eq!(status.current_item_id, Some("b".into()));
        assert_eq!(status.duration_ms, 60_000);
        assert!(!status.has_next);
        assert!(status.has_previous);
    }

    #[tokio::test(start_paused = true)]
    async fn position_follows_virtual_clock() {
        let (engine, _rx) = SimulatedEngine::new(Duration::from_secs(60));
        engine.load(items(&["a"]), 0, 0).await.unwrap();
        engine.play().await.unwrap();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(engine.status().await.unwrap().position_ms, 5_000);

        engine.pause().await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(engine.status().await.unwrap().position_ms, 5_000);
    }

    #[tokio::test(start_paused = true)]
    async fn auto_advances_then_ends() {
        let (engine, mut rx) = SimulatedEngine::new(Duration::from_secs(10));
        engine.load(items(&["a", "b"]), 0, 0).await.unwrap();
        engine.play().await.unwrap();
        drain(&mut rx);

        tokio::time::sleep(Duration::from_millis(10_100)).await;
        assert_eq!(
            drain(&mut rx),
            vec![EngineEvent::MediaItemTransition(Some("b".into()))]
        );

        tokio::time::sleep(Duration::from_millis(10_100)).await;
        assert_eq!(
            drain(&mut rx),
            vec![
                EngineEvent::IsPlayingChanged(false),
                EngineEvent::StateChanged(EngineState::Ended)
            ]
        );
        assert_eq!(engine.status().await.unwrap().state, EngineState::Ended);
    }

    #[tokio::test(start_paused = true)]
    async fn repeat_all_wraps_natively() {
        let (engine, mut rx) = SimulatedEngine::new(Duration::from_secs(10));
        engine.set_repeat_mode(RepeatMode::All).await.unwrap();
        engine.load(items(&["a", "b"]), 1, 0).await.unwrap();
        engine.play().await.unwrap();
        drain(&mut rx);

        engine.finish_current_item();

        assert_eq!(
            drain(&mut rx),
            vec![EngineEvent::MediaItemTransition(Some("a".into()))]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn disconnected_engine_is_unavailable() {
        let (engine, _rx) = SimulatedEngine::new(Duration::from_secs(10));
        engine.set_connected(false);

        assert_eq!(engine.play().await, Err(EngineError::Unavailable));
        assert_eq!(engine.status().await, Err(EngineError::Unavailable));
        assert!(engine.commands().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn seek_to_index_rejects_out_of_bounds() {
        let (engine, _rx) = SimulatedEngine::new(Duration::from_secs(10));
        engine.load(items(&["a"]), 0, 0).await.unwrap();

        assert_eq!(
            engine.seek_to_index(3, 0).await,
            Err(EngineError::IndexOutOfBounds(3))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn shuffle_keeps_current_item() {
        let (engine, mut rx) = SimulatedEngine::new(Duration::from_secs(10));
        engine.load(items(&["a", "b", "c", "d"]), 2, 0).await.unwrap();
        drain(&mut rx);

        engine.set_shuffle_enabled(true).await.unwrap();

        assert_eq!(drain(&mut rx), vec![EngineEvent::ShuffleModeChanged(true)]);
        let status = engine.status().await.unwrap();
        assert_eq!(status.current_item_id, Some("c".into()));
        assert!(status.shuffle_enabled);
    }
}
