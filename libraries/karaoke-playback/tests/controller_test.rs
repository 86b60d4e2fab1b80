//! Controller integration tests: queue loading, navigation, progress
//!
//! Each test drives a real controller against the simulated engine under a
//! paused clock.


use karaoke_core::TrackId;
use karaoke_playback::{
    AudioEffectsManager, EngineCommand, EngineEvent, EngineState, Intent, PlaybackEngine,
    RepeatMode, SimulatedEffectsBackend,
};
use std::time::Duration;
use test_helpers::*;

fn ids(ids: &[&str]) -> Vec<TrackId> {
    ids.iter().map(|id| TrackId::from(*id)).collect()
}

async fn playing(queue: &[&str], start: &str) -> Harness {
    let mut h = Harness::new(InMemoryRepository::new(), InMemoryStore::default());
    h.intent(Intent::PlayTrackWithQueue {
        track: track(start),
        queue: tracks(queue),
    })
    .await;
    h
}

// ============================================================================
// Queue loading
// ============================================================================

#[tokio::test(start_paused = true)]
async fn load_queue_and_play_starts_engine_at_target() {
    let h = playing(&["s1", "s2"], "s1").await;

    assert_eq!(
        h.engine.commands(),
        vec![
            EngineCommand::Load {
                ids: ids(&["s1", "s2"]),
                start_index: 0,
                start_position_ms: 0,
            },
            EngineCommand::Play,
        ]
    );

    let state = h.state();
    assert_eq!(h.current_id().as_deref(), Some("s1"));
    assert!(state.is_playing);
    assert_eq!(state.progress, 0.0);
    assert_eq!(state.queue.len(), 2);
    assert_eq!(state.engine_state, EngineState::Ready);
    // Duration latched once the engine became ready
    assert_eq!(state.duration_ms, 240_000);
    assert_eq!(
        state.current_track.as_ref().map(|t| t.duration_ms),
        Some(240_000)
    );
}

#[tokio::test(start_paused = true)]
async fn unplayable_tracks_are_skipped_in_engine_list() {
    let mut h = Harness::new(InMemoryRepository::new(), InMemoryStore::default());
    let queue = vec![track("a"), silent_track("b"), track("c")];

    h.intent(Intent::PlayTrackWithQueue {
        track: track("c"),
        queue,
    })
    .await;

    assert_eq!(
        h.engine.commands()[0],
        EngineCommand::Load {
            ids: ids(&["a", "c"]),
            start_index: 1,
            start_position_ms: 0,
        }
    );
    // The session still shows the full list
    assert_eq!(h.state().queue.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn unplayable_target_leaves_queue_untouched() {
    let mut h = playing(&["a", "b"], "a").await;
    h.engine.clear_commands();

    h.intent(Intent::PlayTrackWithQueue {
        track: silent_track("x"),
        queue: vec![silent_track("x")],
    })
    .await;

    let state = h.state();
    assert_eq!(h.current_id().as_deref(), Some("a"));
    assert_eq!(state.queue.len(), 2);
    assert_eq!(
        state.last_error.as_deref(),
        Some("No audio URL available for track x")
    );
    assert!(h.engine.commands().is_empty());
}

#[tokio::test(start_paused = true)]
async fn target_outside_queue_plays_alone() {
    let h = playing(&["a", "b"], "z").await;

    assert_eq!(h.state().queue.len(), 1);
    assert_eq!(h.engine.item_ids(), ids(&["z"]));
}

#[tokio::test(start_paused = true)]
async fn replacing_queue_resets_position() {
    let mut h = playing(&["a", "b"], "a").await;
    h.advance(Duration::from_secs(60)).await;
    assert_eq!(h.state().position_ms, 60_000);
    assert_eq!(h.state().progress, 0.25);

    h.intent(Intent::PlayTrackWithQueue {
        track: track("b"),
        queue: tracks(&["a", "b"]),
    })
    .await;

    assert_eq!(h.state().position_ms, 0);
    assert_eq!(h.state().progress, 0.0);
    assert_eq!(h.current_id().as_deref(), Some("b"));
}

#[tokio::test(start_paused = true)]
async fn disconnected_engine_drops_commands() {
    let mut h = Harness::new(InMemoryRepository::new(), InMemoryStore::default());
    h.engine.set_connected(false);

    h.intent(Intent::PlayTrackWithQueue {
        track: track("a"),
        queue: tracks(&["a"]),
    })
    .await;

    let state = h.state();
    assert_eq!(h.current_id().as_deref(), Some("a"));
    assert!(!state.is_playing);
    assert!(state.last_error.is_none());

    // Transport intents are no-ops until the engine comes back
    h.intent(Intent::Next).await;
    h.intent(Intent::SeekToFraction(0.5)).await;
    assert_eq!(h.state().position_ms, 0);
}

// ============================================================================
// Play / pause
// ============================================================================

#[tokio::test(start_paused = true)]
async fn toggle_pauses_and_resumes() {
    let mut h = playing(&["a"], "a").await;

    h.intent(Intent::TogglePlayPause).await;
    assert!(!h.state().is_playing);

    h.intent(Intent::TogglePlayPause).await;
    assert!(h.state().is_playing);
}

#[tokio::test(start_paused = true)]
async fn toggle_without_track_does_nothing() {
    let mut h = Harness::new(InMemoryRepository::new(), InMemoryStore::default());

    h.intent(Intent::TogglePlayPause).await;

    assert!(h.engine.commands().is_empty());
    assert!(!h.state().is_playing);
}

#[tokio::test(start_paused = true)]
async fn toggle_reloads_queue_when_engine_lost_media() {
    let mut h = playing(&["a", "b"], "b").await;
    h.intent(Intent::TogglePlayPause).await;
    h.engine.release().await.unwrap();
    h.settle().await;
    h.engine.clear_commands();

    h.intent(Intent::TogglePlayPause).await;

    assert_eq!(
        h.engine.commands(),
        vec![
            EngineCommand::Load {
                ids: ids(&["a", "b"]),
                start_index: 1,
                start_position_ms: 0,
            },
            EngineCommand::Play,
        ]
    );
    assert!(h.state().is_playing);
}

#[tokio::test(start_paused = true)]
async fn playing_flag_requires_a_current_track() {
    let mut h = Harness::new(InMemoryRepository::new(), InMemoryStore::default());

    h.engine_event(EngineEvent::IsPlayingChanged(true)).await;

    assert!(!h.state().is_playing);
    assert!(h.state().current_track.is_none());
}

// ============================================================================
// Previous / next
// ============================================================================

#[tokio::test(start_paused = true)]
async fn previous_restarts_when_no_prior_item() {
    let mut h = playing(&["s1"], "s1").await;
    h.advance(Duration::from_millis(1_500)).await;
    h.engine.clear_commands();

    h.intent(Intent::Previous).await;

    assert_eq!(h.engine.commands(), vec![EngineCommand::SeekTo(0)]);
    assert_eq!(h.current_id().as_deref(), Some("s1"));
    assert_eq!(h.state().position_ms, 0);
}

#[tokio::test(start_paused = true)]
async fn previous_moves_back_early_in_track() {
    let mut h = playing(&["s1", "s2"], "s2").await;
    h.advance(Duration::from_secs(1)).await;

    h.intent(Intent::Previous).await;

    assert_eq!(h.current_id().as_deref(), Some("s1"));
    assert_eq!(h.state().position_ms, 0);
}

#[tokio::test(start_paused = true)]
async fn previous_restarts_late_in_track() {
    let mut h = playing(&["s1", "s2"], "s2").await;
    h.advance(Duration::from_secs(5)).await;
    h.engine.clear_commands();

    h.intent(Intent::Previous).await;

    assert_eq!(h.engine.commands(), vec![EngineCommand::SeekTo(0)]);
    assert_eq!(h.current_id().as_deref(), Some("s2"));
}

#[tokio::test(start_paused = true)]
async fn previous_wraps_to_last_with_repeat_all() {
    let mut h = playing(&["a", "b", "c"], "a").await;
    h.intent(Intent::CycleRepeatMode).await;
    assert_eq!(h.state().repeat_mode, RepeatMode::All);

    h.intent(Intent::Previous).await;

    assert_eq!(h.current_id().as_deref(), Some("c"));
}

#[tokio::test(start_paused = true)]
async fn next_follows_engine_transition() {
    let mut h = playing(&["a", "b"], "a").await;
    h.advance(Duration::from_secs(10)).await;

    h.intent(Intent::Next).await;

    assert_eq!(h.current_id().as_deref(), Some("b"));
    assert_eq!(h.state().position_ms, 0);
}

#[tokio::test(start_paused = true)]
async fn engine_auto_advance_updates_current_track() {
    let mut h = playing(&["a", "b"], "a").await;

    h.advance(TRACK_LENGTH + Duration::from_millis(100)).await;
    assert_eq!(h.current_id().as_deref(), Some("b"));

    h.advance(Duration::from_millis(300)).await;
    assert!(h.state().is_playing);
    assert!(h.state().position_ms < 1_000);
}

#[tokio::test(start_paused = true)]
async fn transition_adopts_known_duration_of_new_track() {
    let mut h = Harness::new(InMemoryRepository::new(), InMemoryStore::default());
    h.intent(Intent::PlayTrackWithQueue {
        track: track("a"),
        queue: vec![track("a"), track("b").with_duration_ms(200_000)],
    })
    .await;
    h.intent(Intent::TogglePlayPause).await;
    assert_eq!(h.state().duration_ms, 240_000);

    h.engine_event(EngineEvent::MediaItemTransition(Some("b".into())))
        .await;

    let state = h.state();
    assert_eq!(h.current_id().as_deref(), Some("b"));
    assert_eq!(state.duration_ms, 200_000);
    assert_eq!(state.position_ms, 0);
    assert_eq!(state.progress, 0.0);
}

// ============================================================================
// End of queue with repeat
// ============================================================================

#[tokio::test(start_paused = true)]
async fn repeat_one_restarts_same_track_on_every_end() {
    let mut h = playing(&["a", "b", "c"], "b").await;
    h.intent(Intent::CycleRepeatMode).await;
    h.intent(Intent::CycleRepeatMode).await;
    assert_eq!(h.state().repeat_mode, RepeatMode::One);

    for _ in 0..3 {
        h.advance(Duration::from_secs(10)).await;
        h.engine_event(EngineEvent::StateChanged(EngineState::Ended))
            .await;

        assert_eq!(h.current_id().as_deref(), Some("b"));
        assert_eq!(h.state().position_ms, 0);
        assert_eq!(h.state().progress, 0.0);
    }
}

#[tokio::test(start_paused = true)]
async fn repeat_all_wraps_to_first_on_end() {
    let mut h = playing(&["a", "b", "c"], "c").await;
    h.intent(Intent::CycleRepeatMode).await;

    h.engine_event(EngineEvent::StateChanged(EngineState::Ended))
        .await;

    assert_eq!(h.current_id().as_deref(), Some("a"));
}

#[tokio::test(start_paused = true)]
async fn cycle_repeat_mode_reaches_engine() {
    let mut h = playing(&["a"], "a").await;
    h.engine.clear_commands();

    h.intent(Intent::CycleRepeatMode).await;
    h.intent(Intent::CycleRepeatMode).await;
    h.intent(Intent::CycleRepeatMode).await;

    assert_eq!(
        h.engine.commands(),
        vec![
            EngineCommand::SetRepeat(RepeatMode::All),
            EngineCommand::SetRepeat(RepeatMode::One),
            EngineCommand::SetRepeat(RepeatMode::Off),
        ]
    );
    assert_eq!(h.state().repeat_mode, RepeatMode::Off);
}

#[tokio::test(start_paused = true)]
async fn shuffle_state_follows_engine() {
    let mut h = playing(&["a", "b", "c"], "a").await;

    h.intent(Intent::ToggleShuffle).await;
    assert!(h.state().is_shuffle_enabled);
    assert_eq!(h.current_id().as_deref(), Some("a"));

    h.intent(Intent::ToggleShuffle).await;
    assert!(!h.state().is_shuffle_enabled);
}

// ============================================================================
// Seeking and progress
// ============================================================================

#[tokio::test(start_paused = true)]
async fn seek_to_fraction_updates_position_immediately() {
    let mut h = playing(&["a"], "a").await;
    h.engine.clear_commands();

    h.intent(Intent::SeekToFraction(0.5)).await;

    assert_eq!(h.engine.commands(), vec![EngineCommand::SeekTo(120_000)]);
    assert_eq!(h.state().position_ms, 120_000);
    assert_eq!(h.state().progress, 0.5);
}

#[tokio::test(start_paused = true)]
async fn seek_fraction_is_clamped() {
    let mut h = playing(&["a"], "a").await;
    h.engine.clear_commands();

    h.intent(Intent::SeekToFraction(1.7)).await;
    h.intent(Intent::SeekToFraction(-0.2)).await;
    h.intent(Intent::SeekToFraction(f32::NAN)).await;

    assert_eq!(
        h.engine.commands(),
        vec![EngineCommand::SeekTo(240_000), EngineCommand::SeekTo(0)]
    );
}

#[tokio::test(start_paused = true)]
async fn seek_without_media_is_ignored() {
    let mut h = Harness::new(InMemoryRepository::new(), InMemoryStore::default());

    h.intent(Intent::SeekToFraction(0.5)).await;

    assert!(h.engine.commands().is_empty());
}

#[tokio::test(start_paused = true)]
async fn progress_ticks_while_playing_and_freezes_when_paused() {
    let mut h = playing(&["a"], "a").await;

    h.advance(Duration::from_secs(30)).await;
    assert_eq!(h.state().position_ms, 30_000);
    assert_eq!(h.state().progress, 0.125);

    h.intent(Intent::TogglePlayPause).await;
    h.advance(Duration::from_secs(30)).await;
    assert_eq!(h.state().position_ms, 30_000);
}

// ============================================================================
// Effects and teardown
// ============================================================================

#[tokio::test(start_paused = true)]
async fn effects_follow_audio_session() {
    let mut h = Harness::new(InMemoryRepository::new(), InMemoryStore::default());
    let backend = SimulatedEffectsBackend::new();
    let effects = AudioEffectsManager::shared(Box::new(backend.clone()));
    h.controller = h.controller.with_effects(effects.clone());

    h.intent(Intent::PlayTrackWithQueue {
        track: track("a"),
        queue: tracks(&["a"]),
    })
    .await;

    assert_eq!(backend.opened_sessions(), vec![1]);
    assert!(effects.lock().unwrap().state().is_available);

    h.controller.shutdown().await;

    assert_eq!(effects.lock().unwrap().session_id(), None);
    assert_eq!(h.engine.commands().last(), Some(&EngineCommand::Release));
    assert!(!h.state().is_playing);
}
