//! Property tests for session invariants
//!
//! The controller test drives random intent sequences through a harness on
//! a paused runtime and checks the published state after every step.


use karaoke_core::{Playlist, Track};
use karaoke_playback::queue::QueueLoad;
use karaoke_playback::{progress_fraction, Intent, RepeatMode};
use proptest::prelude::*;
use std::time::Duration;
use test_helpers::*;

fn arb_track() -> impl Strategy<Value = Track> {
    (0u8..6, any::<bool>()).prop_map(|(n, playable)| {
        let id = format!("t{n}");
        if playable {
            track(&id)
        } else {
            silent_track(&id)
        }
    })
}

fn arb_intent() -> impl Strategy<Value = Intent> {
    prop_oneof![
        (arb_track(), prop::collection::vec(arb_track(), 0..5))
            .prop_map(|(track, queue)| Intent::PlayTrackWithQueue { track, queue }),
        Just(Intent::TogglePlayPause),
        Just(Intent::Previous),
        Just(Intent::Next),
        Just(Intent::ToggleShuffle),
        Just(Intent::CycleRepeatMode),
        Just(Intent::LoadFullCatalog),
        any::<f32>().prop_map(Intent::SeekToFraction),
    ]
}

#[derive(Debug, Clone)]
enum Step {
    Intent(Intent),
    Wait(u64),
    FinishTrack,
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        4 => arb_intent().prop_map(Step::Intent),
        2 => (100u64..300_000).prop_map(Step::Wait),
        1 => Just(Step::FinishTrack),
    ]
}

proptest! {
    #[test]
    fn progress_stays_in_unit_range(position in any::<i64>(), duration in any::<i64>()) {
        let progress = progress_fraction(position, duration);
        prop_assert!((0.0..=1.0).contains(&progress));
        if duration <= 0 {
            prop_assert_eq!(progress, 0.0);
        }
    }

    #[test]
    fn repeat_cycle_has_period_three(start in prop_oneof![
        Just(RepeatMode::Off),
        Just(RepeatMode::All),
        Just(RepeatMode::One),
    ]) {
        prop_assert_ne!(start.cycle(), start);
        prop_assert_eq!(start.cycle().cycle().cycle(), start);
    }

    #[test]
    fn queue_load_starts_on_target(target in arb_track(), queue in prop::collection::vec(arb_track(), 0..8)) {
        match QueueLoad::prepare(target.clone(), queue) {
            Ok(load) => {
                prop_assert!(target.is_playable());
                prop_assert_eq!(&load.items[load.start_index].id, &target.id);
                prop_assert!(load.tracks.iter().any(|t| t.id == target.id));
            }
            Err(_) => prop_assert!(!target.is_playable()),
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn session_invariants_hold(steps in prop::collection::vec(arb_step(), 1..25)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .start_paused(true)
            .build()
            .unwrap();

        runtime.block_on(async {
            let repository = InMemoryRepository::new()
                .with_playlist("p", tracks(&["t0", "t1", "t2"]))
                .with_playlist("q", vec![track("t3"), silent_track("t4")]);
            let store = InMemoryStore::new(vec![Playlist::new("p", "P"), Playlist::new("q", "Q")]);
            let mut h = Harness::new(repository, store);
            h.intent(Intent::LoadAvailablePlaylists).await;

            for step in steps {
                match step {
                    Step::Intent(intent) => h.intent(intent).await,
                    Step::Wait(ms) => h.advance(Duration::from_millis(ms)).await,
                    Step::FinishTrack => {
                        h.engine.finish_current_item();
                        h.settle().await;
                    }
                }

                let state = h.state();
                assert!((0.0..=1.0).contains(&state.progress), "progress {}", state.progress);
                if state.is_playing {
                    assert!(state.current_track.is_some(), "playing without a track");
                }
                if let Some(current) = &state.current_track {
                    assert!(current.is_playable(), "unplayable current track {}", current.id);
                }
                let mut ids: Vec<_> = state.catalog_tracks.iter().map(|t| &t.id).collect();
                let total = ids.len();
                ids.sort();
                ids.dedup();
                assert_eq!(ids.len(), total, "duplicate catalog ids");
            }
        });
    }
}
