/*!
 * Tests for the playback mode state store
 */

use shadowsync::app_config::DisplayPrefs;
use shadowsync::playback_store::{PlaybackMode, PlaybackStore, StoreEvent};
use shadowsync::player::{MockPlayer, PlayerCommand};
use std::sync::Arc;

use crate::common;

/// Test the store starts in free mode with nothing active
#[test]
fn test_new_store_withDefaults_shouldStartFree() {
    let store = PlaybackStore::new(DisplayPrefs::default(), 1.1);

    assert_eq!(*store.mode(), PlaybackMode::Free);
    assert_eq!(store.active_index(), None);
    assert_eq!(store.active_word_index(), None);
    assert!(!store.playing());
}

/// Test enabling each mode while another is active leaves exactly one
#[test]
fn test_mode_exclusivity_withSequentialEnables_shouldKeepOneActive() {
    let handle = common::store_with_cues(5);
    let mut store = handle.lock();

    store.enable_simple_loop(0.0, 1.0);
    assert!(matches!(store.mode(), PlaybackMode::SimpleLoop { .. }));

    store.start_segment_loop(1.5, 2.5, 3, 1);
    assert!(matches!(store.mode(), PlaybackMode::SegmentLoop { .. }));

    store.enable_shadowing();
    assert!(matches!(store.mode(), PlaybackMode::Shadowing { .. }));

    assert!(store.set_point_a(1.0));
    assert!(matches!(store.mode(), PlaybackMode::AbRepeat { .. }));

    store.enable_simple_loop(2.0, 3.0);
    assert!(matches!(store.mode(), PlaybackMode::SimpleLoop { .. }));
}

/// Test simple loop toggle uses the active cue bounds
#[test]
fn test_toggle_simple_loop_withActiveCue_shouldUseCueBounds() {
    let handle = common::store_with_cues(5);
    let mut store = handle.lock();

    store.set_active_index(Some(2));
    store.toggle_simple_loop();

    match store.mode() {
        PlaybackMode::SimpleLoop { start, end } => {
            assert!((start - 3.0).abs() < 1e-9);
            assert!((end - 4.0).abs() < 1e-9);
        }
        other => panic!("expected simple loop, got {:?}", other),
    }

    store.toggle_simple_loop();
    assert_eq!(*store.mode(), PlaybackMode::Free);
}

/// Test simple loop toggle is a no-op without an active cue
#[test]
fn test_toggle_simple_loop_withNoActiveCue_shouldBeNoOp() {
    let handle = common::store_with_cues(5);
    let mut store = handle.lock();

    store.toggle_simple_loop();
    assert_eq!(*store.mode(), PlaybackMode::Free);
}

/// Test starting a segment loop seeks the player and resets reps
#[test]
fn test_start_segment_loop_withBoundPlayer_shouldSeekToStart() {
    let handle = common::store_with_cues(5);
    let player = Arc::new(MockPlayer::new());
    let mut store = handle.lock();
    store.bind_player(player.clone());

    assert!(store.start_segment_loop(1.5, 2.5, 3, 1));

    assert_eq!(player.commands(), vec![PlayerCommand::SeekTo(1.5)]);
    match store.mode() {
        PlaybackMode::SegmentLoop { completed_reps, total_reps, cue_index, .. } => {
            assert_eq!(*completed_reps, 0);
            assert_eq!(*total_reps, 3);
            assert_eq!(*cue_index, 1);
        }
        other => panic!("expected segment loop, got {:?}", other),
    }
    // Play/pause intent preserved
    assert!(!store.playing());
}

/// Test binding a player applies a non-default preferred playback rate
#[test]
fn test_bind_player_withCustomPlaybackRate_shouldApplyIt() {
    let prefs = DisplayPrefs { playback_rate: 0.75, ..DisplayPrefs::default() };
    let mut store = PlaybackStore::new(prefs, 1.1);
    let player = Arc::new(MockPlayer::new());

    store.bind_player(player.clone());

    assert_eq!(player.commands(), vec![PlayerCommand::SetRate(0.75)]);
}

/// Test binding a player at the default rate issues no command
#[test]
fn test_bind_player_withDefaultPlaybackRate_shouldNotIssueCommand() {
    let mut store = PlaybackStore::new(DisplayPrefs::default(), 1.1);
    let player = Arc::new(MockPlayer::new());

    store.bind_player(player.clone());

    assert!(player.commands().is_empty());
}

/// Test A/B point validation per the rejection rules
#[test]
fn test_ab_points_withInvalidValues_shouldRejectInPlace() {
    let handle = common::store_with_cues(5);
    let mut store = handle.lock();

    // Point B with no prior point A
    assert!(!store.set_point_b(5.0));
    assert_eq!(*store.mode(), PlaybackMode::Free);

    // Negative and NaN times
    assert!(!store.set_point_a(-1.0));
    assert!(!store.set_point_a(f64::NAN));
    assert_eq!(*store.mode(), PlaybackMode::Free);

    // B not strictly greater than A
    assert!(store.set_point_a(5.0));
    assert!(!store.set_point_b(3.0));
    assert!(!store.set_point_b(5.0));
    assert_eq!(
        *store.mode(),
        PlaybackMode::AbRepeat { point_a: Some(5.0), point_b: None }
    );
}

/// Test a valid point B auto-enables the repeat
#[test]
fn test_set_point_b_withValidPointA_shouldAutoEnableRepeat() {
    let handle = common::store_with_cues(5);
    let mut store = handle.lock();

    assert!(store.set_point_a(2.0));
    assert!(store.set_point_b(4.0));
    assert_eq!(
        *store.mode(),
        PlaybackMode::AbRepeat { point_a: Some(2.0), point_b: Some(4.0) }
    );
}

/// Test shadowing pause factor is clamped and applied to the live mode
#[test]
fn test_set_shadowing_pause_factor_withOutOfRangeValue_shouldClamp() {
    let handle = common::store_with_cues(5);
    let mut store = handle.lock();

    store.enable_shadowing();
    store.set_shadowing_pause_factor(10.0);
    match store.mode() {
        PlaybackMode::Shadowing { pause_factor, .. } => assert!((pause_factor - 3.0).abs() < 1e-9),
        other => panic!("expected shadowing, got {:?}", other),
    }
}

/// Test replacing cues resets tracking and bumps the generation
#[test]
fn test_replace_cues_withNewList_shouldResetTracking() {
    let handle = common::store_with_cues(5);
    let mut store = handle.lock();
    store.set_active_index(Some(3));
    store.set_active_word_index(Some(2));
    let generation = store.generation();

    store.replace_cues(common::build_cues(2));

    assert_eq!(store.generation(), generation + 1);
    assert_eq!(store.active_index(), None);
    assert_eq!(store.active_word_index(), None);
    assert_eq!(store.cues().len(), 2);
}

/// Test active index changes reset the word index
#[test]
fn test_set_active_index_withChange_shouldResetWordIndex() {
    let handle = common::store_with_cues(5);
    let mut store = handle.lock();

    store.set_active_index(Some(1));
    store.set_active_word_index(Some(4));
    store.set_active_index(Some(2));

    assert_eq!(store.active_word_index(), None);
}

/// Test reset restores defaults but preserves display preferences
#[test]
fn test_reset_withCustomDisplayPrefs_shouldPreserveThem() {
    let prefs = DisplayPrefs {
        word_highlighting: false,
        visible_languages: vec!["ja".to_string()],
        playback_rate: 0.75,
    };
    let mut store = PlaybackStore::new(prefs.clone(), 1.1);

    store.enable_shadowing();
    store.set_active_index(Some(0));
    store.set_current_time(42.0, false);
    store.reset();

    assert_eq!(*store.mode(), PlaybackMode::Free);
    assert_eq!(store.active_index(), None);
    assert!((store.current_time() - 0.0).abs() < 1e-9);
    assert_eq!(*store.display(), prefs);
}

/// Test store events are broadcast to subscribers
#[tokio::test]
async fn test_subscribe_withModeChange_shouldBroadcastEvent() {
    let handle = common::store_with_cues(5);
    let mut rx = handle.lock().subscribe();

    handle.lock().enable_shadowing();

    let event = rx.recv().await.unwrap();
    assert_eq!(event, StoreEvent::ModeChanged { kind: "shadowing".to_string() });
}

/// Test throttled time writes only notify when asked
#[tokio::test]
async fn test_set_current_time_withSilentWrite_shouldSkipNotification() {
    let handle = common::store_with_cues(5);
    let mut rx = handle.lock().subscribe();

    handle.lock().set_current_time(1.0, false);
    handle.lock().set_current_time(2.0, true);

    let event = rx.recv().await.unwrap();
    assert_eq!(event, StoreEvent::TimeChanged { time: 2.0 });
    assert!((handle.lock().current_time() - 2.0).abs() < 1e-9);
}
