/*!
 * Tests for active-cue lookup
 */

use rand::Rng;
use shadowsync::cue_index::{binary_search_at_time, find_index_at_time};
use crate::common;

/// Test lookup inside cues, in gaps, and outside the full range
#[test]
fn test_find_index_at_time_withGappedCues_shouldResolveContainment() {
    let cues = common::build_cues(5);

    assert_eq!(find_index_at_time(&cues, 0.2, None), Some(0));
    assert_eq!(find_index_at_time(&cues, 3.4, None), Some(2));
    // Gap between cue 0 ([0,1)) and cue 1 ([1.5,2.5))
    assert_eq!(find_index_at_time(&cues, 1.2, None), None);
    assert_eq!(find_index_at_time(&cues, -0.5, None), None);
    assert_eq!(find_index_at_time(&cues, 100.0, None), None);
}

/// Test the hint fast path for monotonically advancing playback
#[test]
fn test_find_index_at_time_withSequentialHints_shouldFollowPlayback() {
    let cues = common::build_cues(5);

    // Still inside the hinted cue
    assert_eq!(find_index_at_time(&cues, 0.9, Some(0)), Some(0));
    // Advanced into the successor
    assert_eq!(find_index_at_time(&cues, 1.6, Some(0)), Some(1));
    // In the gap between hint and successor: short-circuits to none
    assert_eq!(find_index_at_time(&cues, 1.1, Some(0)), None);
}

/// Test out-of-range hints fall back to the search
#[test]
fn test_find_index_at_time_withInvalidHint_shouldStillResolve() {
    let cues = common::build_cues(5);

    assert_eq!(find_index_at_time(&cues, 3.2, Some(999)), Some(2));
    assert_eq!(find_index_at_time(&cues, 3.2, Some(4)), Some(2));
}

/// Test the required equivalence property between both lookup paths
#[test]
fn test_find_index_at_time_withRandomTimesAndHints_shouldMatchBinarySearch() {
    let cues = common::build_cues(40);
    let max_time = cues.last().unwrap().end + 3.0;
    let mut rng = rand::rng();

    for _ in 0..5000 {
        let time = rng.random_range(-2.0..max_time);
        let hint = if rng.random_bool(0.5) {
            Some(rng.random_range(0..60))
        } else {
            None
        };
        assert_eq!(
            find_index_at_time(&cues, time, hint),
            binary_search_at_time(&cues, time),
            "mismatch at time={} hint={:?}",
            time,
            hint
        );
    }
}

/// Test lookup against parsed rather than synthetic cues
#[test]
fn test_find_index_at_time_withParsedSrt_shouldMatchTimestamps() {
    let cues = shadowsync::subtitle_parser::parse(common::sample_srt(), None);

    assert_eq!(find_index_at_time(&cues, 2.0, None), Some(0));
    assert_eq!(find_index_at_time(&cues, 4.5, Some(0)), None);
    assert_eq!(find_index_at_time(&cues, 12.0, Some(1)), Some(2));
}
