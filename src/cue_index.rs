/*!
 * Active-cue lookup.
 *
 * Maps a playback timestamp to the cue whose time range contains it,
 * using a hint fast path for the sequential-playback common case and a
 * binary search fallback. A timestamp in a gap between cues, or outside
 * the cue range entirely, resolves to no active cue.
 */

use crate::subtitle_parser::Cue;

/// Whether a cue's time range contains `time`
#[inline]
fn contains(cue: &Cue, time: f64) -> bool {
    cue.start <= time && time < cue.end
}

/// Find the index of the cue active at `time`, or None if no cue
/// contains it
///
/// `hint` is the previously known active index. The hinted cue and its
/// successor are tested first; when `time` falls in the gap between them
/// the lookup short-circuits to None without a full search. Any other
/// outcome falls back to `binary_search_at_time`.
pub fn find_index_at_time(cues: &[Cue], time: f64, hint: Option<usize>) -> Option<usize> {
    if cues.is_empty() || !time.is_finite() {
        return None;
    }

    if let Some(h) = hint {
        if h < cues.len() {
            if contains(&cues[h], time) {
                return Some(h);
            }
            if h + 1 < cues.len() {
                if contains(&cues[h + 1], time) {
                    return Some(h + 1);
                }
                // Silent gap between the hinted cue and its successor
                if time >= cues[h].end && time < cues[h + 1].start {
                    return None;
                }
            }
        }
    }

    binary_search_at_time(cues, time)
}

/// From-scratch binary search over cue start/end bounds, O(log n)
///
/// Locates the latest-starting cue at or before `time` and checks
/// containment; never guesses a nearest cue when none contains `time`.
pub fn binary_search_at_time(cues: &[Cue], time: f64) -> Option<usize> {
    if cues.is_empty() || !time.is_finite() {
        return None;
    }

    let candidates = cues.partition_point(|cue| cue.start <= time);
    if candidates == 0 {
        return None;
    }

    let idx = candidates - 1;
    if contains(&cues[idx], time) {
        Some(idx)
    } else {
        None
    }
}
