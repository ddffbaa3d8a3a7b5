/*!
 * Synchronization driver.
 *
 * The cooperative per-frame loop that keeps the playback store in step
 * with the external player: it reads the player clock, resolves the
 * active cue, advances word highlighting, evaluates shadowing pauses,
 * and applies loop/repeat boundary actions. The driver runs at one of
 * two levels - Active (frame-by-frame ticks while playing) and Idle
 * (a low-frequency poll that keeps the active index correct without
 * running the full pipeline).
 *
 * All scheduling state (resume deadlines, notification throttling) is
 * expressed against injected `Instant`s, so the whole tick pipeline is
 * testable without sleeping; `run` adapts it onto the tokio timer.
 */

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, warn};
use tokio::sync::watch;

use crate::app_config::{ShadowingConfig, SyncConfig};
use crate::cue_index;
use crate::language_utils;
use crate::playback_store::{PlaybackMode, StoreHandle};
use crate::player::PlayerControl;

/// Driver run level, derived from the store's playing flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunLevel {
    /// No per-frame work; a 100 ms poll keeps the index fresh
    Idle,
    /// Full tick pipeline once per scheduled frame
    Active,
}

/// A pending one-shot shadowing resume
#[derive(Debug, Clone)]
struct ResumeTimer {
    /// Deadline after which the resume fires
    due: Instant,
    /// Cue whose pause scheduled this resume
    cue_index: usize,
}

/// Compute the shadowing pause duration for a sentence
///
/// `duration` is the sentence length in seconds. The adaptive tier
/// (factor exactly 1.1) adds a one-second floor on top of the scaled
/// duration; the compact tier (factor <= 1.0) clamps to at least one
/// second; the relaxed tier clamps to at least 1.5 seconds.
pub fn shadowing_wait(duration: f64, pause_factor: f64) -> Duration {
    let base_ms = duration * 1000.0 * pause_factor;
    let wait_ms = if (pause_factor - 1.1).abs() < f64::EPSILON {
        duration * 1000.0 * 1.1 + 1000.0
    } else if pause_factor <= 1.0 {
        base_ms.max(1000.0)
    } else {
        base_ms.max(1500.0)
    };
    Duration::from_millis(wait_ms.round() as u64)
}

/// Synchronization driver
pub struct SyncDriver {
    /// Shared playback state
    store: StoreHandle,

    /// Bound external player; an unbound player makes every tick a no-op
    player: Option<Arc<dyn PlayerControl>>,

    /// Driver cadence and feature settings
    config: SyncConfig,

    /// Shadowing trigger settings
    shadowing: ShadowingConfig,

    /// Player time seen by the previous tick
    last_time: f64,

    /// When the store was last notified of a time change
    last_notify: Option<Instant>,

    /// Tokenized word lists memoized by cue id
    word_cache: HashMap<String, Arc<Vec<String>>>,

    /// Cue-list generation the cache was built against
    cache_generation: u64,

    /// Pending shadowing resume, if any
    pending_resume: Option<ResumeTimer>,

    /// Whether the practice session is blocked by a concurrent activity
    blocked: bool,
}

impl SyncDriver {
    /// Create a driver over a store handle
    pub fn new(store: StoreHandle, config: SyncConfig, shadowing: ShadowingConfig) -> Self {
        Self {
            store,
            player: None,
            config,
            shadowing,
            last_time: f64::NEG_INFINITY,
            last_notify: None,
            word_cache: HashMap::new(),
            cache_generation: 0,
            pending_resume: None,
            blocked: false,
        }
    }

    /// Bind the external player
    pub fn bind_player(&mut self, player: Arc<dyn PlayerControl>) {
        self.player = Some(player);
    }

    /// Current run level, derived from the store's playing flag
    pub fn run_level(&self) -> RunLevel {
        if self.store.lock().playing() {
            RunLevel::Active
        } else {
            RunLevel::Idle
        }
    }

    /// Whether a shadowing resume is pending
    pub fn has_pending_resume(&self) -> bool {
        self.pending_resume.is_some()
    }

    /// Block or unblock the practice session
    ///
    /// While blocked (e.g. a voice recording in progress) shadowing never
    /// schedules, and blocking cancels any pending resume.
    pub fn set_session_blocked(&mut self, blocked: bool) {
        self.blocked = blocked;
        if blocked && self.pending_resume.take().is_some() {
            debug!("Session blocked, canceling pending shadowing resume");
            self.store.lock().clear_shadowing_waiting();
        }
    }

    /// Cancel timers ahead of teardown
    pub fn shutdown(&mut self) {
        if self.pending_resume.take().is_some() {
            self.store.lock().clear_shadowing_waiting();
        }
    }

    /// Run one frame of the synchronization pipeline at the current
    /// wall-clock instant
    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    /// Run one frame of the synchronization pipeline
    pub fn tick_at(&mut self, now: Instant) {
        self.check_pending_resume(now);

        let Some(player) = self.player.clone() else {
            return;
        };

        // A single bad frame must not terminate synchronization
        let time = match player.current_time() {
            Ok(time) => time,
            Err(e) => {
                warn!("Skipping tick, failed to read player time: {}", e);
                return;
            }
        };

        // De-duplicate redundant frames from a stalled player
        if (time - self.last_time).abs() < self.config.min_time_delta {
            return;
        }
        self.last_time = time;

        self.write_time(time, now);
        let active = self.resolve_active_index(time);
        self.update_word_index(time, active);
        if self.evaluate_shadowing(time, active, now, &player) {
            // Pausing for shadowing supersedes boundary handling this frame
            return;
        }
        self.apply_boundary_action(time, &player);
    }

    /// Low-frequency poll while idle
    ///
    /// Keeps the active index and current time correct for
    /// index-dependent UI without running the full per-frame pipeline,
    /// and fires due resume timers (the player is paused during a
    /// shadowing wait, so the resume can only fire here).
    pub fn poll_idle_at(&mut self, now: Instant) {
        self.check_pending_resume(now);

        let Some(player) = self.player.clone() else {
            return;
        };
        let time = match player.current_time() {
            Ok(time) => time,
            Err(e) => {
                warn!("Skipping idle poll, failed to read player time: {}", e);
                return;
            }
        };

        self.write_time(time, now);
        self.resolve_active_index(time);
    }

    /// Store the latest time, notifying downstream at most every
    /// `time_notify_interval_ms`
    fn write_time(&mut self, time: f64, now: Instant) {
        let interval = Duration::from_millis(self.config.time_notify_interval_ms);
        let notify = match self.last_notify {
            Some(last) => now.duration_since(last) >= interval,
            None => true,
        };
        if notify {
            self.last_notify = Some(now);
        }
        self.store.lock().set_current_time(time, notify);
    }

    /// Resolve the active cue with the previous index as hint
    fn resolve_active_index(&mut self, time: f64) -> Option<usize> {
        let mut store = self.store.lock();
        let cues = store.cues();
        let hint = store.active_index();
        let index = cue_index::find_index_at_time(&cues, time, hint);
        if index != hint {
            store.set_active_index(index);
        }
        index
    }

    /// Compute the proportionally-sliced word index for the active cue
    fn update_word_index(&mut self, time: f64, active: Option<usize>) {
        if !self.config.word_highlighting {
            return;
        }
        let Some(index) = active else {
            return;
        };

        let mut store = self.store.lock();
        if !store.display().word_highlighting {
            return;
        }
        let cues = store.cues();
        let Some(cue) = cues.get(index) else {
            return;
        };

        // Word lists are tokenized once per cue and invalidated when the
        // cue list is replaced.
        if store.generation() != self.cache_generation {
            self.word_cache.clear();
            self.cache_generation = store.generation();
        }
        let words = self
            .word_cache
            .entry(cue.id.clone())
            .or_insert_with(|| Arc::new(language_utils::tokenize(&cue.text)))
            .clone();

        let word_count = words.len();
        if word_count == 0 {
            return;
        }
        let slice = cue.duration() / word_count as f64;
        let word_index = ((time - cue.start) / slice).floor() as i64;
        let clamped = word_index.clamp(0, word_count as i64 - 1) as usize;
        store.set_active_word_index(Some(clamped));
    }

    /// Pause at a sentence end and schedule the one-shot resume
    ///
    /// Returns true when a pause fired this frame.
    fn evaluate_shadowing(
        &mut self,
        time: f64,
        active: Option<usize>,
        now: Instant,
        player: &Arc<dyn PlayerControl>,
    ) -> bool {
        if self.blocked {
            return false;
        }

        let mut store = self.store.lock();
        let PlaybackMode::Shadowing { pause_factor, waiting_for_resume, last_triggered_cue_index } =
            *store.mode()
        else {
            return false;
        };
        if waiting_for_resume {
            return false;
        }
        let Some(index) = active else {
            return false;
        };
        if last_triggered_cue_index == Some(index) {
            return false;
        }

        let cues = store.cues();
        let Some(cue) = cues.get(index) else {
            return false;
        };
        if time < cue.end - self.shadowing.trigger_lead {
            return false;
        }

        if let Err(e) = player.pause() {
            warn!("Shadowing pause failed: {}", e);
            return false;
        }
        store.set_playing(false);
        store.mark_shadowing_waiting(index);

        let wait = shadowing_wait(cue.duration(), pause_factor);
        debug!("Shadowing pause at cue {} for {:?}", index, wait);
        self.pending_resume = Some(ResumeTimer { due: now + wait, cue_index: index });
        true
    }

    /// Fire or cancel the pending shadowing resume
    fn check_pending_resume(&mut self, now: Instant) {
        let Some(timer) = self.pending_resume.clone() else {
            return;
        };

        {
            let store = self.store.lock();
            // Disabling shadowing cancels the timer
            if !matches!(store.mode(), PlaybackMode::Shadowing { .. }) {
                drop(store);
                self.pending_resume = None;
                return;
            }
        }

        if now < timer.due {
            return;
        }
        self.pending_resume = None;

        let mut store = self.store.lock();
        store.clear_shadowing_waiting();

        let cues = store.cues();
        let next_index = timer.cue_index + 1;
        let Some(next) = cues.get(next_index) else {
            debug!("Shadowing resume at last cue, staying paused");
            return;
        };
        let next_start = next.start;
        drop(store);

        let Some(player) = self.player.clone() else {
            return;
        };
        if let Err(e) = player.seek_to(next_start) {
            warn!("Shadowing resume seek failed: {}", e);
            return;
        }
        if let Err(e) = player.play() {
            warn!("Shadowing resume play failed: {}", e);
            return;
        }
        self.store.lock().set_playing(true);
        debug!("Shadowing resumed at cue {}", next_index);
    }

    /// Evaluate loop/repeat boundaries in strict precedence order
    ///
    /// A/B repeat outranks segment-loop handling, which outranks the
    /// simple loop; at most one boundary action fires per tick.
    fn apply_boundary_action(&mut self, time: f64, player: &Arc<dyn PlayerControl>) {
        let mode = self.store.lock().mode().clone();
        match mode {
            PlaybackMode::AbRepeat { point_a: Some(a), point_b: Some(b) } => {
                if time >= b || time < a {
                    if let Err(e) = player.seek_to(a) {
                        warn!("A/B repeat seek failed: {}", e);
                    }
                    self.last_time = a;
                }
            }
            PlaybackMode::SegmentLoop { start, end, total_reps, completed_reps, cue_index } => {
                if time >= end {
                    self.segment_loop_boundary(
                        start,
                        total_reps,
                        completed_reps,
                        cue_index,
                        player,
                    );
                }
            }
            PlaybackMode::SimpleLoop { start, end } => {
                if time >= end {
                    if let Err(e) = player.seek_to(start) {
                        warn!("Simple loop seek failed: {}", e);
                    }
                    self.last_time = start;
                }
            }
            _ => {}
        }
    }

    /// Handle a segment-loop end crossing
    fn segment_loop_boundary(
        &mut self,
        start: f64,
        total_reps: u32,
        completed_reps: u32,
        cue_index: usize,
        player: &Arc<dyn PlayerControl>,
    ) {
        if completed_reps < total_reps.saturating_sub(1) {
            if let Err(e) = player.seek_to(start) {
                warn!("Segment loop seek failed: {}", e);
                return;
            }
            self.last_time = start;
            self.store.lock().increment_segment_loop_rep();
            return;
        }

        // Final repetition finished
        let mut store = self.store.lock();
        store.clear_segment_loop();
        let cues = store.cues();
        let next = cues.get(cue_index + 1).map(|cue| cue.start);
        drop(store);

        match next {
            Some(next_start) if self.config.segment_auto_advance => {
                if let Err(e) = player.seek_to(next_start) {
                    warn!("Segment loop advance seek failed: {}", e);
                }
                self.last_time = next_start;
            }
            _ => {
                if let Err(e) = player.pause() {
                    warn!("Segment loop pause failed: {}", e);
                }
                self.store.lock().set_playing(false);
            }
        }
    }

    /// Drive the tick loop on the tokio timer until `shutdown` flips
    ///
    /// Frame-interval cadence while Active, the idle poll interval while
    /// Idle. The run-level transition is just the store's playing flag
    /// observed each iteration.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let frame = Duration::from_millis(self.config.frame_interval_ms);
        let idle = Duration::from_millis(self.config.idle_poll_ms);

        loop {
            let level = self.run_level();
            let wait = match level {
                RunLevel::Active => frame,
                RunLevel::Idle => idle,
            };

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = tokio::time::sleep(wait) => {
                    let now = Instant::now();
                    match level {
                        RunLevel::Active => self.tick_at(now),
                        RunLevel::Idle => self.poll_idle_at(now),
                    }
                }
            }
        }

        self.shutdown();
        debug!("Synchronization driver stopped");
    }
}
