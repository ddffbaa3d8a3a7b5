/*!
 * Playback mode state store.
 *
 * Owns the engine's per-session playback state: the current time, the
 * active cue and word indices, the loaded cue list, and exactly one
 * active playback mode. Mode exclusivity is enforced here, by the enable
 * operations themselves - the synchronization driver never arbitrates
 * between modes, it only reads whichever single mode is active.
 *
 * The store is the only sanctioned mutation surface for external
 * collaborators; UI code subscribes to change events and calls the
 * enable/disable/toggle operations, nothing else.
 */

use std::sync::Arc;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::app_config::DisplayPrefs;
use crate::player::PlayerControl;
use crate::subtitle_parser::CueList;

/// Capacity of the store's event channel
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Bounds for the shadowing pause factor
const MIN_PAUSE_FACTOR: f64 = 0.5;
const MAX_PAUSE_FACTOR: f64 = 3.0;

/// The single active playback-practice behavior
///
/// At most one non-`Free` variant is active at any time; every enable
/// operation disables whichever mode is currently active as its first
/// effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PlaybackMode {
    /// Normal playback, no practice behavior
    Free,

    /// Loop between two fixed points until disabled
    SimpleLoop {
        /// Loop start in seconds
        start: f64,
        /// Loop end in seconds
        end: f64,
    },

    /// Repeat one cue a fixed number of times
    SegmentLoop {
        /// Loop start in seconds
        start: f64,
        /// Loop end in seconds
        end: f64,
        /// Requested repetitions
        total_reps: u32,
        /// Repetitions completed so far, incremented only by the
        /// driver's boundary-crossing detection
        completed_reps: u32,
        /// Index of the cue being repeated
        cue_index: usize,
    },

    /// Repeat between two user-set points
    ///
    /// The repeat boundary only fires once both points are set.
    AbRepeat {
        /// Point A in seconds
        point_a: Option<f64>,
        /// Point B in seconds, strictly greater than point A
        point_b: Option<f64>,
    },

    /// Pause after each sentence for a computed duration, then advance
    Shadowing {
        /// Pause duration multiplier over the sentence duration
        pause_factor: f64,
        /// Whether a resume timer is pending
        waiting_for_resume: bool,
        /// Cue that last triggered a pause, so one cue pauses once
        last_triggered_cue_index: Option<usize>,
    },
}

impl PlaybackMode {
    /// Short name for logging and events
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::SimpleLoop { .. } => "simple_loop",
            Self::SegmentLoop { .. } => "segment_loop",
            Self::AbRepeat { .. } => "ab_repeat",
            Self::Shadowing { .. } => "shadowing",
        }
    }
}

/// Change notifications emitted by the store
///
/// Delivered on a broadcast channel so any number of UI collaborators can
/// observe state without polling. Time notifications are throttled by the
/// driver, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StoreEvent {
    /// The current playback time advanced
    TimeChanged {
        /// Latest time in seconds
        time: f64,
    },
    /// A different cue became active (or none is)
    ActiveCueChanged {
        /// New active cue index
        index: Option<usize>,
    },
    /// The highlighted word moved within the active cue
    WordIndexChanged {
        /// New active word index
        index: Option<usize>,
    },
    /// The active playback mode changed
    ModeChanged {
        /// Kind of the mode now active
        kind: String,
    },
    /// The playing flag flipped
    PlayingChanged {
        /// Whether playback is running
        playing: bool,
    },
    /// The cue list was replaced wholesale
    CuesReplaced {
        /// Generation counter after the replacement
        generation: u64,
    },
}

/// Shared handle to the store
///
/// The host is cooperative, so the lock is uncontended by construction;
/// it exists to satisfy aliasing, and to make each enable operation
/// atomic with respect to its exclusivity check.
pub type StoreHandle = Arc<parking_lot::Mutex<PlaybackStore>>;

/// Playback state store
#[derive(Debug)]
pub struct PlaybackStore {
    /// Loaded cue list, replaced wholesale on a new subtitle load
    cues: Arc<CueList>,

    /// Bumped on every cue-list replacement; caches keyed by cue id
    /// check this to invalidate
    generation: u64,

    /// Latest playback time written by the driver
    current_time: f64,

    /// Index of the cue containing the current time
    active_index: Option<usize>,

    /// Index of the highlighted word within the active cue
    active_word_index: Option<usize>,

    /// Whether the external player is playing
    playing: bool,

    /// The single active playback mode
    mode: PlaybackMode,

    /// Default pause factor applied when shadowing is enabled
    default_pause_factor: f64,

    /// User display preferences, preserved across `reset`
    display: DisplayPrefs,

    /// Bound external player, None until a host attaches one
    player: Option<Arc<dyn PlayerControl>>,

    /// Change notification channel
    events: broadcast::Sender<StoreEvent>,
}

impl PlaybackStore {
    /// Create a store with the given display preferences and shadowing
    /// default
    pub fn new(display: DisplayPrefs, default_pause_factor: f64) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            cues: Arc::new(Vec::new()),
            generation: 0,
            current_time: 0.0,
            active_index: None,
            active_word_index: None,
            playing: false,
            mode: PlaybackMode::Free,
            default_pause_factor,
            display,
            player: None,
            events,
        }
    }

    /// Create a store handle with default preferences
    pub fn handle() -> StoreHandle {
        Arc::new(parking_lot::Mutex::new(Self::new(
            DisplayPrefs::default(),
            crate::app_config::ShadowingConfig::default().pause_factor,
        )))
    }

    /// Bind the external player used for mode side effects
    ///
    /// Applies the user's preferred playback rate when it differs from
    /// the player default.
    pub fn bind_player(&mut self, player: Arc<dyn PlayerControl>) {
        if (self.display.playback_rate - 1.0).abs() > f64::EPSILON {
            if let Err(e) = player.set_playback_rate(self.display.playback_rate) {
                warn!("Failed to apply preferred playback rate: {}", e);
            }
        }
        self.player = Some(player);
    }

    /// Subscribe to change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: StoreEvent) {
        // Nobody listening is fine
        let _ = self.events.send(event);
    }

    // ---- read accessors -------------------------------------------------

    /// The loaded cue list
    pub fn cues(&self) -> Arc<CueList> {
        Arc::clone(&self.cues)
    }

    /// Cue-list generation counter
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Latest playback time in seconds
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// Index of the active cue, if any
    pub fn active_index(&self) -> Option<usize> {
        self.active_index
    }

    /// Index of the highlighted word, if any
    pub fn active_word_index(&self) -> Option<usize> {
        self.active_word_index
    }

    /// Whether the external player is playing
    pub fn playing(&self) -> bool {
        self.playing
    }

    /// The active playback mode
    pub fn mode(&self) -> &PlaybackMode {
        &self.mode
    }

    /// User display preferences
    pub fn display(&self) -> &DisplayPrefs {
        &self.display
    }

    // ---- driver-facing mutation -----------------------------------------

    /// Replace the cue list wholesale
    ///
    /// Resets cue tracking and bumps the generation counter so word-list
    /// caches keyed by cue id invalidate.
    pub fn replace_cues(&mut self, cues: CueList) {
        self.cues = Arc::new(cues);
        self.generation += 1;
        self.active_index = None;
        self.active_word_index = None;
        let generation = self.generation;
        debug!("Cue list replaced: {} cues, generation {}", self.cues.len(), generation);
        self.emit(StoreEvent::CuesReplaced { generation });
    }

    /// Write the latest playback time, optionally notifying subscribers
    ///
    /// The driver stores every new value but notifies at most every
    /// 100 ms; discrete user seeks notify unconditionally.
    pub fn set_current_time(&mut self, time: f64, notify: bool) {
        self.current_time = time;
        if notify {
            self.emit(StoreEvent::TimeChanged { time });
        }
    }

    /// Write the active cue index; resets the word index on change
    pub fn set_active_index(&mut self, index: Option<usize>) {
        if self.active_index == index {
            return;
        }
        self.active_index = index;
        self.active_word_index = None;
        self.emit(StoreEvent::ActiveCueChanged { index });
    }

    /// Write the active word index
    pub fn set_active_word_index(&mut self, index: Option<usize>) {
        if self.active_word_index == index {
            return;
        }
        self.active_word_index = index;
        self.emit(StoreEvent::WordIndexChanged { index });
    }

    /// Flip the playing flag; the driver observes this to switch run
    /// levels
    pub fn set_playing(&mut self, playing: bool) {
        if self.playing == playing {
            return;
        }
        self.playing = playing;
        self.emit(StoreEvent::PlayingChanged { playing });
    }

    // ---- mode operations ------------------------------------------------

    /// Disable whichever mode is active; idempotent from `Free`
    fn disable_active_mode(&mut self) {
        if self.mode != PlaybackMode::Free {
            debug!("Disabling {} mode", self.mode.kind());
            self.set_mode(PlaybackMode::Free);
        }
    }

    fn set_mode(&mut self, mode: PlaybackMode) {
        let kind = mode.kind().to_string();
        self.mode = mode;
        self.emit(StoreEvent::ModeChanged { kind });
    }

    /// Enable a simple loop over explicit bounds
    ///
    /// Returns false and leaves state unchanged on degenerate bounds.
    pub fn enable_simple_loop(&mut self, start: f64, end: f64) -> bool {
        if !start.is_finite() || !end.is_finite() || end <= start {
            warn!("Rejected simple loop with bounds {}..{}", start, end);
            return false;
        }
        self.disable_active_mode();
        self.set_mode(PlaybackMode::SimpleLoop { start, end });
        true
    }

    /// Disable the simple loop if one is active
    pub fn disable_simple_loop(&mut self) {
        if matches!(self.mode, PlaybackMode::SimpleLoop { .. }) {
            self.set_mode(PlaybackMode::Free);
        }
    }

    /// Toggle the simple loop
    ///
    /// Toggling on without explicit bounds uses the bounds of the
    /// currently active cue; a no-op when no cue is active.
    pub fn toggle_simple_loop(&mut self) {
        if matches!(self.mode, PlaybackMode::SimpleLoop { .. }) {
            self.disable_simple_loop();
            return;
        }
        let Some(index) = self.active_index else {
            debug!("Simple loop toggle ignored: no active cue");
            return;
        };
        let Some(cue) = self.cues.get(index) else {
            return;
        };
        let (start, end) = (cue.start, cue.end);
        self.enable_simple_loop(start, end);
    }

    /// Start a segment loop over one cue
    ///
    /// Seeks the bound player to `start` immediately, resets the
    /// completed count, and preserves the caller's play/pause intent.
    pub fn start_segment_loop(
        &mut self,
        start: f64,
        end: f64,
        total_reps: u32,
        cue_index: usize,
    ) -> bool {
        if !start.is_finite() || !end.is_finite() || end <= start || total_reps == 0 {
            warn!("Rejected segment loop with bounds {}..{} reps {}", start, end, total_reps);
            return false;
        }
        self.disable_active_mode();
        if let Some(player) = &self.player {
            if let Err(e) = player.seek_to(start) {
                warn!("Segment loop seek failed: {}", e);
            }
        }
        self.set_mode(PlaybackMode::SegmentLoop {
            start,
            end,
            total_reps,
            completed_reps: 0,
            cue_index,
        });
        true
    }

    /// Record one completed segment-loop repetition
    ///
    /// Called only by the driver on boundary crossing.
    pub fn increment_segment_loop_rep(&mut self) {
        if let PlaybackMode::SegmentLoop { completed_reps, .. } = &mut self.mode {
            *completed_reps += 1;
        }
    }

    /// Clear the segment loop if one is active
    pub fn clear_segment_loop(&mut self) {
        if matches!(self.mode, PlaybackMode::SegmentLoop { .. }) {
            self.set_mode(PlaybackMode::Free);
        }
    }

    /// Set repeat point A
    ///
    /// Rejects negative or NaN times, leaving state unchanged. Entering
    /// point A switches the store into A/B mode (disabling any other
    /// mode); the repeat boundary stays dormant until point B is set.
    pub fn set_point_a(&mut self, time: f64) -> bool {
        if !time.is_finite() || time < 0.0 {
            warn!("Rejected point A at {}", time);
            return false;
        }
        if let PlaybackMode::AbRepeat { point_b, .. } = self.mode {
            // Re-anchoring A above an existing B would invert the range
            if let Some(b) = point_b {
                if time >= b {
                    warn!("Rejected point A at {} >= point B {}", time, b);
                    return false;
                }
            }
            self.set_mode(PlaybackMode::AbRepeat { point_a: Some(time), point_b });
        } else {
            self.disable_active_mode();
            self.set_mode(PlaybackMode::AbRepeat { point_a: Some(time), point_b: None });
        }
        true
    }

    /// Set repeat point B
    ///
    /// Rejects negative or NaN times, and any value not strictly greater
    /// than point A; rejects when point A is unset. A valid point B
    /// auto-enables the repeat.
    pub fn set_point_b(&mut self, time: f64) -> bool {
        if !time.is_finite() || time < 0.0 {
            warn!("Rejected point B at {}", time);
            return false;
        }
        let PlaybackMode::AbRepeat { point_a: Some(a), .. } = self.mode else {
            warn!("Rejected point B at {}: point A not set", time);
            return false;
        };
        if time <= a {
            warn!("Rejected point B at {} <= point A {}", time, a);
            return false;
        }
        self.set_mode(PlaybackMode::AbRepeat { point_a: Some(a), point_b: Some(time) });
        true
    }

    /// Clear the A/B repeat if one is staged or active
    pub fn clear_ab_repeat(&mut self) {
        if matches!(self.mode, PlaybackMode::AbRepeat { .. }) {
            self.set_mode(PlaybackMode::Free);
        }
    }

    /// Enable shadowing with the stored pause factor
    pub fn enable_shadowing(&mut self) {
        self.disable_active_mode();
        self.set_mode(PlaybackMode::Shadowing {
            pause_factor: self.default_pause_factor,
            waiting_for_resume: false,
            last_triggered_cue_index: None,
        });
    }

    /// Disable shadowing if active
    pub fn disable_shadowing(&mut self) {
        if matches!(self.mode, PlaybackMode::Shadowing { .. }) {
            self.set_mode(PlaybackMode::Free);
        }
    }

    /// Flip shadowing based on the current state
    pub fn toggle_shadowing(&mut self) {
        if matches!(self.mode, PlaybackMode::Shadowing { .. }) {
            self.disable_shadowing();
        } else {
            self.enable_shadowing();
        }
    }

    /// Change the shadowing pause factor, clamped to a sane range
    ///
    /// Applies to the live mode when shadowing is active and to future
    /// enables either way.
    pub fn set_shadowing_pause_factor(&mut self, factor: f64) {
        if !factor.is_finite() {
            warn!("Rejected non-finite shadowing pause factor");
            return;
        }
        let clamped = factor.clamp(MIN_PAUSE_FACTOR, MAX_PAUSE_FACTOR);
        self.default_pause_factor = clamped;
        if let PlaybackMode::Shadowing { pause_factor, .. } = &mut self.mode {
            *pause_factor = clamped;
        }
    }

    /// Mark a shadowing pause as pending for a cue
    ///
    /// Driver-only: records which cue triggered so it pauses once.
    pub fn mark_shadowing_waiting(&mut self, cue_index: usize) {
        if let PlaybackMode::Shadowing { waiting_for_resume, last_triggered_cue_index, .. } =
            &mut self.mode
        {
            *waiting_for_resume = true;
            *last_triggered_cue_index = Some(cue_index);
        }
    }

    /// Clear a pending shadowing pause
    pub fn clear_shadowing_waiting(&mut self) {
        if let PlaybackMode::Shadowing { waiting_for_resume, .. } = &mut self.mode {
            *waiting_for_resume = false;
        }
    }

    /// Restore mode and cue-tracking fields to defaults
    ///
    /// Display preferences survive; they belong to the user, not the
    /// session.
    pub fn reset(&mut self) {
        self.set_mode(PlaybackMode::Free);
        self.set_active_index(None);
        self.current_time = 0.0;
        self.playing = false;
        self.default_pause_factor = crate::app_config::ShadowingConfig::default().pause_factor;
    }
}
