/*!
 * # shadowsync
 *
 * A Rust library for subtitle-synchronized media playback, built for
 * language-learning practice drills.
 *
 * ## Features
 *
 * - Parse SRT and WebVTT subtitle text with format auto-detection
 * - Offload large parses to a background thread with progress reporting
 * - Resolve the active cue for any playback timestamp in O(log n),
 *   with a hint fast path for sequential playback
 * - Track playback state with strictly-mutually-exclusive practice
 *   modes: simple loop, segment loop, A/B repeat, shadowing
 * - Drive frame-by-frame synchronization against any media player
 *   through a narrow control trait
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `subtitle_parser`: Subtitle parsing and cue construction
 * - `language_utils`: Script classification and language tags
 * - `worker`: Background parse offload
 * - `cue_index`: Active-cue lookup
 * - `playback_store`: Playback mode state store
 * - `sync_driver`: Per-frame synchronization driver
 * - `player`: External player control boundary
 * - `errors`: Custom error types for the engine
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod cue_index;
pub mod errors;
pub mod language_utils;
pub mod playback_store;
pub mod player;
pub mod subtitle_parser;
pub mod sync_driver;
pub mod worker;

// Re-export main types for easier usage
pub use app_config::Config;
pub use cue_index::find_index_at_time;
pub use playback_store::{PlaybackMode, PlaybackStore, StoreEvent, StoreHandle};
pub use player::{MockPlayer, PlayerControl};
pub use subtitle_parser::{Cue, CueList, SubtitleFormat};
pub use sync_driver::{RunLevel, SyncDriver};
pub use worker::WorkerManager;
pub use errors::{AppError, ParseError, PlayerError, WorkerError};
