/*!
 * External player control boundary.
 *
 * The engine consumes, but never implements, a media player. This module
 * defines the narrow control surface the synchronization driver and the
 * playback store use to issue seek/pause/resume side effects, plus a mock
 * implementation used by the test suite.
 */

use std::fmt::Debug;

use crate::errors::PlayerError;

/// Control surface of the external media player
///
/// All engine side effects reach the player through this trait, allowing
/// hosts to bind whatever playback backend they embed. A driver with no
/// bound player treats every tick as a no-op.
pub trait PlayerControl: Send + Sync + Debug {
    /// Seek to an absolute position in seconds
    fn seek_to(&self, seconds: f64) -> Result<(), PlayerError>;

    /// Read the current playback position in seconds
    fn current_time(&self) -> Result<f64, PlayerError>;

    /// Resume playback
    fn play(&self) -> Result<(), PlayerError>;

    /// Pause playback
    fn pause(&self) -> Result<(), PlayerError>;

    /// Change the playback rate
    fn set_playback_rate(&self, rate: f64) -> Result<(), PlayerError>;
}

pub mod mock;

pub use mock::{MockPlayer, PlayerCommand};
