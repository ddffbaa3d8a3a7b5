/*!
 * Mock player implementation for testing.
 *
 * This module provides a scriptable player that records every control
 * command the engine issues:
 * - `MockPlayer::at(time)` - starts at a fixed position
 * - `MockPlayer::failing()` - every read and command fails
 */

use parking_lot::Mutex;
use std::sync::Arc;

use crate::errors::PlayerError;
use crate::player::PlayerControl;

/// A control command captured by the mock
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCommand {
    /// Seek to an absolute position
    SeekTo(f64),
    /// Resume playback
    Play,
    /// Pause playback
    Pause,
    /// Change the playback rate
    SetRate(f64),
}

/// Behavior mode for the mock player
#[derive(Debug, Clone, Copy, PartialEq)]
enum MockBehavior {
    /// Commands succeed and are recorded
    Working,
    /// Every read and command fails
    Failing,
}

/// Mock player for testing driver and store side effects
#[derive(Debug, Clone)]
pub struct MockPlayer {
    /// Current playback position, settable by tests
    time: Arc<Mutex<f64>>,
    /// Whether the simulated player is playing
    playing: Arc<Mutex<bool>>,
    /// Commands captured in issue order
    commands: Arc<Mutex<Vec<PlayerCommand>>>,
    /// Behavior mode
    behavior: MockBehavior,
}

impl MockPlayer {
    /// Create a working mock player positioned at zero
    pub fn new() -> Self {
        Self::at(0.0)
    }

    /// Create a working mock player at a fixed position
    pub fn at(time: f64) -> Self {
        Self {
            time: Arc::new(Mutex::new(time)),
            playing: Arc::new(Mutex::new(false)),
            commands: Arc::new(Mutex::new(Vec::new())),
            behavior: MockBehavior::Working,
        }
    }

    /// Create a mock player whose every operation fails
    pub fn failing() -> Self {
        Self {
            time: Arc::new(Mutex::new(0.0)),
            playing: Arc::new(Mutex::new(false)),
            commands: Arc::new(Mutex::new(Vec::new())),
            behavior: MockBehavior::Failing,
        }
    }

    /// Advance the simulated playback position
    pub fn set_time(&self, time: f64) {
        *self.time.lock() = time;
    }

    /// Whether the simulated player is currently playing
    pub fn is_playing(&self) -> bool {
        *self.playing.lock()
    }

    /// Snapshot of the captured commands
    pub fn commands(&self) -> Vec<PlayerCommand> {
        self.commands.lock().clone()
    }

    /// Drop all captured commands
    pub fn clear_commands(&self) {
        self.commands.lock().clear();
    }

    fn record(&self, command: PlayerCommand) -> Result<(), PlayerError> {
        if self.behavior == MockBehavior::Failing {
            return Err(PlayerError::CommandFailed("mock player failure".to_string()));
        }
        self.commands.lock().push(command);
        Ok(())
    }
}

impl Default for MockPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayerControl for MockPlayer {
    fn seek_to(&self, seconds: f64) -> Result<(), PlayerError> {
        self.record(PlayerCommand::SeekTo(seconds))?;
        *self.time.lock() = seconds;
        Ok(())
    }

    fn current_time(&self) -> Result<f64, PlayerError> {
        if self.behavior == MockBehavior::Failing {
            return Err(PlayerError::ReadFailed("mock player failure".to_string()));
        }
        Ok(*self.time.lock())
    }

    fn play(&self) -> Result<(), PlayerError> {
        self.record(PlayerCommand::Play)?;
        *self.playing.lock() = true;
        Ok(())
    }

    fn pause(&self) -> Result<(), PlayerError> {
        self.record(PlayerCommand::Pause)?;
        *self.playing.lock() = false;
        Ok(())
    }

    fn set_playback_rate(&self, rate: f64) -> Result<(), PlayerError> {
        self.record(PlayerCommand::SetRate(rate))
    }
}
