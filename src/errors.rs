/*!
 * Error types for the shadowsync engine.
 *
 * This module contains custom error types for different parts of the engine,
 * using the thiserror crate for ergonomic error definitions.
 */

// Allow dead code - error types are for library consumers
#![allow(dead_code)]

use thiserror::Error;

/// Errors that can occur while parsing subtitle text
#[derive(Error, Debug)]
pub enum ParseError {
    /// Error when a timestamp cannot be parsed
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Error when a cue has a non-positive time range
    #[error("Invalid time range: end {end} <= start {start}")]
    InvalidTimeRange {
        /// Cue start in seconds
        start: f64,
        /// Cue end in seconds
        end: f64,
    },

    /// Error when a cue has no text after markup stripping
    #[error("Empty cue text at block {0}")]
    EmptyText(usize),
}

/// Errors that can occur in the worker offload manager
#[derive(Error, Debug)]
pub enum WorkerError {
    /// The background parse did not complete within the fixed bound
    #[error("Worker parse timed out after {0} seconds")]
    Timeout(u64),

    /// The background thread reported a parse failure
    #[error("Worker parse failed: {0}")]
    ParseFailed(String),

    /// The manager was shut down while the request was in flight
    #[error("Worker manager terminated with requests pending")]
    Terminated,
}

/// Errors that can occur when talking to the external player
#[derive(Error, Debug)]
pub enum PlayerError {
    /// Error reading the current playback position
    #[error("Failed to read player time: {0}")]
    ReadFailed(String),

    /// Error issuing a playback control command
    #[error("Player command failed: {0}")]
    CommandFailed(String),
}

/// Main engine error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from subtitle parsing
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Error from the worker offload manager
    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    /// Error from the external player
    #[error("Player error: {0}")]
    Player(#[from] PlayerError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
