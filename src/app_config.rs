use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::Path;

/// Engine configuration module
/// This module handles the engine configuration including loading,
/// validating and saving configuration settings.
/// Represents the engine configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Synchronization driver settings
    #[serde(default)]
    pub sync: SyncConfig,

    /// Worker offload settings
    #[serde(default)]
    pub worker: WorkerConfig,

    /// Shadowing practice settings
    #[serde(default)]
    pub shadowing: ShadowingConfig,

    /// User display preferences (preserved across store resets)
    #[serde(default)]
    pub display: DisplayPrefs,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Synchronization driver configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SyncConfig {
    /// Frame interval in milliseconds while playback is active
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,

    /// Poll interval in milliseconds while playback is idle
    #[serde(default = "default_idle_poll_ms")]
    pub idle_poll_ms: u64,

    /// Minimum player-time delta treated as a new frame, in seconds
    #[serde(default = "default_min_time_delta")]
    pub min_time_delta: f64,

    /// Minimum interval between downstream time notifications, in milliseconds
    #[serde(default = "default_time_notify_interval_ms")]
    pub time_notify_interval_ms: u64,

    /// Whether the driver computes per-word highlight indices
    #[serde(default = "default_true")]
    pub word_highlighting: bool,

    /// Whether a finished segment loop advances to the next cue
    /// instead of pausing
    #[serde(default = "default_true")]
    pub segment_auto_advance: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: default_frame_interval_ms(),
            idle_poll_ms: default_idle_poll_ms(),
            min_time_delta: default_min_time_delta(),
            time_notify_interval_ms: default_time_notify_interval_ms(),
            word_highlighting: true,
            segment_auto_advance: true,
        }
    }
}

/// Worker offload configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WorkerConfig {
    /// Payload size in bytes at or above which parsing is offloaded
    /// to the background thread
    #[serde(default = "default_offload_threshold_bytes")]
    pub offload_threshold_bytes: usize,

    /// Timeout for a single offloaded parse request, in seconds
    #[serde(default = "default_worker_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            offload_threshold_bytes: default_offload_threshold_bytes(),
            timeout_secs: default_worker_timeout_secs(),
        }
    }
}

/// Shadowing practice configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ShadowingConfig {
    /// Pause duration multiplier applied to the sentence duration
    #[serde(default = "default_pause_factor")]
    pub pause_factor: f64,

    /// Seconds before a cue's end at which the shadowing pause triggers
    #[serde(default = "default_trigger_lead")]
    pub trigger_lead: f64,
}

impl Default for ShadowingConfig {
    fn default() -> Self {
        Self {
            pause_factor: default_pause_factor(),
            trigger_lead: default_trigger_lead(),
        }
    }
}

/// User display preferences
///
/// These survive `PlaybackStore::reset()` - they describe how the user wants
/// subtitles shown, not what the engine is currently doing.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DisplayPrefs {
    /// Whether word-level highlighting is shown
    #[serde(default = "default_true")]
    pub word_highlighting: bool,

    /// Language tags the user wants rendered, in display order
    #[serde(default = "default_visible_languages")]
    pub visible_languages: Vec<String>,

    /// Preferred playback rate
    #[serde(default = "default_playback_rate")]
    pub playback_rate: f64,
}

impl Default for DisplayPrefs {
    fn default() -> Self {
        Self {
            word_highlighting: true,
            visible_languages: default_visible_languages(),
            playback_rate: default_playback_rate(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_frame_interval_ms() -> u64 {
    33
}

fn default_idle_poll_ms() -> u64 {
    100
}

fn default_min_time_delta() -> f64 {
    0.01
}

fn default_time_notify_interval_ms() -> u64 {
    100
}

fn default_offload_threshold_bytes() -> usize {
    100 * 1024
}

fn default_worker_timeout_secs() -> u64 {
    30
}

fn default_pause_factor() -> f64 {
    1.1
}

fn default_trigger_lead() -> f64 {
    0.1
}

fn default_playback_rate() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

fn default_visible_languages() -> Vec<String> {
    vec!["en".to_string(), "zh".to_string()]
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)
            .context("Failed to serialize configuration")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.sync.frame_interval_ms == 0 {
            return Err(anyhow!("frame_interval_ms must be greater than zero"));
        }
        if self.sync.idle_poll_ms == 0 {
            return Err(anyhow!("idle_poll_ms must be greater than zero"));
        }
        if !self.sync.min_time_delta.is_finite() || self.sync.min_time_delta < 0.0 {
            return Err(anyhow!("min_time_delta must be a non-negative number"));
        }
        if !self.shadowing.pause_factor.is_finite() || self.shadowing.pause_factor <= 0.0 {
            return Err(anyhow!("shadowing pause_factor must be positive"));
        }
        if self.worker.timeout_secs == 0 {
            return Err(anyhow!("worker timeout_secs must be greater than zero"));
        }
        for tag in &self.display.visible_languages {
            crate::language_utils::validate_language_tag(tag)?;
        }
        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            sync: SyncConfig::default(),
            worker: WorkerConfig::default(),
            shadowing: ShadowingConfig::default(),
            display: DisplayPrefs::default(),
            log_level: LogLevel::default(),
        }
    }
}
