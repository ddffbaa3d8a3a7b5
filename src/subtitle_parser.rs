use std::collections::BTreeMap;
use std::fmt;
use regex::Regex;
use once_cell::sync::Lazy;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::errors::ParseError;
use crate::language_utils;

// @module: Subtitle parsing and cue construction

// @const: Cue timing line regex, both millisecond delimiters
static TIMING_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{2}):(\d{2}):(\d{2})[.,](\d{3})\s*-->\s*(\d{2}):(\d{2}):(\d{2})[.,](\d{3})")
        .unwrap()
});

// @const: Single timestamp regex
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{2}):(\d{2}):(\d{2})[.,](\d{3})$").unwrap()
});

// @const: Inline per-word timestamp tags, e.g. <00:00:01.500>
static INLINE_TIMESTAMP_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<\d{2}:\d{2}:\d{2}[.,]\d{3}>").unwrap()
});

// @const: Voice/speaker tags, e.g. <v Roger> ... </v>
static VOICE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?v[^>]*>").unwrap());

// @const: Style and class tags, e.g. <c.yellow>, <b>, <i>, <ruby>
static STYLE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"</?(c|b|i|u|ruby|rt|lang)[^>]*>").unwrap());

// @const: Any remaining angle-bracket tag
static ANGLE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

// @const: Runs of whitespace
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

// @const: SRT block index line
static INDEX_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\s*$").unwrap());

/// How often the progress callback fires, in parsed blocks
const PROGRESS_EVERY_BLOCKS: usize = 50;

/// Subtitle text format, detected from the input header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtitleFormat {
    /// Numbered blocks, comma millisecond delimiter
    Srt,
    /// WEBVTT header, dot millisecond delimiter, inline markup
    Vtt,
    /// Unrecognized header; parses to an empty cue list
    Unknown,
}

impl fmt::Display for SubtitleFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Srt => write!(f, "srt"),
            Self::Vtt => write!(f, "vtt"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

// @struct: Single subtitle cue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cue {
    // @field: Deterministic id derived from the ordinal
    pub id: String,

    // @field: Ordinal among successfully parsed blocks
    pub index: usize,

    // @field: Start time in seconds
    pub start: f64,

    // @field: End time in seconds
    pub end: f64,

    // @field: Cue text, markup stripped, lines joined by newline
    pub text: String,

    // @field: Per-language text buckets keyed by ISO 639-1 tag
    pub languages: BTreeMap<String, String>,
}

/// Ordered list of cues produced by one parse
pub type CueList = Vec<Cue>;

impl Cue {
    /// Creates a cue without validation - used by tests and benches
    #[allow(dead_code)]
    pub fn new(index: usize, start: f64, end: f64, text: String) -> Self {
        let lines: Vec<String> = text.lines().map(|l| l.to_string()).collect();
        let languages = build_language_map(&lines);
        Cue {
            id: format!("cue-{}", index),
            index,
            start,
            end,
            text,
            languages,
        }
    }

    // @creates: Validated cue
    // @validates: Positive-width time range and non-empty text
    pub fn new_validated(
        index: usize,
        start: f64,
        end: f64,
        lines: Vec<String>,
    ) -> Result<Self, ParseError> {
        if end <= start {
            return Err(ParseError::InvalidTimeRange { start, end });
        }

        let lines: Vec<String> = lines
            .into_iter()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();
        if lines.is_empty() {
            return Err(ParseError::EmptyText(index));
        }

        let languages = build_language_map(&lines);
        Ok(Cue {
            id: format!("cue-{}", index),
            index,
            start,
            end,
            text: lines.join("\n"),
            languages,
        })
    }

    /// Cue duration in seconds
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Text bucket for a language tag
    pub fn language(&self, tag: &str) -> Option<&str> {
        self.languages.get(tag).map(|s| s.as_str())
    }

    /// Legacy accessor over the `en` bucket
    pub fn english_text(&self) -> Option<&str> {
        self.language("en")
    }

    /// Legacy accessor over the `zh` bucket
    pub fn chinese_text(&self) -> Option<&str> {
        self.language("zh")
    }
}

impl fmt::Display for Cue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.index + 1)?;
        writeln!(
            f,
            "{} --> {}",
            format_timestamp(self.start, ','),
            format_timestamp(self.end, ',')
        )?;
        writeln!(f, "{}", self.text)?;
        writeln!(f)
    }
}

/// Detect the subtitle format from the trimmed input text
pub fn detect_format(text: &str) -> SubtitleFormat {
    let trimmed = text.trim_start_matches('\u{feff}').trim_start();
    if trimmed.starts_with("WEBVTT") {
        return SubtitleFormat::Vtt;
    }
    if let Some(first_line) = trimmed.lines().next() {
        if INDEX_LINE.is_match(first_line) {
            return SubtitleFormat::Srt;
        }
    }
    SubtitleFormat::Unknown
}

/// Parse a single `HH:MM:SS(.|,)mmm` timestamp to seconds
pub fn parse_timestamp(timestamp: &str) -> Result<f64, ParseError> {
    let caps = TIMESTAMP_REGEX
        .captures(timestamp.trim())
        .ok_or_else(|| ParseError::InvalidTimestamp(timestamp.to_string()))?;
    timestamp_from_captures(&caps, 1)
        .ok_or_else(|| ParseError::InvalidTimestamp(timestamp.to_string()))
}

/// Format seconds as `HH:MM:SS<delim>mmm`
///
/// Inverse of `parse_timestamp` to millisecond precision.
pub fn format_timestamp(seconds: f64, delimiter: char) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1_000;
    let millis = total_ms % 1_000;
    format!("{:02}:{:02}:{:02}{}{:03}", hours, minutes, secs, delimiter, millis)
}

/// Parse subtitle text into an ordered cue list
///
/// Fails soft: malformed blocks are skipped, an unrecognized format yields
/// an empty list. Identical input always yields an identical cue list.
pub fn parse(text: &str, format_hint: Option<SubtitleFormat>) -> CueList {
    parse_with_progress(text, format_hint, |_| {})
}

/// Parse with a progress callback, reporting 0-100 roughly every
/// fifty processed blocks
pub fn parse_with_progress(
    text: &str,
    format_hint: Option<SubtitleFormat>,
    mut progress: impl FnMut(u8),
) -> CueList {
    let format = format_hint.unwrap_or_else(|| detect_format(text));
    if format == SubtitleFormat::Unknown {
        debug!("Unrecognized subtitle format, returning empty cue list");
        return Vec::new();
    }

    let blocks = split_blocks(text);
    let total_blocks = blocks.len().max(1);
    let mut cues: CueList = Vec::with_capacity(blocks.len());

    for (block_num, block) in blocks.iter().enumerate() {
        if let Some(cue) = parse_block(format, block, cues.len()) {
            cues.push(cue);
        }
        if (block_num + 1) % PROGRESS_EVERY_BLOCKS == 0 {
            let percent = ((block_num + 1) * 100 / total_blocks).min(100) as u8;
            progress(percent);
        }
    }

    progress(100);
    debug!("Parsed {} cues from {} blocks ({})", cues.len(), blocks.len(), format);
    cues
}

/// Split input into blank-line-delimited blocks of trimmed lines
fn split_blocks(text: &str) -> Vec<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }
    blocks
}

/// Parse one block into a cue; None skips the block without aborting
fn parse_block(format: SubtitleFormat, block: &[&str], ordinal: usize) -> Option<Cue> {
    let min_lines = match format {
        // Index line, timing line, at least one text line
        SubtitleFormat::Srt => 3,
        // Timing line (optionally preceded by a cue identifier), text
        SubtitleFormat::Vtt => 2,
        SubtitleFormat::Unknown => return None,
    };

    if block.len() < min_lines {
        warn!("Skipping short subtitle block ({} lines)", block.len());
        return None;
    }

    // Header blocks and NOTE/STYLE blocks carry no timing line and are
    // skipped by the same path as malformed cues.
    let timing_idx = match format {
        SubtitleFormat::Srt => {
            if !INDEX_LINE.is_match(block[0]) {
                warn!("Skipping block without sequence number: {}", block[0]);
                return None;
            }
            1
        }
        SubtitleFormat::Vtt => {
            // Tolerate one identifier line before the timing line
            if block[0].contains("-->") {
                0
            } else if block.len() > 2 && block[1].contains("-->") {
                1
            } else {
                debug!("Skipping non-cue block: {}", block[0]);
                return None;
            }
        }
        SubtitleFormat::Unknown => return None,
    };
    let timing_line = block[timing_idx];

    let caps = match TIMING_REGEX.captures(timing_line) {
        Some(caps) => caps,
        None => {
            warn!("Skipping block with malformed timing line: {}", timing_line);
            return None;
        }
    };
    let (start, end) = match (timestamp_from_captures(&caps, 1), timestamp_from_captures(&caps, 5)) {
        (Some(start), Some(end)) => (start, end),
        _ => {
            warn!("Skipping block with invalid timestamp components: {}", timing_line);
            return None;
        }
    };

    let lines: Vec<String> = block[timing_idx + 1..]
        .iter()
        .map(|line| match format {
            SubtitleFormat::Vtt => strip_markup(line),
            _ => line.trim().to_string(),
        })
        .collect();

    match Cue::new_validated(ordinal, start, end, lines) {
        Ok(cue) => Some(cue),
        Err(e) => {
            warn!("Skipping invalid cue block: {}", e);
            None
        }
    }
}

/// Convert four timing capture groups starting at `start_idx` to seconds
fn timestamp_from_captures(caps: &regex::Captures, start_idx: usize) -> Option<f64> {
    let field = |i: usize| -> Option<u64> { caps.get(start_idx + i)?.as_str().parse().ok() };
    let (hours, minutes, seconds, millis) = (field(0)?, field(1)?, field(2)?, field(3)?);
    if minutes >= 60 || seconds >= 60 || millis >= 1000 {
        return None;
    }
    Some((hours * 3600 + minutes * 60 + seconds) as f64 + millis as f64 / 1000.0)
}

/// Strip inline VTT markup from a line and collapse whitespace runs
fn strip_markup(line: &str) -> String {
    let stripped = INLINE_TIMESTAMP_TAG.replace_all(line, "");
    let stripped = VOICE_TAG.replace_all(&stripped, "");
    let stripped = STYLE_TAG.replace_all(&stripped, "");
    let stripped = ANGLE_TAG.replace_all(&stripped, "");
    WHITESPACE_RUN.replace_all(stripped.trim(), " ").to_string()
}

/// Bucket cue lines into a language map by detected script
///
/// Lines sharing a language are concatenated with a single space. A
/// single-line cue is classified as one whole unit.
fn build_language_map(lines: &[String]) -> BTreeMap<String, String> {
    let mut map: BTreeMap<String, String> = BTreeMap::new();
    for line in lines {
        let tag = language_utils::classify_line(line);
        match map.get_mut(tag) {
            Some(bucket) => {
                bucket.push(' ');
                bucket.push_str(line);
            }
            None => {
                map.insert(tag.to_string(), line.clone());
            }
        }
    }
    map
}
