/*!
 * Tests for subtitle parsing functionality
 */

use shadowsync::subtitle_parser::{
    detect_format, format_timestamp, parse, parse_timestamp, parse_with_progress, SubtitleFormat,
};
use crate::common;

/// Test timestamp parsing and formatting round trip
#[test]
fn test_timestamp_parsing_withValidTimestamp_shouldParseAndFormat() {
    let ts = "01:23:45,678";
    let seconds = parse_timestamp(ts).unwrap();
    assert!((seconds - 5025.678).abs() < 1e-9);

    let formatted = format_timestamp(seconds, ',');
    assert_eq!(formatted, ts);
}

/// Test round trip through the dot-delimited form
#[test]
fn test_timestamp_roundtrip_withDotDelimiter_shouldPreserveText() {
    let ts = "00:02:03.456";
    let seconds = parse_timestamp(ts).unwrap();
    assert_eq!(format_timestamp(seconds, '.'), ts);
}

/// Test malformed timestamps are rejected
#[test]
fn test_timestamp_parsing_withMalformedInput_shouldFail() {
    assert!(parse_timestamp("1:2:3,4").is_err());
    assert!(parse_timestamp("00:00:05").is_err());
    assert!(parse_timestamp("garbage").is_err());
}

/// Test parsing a minimal SRT block
#[test]
fn test_parse_withSingleSrtBlock_shouldYieldOneCue() {
    let cues = parse("1\n00:00:01,000 --> 00:00:04,000\nHello world", None);

    assert_eq!(cues.len(), 1);
    assert!((cues[0].start - 1.0).abs() < 1e-9);
    assert!((cues[0].end - 4.0).abs() < 1e-9);
    assert_eq!(cues[0].text, "Hello world");
}

/// Test parsing SRT content with multiple entries
#[test]
fn test_parse_withValidSrtContent_shouldParseAllEntries() {
    let cues = parse(common::sample_srt(), None);

    assert_eq!(cues.len(), 3);
    assert_eq!(cues[0].index, 0);
    assert_eq!(cues[0].id, "cue-0");
    assert_eq!(cues[1].text, "It contains multiple entries.");
    assert!((cues[2].start - 10.0).abs() < 1e-9);
}

/// Test VTT parsing strips inline markup and skips NOTE blocks
#[test]
fn test_parse_withVttMarkup_shouldStripTagsAndSkipNotes() {
    let cues = parse(common::sample_vtt(), None);

    assert_eq!(cues.len(), 2);
    assert_eq!(cues[0].text, "Welcome back");
    assert_eq!(cues[1].text, "Practice every day");
}

/// Test that a malformed block is skipped without aborting the parse
#[test]
fn test_parse_withMalformedBlock_shouldSkipAndContinue() {
    common::init_test_logging();
    let content = "1\n00:00:01,000 --> 00:00:04,000\nGood entry\n\n\
                   2\nnot a timestamp\nBad entry\n\n\
                   3\n00:00:10,000 --> 00:00:14,000\nAnother good entry\n";
    let cues = parse(content, None);

    assert_eq!(cues.len(), 2);
    // Ordinals count successfully parsed blocks, not header numbers
    assert_eq!(cues[1].index, 1);
    assert_eq!(cues[1].text, "Another good entry");
}

/// Test hard validation of inverted time ranges at parse time
#[test]
fn test_parse_withInvertedTimeRange_shouldSkipBlock() {
    let content = "1\n00:00:05,000 --> 00:00:02,000\nBackwards\n\n\
                   2\n00:00:06,000 --> 00:00:08,000\nForwards\n";
    let cues = parse(content, None);

    assert_eq!(cues.len(), 1);
    assert_eq!(cues[0].text, "Forwards");
}

/// Test unknown formats parse to an empty list instead of erroring
#[test]
fn test_parse_withUnknownFormat_shouldReturnEmptyList() {
    let cues = parse("[Script Info]\nTitle: not a caption file", None);
    assert!(cues.is_empty());
}

/// Test every parsed cue satisfies the time-range and text invariants
#[test]
fn test_parse_withAnyInput_shouldUpholdCueInvariants() {
    for content in [common::sample_srt(), common::sample_vtt()] {
        for cue in parse(content, None) {
            assert!(cue.end > cue.start, "cue {} has non-positive range", cue.id);
            assert!(!cue.text.is_empty(), "cue {} has empty text", cue.id);
        }
    }
}

/// Test determinism of repeated parses
#[test]
fn test_parse_withIdenticalInput_shouldBeDeterministic() {
    let first = parse(common::sample_srt(), None);
    let second = parse(common::sample_srt(), None);
    assert_eq!(first, second);
}

/// Test a format hint overrides detection
#[test]
fn test_parse_withFormatHint_shouldBypassDetection() {
    // Dot-delimited timestamps with no WEBVTT header detect as unknown,
    // but a VTT hint parses them
    let content = "00:00:01.000 --> 00:00:02.000\nHinted cue";
    assert_eq!(detect_format(content), SubtitleFormat::Unknown);

    let cues = parse(content, Some(SubtitleFormat::Vtt));
    assert_eq!(cues.len(), 1);
    assert_eq!(cues[0].text, "Hinted cue");
}

/// Test language separation buckets bilingual cue lines
#[test]
fn test_parse_withBilingualCue_shouldSeparateLanguages() {
    let content = "1\n00:00:01,000 --> 00:00:04,000\nHello world\n你好世界\n";
    let cues = parse(content, None);

    assert_eq!(cues.len(), 1);
    assert_eq!(cues[0].english_text(), Some("Hello world"));
    assert_eq!(cues[0].chinese_text(), Some("你好世界"));
}

/// Test lines sharing a language concatenate into one bucket
#[test]
fn test_parse_withTwoEnglishLines_shouldConcatenateBucket() {
    let content = "1\n00:00:01,000 --> 00:00:04,000\nFirst line\nSecond line\n";
    let cues = parse(content, None);

    assert_eq!(cues[0].language("en"), Some("First line Second line"));
}

/// Test the progress callback reports completion
#[test]
fn test_parse_with_progress_withManyBlocks_shouldReportPercentages() {
    let mut content = String::new();
    for i in 0..120 {
        let start = i * 2;
        content.push_str(&format!(
            "{}\n{} --> {}\nblock {}\n\n",
            i + 1,
            format_timestamp(start as f64, ','),
            format_timestamp(start as f64 + 1.5, ','),
            i
        ));
    }

    let mut reports = Vec::new();
    let cues = parse_with_progress(&content, None, |percent| reports.push(percent));

    assert_eq!(cues.len(), 120);
    // Roughly every 50 blocks plus the final 100
    assert!(reports.len() >= 3);
    assert_eq!(*reports.last().unwrap(), 100);
    assert!(reports.windows(2).all(|w| w[0] <= w[1]));
}
