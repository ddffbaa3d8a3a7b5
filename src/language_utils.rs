use anyhow::{anyhow, Result};
use isolang::Language;

/// Language utilities for script classification and language tags
///
/// This module classifies subtitle lines into language buckets by Unicode
/// script ranges and provides ISO 639-1 tag validation and display names
/// for the tags the classifier emits.
/// Script ranges checked by `classify_line`, in precedence order.
/// Kana outranks ideographs so Japanese lines mixing kanji and kana
/// land in the `ja` bucket.
const SCRIPT_CHECKS: &[(&str, fn(char) -> bool)] = &[
    ("ja", is_kana),
    ("ko", is_hangul),
    ("zh", is_cjk_ideograph),
    ("ru", is_cyrillic),
    ("ar", is_arabic),
    ("th", is_thai),
    ("hi", is_devanagari),
];

fn is_cjk_ideograph(c: char) -> bool {
    matches!(c, '\u{4E00}'..='\u{9FFF}' | '\u{3400}'..='\u{4DBF}' | '\u{F900}'..='\u{FAFF}')
}

fn is_hangul(c: char) -> bool {
    matches!(c, '\u{AC00}'..='\u{D7AF}' | '\u{1100}'..='\u{11FF}' | '\u{3130}'..='\u{318F}')
}

fn is_kana(c: char) -> bool {
    matches!(c, '\u{3040}'..='\u{309F}' | '\u{30A0}'..='\u{30FF}' | '\u{31F0}'..='\u{31FF}')
}

fn is_cyrillic(c: char) -> bool {
    matches!(c, '\u{0400}'..='\u{04FF}' | '\u{0500}'..='\u{052F}')
}

fn is_arabic(c: char) -> bool {
    matches!(c, '\u{0600}'..='\u{06FF}' | '\u{0750}'..='\u{077F}')
}

fn is_thai(c: char) -> bool {
    matches!(c, '\u{0E00}'..='\u{0E7F}')
}

fn is_devanagari(c: char) -> bool {
    matches!(c, '\u{0900}'..='\u{097F}')
}

/// Classify a line of subtitle text into a language bucket tag
///
/// Checks the script ranges in precedence order; anything containing only
/// ASCII letters, numerics, or punctuation falls through to `en`.
pub fn classify_line(line: &str) -> &'static str {
    for &(tag, check) in SCRIPT_CHECKS {
        if line.chars().any(check) {
            return tag;
        }
    }
    // Fast path: ASCII letters, pure numerics, and punctuation all read as
    // Latin/English.
    "en"
}

/// Whether a bucket tag names a script written without word spaces
pub fn is_spaceless_script(tag: &str) -> bool {
    matches!(tag, "zh" | "ja" | "th")
}

/// Split cue text into highlightable word tokens
///
/// Whitespace-delimited for spaced scripts. A line with no spaces that
/// classifies as a spaceless script falls back to per-character tokens so
/// highlighting still advances through the cue.
pub fn tokenize(text: &str) -> Vec<String> {
    let words: Vec<String> = text.split_whitespace().map(|w| w.to_string()).collect();
    if words.len() == 1 && is_spaceless_script(classify_line(text)) {
        return text
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| c.to_string())
            .collect();
    }
    words
}

/// Validate that a tag is a known ISO 639-1 language code
pub fn validate_language_tag(tag: &str) -> Result<()> {
    let normalized = tag.trim().to_lowercase();
    if normalized.len() == 2 && Language::from_639_1(&normalized).is_some() {
        return Ok(());
    }
    Err(anyhow!("Invalid language tag: {}", tag))
}

/// Get the English display name for a language tag
pub fn language_display_name(tag: &str) -> Result<String> {
    let normalized = tag.trim().to_lowercase();
    Language::from_639_1(&normalized)
        .map(|lang| lang.to_name().to_string())
        .ok_or_else(|| anyhow!("Unknown language tag: {}", tag))
}
