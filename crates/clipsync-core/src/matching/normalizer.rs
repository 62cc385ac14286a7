//! Filename canonicalization.
//!
//! Three progressively aggressive forms are produced for a filename stem:
//!
//! - **basic**: lowercase, spaces removed
//! - **standard**: basic plus download-tool artifacts, punctuation and all
//!   whitespace removed, NFKC-normalized
//! - **aggressive**: standard after a trailing copy suffix (`(1)`, `_copy`, ...)
//!   has been dropped
//!
//! Every function here is total and side-effect free.

use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Punctuation and symbols removed by the standard pass. Whitespace is handled separately.
const SPECIAL_CHARS: &str = "-_!@#$%^&*()+=[]{};:'\",.<>/?\\|`~";

lazy_static! {
    /// Copy suffixes in priority order. The first one that matches wins.
    static ref COPY_PATTERNS: [Regex; 7] = [
        Regex::new(r"(?i)\s*\(\d+\)$").unwrap(),
        Regex::new(r"(?i)\s*_\d+$").unwrap(),
        Regex::new(r"(?i)\s*-\d+$").unwrap(),
        Regex::new(r"(?i)\s*\(copy\)$").unwrap(),
        Regex::new(r"(?i)\s*_copy$").unwrap(),
        Regex::new(r"(?i)\s*\s+copy$").unwrap(),
        Regex::new(r"(?i)\s*\[duplicate\]$").unwrap(),
    ];

    /// `[xxxxxxxxxxx]` video id appended by downloaders.
    static ref VIDEO_ID: Regex = Regex::new(r"\s*\[[A-Za-z0-9_-]{11}\]$").unwrap();

    /// `.f399`-style format code left behind by split audio/video downloads.
    static ref FORMAT_CODE: Regex = Regex::new(r"\.f\d{3}$").unwrap();

    static ref CHANNEL_SUFFIXES: [Regex; 3] = [
        Regex::new(r"(?i)\s*@\s*Hustler\s*Casino\s*Live\s*$").unwrap(),
        Regex::new(r"(?i)\s*@\s*HustlerCasinoLive\s*$").unwrap(),
        Regex::new(r"(?i)\s*@\s*[A-Za-z0-9_]+\s*$").unwrap(),
    ];
}

/// Lowercase and drop space characters. The cheapest exact-match key.
pub fn normalize_basic(text: &str) -> String {
    text.to_lowercase().replace(' ', "").trim().to_string()
}

/// Remove a trailing video id token, then a trailing format code.
pub fn strip_video_id_and_format_code(text: &str) -> String {
    let without_id = VIDEO_ID.replace(text, "");
    let without_code = FORMAT_CODE.replace(&without_id, "");
    without_code.trim().to_string()
}

/// Repeats the fold until it stops changing the text. Removing a space can
/// leave a combining mark next to a base letter, and lowercasing can produce
/// a decomposed sequence, so one pass is not always a fixed point.
pub fn normalize_standard(text: &str) -> String {
    let mut current = strip_video_id_and_format_code(text);
    loop {
        let next = fold_standard(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn fold_standard(text: &str) -> String {
    let cleaned: String = text
        .nfkc()
        .filter(|c| !SPECIAL_CHARS.contains(*c) && !c.is_whitespace())
        .collect();
    cleaned.to_lowercase()
}

/// Standard normalization applied after the copy suffix is removed.
///
/// The suffix must go first: patterns such as `(1)` contain punctuation the
/// standard pass would otherwise partially consume.
pub fn normalize_aggressive(text: &str) -> String {
    let (core, _) = split_copy_suffix(text);
    normalize_standard(core)
}

/// Split off the copy suffix, keeping it for diagnostics.
///
/// ```
/// use clipsync_core::matching::normalizer::extract_core_title;
/// assert_eq!(extract_core_title("Video (1)"), ("Video".to_string(), " (1)".to_string()));
/// ```
pub fn extract_core_title(text: &str) -> (String, String) {
    let (core, suffix) = split_copy_suffix(text);
    (core.trim().to_string(), suffix.to_string())
}

/// Strip a trailing `@Channel` tag.
pub fn remove_channel_suffix(text: &str) -> String {
    let mut result = text.to_string();
    for pattern in CHANNEL_SUFFIXES.iter() {
        result = pattern.replace(&result, "").into_owned();
    }
    result.trim().to_string()
}

fn split_copy_suffix(text: &str) -> (&str, &str) {
    for pattern in COPY_PATTERNS.iter() {
        if let Some(found) = pattern.find(text) {
            return (&text[..found.start()], found.as_str());
        }
    }
    (text, "")
}

/// Every normalization of one filename, for reports and debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedForms {
    pub original: String,
    pub basic: String,
    pub standard: String,
    pub aggressive: String,
    pub no_channel: String,
    pub core_title: String,
    pub suffix: String,
}

impl NormalizedForms {
    pub fn of(text: &str) -> Self {
        let (core_title, suffix) = extract_core_title(text);
        Self {
            original: text.to_string(),
            basic: normalize_basic(text),
            standard: normalize_standard(text),
            aggressive: normalize_aggressive(text),
            no_channel: remove_channel_suffix(text),
            core_title,
            suffix,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_basic() {
        assert_eq!(normalize_basic("Hello World"), "helloworld");
        assert_eq!(normalize_basic("  Test  "), "test");
        assert_eq!(normalize_basic("A B C"), "abc");
    }

    #[test]
    fn test_normalize_standard_strips_punctuation() {
        assert_eq!(normalize_standard("Hello-World_Test!"), "helloworldtest");
        assert_eq!(normalize_standard("Video #123"), "video123");
        assert_eq!(normalize_standard("$100,000 Pot!"), "100000pot");
        assert_eq!(normalize_standard("Alan's Video"), "alansvideo");
        assert_eq!(
            normalize_standard("$100,000 Pot!"),
            normalize_standard("$100000 Pot")
        );
    }

    #[test]
    fn test_normalize_standard_strips_download_artifacts() {
        assert_eq!(normalize_standard("Big Hand [dQw4w9WgXcQ]"), "bighand");
        assert_eq!(normalize_standard("Big Hand.f399"), "bighand");
        // Ten characters is not a video id, so the token stays.
        assert_eq!(normalize_standard("Big Hand [abcdefghij]"), "bighandabcdefghij");
    }

    #[test]
    fn test_normalize_standard_applies_nfkc() {
        // Fullwidth letters fold to ASCII.
        assert_eq!(normalize_standard("ＡＢＣ"), "abc");
    }

    #[test]
    fn test_normalize_aggressive_strips_copy_suffixes() {
        assert_eq!(normalize_aggressive("Video (1)"), "video");
        assert_eq!(normalize_aggressive("Video"), "video");
        assert_eq!(normalize_aggressive("Video_copy"), "video");
        assert_eq!(normalize_aggressive("Video-2"), "video");
        assert_eq!(normalize_aggressive("Video (copy)"), "video");
        assert_eq!(normalize_aggressive("Video (COPY)"), "video");
        assert_eq!(normalize_aggressive("Video copy"), "video");
        assert_eq!(normalize_aggressive("Video [duplicate]"), "video");
    }

    #[test]
    fn test_normalize_aggressive_removes_only_first_matching_suffix() {
        // `(2)` matches first; the remaining `(1)` becomes content.
        assert_eq!(normalize_aggressive("Video (1) (2)"), "video1");
    }

    #[test]
    fn test_extract_core_title() {
        assert_eq!(
            extract_core_title("Video (1)"),
            ("Video".to_string(), " (1)".to_string())
        );
        assert_eq!(
            extract_core_title("Test_copy"),
            ("Test".to_string(), "_copy".to_string())
        );
        assert_eq!(
            extract_core_title("Normal Video"),
            ("Normal Video".to_string(), String::new())
        );
    }

    #[test]
    fn test_remove_channel_suffix() {
        assert_eq!(
            remove_channel_suffix("Great Play @Hustler Casino Live"),
            "Great Play"
        );
        assert_eq!(
            remove_channel_suffix("Amazing Hand @HustlerCasinoLive"),
            "Amazing Hand"
        );
        assert_eq!(remove_channel_suffix("No Channel Here"), "No Channel Here");
    }

    #[test]
    fn test_normalize_standard_recomposes_spacing_diacritics() {
        // `¸` and `´` fold to a space plus a combining mark; the mark must
        // end up composed onto the preceding letter.
        assert_eq!(normalize_standard("R¸"), "\u{157}");
        assert_eq!(normalize_standard(&normalize_standard("R¸")), "\u{157}");
        let once = normalize_standard("Don´t Call");
        assert_eq!(normalize_standard(&once), once);
    }

    #[test]
    fn test_normalized_forms() {
        let forms = NormalizedForms::of("Big Hand (1)");
        assert_eq!(forms.basic, "bighand(1)");
        assert_eq!(forms.standard, "bighand1");
        assert_eq!(forms.aggressive, "bighand");
        assert_eq!(forms.core_title, "Big Hand");
        assert_eq!(forms.suffix, " (1)");
    }

    proptest! {
        #[test]
        fn prop_normalize_standard_idempotent(s in "\\PC{0,40}") {
            let once = normalize_standard(&s);
            prop_assert_eq!(normalize_standard(&once), once);
        }

        #[test]
        fn prop_normalize_aggressive_idempotent(s in "\\PC{0,40}") {
            let once = normalize_aggressive(&s);
            prop_assert_eq!(normalize_aggressive(&once), once);
        }
    }
}
