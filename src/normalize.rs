//! Search-key normalization shared by the matcher, the artist dropdown and the CLI.
//!
//! Keys are comparison-only: they are recomputed on demand and never displayed.
//! Any change here changes what every query matches. Run tests after changes.

use once_cell::sync::Lazy;
use regex::Regex;

// ============================================================================
// REGEX PATTERNS
// ============================================================================

/// Everything that is not a lowercase ASCII letter, ASCII digit, CJK unified
/// ideograph, whitespace, or straight apostrophe.
pub static NON_KEY_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9\u{4E00}-\u{9FFF}\s']").unwrap());

/// Runs of whitespace, collapsed to a single space.
pub static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Convert curly quotes to their straight forms.
/// e.g., "God’s Plan" → "God's Plan", "“Hello”" → "\"Hello\""
pub fn normalize_quotes(s: &str) -> String {
    s.replace(['\u{2018}', '\u{2019}'], "'") // Left/right single curly quotes
        .replace(['\u{201C}', '\u{201D}'], "\"") // Left/right double curly quotes
}

// ============================================================================
// NORMALIZATION FUNCTIONS
// ============================================================================

/// Normalize text into a search key.
///
/// Lowercases, straightens curly quotes, turns punctuation into spaces and
/// collapses whitespace. Total over all inputs; the empty string maps to itself.
///
/// e.g., "HUMBLE." → "humble", "God’s Plan" → "god's plan"
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let quoted = normalize_quotes(lowered.trim());
    let stripped = NON_KEY_CHARS.replace_all(&quoted, " ");
    WHITESPACE_RUN
        .replace_all(&stripped, " ")
        .trim()
        .to_string()
}

/// Normalize optional text. Absent text is treated as the empty string.
pub fn normalize_opt(text: Option<&str>) -> String {
    normalize(text.unwrap_or(""))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_basic() {
        assert_eq!(normalize("HUMBLE."), "humble");
        assert_eq!(normalize("  Kendrick   Lamar  "), "kendrick lamar");
        assert_eq!(normalize("Rock & Roll"), "rock roll");
        assert_eq!(normalize("Tell Me (Why?) - Live"), "tell me why live");
    }

    #[test]
    fn test_curly_quotes() {
        assert_eq!(normalize("God's Plan"), normalize("God\u{2019}s Plan"));
        assert_eq!(normalize("\u{2018}Sup"), "'sup");
        assert_eq!(normalize_quotes("\u{201C}Hi\u{201D}"), "\"Hi\"");
        // Double quotes are straightened and then stripped like other punctuation
        assert_eq!(normalize("\u{201C}Hi\u{201D} there"), "hi there");
    }

    #[test]
    fn test_keeps_cjk_and_apostrophes() {
        assert_eq!(normalize("周杰倫 - 晴天"), "周杰倫 晴天");
        assert_eq!(normalize("Don't Stop"), "don't stop");
    }

    #[test]
    fn test_strips_non_ascii_letters() {
        // No diacritic folding: accented letters are punctuation to the key
        assert_eq!(normalize("Beyoncé"), "beyonc");
        assert_eq!(normalize("Ünïcode"), "n code");
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \t\n "), "");
        assert_eq!(normalize("!?."), "");
        assert_eq!(normalize_opt(None), "");
        assert_eq!(normalize_opt(Some("A.B")), "a b");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "God\u{2019}s Plan",
            "HUMBLE.",
            "  a -- b  ",
            "周杰倫 ~ Jay Chou!!",
            "\u{201C}quoted\u{201D}",
            "",
        ];
        for s in samples {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", s);
        }
    }

    #[test]
    fn test_case_insensitive() {
        let samples = ["Kendrick Lamar", "HUMBLE.", "god's plan", "Mr. Brightside 2004"];
        for s in samples {
            assert_eq!(normalize(s), normalize(&s.to_uppercase()));
            assert_eq!(normalize(s), normalize(&s.to_lowercase()));
        }
    }
}
