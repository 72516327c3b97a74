//! Title canonicalization and text normalization for guess matching.
//!
//! Two reductions live here:
//! - [`canonicalize`] turns a raw track title ("Hellfire (Remix) - Radio Edit")
//!   into its base display/comparison form ("Hellfire").
//! - [`normalize_text`] turns any string (guess, title, artist) into the
//!   lowercase alphanumeric-and-single-space form that matching runs on.
//!
//! CRITICAL: matching thresholds are calibrated against these exact rules.
//! Run the tests in `matching` and `similarity` after any change here.

use any_ascii::any_ascii;
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

// ============================================================================
// REGEX PATTERNS
// ============================================================================

/// Parenthetical asides: "(Remix)", "(feat. Someone)", "(Live at Wembley)".
/// Non-greedy and non-nested; eats the whitespace run in front of the span.
pub static PARENTHETICAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\([^)]*\)").unwrap());

/// Regex to collapse multiple whitespace into single space
pub static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());

/// Separator between a title and its qualifiers: "Song - Remastered 2011"
pub const DASH_SEPARATOR: &str = " - ";

/// Characters trimmed from both ends of a canonical title.
pub const EDGE_CHARS: &[char] = &[' ', '-', '\u{2013}', '\u{2014}', '_', '"', '\''];

/// Default artist list delimiters.
/// Word delimiters only split on whole words and swallow one trailing '.'
/// ("feat." as well as "feat").
pub const DEFAULT_ARTIST_DELIMITERS: &[&str] = &[",", "&", "feat", "with", "x"];

/// Splitter built from [`DEFAULT_ARTIST_DELIMITERS`].
pub static ARTIST_DELIMITERS: Lazy<ArtistSplitter> =
    Lazy::new(|| ArtistSplitter::new(DEFAULT_ARTIST_DELIMITERS).unwrap());

// ============================================================================
// CANONICAL TITLES
// ============================================================================

/// Single reduction pass: parentheticals, dash qualifiers, edge punctuation,
/// doubled whitespace.
fn canonicalize_once(raw_title: &str) -> String {
    let no_paren = PARENTHETICAL.replace_all(raw_title, "");

    // First non-empty " - " segment; all-empty falls back to the unsplit text
    let base = no_paren
        .split(DASH_SEPARATOR)
        .map(str::trim)
        .find(|segment| !segment.is_empty())
        .unwrap_or(no_paren.as_ref());

    let base = base.trim_matches(EDGE_CHARS);
    MULTI_SPACE.replace_all(base, " ").trim().to_string()
}

/// Reduce a raw track title to its canonical form.
///
/// e.g., "Hellfire (Remix) - Radio Edit" → "Hellfire",
///       "Bohemian Rhapsody - Remastered 2011" → "Bohemian Rhapsody"
///
/// Total: never fails, empty in → empty out. The reduction is repeated until
/// it stops changing, so the result is always a fixed point
/// (`canonicalize(canonicalize(x)) == canonicalize(x)`). For ordinary titles
/// that is a single pass.
pub fn canonicalize(raw_title: &str) -> String {
    let mut current = canonicalize_once(raw_title);
    loop {
        let next = canonicalize_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

// ============================================================================
// NORMALIZED TEXT
// ============================================================================

/// Normalize text for lenient matching.
/// Lowercases, drops everything outside `[a-z0-9]` and whitespace, collapses
/// whitespace runs to a single space and trims.
///
/// The result is either empty or matches `^[a-z0-9]+( [a-z0-9]+)*$`.
pub fn normalize_text(value: &str) -> String {
    let lowered = value.to_lowercase();
    let kept: String = lowered
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace())
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Check if a character is a Unicode combining mark (diacritical mark).
pub fn is_combining_mark(c: char) -> bool {
    matches!(c as u32, 0x0300..=0x036F | 0x1AB0..=0x1AFF | 0x1DC0..=0x1DFF | 0x20D0..=0x20FF | 0xFE20..=0xFE2F)
}

/// Fold Unicode text to ASCII by applying NFKD decomposition and removing combining marks.
/// e.g., "Beyoncé" → "beyonce", "Motörhead" → "motorhead"
///
/// Only used when diacritic folding is switched on in the match config;
/// plain [`normalize_text`] simply drops non-ASCII letters.
pub fn fold_to_ascii(s: &str) -> String {
    let stripped: String = s.nfkd().filter(|c| !is_combining_mark(*c)).collect();
    // Transliterate whatever is left (Cyrillic, CJK, ...)
    any_ascii(&stripped).to_lowercase()
}

// ============================================================================
// ARTIST LISTS
// ============================================================================

/// Splits a raw artist field ("Drake feat. Jay Z", "A, B & C") into names.
#[derive(Debug, Clone)]
pub struct ArtistSplitter {
    pattern: Option<Regex>,
}

impl ArtistSplitter {
    /// Build a splitter from a delimiter list.
    /// Alphanumeric delimiters match case-insensitively as whole words and may
    /// be followed by a '.'; anything else matches literally.
    pub fn new<S: AsRef<str>>(delimiters: &[S]) -> Result<Self, regex::Error> {
        let alternatives: Vec<String> = delimiters
            .iter()
            .map(|d| d.as_ref().trim())
            .filter(|d| !d.is_empty())
            .map(|d| {
                if d.chars().all(char::is_alphanumeric) {
                    format!(r"\b{}\b\.?", regex::escape(d))
                } else {
                    regex::escape(d)
                }
            })
            .collect();

        if alternatives.is_empty() {
            return Ok(Self { pattern: None });
        }

        let pattern = Regex::new(&format!("(?i){}", alternatives.join("|")))?;
        Ok(Self {
            pattern: Some(pattern),
        })
    }

    /// Raw (untrimmed) pieces of the artist field.
    pub fn split<'a>(&self, artist_field: &'a str) -> Vec<&'a str> {
        match &self.pattern {
            Some(re) => re.split(artist_field).collect(),
            None => vec![artist_field],
        }
    }
}

/// Split an artist field on the default delimiters.
/// e.g., "Imagine Dragons, Arty" → ["Imagine Dragons", " Arty"]
pub fn split_artists(artist_field: &str) -> Vec<&str> {
    ARTIST_DELIMITERS.split(artist_field)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_basic() {
        assert_eq!(canonicalize("Hellfire (Remix)"), "Hellfire");
        assert_eq!(canonicalize("Hellfire (Remix) - Radio Edit"), "Hellfire");
        assert_eq!(
            canonicalize("Bohemian Rhapsody - Remastered 2011"),
            "Bohemian Rhapsody"
        );
        assert_eq!(canonicalize("Title - Remastered 2020"), "Title");
    }

    #[test]
    fn test_canonicalize_multiple_parentheticals() {
        assert_eq!(canonicalize("Song (feat. A) (Live)"), "Song");
        assert_eq!(canonicalize("Mid (x) Title"), "Mid Title");
    }

    #[test]
    fn test_canonicalize_nested_parens_strip_to_first_close() {
        // "(a (b)" goes, the stray ")" stays
        assert_eq!(canonicalize("Song (a (b) c)"), "Song c)");
    }

    #[test]
    fn test_canonicalize_edge_punctuation() {
        assert_eq!(canonicalize("\"Quoted Title\""), "Quoted Title");
        assert_eq!(canonicalize("'Single'"), "Single");
        assert_eq!(canonicalize("__Under__"), "Under");
        assert_eq!(canonicalize("\u{2014} Em Dash \u{2013}"), "Em Dash");
        assert_eq!(canonicalize("Spaced    Out   Title"), "Spaced Out Title");
    }

    #[test]
    fn test_canonicalize_dash_segments() {
        // Leading empty segment is skipped
        assert_eq!(canonicalize(" - Intro - Outro"), "Intro");
        // Dash without surrounding spaces is part of the title
        assert_eq!(canonicalize("Jay-Z Tribute"), "Jay-Z Tribute");
        assert_eq!(canonicalize("A - B - C"), "A");
    }

    #[test]
    fn test_canonicalize_empty_and_degenerate() {
        assert_eq!(canonicalize(""), "");
        assert_eq!(canonicalize("   "), "");
        assert_eq!(canonicalize("(Live)"), "");
        assert_eq!(canonicalize(" - "), "");
        assert_eq!(canonicalize("---"), "");
    }

    #[test]
    fn test_canonicalize_idempotent() {
        let samples = [
            "Hellfire (Remix) - Radio Edit",
            "\t-A",
            "A -\t\tB",
            "  \"Don't Stop Me Now\" - 2011 Mix ",
            "(Intro) - (Outro)",
            "x  (y)  z - w",
            "Song (unclosed",
            "\u{2014}\u{2014}",
            "Ça Plane Pour Moi",
        ];
        for raw in samples {
            let once = canonicalize(raw);
            assert_eq!(canonicalize(&once), once, "not idempotent for {:?}", raw);
            assert!(!once.starts_with(EDGE_CHARS), "leading edge char in {:?}", once);
            assert!(!once.ends_with(EDGE_CHARS), "trailing edge char in {:?}", once);
            assert!(!MULTI_SPACE.is_match(&once), "doubled whitespace in {:?}", once);
        }
    }

    #[test]
    fn test_normalize_text_basic() {
        assert_eq!(normalize_text("Hellfire"), "hellfire");
        assert_eq!(normalize_text("  Don't   Stop Me Now! "), "dont stop me now");
        assert_eq!(normalize_text("AC/DC"), "acdc");
        assert_eq!(normalize_text("Tab\tand\nnewline"), "tab and newline");
    }

    #[test]
    fn test_normalize_text_drops_non_ascii_letters() {
        assert_eq!(normalize_text("Beyoncé"), "beyonc");
        assert_eq!(normalize_text("кино"), "");
        assert_eq!(normalize_text("?!..."), "");
        assert_eq!(normalize_text(""), "");
    }

    #[test]
    fn test_normalize_text_shape() {
        let shape = Regex::new(r"^[a-z0-9]+( [a-z0-9]+)*$").unwrap();
        for raw in ["A  b", " x ", "1, 2, 3", "Ünïcode — mix", "__a__b__"] {
            let n = normalize_text(raw);
            assert!(n.is_empty() || shape.is_match(&n), "bad shape {:?}", n);
        }
    }

    #[test]
    fn test_fold_to_ascii() {
        assert_eq!(fold_to_ascii("Beyoncé"), "beyonce");
        assert_eq!(fold_to_ascii("Motörhead"), "motorhead");
        assert_eq!(fold_to_ascii("Björk"), "bjork");
    }

    #[test]
    fn test_split_artists() {
        assert_eq!(
            split_artists("Imagine Dragons, Arty"),
            vec!["Imagine Dragons", " Arty"]
        );
        assert_eq!(split_artists("Drake feat. Jay Z"), vec!["Drake ", " Jay Z"]);
        assert_eq!(split_artists("A & B with C"), vec!["A ", " B ", " C"]);
        assert_eq!(split_artists("DJ Snake X Lil Jon"), vec!["DJ Snake ", " Lil Jon"]);
    }

    #[test]
    fn test_split_artists_whole_words_only() {
        // "x" inside "Alex", "with" inside "Withered", "feat" inside "Feather"
        assert_eq!(split_artists("Alex Clare"), vec!["Alex Clare"]);
        assert_eq!(split_artists("Withered Hand"), vec!["Withered Hand"]);
        assert_eq!(split_artists("Feather Line"), vec!["Feather Line"]);
    }

    #[test]
    fn test_custom_artist_splitter() {
        let splitter = ArtistSplitter::new(&["/", "vs"]).unwrap();
        assert_eq!(splitter.split("A vs. B/C"), vec!["A ", " B", "C"]);

        let none = ArtistSplitter::new::<&str>(&[]).unwrap();
        assert_eq!(none.split("A, B"), vec!["A, B"]);
    }
}
