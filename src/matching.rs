//! Guess evaluation: does a free-text guess name the right track?
//!
//! Two stages:
//! 1. Containment - the normalized canonical title equals the normalized
//!    guess, or appears in it as a whole-token span ("hellfire by imagine
//!    dragons" contains "hellfire"; "scarlet" does not contain "car").
//! 2. Fuzzy fallback - longest-matching-blocks ratio against a threshold,
//!    so one- or two-character typos on short titles still count.
//!
//! Everything here is pure and infallible. Bad input degrades to "no match".

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::normalize::{canonicalize, fold_to_ascii, normalize_text, ArtistSplitter, DEFAULT_ARTIST_DELIMITERS};
use crate::similarity;

// ============================================================================
// Thresholds
// ============================================================================

/// Minimum similarity ratio for a fuzzy match.
/// Accepts 1-2 character typos on short titles, rejects same-length
/// different titles.
pub const FUZZY_THRESHOLD: f64 = 0.85;

/// Similarity reported for an exact or contained match.
pub const CONTAINED_SIMILARITY: f64 = 1.0;

// ============================================================================
// Config & Results
// ============================================================================

/// Tunable matching constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Minimum fuzzy ratio counted as a correct guess
    pub fuzzy_threshold: f64,
    /// Delimiters between artist names in an artist field
    pub artist_delimiters: Vec<String>,
    /// Fold accents/non-Latin scripts to ASCII before normalizing
    /// ("beyonce" then matches "Beyoncé"). Off by default.
    pub fold_diacritics: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: FUZZY_THRESHOLD,
            artist_delimiters: DEFAULT_ARTIST_DELIMITERS.iter().map(|d| d.to_string()).collect(),
            fold_diacritics: false,
        }
    }
}

/// How a guess matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Title equal to or contained in the guess
    Contained,
    /// Similar enough to pass the fuzzy threshold
    Fuzzy,
    /// Not a match
    Miss,
}

/// Outcome of evaluating one guess.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub matched: bool,
    /// 1.0 for contained matches, the fuzzy ratio otherwise
    pub similarity: f64,
    pub kind: MatchKind,
}

impl MatchResult {
    fn contained() -> Self {
        Self {
            matched: true,
            similarity: CONTAINED_SIMILARITY,
            kind: MatchKind::Contained,
        }
    }

    fn miss(similarity: f64) -> Self {
        Self {
            matched: false,
            similarity,
            kind: MatchKind::Miss,
        }
    }

    /// `(matched, similarity)` pair.
    pub fn as_pair(&self) -> (bool, f64) {
        (self.matched, self.similarity)
    }
}

// ============================================================================
// Evaluator
// ============================================================================

/// Guess evaluator for one [`MatchConfig`].
/// Holds only compiled, immutable state; share it freely across threads.
#[derive(Debug, Clone)]
pub struct Evaluator {
    config: MatchConfig,
    artists: ArtistSplitter,
}

static DEFAULT_EVALUATOR: Lazy<Evaluator> = Lazy::new(|| Evaluator::new(MatchConfig::default()).unwrap());

impl Evaluator {
    pub fn new(config: MatchConfig) -> Result<Self, regex::Error> {
        let artists = ArtistSplitter::new(&config.artist_delimiters)?;
        Ok(Self { config, artists })
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    fn normalize(&self, value: &str) -> String {
        if self.config.fold_diacritics {
            normalize_text(&fold_to_ascii(value))
        } else {
            normalize_text(value)
        }
    }

    fn normalized_title(&self, correct_title: &str) -> String {
        self.normalize(&canonicalize(correct_title))
    }

    /// True when the canonical title is the whole guess or a whole-token span of it.
    pub fn guess_contains_title(&self, guess: &str, correct_title: &str) -> bool {
        let title_norm = self.normalized_title(correct_title);
        contains_token_span(&self.normalize(guess), &title_norm)
    }

    /// Evaluate a guess against a raw title.
    pub fn evaluate(&self, guess: &str, correct_title: &str) -> MatchResult {
        let guess_norm = self.normalize(guess);
        let title_norm = self.normalized_title(correct_title);

        if contains_token_span(&guess_norm, &title_norm) {
            return MatchResult::contained();
        }

        if guess_norm.is_empty() || title_norm.is_empty() {
            return MatchResult::miss(0.0);
        }

        let ratio = similarity::ratio(&guess_norm, &title_norm);
        if ratio >= self.config.fuzzy_threshold {
            MatchResult {
                matched: true,
                similarity: ratio,
                kind: MatchKind::Fuzzy,
            }
        } else {
            MatchResult::miss(ratio)
        }
    }

    /// Lenient yes/no verdict.
    pub fn is_correct_guess(&self, guess: &str, correct_title: &str) -> bool {
        self.evaluate(guess, correct_title).matched
    }

    /// Does the guess mention any credited artist?
    /// e.g., "hellfire by imagine dragons" mentions "Imagine Dragons, Arty".
    pub fn mentions_artist(&self, guess: &str, artist_field: &str) -> bool {
        let guess_norm = self.normalize(guess);

        let token_hit = self
            .artists
            .split(artist_field)
            .into_iter()
            .map(|token| self.normalize(token))
            .any(|token| !token.is_empty() && guess_norm.contains(&token));
        if token_hit {
            return true;
        }

        // Whole field, for names the delimiters cut apart ("Earth, Wind & Fire")
        let field_norm = self.normalize(artist_field);
        !field_norm.is_empty() && guess_norm.contains(&field_norm)
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        DEFAULT_EVALUATOR.clone()
    }
}

/// `needle` equals `haystack` or sits in it bounded by start/end or a space.
/// Both sides are expected to be normalized text (single spaces, no edges).
fn contains_token_span(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    if haystack == needle {
        return true;
    }
    format!(" {} ", haystack).contains(&format!(" {} ", needle))
}

// ============================================================================
// Default-config shortcuts
// ============================================================================

/// Evaluate with the default config. Returns `(matched, similarity)`.
pub fn evaluate(guess: &str, correct_title: &str) -> (bool, f64) {
    DEFAULT_EVALUATOR.evaluate(guess, correct_title).as_pair()
}

pub fn is_correct_guess(guess: &str, correct_title: &str) -> bool {
    DEFAULT_EVALUATOR.is_correct_guess(guess, correct_title)
}

pub fn guess_contains_title(guess: &str, correct_title: &str) -> bool {
    DEFAULT_EVALUATOR.guess_contains_title(guess, correct_title)
}

pub fn mentions_artist(guess: &str, artist_field: &str) -> bool {
    DEFAULT_EVALUATOR.mentions_artist(guess, artist_field)
}

// ============================================================================
// TESTS
// ============================================================================
