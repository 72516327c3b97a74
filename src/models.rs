//! Core data models for the guessing game.
//!
//! Songs from the listener's library, game settings, and the counters
//! collected by batch evaluation and threshold calibration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::matching::{MatchConfig, MatchKind, MatchResult};

// ============================================================================
// Songs
// ============================================================================

/// One track of the listener's library.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Song {
    pub title: String,
    pub artist: String,
    /// Player URI handed to the external audio player
    pub uri: String,
    pub duration_ms: u64,
}

/// Load a song library from a JSON array.
/// Entries without a usable title are dropped.
pub fn load_songs(path: &Path) -> Result<Vec<Song>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read song library {}", path.display()))?;
    let songs: Vec<Song> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse song library {}", path.display()))?;

    let total = songs.len();
    let songs: Vec<Song> = songs
        .into_iter()
        .filter(|s| !s.title.trim().is_empty())
        .collect();
    if songs.len() < total {
        log::warn!("Skipped {} songs without a title", total - songs.len());
    }
    Ok(songs)
}

// ============================================================================
// Game Settings
// ============================================================================

/// Settings for a game session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub attempts_per_round: u32,
    pub lives: u32,
    /// Snippet length on the first attempt
    pub seconds_base: f64,
    /// Extra snippet length per further attempt
    pub seconds_growth: f64,
    /// Start snippets at a random point of the track
    pub randomize_offset: bool,
    /// Time limit per round
    pub per_round_seconds: u32,
    pub matching: MatchConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            attempts_per_round: 3,
            lives: 3,
            seconds_base: 1.0,
            seconds_growth: 0.75,
            randomize_offset: true,
            per_round_seconds: 60,
            matching: MatchConfig::default(),
        }
    }
}

impl GameConfig {
    /// Load settings from a JSON file; missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: GameConfig = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        Ok(config)
    }

    /// Clamp values into playable ranges.
    pub fn clamped(mut self) -> Self {
        self.attempts_per_round = self.attempts_per_round.max(1);
        self.lives = self.lives.max(1);
        self.per_round_seconds = self.per_round_seconds.clamp(5, 600);
        self.seconds_base = if self.seconds_base.is_finite() {
            self.seconds_base.max(0.2)
        } else {
            1.0
        };
        self.seconds_growth = if self.seconds_growth.is_finite() {
            self.seconds_growth.max(0.0)
        } else {
            0.0
        };
        self.matching.fuzzy_threshold = if self.matching.fuzzy_threshold.is_nan() {
            crate::matching::FUZZY_THRESHOLD
        } else {
            self.matching.fuzzy_threshold.clamp(0.0, 1.0)
        };
        self
    }
}

// ============================================================================
// Batch Evaluation Models
// ============================================================================

/// One guess to evaluate offline.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GuessRow {
    pub guess: String,
    pub title: String,
    pub artist: String,
    /// Ground truth for calibration: should this guess count?
    pub expected: Option<bool>,
}

/// Load guess rows from a JSON array.
pub fn load_guess_rows(path: &Path) -> Result<Vec<GuessRow>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read guesses {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse guesses {}", path.display()))
}

/// Evaluation of one [`GuessRow`].
#[derive(Clone, Debug, Serialize)]
pub struct GuessVerdict {
    pub guess: String,
    pub canonical_title: String,
    #[serde(flatten)]
    pub result: MatchResult,
    pub artist_mentioned: bool,
    pub points: u32,
    pub expected: Option<bool>,
}

// ============================================================================
// Statistics
// ============================================================================

/// Counters for a batch or calibration run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct EvalStats {
    pub threshold: f64,
    pub total_rows: usize,
    pub matched: usize,
    pub contained: usize,
    pub fuzzy: usize,
    pub artist_mentions: usize,

    // Labeled rows only
    pub labeled_rows: usize,
    pub true_positives: usize,
    pub false_positives: usize,
    pub true_negatives: usize,
    pub false_negatives: usize,

    // Timing
    pub elapsed_seconds: f64,
}

impl EvalStats {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            ..Self::default()
        }
    }

    /// Count one verdict.
    pub fn record(&mut self, verdict: &GuessVerdict) {
        self.total_rows += 1;
        match verdict.result.kind {
            MatchKind::Contained => self.contained += 1,
            MatchKind::Fuzzy => self.fuzzy += 1,
            MatchKind::Miss => {}
        }
        if verdict.result.matched {
            self.matched += 1;
            if verdict.artist_mentioned {
                self.artist_mentions += 1;
            }
        }

        if let Some(expected) = verdict.expected {
            self.labeled_rows += 1;
            match (expected, verdict.result.matched) {
                (true, true) => self.true_positives += 1,
                (false, true) => self.false_positives += 1,
                (false, false) => self.true_negatives += 1,
                (true, false) => self.false_negatives += 1,
            }
        }
    }

    /// Calculate match rate as a percentage
    pub fn match_rate(&self) -> f64 {
        if self.total_rows == 0 {
            0.0
        } else {
            100.0 * self.matched as f64 / self.total_rows as f64
        }
    }

    /// Share of labeled rows judged correctly, as a percentage
    pub fn accuracy(&self) -> Option<f64> {
        if self.labeled_rows == 0 {
            None
        } else {
            let correct = self.true_positives + self.true_negatives;
            Some(100.0 * correct as f64 / self.labeled_rows as f64)
        }
    }

    /// Log stats to stderr in JSON format
    pub fn log_phase(&self, phase: &str) {
        if let Ok(json) = serde_json::to_string_pretty(self) {
            eprintln!("[STATS:{}]\n{}", phase, json);
        }
    }

    /// Write stats to a JSON file
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write stats {}", path.display()))?;
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn verdict(kind: MatchKind, artist: bool, expected: Option<bool>) -> GuessVerdict {
        GuessVerdict {
            guess: String::new(),
            canonical_title: String::new(),
            result: MatchResult {
                matched: kind != MatchKind::Miss,
                similarity: if kind == MatchKind::Contained { 1.0 } else { 0.5 },
                kind,
            },
            artist_mentioned: artist,
            points: 0,
            expected,
        }
    }

    #[test]
    fn test_load_songs_skips_untitled() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"title": "Hellfire", "artist": "Imagine Dragons", "uri": "spotify:track:1", "duration_ms": 180000}},
                {{"title": "  ", "artist": "Nobody"}},
                {{"title": "Believer"}}
            ]"#
        )
        .unwrap();

        let songs = load_songs(file.path()).unwrap();
        assert_eq!(songs.len(), 2);
        assert_eq!(songs[0].duration_ms, 180000);
        assert_eq!(songs[1].artist, "");
        assert_eq!(songs[1].duration_ms, 0);
    }

    #[test]
    fn test_load_songs_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = load_songs(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse song library"));
    }

    #[test]
    fn test_game_config_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"lives": 5, "matching": {{"fuzzy_threshold": 0.9}}}}"#).unwrap();

        let config = GameConfig::load(file.path()).unwrap();
        assert_eq!(config.lives, 5);
        assert_eq!(config.attempts_per_round, 3);
        assert_eq!(config.matching.fuzzy_threshold, 0.9);
        assert_eq!(config.matching.artist_delimiters.len(), 5);
    }

    #[test]
    fn test_game_config_clamped() {
        let config = GameConfig {
            attempts_per_round: 0,
            lives: 0,
            seconds_base: 0.0,
            seconds_growth: -1.0,
            per_round_seconds: 10_000,
            ..GameConfig::default()
        }
        .clamped();
        assert_eq!(config.attempts_per_round, 1);
        assert_eq!(config.lives, 1);
        assert_eq!(config.seconds_base, 0.2);
        assert_eq!(config.seconds_growth, 0.0);
        assert_eq!(config.per_round_seconds, 600);
    }

    #[test]
    fn test_stats_record() {
        let mut stats = EvalStats::new(0.85);
        stats.record(&verdict(MatchKind::Contained, true, Some(true)));
        stats.record(&verdict(MatchKind::Fuzzy, false, Some(false)));
        stats.record(&verdict(MatchKind::Miss, true, Some(true)));
        stats.record(&verdict(MatchKind::Miss, false, None));

        assert_eq!(stats.total_rows, 4);
        assert_eq!(stats.matched, 2);
        assert_eq!(stats.contained, 1);
        assert_eq!(stats.fuzzy, 1);
        assert_eq!(stats.artist_mentions, 1);
        assert_eq!(stats.labeled_rows, 3);
        assert_eq!(stats.true_positives, 1);
        assert_eq!(stats.false_positives, 1);
        assert_eq!(stats.false_negatives, 1);
        assert_eq!(stats.match_rate(), 50.0);
        assert!((stats.accuracy().unwrap() - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_stats_empty() {
        let stats = EvalStats::default();
        assert_eq!(stats.match_rate(), 0.0);
        assert_eq!(stats.accuracy(), None);
    }
}
