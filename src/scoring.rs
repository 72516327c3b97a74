//! Scoring for the guessing game.
//!
//! This module contains:
//! - Points per correct guess (title only vs. title + artist)
//! - Streak bonus for consecutive correct rounds
//! - Per-round attempt tracking
//! - Session state: lives, score, accuracy

use serde::Serialize;

use crate::matching::{Evaluator, MatchResult};
use crate::models::Song;
use crate::normalize::canonicalize;

// ============================================================================
// Point Values
// ============================================================================

/// Points for naming the title
pub const TITLE_POINTS: u32 = 1;

/// Points for naming the title and the artist
pub const ARTIST_BONUS_POINTS: u32 = 3;

/// Extra point for a correct round right after another correct round
pub const STREAK_BONUS: u32 = 1;

/// Points for a correct guess.
pub fn guess_points(artist_mentioned: bool) -> u32 {
    if artist_mentioned {
        ARTIST_BONUS_POINTS
    } else {
        TITLE_POINTS
    }
}

// ============================================================================
// Rounds
// ============================================================================

/// What happened to one guess.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GuessOutcome {
    Correct {
        points: u32,
        similarity: f64,
        artist_bonus: bool,
    },
    /// Wrong, attempts remain
    Retry { similarity: f64, attempts_left: u32 },
    /// Wrong, and that was the last attempt
    OutOfAttempts { similarity: f64 },
}

/// One round: a target song and a budget of attempts.
#[derive(Debug, Clone)]
pub struct Round<'a> {
    song: &'a Song,
    attempts_total: u32,
    attempts_remaining: u32,
}

impl<'a> Round<'a> {
    pub fn new(song: &'a Song, attempts: u32) -> Self {
        let attempts = attempts.max(1);
        Self {
            song,
            attempts_total: attempts,
            attempts_remaining: attempts,
        }
    }

    pub fn song(&self) -> &'a Song {
        self.song
    }

    /// Title as shown to the player when revealing the answer.
    pub fn canonical_title(&self) -> String {
        canonicalize(&self.song.title)
    }

    pub fn attempts_remaining(&self) -> u32 {
        self.attempts_remaining
    }

    /// 0-based index of the attempt being played.
    pub fn attempt_index(&self) -> u32 {
        self.attempts_total - self.attempts_remaining
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempts_remaining == 0
    }

    /// Score one guess and use up an attempt if it was wrong.
    pub fn guess(&mut self, evaluator: &Evaluator, guess: &str) -> GuessOutcome {
        if self.is_exhausted() {
            return GuessOutcome::OutOfAttempts { similarity: 0.0 };
        }

        let MatchResult {
            matched, similarity, ..
        } = evaluator.evaluate(guess, &self.song.title);

        if matched {
            let artist_bonus = evaluator.mentions_artist(guess, &self.song.artist);
            return GuessOutcome::Correct {
                points: guess_points(artist_bonus),
                similarity,
                artist_bonus,
            };
        }

        self.attempts_remaining -= 1;
        if self.attempts_remaining > 0 {
            GuessOutcome::Retry {
                similarity,
                attempts_left: self.attempts_remaining,
            }
        } else {
            GuessOutcome::OutOfAttempts { similarity }
        }
    }
}

// ============================================================================
// Sessions
// ============================================================================

/// Points credited for a won round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundScore {
    pub earned: u32,
    pub streak_bonus: u32,
    /// Session total after this round
    pub total: u32,
}

/// Score, streak and lives across rounds.
#[derive(Debug, Clone)]
pub struct Session {
    lives_remaining: u32,
    rounds_played: u32,
    correct: u32,
    score: u32,
    streak: u32,
    best_streak: u32,
}

impl Session {
    pub fn new(lives: u32) -> Self {
        Self {
            lives_remaining: lives,
            rounds_played: 0,
            correct: 0,
            score: 0,
            streak: 0,
            best_streak: 0,
        }
    }

    /// Credit a won round worth `earned` points.
    pub fn record_correct(&mut self, earned: u32) -> RoundScore {
        let streak_bonus = if self.streak >= 1 { STREAK_BONUS } else { 0 };
        self.rounds_played += 1;
        self.correct += 1;
        self.score += earned + streak_bonus;
        self.streak += 1;
        self.best_streak = self.best_streak.max(self.streak);
        RoundScore {
            earned,
            streak_bonus,
            total: self.score,
        }
    }

    /// A lost round (out of attempts, skipped, out of time) costs a life.
    /// Returns the lives left.
    pub fn record_failure(&mut self) -> u32 {
        self.rounds_played += 1;
        self.lives_remaining = self.lives_remaining.saturating_sub(1);
        self.streak = 0;
        self.lives_remaining
    }

    pub fn is_over(&self) -> bool {
        self.lives_remaining == 0
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn lives_remaining(&self) -> u32 {
        self.lives_remaining
    }

    pub fn rounds_played(&self) -> u32 {
        self.rounds_played
    }

    /// Correct rounds as a percentage; None before the first round.
    pub fn accuracy(&self) -> Option<f64> {
        if self.rounds_played == 0 {
            None
        } else {
            Some(100.0 * self.correct as f64 / self.rounds_played as f64)
        }
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            rounds_played: self.rounds_played,
            correct: self.correct,
            score: self.score,
            lives_remaining: self.lives_remaining,
            best_streak: self.best_streak,
            accuracy: self.accuracy(),
        }
    }
}

/// End-of-game report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub rounds_played: u32,
    pub correct: u32,
    pub score: u32,
    pub lives_remaining: u32,
    pub best_streak: u32,
    pub accuracy: Option<f64>,
}

// ============================================================================
// TESTS
// ============================================================================
