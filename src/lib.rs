//! spguess - lenient guess evaluation for a song-guessing game.
//!
//! Decides whether a typed guess names a song: titles are canonicalized,
//! guesses containing the title are accepted outright, and everything else
//! is compared with a difflib-compatible similarity ratio.

pub mod batch;
pub mod game;
pub mod highscore;
pub mod logging;
pub mod matching;
pub mod models;
pub mod normalize;
pub mod progress;
pub mod safety;
pub mod scoring;
pub mod similarity;
pub mod snippet;
pub mod suggest;

pub use matching::{evaluate, mentions_artist, Evaluator, MatchConfig, MatchResult, FUZZY_THRESHOLD};
pub use normalize::canonicalize;
pub use similarity::ratio;
