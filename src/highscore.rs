//! Best-score persistence.
//!
//! A single scalar in a small JSON file: `{"best_score": 12}`. A missing or
//! unreadable file counts as a best score of 0.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::safety::validate_output_path;

/// Default file name, created next to the song library
pub const DEFAULT_FILE_NAME: &str = "high_scores.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct HighScoreFile {
    best_score: u32,
}

/// Reads and updates the best score on disk.
#[derive(Debug, Clone)]
pub struct HighScoreStore {
    path: PathBuf,
}

impl HighScoreStore {
    /// Open a store at `path`, refusing paths that could clobber an input file.
    pub fn new(path: impl Into<PathBuf>, input_paths: &[&Path]) -> Result<Self> {
        let path = path.into();
        validate_output_path(&path, "score", input_paths)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Best score so far; 0 if there is none or the file is unreadable.
    pub fn load(&self) -> u32 {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) => {
                log::debug!("No high score at {}: {}", self.path.display(), e);
                return 0;
            }
        };
        match serde_json::from_str::<HighScoreFile>(&raw) {
            Ok(file) => file.best_score,
            Err(e) => {
                log::warn!("Ignoring corrupt high score file {}: {}", self.path.display(), e);
                0
            }
        }
    }

    /// Save `score` if it beats the stored best. Returns true on a new high score.
    pub fn record(&self, score: u32) -> Result<bool> {
        if score <= self.load() {
            return Ok(false);
        }
        let json = serde_json::to_string(&HighScoreFile { best_score: score })?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write high score {}", self.path.display()))?;
        Ok(true)
    }
}
