//! Typeahead suggestions while the player types a guess.
//!
//! Candidates are the library's canonical titles, plus "Title - Artist"
//! variants so a completed suggestion also earns the artist bonus.

use rustc_hash::FxHashSet;

use crate::models::Song;
use crate::normalize::canonicalize;
use crate::similarity::SequenceMatcher;

/// Maximum number of suggestions shown
pub const DEFAULT_LIMIT: usize = 50;

/// Minimum similarity for a suggestion
pub const DEFAULT_CUTOFF: f64 = 0.5;

/// Suggestion candidates for a library, duplicates removed, first seen kept.
pub fn suggestion_candidates(songs: &[Song]) -> Vec<String> {
    let mut seen: FxHashSet<String> = FxHashSet::default();
    let mut candidates = Vec::with_capacity(songs.len() * 2);

    for song in songs {
        let title = canonicalize(&song.title);
        if title.is_empty() {
            continue;
        }
        let artist = song.artist.trim();
        let with_artist = (!artist.is_empty()).then(|| format!("{} - {}", title, artist));

        for candidate in std::iter::once(title).chain(with_artist) {
            if seen.insert(candidate.clone()) {
                candidates.push(candidate);
            }
        }
    }
    candidates
}

/// Best `limit` candidates scoring at least `cutoff` against `word`,
/// best first. Ties resolve to the lexically greater candidate.
pub fn close_matches<'c>(word: &str, candidates: &'c [String], limit: usize, cutoff: f64) -> Vec<&'c str> {
    if limit == 0 {
        return Vec::new();
    }
    let cutoff = cutoff.clamp(0.0, 1.0);
    let word_chars: Vec<char> = word.chars().collect();

    let mut scored: Vec<(f64, &str)> = candidates
        .iter()
        .filter_map(|candidate| {
            let candidate_chars: Vec<char> = candidate.chars().collect();
            let sm = SequenceMatcher::new(&candidate_chars, &word_chars);
            // Cheap upper bounds first
            if sm.real_quick_ratio() < cutoff || sm.quick_ratio() < cutoff {
                return None;
            }
            let score = sm.ratio();
            (score >= cutoff).then_some((score, candidate.as_str()))
        })
        .collect();

    scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| b.1.cmp(a.1)));
    scored.truncate(limit);
    scored.into_iter().map(|(_, candidate)| candidate).collect()
}

/// Suggestions for the current input text.
pub fn suggest(text: &str, songs: &[Song]) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    let candidates = suggestion_candidates(songs);
    let matches: Vec<String> = close_matches(text, &candidates, DEFAULT_LIMIT, DEFAULT_CUTOFF)
        .into_iter()
        .map(str::to_string)
        .collect();
    log::trace!("Suggestions for {:?}: {} matches", text, matches.len());
    matches
}
