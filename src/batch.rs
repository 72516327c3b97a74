//! Offline evaluation of many guesses at once.
//!
//! Rows are independent, so they are scored in parallel on the rayon pool;
//! the evaluator holds no mutable state and needs no locking.

use rayon::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::matching::Evaluator;
use crate::models::{EvalStats, GuessRow, GuessVerdict};
use crate::normalize::canonicalize;
use crate::progress::Reporter;
use crate::scoring::guess_points;

/// Log-only progress line every N rows
const LOG_INTERVAL: u64 = 10_000;

/// Score a single row.
pub fn evaluate_row(evaluator: &Evaluator, row: &GuessRow) -> GuessVerdict {
    let result = evaluator.evaluate(&row.guess, &row.title);
    let artist_mentioned = evaluator.mentions_artist(&row.guess, &row.artist);
    let points = if result.matched {
        guess_points(artist_mentioned)
    } else {
        0
    };

    GuessVerdict {
        guess: row.guess.clone(),
        canonical_title: canonicalize(&row.title),
        result,
        artist_mentioned,
        points,
        expected: row.expected,
    }
}

/// Score all rows in parallel. Verdicts keep the input order.
pub fn evaluate_rows(
    evaluator: &Evaluator,
    rows: &[GuessRow],
    reporter: Reporter,
    phase: &str,
) -> (Vec<GuessVerdict>, EvalStats) {
    let start = Instant::now();
    let total = rows.len() as u64;
    let pb = reporter.progress_bar(total, phase);
    let done = AtomicU64::new(0);

    let verdicts: Vec<GuessVerdict> = rows
        .par_iter()
        .map(|row| {
            let verdict = evaluate_row(evaluator, row);
            pb.inc(1);
            let current = done.fetch_add(1, Ordering::Relaxed) + 1;
            reporter.log_progress(phase, current, total, LOG_INTERVAL);
            verdict
        })
        .collect();

    let mut stats = EvalStats::new(evaluator.config().fuzzy_threshold);
    for verdict in &verdicts {
        stats.record(verdict);
    }
    stats.elapsed_seconds = start.elapsed().as_secs_f64();

    pb.finish_with_message(format!("{}: {} rows, {} matched", phase, stats.total_rows, stats.matched));
    (verdicts, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::{MatchKind, MatchConfig};

    fn row(guess: &str, title: &str, artist: &str, expected: Option<bool>) -> GuessRow {
        GuessRow {
            guess: guess.to_string(),
            title: title.to_string(),
            artist: artist.to_string(),
            expected,
        }
    }

    #[test]
    fn test_evaluate_row_points() {
        let evaluator = Evaluator::default();
        let v = evaluate_row(&evaluator, &row("hellfire imagine dragons", "Hellfire (Remix)", "Imagine Dragons", None));
        assert!(v.result.matched);
        assert_eq!(v.canonical_title, "Hellfire");
        assert_eq!(v.points, 3);

        let v = evaluate_row(&evaluator, &row("thunder imagine dragons", "Hellfire", "Imagine Dragons", None));
        assert!(!v.result.matched);
        assert!(v.artist_mentioned);
        assert_eq!(v.points, 0);
    }

    #[test]
    fn test_evaluate_rows_keeps_order_and_counts() {
        let rows: Vec<GuessRow> = (0..500)
            .map(|i| {
                if i % 2 == 0 {
                    row(&format!("hellfire {}", i), "Hellfire", "", Some(true))
                } else {
                    row("thunder", "Hellfire", "", Some(false))
                }
            })
            .collect();

        let (verdicts, stats) = evaluate_rows(&Evaluator::default(), &rows, Reporter::hidden(), "TEST");
        assert_eq!(verdicts.len(), 500);
        for (i, v) in verdicts.iter().enumerate() {
            assert_eq!(v.guess, rows[i].guess);
            assert_eq!(v.result.kind == MatchKind::Contained, i % 2 == 0);
        }
        assert_eq!(stats.total_rows, 500);
        assert_eq!(stats.matched, 250);
        assert_eq!(stats.true_positives, 250);
        assert_eq!(stats.true_negatives, 250);
        assert_eq!(stats.accuracy(), Some(100.0));
    }

    #[test]
    fn test_threshold_recorded() {
        let evaluator = Evaluator::new(MatchConfig {
            fuzzy_threshold: 0.7,
            ..MatchConfig::default()
        })
        .unwrap();
        let (_, stats) = evaluate_rows(&evaluator, &[], Reporter::hidden(), "EMPTY");
        assert_eq!(stats.threshold, 0.7);
        assert_eq!(stats.total_rows, 0);
    }
}
