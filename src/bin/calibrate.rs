//! Sweep the fuzzy threshold over labeled guesses
//! Usage: cargo run --release --bin calibrate -- <labeled_guesses.json>

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;

use spguess::batch::evaluate_rows;
use spguess::logging::{init_logging, Verbosity};
use spguess::matching::{Evaluator, MatchConfig, FUZZY_THRESHOLD};
use spguess::models::{load_guess_rows, EvalStats};
use spguess::progress::{format_duration, Reporter};
use spguess::safety::validate_output_path;

#[derive(Parser)]
#[command(name = "calibrate")]
#[command(about = "Compare fuzzy thresholds against hand-labeled guesses")]
struct Args {
    /// JSON array of {guess, title, artist, expected}
    input: PathBuf,

    #[arg(long, default_value = "0.70")]
    from: f64,

    #[arg(long, default_value = "0.95")]
    to: f64,

    #[arg(long, default_value = "0.05")]
    step: f64,

    /// Strip accents and transliterate before comparing
    #[arg(long)]
    fold_diacritics: bool,

    /// Write per-threshold stats as JSON (name must contain "calibration")
    #[arg(long)]
    output: Option<PathBuf>,

    #[arg(long, default_value = "0")]
    workers: usize,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Upper bound on thresholds in one sweep
const MAX_THRESHOLD_STEPS: usize = 1000;

/// Thresholds from `from` to `to` inclusive, rounded to 4 places.
fn threshold_steps(from: f64, to: f64, step: f64) -> Result<Vec<f64>> {
    if !(step > 0.0) {
        bail!("--step must be positive");
    }
    let span = (to - from) / step + 1e-9;
    if !span.is_finite() || span >= MAX_THRESHOLD_STEPS as f64 {
        bail!(
            "--step {} gives more than {} thresholds between {} and {}",
            step,
            MAX_THRESHOLD_STEPS,
            from,
            to
        );
    }
    let count = span.floor() as usize;
    Ok((0..=count)
        .map(|i| ((from + step * i as f64) * 10_000.0).round() / 10_000.0)
        .collect())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(Verbosity {
        verbose: args.verbose,
        quiet: false,
    });

    if !(0.0..=1.0).contains(&args.from) || !(0.0..=1.0).contains(&args.to) || args.from > args.to {
        bail!("Need 0 <= --from <= --to <= 1");
    }
    let thresholds = threshold_steps(args.from, args.to, args.step)?;
    if let Some(output) = &args.output {
        validate_output_path(output, "calibration", &[args.input.as_path()])?;
    }
    if args.workers > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(args.workers)
            .build_global()
            .context("Failed to set thread pool size")?;
    }

    let start = Instant::now();
    eprintln!("Loading labeled guesses...");
    let rows = load_guess_rows(&args.input)?;
    let labeled = rows.iter().filter(|r| r.expected.is_some()).count();
    if labeled == 0 {
        bail!("No labeled rows in {:?} (set \"expected\" on each guess)", args.input);
    }
    eprintln!("Loaded {} guesses, {} labeled", rows.len(), labeled);

    let mut results: Vec<EvalStats> = Vec::new();
    for threshold in thresholds {
        let evaluator = Evaluator::new(MatchConfig {
            fuzzy_threshold: threshold,
            fold_diacritics: args.fold_diacritics,
            ..MatchConfig::default()
        })
        .context("Invalid artist delimiters")?;
        let (_, stats) = evaluate_rows(&evaluator, &rows, Reporter::hidden(), "calibrate");
        log::debug!("threshold {:.2}: {} matched", threshold, stats.matched);
        results.push(stats);
    }

    // ========================================================================
    // RESULTS
    // ========================================================================

    println!("\n{:=<60}", "");
    println!("{:>9} {:>9} {:>9} {:>7} {:>7}", "threshold", "matched", "accuracy", "FP", "FN");
    println!("{:-<60}", "");
    for stats in &results {
        let marker = if (stats.threshold - FUZZY_THRESHOLD).abs() < 1e-9 {
            " (default)"
        } else {
            ""
        };
        println!(
            "{:>9.2} {:>9} {:>8.1}% {:>7} {:>7}{}",
            stats.threshold,
            stats.matched,
            stats.accuracy().unwrap_or(0.0),
            stats.false_positives,
            stats.false_negatives,
            marker
        );
    }
    println!("{:=<60}", "");

    // Best accuracy, lowest threshold on ties
    if let Some(best) = results.iter().fold(None::<&EvalStats>, |best, stats| match best {
        Some(b) if b.accuracy() >= stats.accuracy() => Some(b),
        _ => Some(stats),
    }) {
        println!(
            "Best: {:.2} at {:.1}% accuracy",
            best.threshold,
            best.accuracy().unwrap_or(0.0)
        );
    }
    println!("Elapsed: {}", format_duration(start.elapsed()));

    if let Some(output) = &args.output {
        let json = serde_json::to_string_pretty(&results)?;
        std::fs::write(output, json)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        eprintln!("Wrote {}", output.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_steps() {
        assert_eq!(
            threshold_steps(0.70, 0.95, 0.05).unwrap(),
            vec![0.7, 0.75, 0.8, 0.85, 0.9, 0.95]
        );
        assert_eq!(threshold_steps(0.85, 0.85, 0.05).unwrap(), vec![0.85]);
        assert_eq!(threshold_steps(0.0, 0.5, 0.001).unwrap().len(), 501);
    }

    #[test]
    fn test_threshold_steps_rejects_tiny_steps() {
        assert!(threshold_steps(0.70, 0.95, 1e-300).is_err());
        assert!(threshold_steps(0.0, 1.0, 0.001).is_err());
        assert!(threshold_steps(0.70, 0.95, 0.0).is_err());
        assert!(threshold_steps(0.70, 0.95, f64::NAN).is_err());
    }
}
