use anyhow::{bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::{self, BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use spguess::batch::evaluate_rows;
use spguess::game::Game;
use spguess::highscore::{HighScoreStore, DEFAULT_FILE_NAME};
use spguess::logging::{init_logging, Verbosity};
use spguess::matching::{Evaluator, MatchConfig};
use spguess::models::{load_guess_rows, load_songs, GameConfig};
use spguess::normalize::canonicalize;
use spguess::progress::{format_duration, Reporter};
use spguess::safety::validate_output_path;
use spguess::scoring::guess_points;
use spguess::suggest::suggest;

#[derive(Parser)]
#[command(name = "spguess")]
#[command(about = "Evaluate song-title guesses and play the guessing game in a terminal")]
struct Args {
    /// More diagnostics (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Errors only
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the canonical form of each title
    Canonicalize { titles: Vec<String> },

    /// Judge one guess against a title
    Evaluate {
        guess: String,
        title: String,

        /// Artist field, to check for the artist bonus
        #[arg(long)]
        artist: Option<String>,

        #[command(flatten)]
        matching: MatchArgs,
    },

    /// Typeahead suggestions from a song library
    Suggest {
        text: String,

        #[arg(long)]
        songs: PathBuf,
    },

    /// Evaluate a JSON file of guesses in parallel
    Batch {
        input: PathBuf,

        /// Write aggregate stats as JSON (name must contain "stats")
        #[arg(long)]
        output: Option<PathBuf>,

        /// Write every verdict as JSON (name must contain "verdict")
        #[arg(long)]
        verdicts: Option<PathBuf>,

        #[arg(long, default_value = "0")]
        workers: usize,

        /// Hide progress bars, print periodic progress lines
        #[arg(long)]
        log_only: bool,

        #[command(flatten)]
        matching: MatchArgs,
    },

    /// Play in the terminal (snippets are announced, not played)
    Play(PlayArgs),
}

#[derive(ClapArgs)]
struct MatchArgs {
    /// Similarity needed for a fuzzy match
    #[arg(long)]
    threshold: Option<f64>,

    /// Strip accents and transliterate before comparing
    #[arg(long)]
    fold_diacritics: bool,
}

impl MatchArgs {
    fn apply(&self, mut config: MatchConfig) -> Result<MatchConfig> {
        if let Some(threshold) = self.threshold {
            if !(0.0..=1.0).contains(&threshold) {
                bail!("Threshold must be between 0 and 1, got {}", threshold);
            }
            config.fuzzy_threshold = threshold;
        }
        if self.fold_diacritics {
            config.fold_diacritics = true;
        }
        Ok(config)
    }

    fn evaluator(&self) -> Result<Evaluator> {
        let config = self.apply(MatchConfig::default())?;
        Evaluator::new(config).context("Invalid artist delimiters")
    }
}

#[derive(ClapArgs)]
struct PlayArgs {
    #[arg(long)]
    songs: PathBuf,

    /// JSON game settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// High score file (defaults to high_scores.json next to the library)
    #[arg(long)]
    scores: Option<PathBuf>,

    /// Don't read or write a high score
    #[arg(long)]
    no_scores: bool,

    #[arg(long)]
    attempts: Option<u32>,

    #[arg(long)]
    lives: Option<u32>,

    /// Round time limit in seconds
    #[arg(long)]
    seconds: Option<u32>,

    /// Seed for song and snippet selection
    #[arg(long)]
    seed: Option<u64>,

    #[command(flatten)]
    matching: MatchArgs,
}

fn run_canonicalize(titles: &[String]) -> Result<()> {
    if titles.is_empty() {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = line.context("Failed to read stdin")?;
            println!("{}", canonicalize(&line));
        }
    } else {
        for title in titles {
            println!("{}", canonicalize(title));
        }
    }
    Ok(())
}

fn run_evaluate(guess: &str, title: &str, artist: Option<&str>, matching: &MatchArgs) -> Result<()> {
    let evaluator = matching.evaluator()?;
    let result = evaluator.evaluate(guess, title);

    println!("Title:      {}", canonicalize(title));
    println!("Match:      {} ({:?})", result.matched, result.kind);
    println!("Similarity: {:.4}", result.similarity);
    if let Some(artist) = artist {
        let mentioned = evaluator.mentions_artist(guess, artist);
        println!("Artist:     {}", if mentioned { "mentioned" } else { "not mentioned" });
        if result.matched {
            println!("Points:     {}", guess_points(mentioned));
        }
    }
    Ok(())
}

fn run_suggest(text: &str, songs_path: &Path) -> Result<()> {
    let songs = load_songs(songs_path)?;
    let suggestions = suggest(text, &songs);
    if suggestions.is_empty() {
        println!("No suggestions.");
    }
    for suggestion in suggestions {
        println!("{}", suggestion);
    }
    Ok(())
}

fn run_batch(
    input: &Path,
    output: Option<&Path>,
    verdicts_path: Option<&Path>,
    workers: usize,
    log_only: bool,
    matching: &MatchArgs,
) -> Result<()> {
    if workers > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build_global()
            .context("Failed to set thread pool size")?;
    }
    if let Some(path) = output {
        validate_output_path(path, "stats", &[input])?;
    }
    if let Some(path) = verdicts_path {
        validate_output_path(path, "verdict", &[input])?;
    }

    let start = Instant::now();
    let evaluator = matching.evaluator()?;

    eprintln!("Loading guesses: {:?}", input);
    let rows = load_guess_rows(input)?;
    eprintln!("Loaded {} guesses", rows.len());

    let (verdicts, stats) = evaluate_rows(&evaluator, &rows, Reporter::new(log_only), "Evaluating guesses");
    stats.log_phase("batch");

    if let Some(path) = output {
        stats.write_to_file(path)?;
    }
    if let Some(path) = verdicts_path {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &verdicts)?;
        writer.flush()?;
    }

    println!("\n{:=<60}", "");
    println!("Evaluation complete!");
    println!("  Guesses: {}", stats.total_rows);
    println!(
        "  Matched: {} ({:.1}%), {} contained, {} fuzzy",
        stats.matched,
        stats.match_rate(),
        stats.contained,
        stats.fuzzy
    );
    println!("  Artist mentioned: {}", stats.artist_mentions);
    if let Some(accuracy) = stats.accuracy() {
        println!(
            "  Accuracy: {:.1}% over {} labeled (FP {}, FN {})",
            accuracy, stats.labeled_rows, stats.false_positives, stats.false_negatives
        );
    }
    println!("  Elapsed: {}", format_duration(start.elapsed()));
    println!("{:=<60}", "");
    Ok(())
}

fn run_play(args: &PlayArgs) -> Result<()> {
    let songs = load_songs(&args.songs)?;
    if songs.is_empty() {
        bail!("No songs found in {:?}", args.songs);
    }

    let mut config = match &args.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    if let Some(attempts) = args.attempts {
        config.attempts_per_round = attempts;
    }
    if let Some(lives) = args.lives {
        config.lives = lives;
    }
    if let Some(seconds) = args.seconds {
        config.per_round_seconds = seconds;
    }
    config.matching = args.matching.apply(config.matching)?;

    let store = if args.no_scores {
        None
    } else {
        let path = args.scores.clone().unwrap_or_else(|| {
            args.songs
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join(DEFAULT_FILE_NAME)
        });
        let mut inputs: Vec<&Path> = vec![args.songs.as_path()];
        if let Some(config_path) = &args.config {
            inputs.push(config_path.as_path());
        }
        Some(HighScoreStore::new(path, &inputs)?)
    };

    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut game = Game::new(&songs, config, stdin.lock(), stdout.lock(), rng)?;
    game.run(store.as_ref())?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(Verbosity {
        verbose: args.verbose,
        quiet: args.quiet,
    });

    match &args.command {
        Command::Canonicalize { titles } => run_canonicalize(titles),
        Command::Evaluate {
            guess,
            title,
            artist,
            matching,
        } => run_evaluate(guess, title, artist.as_deref(), matching),
        Command::Suggest { text, songs } => run_suggest(text, songs),
        Command::Batch {
            input,
            output,
            verdicts,
            workers,
            log_only,
            matching,
        } => run_batch(
            input,
            output.as_deref(),
            verdicts.as_deref(),
            *workers,
            *log_only,
            matching,
        ),
        Command::Play(play) => run_play(play),
    }
}
