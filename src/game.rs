//! Terminal round controller.
//!
//! Runs rounds against the song library: pick a song, plan a snippet for
//! each attempt (the external player does the playing), read guesses, score
//! them, and keep lives/streak/score until the player runs out of lives or
//! quits.

use anyhow::{bail, Context, Result};
use log::{debug, info, warn};
use rand::seq::SliceRandom;
use rand::Rng;
use std::io::{BufRead, Write};
use std::time::Instant;

use crate::highscore::HighScoreStore;
use crate::matching::Evaluator;
use crate::models::{GameConfig, Song};
use crate::scoring::{GuessOutcome, Round, Session, SessionSummary};
use crate::snippet::{format_position, plan_snippet};

/// What a line of player input means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    Skip,
    Guess(String),
}

/// Interpret one input line. Commands may be typed with a leading '/'.
pub fn parse_command(line: &str) -> Command {
    let trimmed = line.trim();
    let word = trimmed.to_lowercase();
    match word.strip_prefix('/').unwrap_or(&word) {
        "quit" | "exit" => Command::Quit,
        "skip" | "s" | "pass" | "next" => Command::Skip,
        _ => Command::Guess(trimmed.to_string()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RoundEnd {
    Correct { points: u32 },
    Failed,
    Quit,
}

/// A game session over some input, output and randomness source.
pub struct Game<'a, I, O, R> {
    songs: &'a [Song],
    config: GameConfig,
    evaluator: Evaluator,
    input: I,
    output: O,
    rng: R,
}

impl<'a, I, O, R> Game<'a, I, O, R>
where
    I: BufRead,
    O: Write,
    R: Rng,
{
    pub fn new(songs: &'a [Song], config: GameConfig, input: I, output: O, rng: R) -> Result<Self> {
        let config = config.clamped();
        let evaluator = Evaluator::new(config.matching.clone()).context("Invalid artist delimiters")?;
        Ok(Self {
            songs,
            config,
            evaluator,
            input,
            output,
            rng,
        })
    }

    /// Play until lives run out or the player quits.
    pub fn run(&mut self, high_scores: Option<&HighScoreStore>) -> Result<SessionSummary> {
        if self.songs.is_empty() {
            bail!("No songs to play. Add some songs to the library and try again.");
        }

        writeln!(self.output, "---===### SPGuess ###===---")?;
        writeln!(
            self.output,
            "Guess the song title. Case and punctuation don't matter. Type 'quit' anytime."
        )?;
        writeln!(
            self.output,
            "You have {} attempts per round and {} lives per game. Failing a round costs 1 life.",
            self.config.attempts_per_round, self.config.lives
        )?;

        let best_score = high_scores.map(HighScoreStore::load).unwrap_or(0);
        let mut session = Session::new(self.config.lives);

        while !session.is_over() {
            match self.play_round()? {
                RoundEnd::Correct { points } => {
                    let scored = session.record_correct(points);
                    if scored.streak_bonus > 0 {
                        writeln!(
                            self.output,
                            "Points this round: +{} (+{} streak) | Total: {}",
                            scored.earned, scored.streak_bonus, scored.total
                        )?;
                    } else {
                        writeln!(
                            self.output,
                            "Points this round: +{} | Total: {}",
                            scored.earned, scored.total
                        )?;
                    }
                }
                RoundEnd::Failed => {
                    let lives = session.record_failure();
                    writeln!(self.output, "Life lost! Lives remaining: {}", lives)?;
                }
                RoundEnd::Quit => break,
            }
        }

        let summary = session.summary();
        self.print_summary(&summary)?;

        if let Some(store) = high_scores {
            if store.record(summary.score)? {
                writeln!(self.output, "New high score! \u{1F3C6}")?;
            } else {
                writeln!(self.output, "Best score to beat: {}", best_score)?;
            }
        }
        writeln!(self.output, "Goodbye!")?;
        Ok(summary)
    }

    fn play_round(&mut self) -> Result<RoundEnd> {
        let songs = self.songs;
        let Some(song) = songs.choose(&mut self.rng) else {
            bail!("No songs to play");
        };
        let mut round = Round::new(song, self.config.attempts_per_round);
        let title = round.canonical_title();
        info!("Round start → selected '{}' by {}", title, song.artist);

        writeln!(self.output)?;
        writeln!(self.output, "---===### GUESS THE SONG ###===---")?;
        writeln!(
            self.output,
            "You get a short audio snippet. Guess the title. Type 'skip' to forfeit the round or 'quit' to exit."
        )?;
        writeln!(self.output, "Round timer: {}s", self.config.per_round_seconds)?;

        let started = Instant::now();
        let limit = self.config.per_round_seconds as f64;

        loop {
            let remaining = limit - started.elapsed().as_secs_f64();
            let Some(plan) = plan_snippet(
                &self.config,
                round.attempt_index(),
                Some(remaining),
                song.duration_ms,
                &mut self.rng,
            ) else {
                writeln!(self.output, "Time's up for this round!")?;
                writeln!(
                    self.output,
                    "Out of time. The correct answer was '{}' by {}.",
                    title, song.artist
                )?;
                return Ok(RoundEnd::Failed);
            };
            debug!(
                "Snippet → uri={} len={:.2}s start_ms={}",
                song.uri, plan.seconds, plan.start_ms
            );
            writeln!(
                self.output,
                "\u{266A} Snippet: {:.1}s from {}",
                plan.seconds,
                format_position(plan.start_ms)
            )?;

            writeln!(
                self.output,
                "Attempts left: {} | Time left: ~{}s. Your guess (or 'quit'): ",
                round.attempts_remaining(),
                remaining.max(0.0) as u64
            )?;
            self.output.flush()?;

            let Some(line) = self.read_line()? else {
                debug!("Input closed, ending session");
                return Ok(RoundEnd::Quit);
            };

            let guess = match parse_command(&line) {
                Command::Quit => return Ok(RoundEnd::Quit),
                Command::Skip => {
                    writeln!(self.output, "You skipped this round.")?;
                    return Ok(RoundEnd::Failed);
                }
                Command::Guess(guess) => guess,
            };

            match round.guess(&self.evaluator, &guess) {
                GuessOutcome::Correct {
                    points,
                    similarity,
                    artist_bonus,
                } => {
                    info!(
                        "Guess OK → input='{}' vs title='{}', sim={:.2}, artist_included={}",
                        guess,
                        title,
                        similarity,
                        if artist_bonus { "yes" } else { "no" }
                    );
                    writeln!(self.output, "-=# RESULT #=-")?;
                    writeln!(self.output, "Correct! It was '{}' by {}.", title, song.artist)?;
                    if artist_bonus {
                        writeln!(self.output, "Bonus: You included the artist!")?;
                    }
                    return Ok(RoundEnd::Correct { points });
                }
                GuessOutcome::Retry { similarity, .. } => {
                    warn!("Guess MISS → input='{}', sim={:.2}", guess, similarity);
                    writeln!(self.output, "Not quite. Replaying the snippet...")?;
                }
                GuessOutcome::OutOfAttempts { similarity } => {
                    warn!("Guess MISS → input='{}', sim={:.2}", guess, similarity);
                    writeln!(self.output, "-=# RESULT #=-")?;
                    writeln!(
                        self.output,
                        "Out of attempts. The correct answer was '{}' by {}.",
                        title, song.artist
                    )?;
                    return Ok(RoundEnd::Failed);
                }
            }
        }
    }

    /// Next input line without its line ending; None at end of input.
    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        let read = self.input.read_line(&mut line).context("Failed to read guess")?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn print_summary(&mut self, summary: &SessionSummary) -> Result<()> {
        writeln!(self.output)?;
        writeln!(self.output, "---===### SESSION SUMMARY ###===---")?;
        writeln!(self.output, "Rounds played: {}", summary.rounds_played)?;
        writeln!(self.output, "Correct guesses: {}", summary.correct)?;
        writeln!(self.output, "Total points: {}", summary.score)?;
        writeln!(self.output, "Lives remaining: {}", summary.lives_remaining)?;
        if let Some(accuracy) = summary.accuracy {
            writeln!(self.output, "Accuracy: {:.1}%", accuracy)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn library() -> Vec<Song> {
        vec![Song {
            title: "Hellfire (Remix) - Radio Edit".to_string(),
            artist: "Imagine Dragons".to_string(),
            uri: "spotify:track:hellfire".to_string(),
            duration_ms: 180_000,
        }]
    }

    fn play(input: &str, config: GameConfig, store: Option<&HighScoreStore>) -> (SessionSummary, String) {
        let songs = library();
        let mut output = Vec::new();
        let summary = {
            let mut game = Game::new(
                &songs,
                config,
                input.as_bytes(),
                &mut output,
                StdRng::seed_from_u64(1),
            )
            .unwrap();
            game.run(store).unwrap()
        };
        (summary, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("quit"), Command::Quit);
        assert_eq!(parse_command(" /EXIT "), Command::Quit);
        assert_eq!(parse_command("skip"), Command::Skip);
        assert_eq!(parse_command("/s"), Command::Skip);
        assert_eq!(parse_command("next"), Command::Skip);
        assert_eq!(parse_command("  Hellfire "), Command::Guess("Hellfire".to_string()));
        assert_eq!(parse_command("quitting time"), Command::Guess("quitting time".to_string()));
    }

    #[test]
    fn test_correct_then_quit() {
        let (summary, out) = play("hellfire\nhellfire imagine dragons\nquit\n", GameConfig::default(), None);
        assert_eq!(summary.rounds_played, 2);
        assert_eq!(summary.correct, 2);
        // 1 point, then 3 points + 1 streak
        assert_eq!(summary.score, 5);
        assert!(out.contains("Correct! It was 'Hellfire' by Imagine Dragons."));
        assert!(out.contains("Bonus: You included the artist!"));
        assert!(out.contains("Points this round: +3 (+1 streak) | Total: 5"));
        assert!(out.contains("Goodbye!"));
    }

    #[test]
    fn test_running_out_of_lives() {
        let config = GameConfig {
            lives: 1,
            attempts_per_round: 2,
            ..GameConfig::default()
        };
        let (summary, out) = play("thunder\nbeliever\nhellfire\n", config, None);
        assert_eq!(summary.rounds_played, 1);
        assert_eq!(summary.correct, 0);
        assert_eq!(summary.lives_remaining, 0);
        assert!(out.contains("Not quite. Replaying the snippet..."));
        assert!(out.contains("Out of attempts. The correct answer was 'Hellfire' by Imagine Dragons."));
        assert!(out.contains("Life lost! Lives remaining: 0"));
        assert!(out.contains("Accuracy: 0.0%"));
    }

    #[test]
    fn test_skip_costs_a_life() {
        let config = GameConfig {
            lives: 2,
            ..GameConfig::default()
        };
        let (summary, out) = play("skip\n/pass\n", config, None);
        assert_eq!(summary.rounds_played, 2);
        assert_eq!(summary.lives_remaining, 0);
        assert!(out.contains("You skipped this round."));
    }

    #[test]
    fn test_end_of_input_ends_session() {
        let (summary, out) = play("", GameConfig::default(), None);
        assert_eq!(summary.rounds_played, 0);
        assert_eq!(summary.accuracy, None);
        assert!(out.contains("SESSION SUMMARY"));
        assert!(out.contains("Snippet: 1.0s"));
    }

    #[test]
    fn test_high_score_saved() {
        let dir = tempfile::tempdir().unwrap();
        let store = HighScoreStore::new(dir.path().join("high_scores.json"), &[]).unwrap();

        let (_, out) = play("hellfire\nquit\n", GameConfig::default(), Some(&store));
        assert!(out.contains("New high score!"));
        assert_eq!(store.load(), 1);

        let (_, out) = play("quit\n", GameConfig::default(), Some(&store));
        assert!(out.contains("Best score to beat: 1"));
    }

    #[test]
    fn test_empty_library() {
        let songs: Vec<Song> = Vec::new();
        let mut output = Vec::new();
        let mut game = Game::new(&songs, GameConfig::default(), "".as_bytes(), &mut output, StdRng::seed_from_u64(1)).unwrap();
        assert!(game.run(None).is_err());
    }
}
