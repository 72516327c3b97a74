//! Snippet planning: how much of the track to play, and from where.
//!
//! Each attempt replays a slightly longer snippet. The actual playback is
//! done by an external player; this only decides the window.

use rand::Rng;

use crate::models::GameConfig;

/// Shortest snippet ever requested
pub const MIN_SNIPPET_SECONDS: f64 = 0.5;

/// Slack kept after the snippet so it doesn't run into the end of the track
pub const END_HEADROOM_SECONDS: f64 = 0.5;

/// Window to request from the player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnippetPlan {
    pub seconds: f64,
    pub start_ms: u64,
}

/// Snippet length for a 0-based attempt index, before the round clock is applied.
pub fn snippet_seconds(base: f64, growth: f64, attempt_index: u32) -> f64 {
    (base + growth * attempt_index as f64).max(MIN_SNIPPET_SECONDS)
}

/// Latest start offset that leaves room for the snippet.
pub fn max_start_ms(duration_ms: u64, seconds: f64) -> u64 {
    let headroom_ms = ((seconds + END_HEADROOM_SECONDS) * 1000.0).max(0.0) as u64;
    duration_ms.saturating_sub(headroom_ms)
}

/// Plan the snippet for an attempt.
///
/// `remaining_seconds` is what is left of the round clock (None = no limit).
/// Returns None once the round is out of time.
pub fn plan_snippet<R: Rng>(
    config: &GameConfig,
    attempt_index: u32,
    remaining_seconds: Option<f64>,
    duration_ms: u64,
    rng: &mut R,
) -> Option<SnippetPlan> {
    let mut seconds = snippet_seconds(config.seconds_base, config.seconds_growth, attempt_index);

    if let Some(remaining) = remaining_seconds {
        if remaining <= 0.0 {
            return None;
        }
        seconds = seconds.min(remaining.max(MIN_SNIPPET_SECONDS));
    }

    let max_start = max_start_ms(duration_ms, seconds);
    let start_ms = if config.randomize_offset && max_start > 0 {
        rng.gen_range(0..=max_start)
    } else {
        0
    };

    Some(SnippetPlan { seconds, start_ms })
}

/// "1:05.3" style position for display, rounded to tenths.
pub fn format_position(ms: u64) -> String {
    let tenths = (ms + 50) / 100;
    let minutes = tenths / 600;
    let rest = tenths % 600;
    format!("{}:{:02}.{}", minutes, rest / 10, rest % 10)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_snippet_seconds_grow() {
        assert_eq!(snippet_seconds(1.0, 0.75, 0), 1.0);
        assert_eq!(snippet_seconds(1.0, 0.75, 2), 2.5);
        assert_eq!(snippet_seconds(0.2, 0.0, 0), MIN_SNIPPET_SECONDS);
    }

    #[test]
    fn test_max_start() {
        assert_eq!(max_start_ms(180_000, 1.0), 178_500);
        assert_eq!(max_start_ms(1_000, 1.0), 0);
        assert_eq!(max_start_ms(0, 2.0), 0);
    }

    #[test]
    fn test_plan_respects_round_clock() {
        let config = GameConfig::default();
        let mut rng = StdRng::seed_from_u64(7);

        let plan = plan_snippet(&config, 2, Some(1.2), 200_000, &mut rng).unwrap();
        assert_eq!(plan.seconds, 1.2);

        let plan = plan_snippet(&config, 2, Some(0.1), 200_000, &mut rng).unwrap();
        assert_eq!(plan.seconds, MIN_SNIPPET_SECONDS);

        assert_eq!(plan_snippet(&config, 0, Some(0.0), 200_000, &mut rng), None);
    }

    #[test]
    fn test_plan_offsets() {
        let mut rng = StdRng::seed_from_u64(42);
        let config = GameConfig::default();
        for attempt in 0..3 {
            let plan = plan_snippet(&config, attempt, None, 10_000, &mut rng).unwrap();
            assert!(plan.start_ms <= max_start_ms(10_000, plan.seconds));
        }

        let fixed = GameConfig {
            randomize_offset: false,
            ..GameConfig::default()
        };
        let plan = plan_snippet(&fixed, 0, None, 200_000, &mut rng).unwrap();
        assert_eq!(plan.start_ms, 0);

        // Track shorter than the snippet plays from the start
        let plan = plan_snippet(&config, 0, None, 500, &mut rng).unwrap();
        assert_eq!(plan.start_ms, 0);
    }

    #[test]
    fn test_format_position() {
        assert_eq!(format_position(0), "0:00.0");
        assert_eq!(format_position(65_300), "1:05.3");
        assert_eq!(format_position(59_960), "1:00.0");
        assert_eq!(format_position(59_940), "0:59.9");
        assert_eq!(format_position(3_600_049), "60:00.0");
    }
}
