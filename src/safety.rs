//! Safety checks before writing files next to the player's data.
//!
//! The high-score file usually sits beside the song library and the game
//! config; these checks keep a mistyped path from overwriting either.

use anyhow::{bail, Result};
use std::path::Path;

/// Input file names that must never be used as an output.
const PROTECTED_PATTERNS: [&str; 3] = ["songs", "library", "config"];

/// Validates that an output path is safe to overwrite.
///
/// Checks:
/// - Output filename must contain the required pattern (e.g., "score")
/// - Output must be a `.json` file
/// - Output cannot be the same as any of the provided input paths
///
/// # Arguments
/// * `output` - The output path that will be created/overwritten
/// * `required_pattern` - Pattern that must appear in the output filename
/// * `input_paths` - Input paths (song library, config) that must not match the output
pub fn validate_output_path(output: &Path, required_pattern: &str, input_paths: &[&Path]) -> Result<()> {
    let output_name = output.file_name().and_then(|n| n.to_str()).unwrap_or("");

    if !output_name.contains(required_pattern) {
        bail!(
            "Safety check failed: output file '{}' must contain '{}' in the name",
            output.display(),
            required_pattern
        );
    }

    if output.extension().and_then(|e| e.to_str()) != Some("json") {
        bail!(
            "Safety check failed: output file '{}' must be a .json file",
            output.display()
        );
    }

    for input in input_paths {
        if output == *input {
            bail!(
                "Safety check failed: output '{}' cannot be the same as input '{}'",
                output.display(),
                input.display()
            );
        }
    }

    let lower = output_name.to_lowercase();
    for pattern in PROTECTED_PATTERNS {
        if lower.contains(pattern) {
            bail!(
                "Safety check failed: output '{}' looks like a {} file",
                output.display(),
                pattern
            );
        }
    }

    Ok(())
}
