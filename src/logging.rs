//! Diagnostic logging setup.
//!
//! Verbosity comes in as a value from the command line, not as global
//! state. `RUST_LOG`, when set, still overrides it.

use log::LevelFilter;

/// Verbosity picked on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Verbosity {
    /// Number of `-v` flags
    pub verbose: u8,
    /// `-q`: errors only
    pub quiet: bool,
}

impl Verbosity {
    pub fn level_filter(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Error;
        }
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

/// Install the stderr logger. Later calls are no-ops.
pub fn init_logging(verbosity: Verbosity) {
    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(verbosity.level_filter())
        .format_timestamp(None)
        .format_target(false)
        .parse_env(env_logger::Env::default());
    if builder.try_init().is_err() {
        log::debug!("Logger already initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_filter() {
        assert_eq!(Verbosity::default().level_filter(), LevelFilter::Warn);
        assert_eq!(Verbosity { verbose: 1, quiet: false }.level_filter(), LevelFilter::Info);
        assert_eq!(Verbosity { verbose: 2, quiet: false }.level_filter(), LevelFilter::Debug);
        assert_eq!(Verbosity { verbose: 7, quiet: false }.level_filter(), LevelFilter::Trace);
        assert_eq!(Verbosity { verbose: 3, quiet: true }.level_filter(), LevelFilter::Error);
    }

    #[test]
    fn test_init_twice() {
        init_logging(Verbosity::default());
        init_logging(Verbosity { verbose: 2, quiet: false });
    }
}
