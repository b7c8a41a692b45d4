// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! stderr logging for the binaries.

use spectra_config::LogLevel;
use tracing_subscriber::EnvFilter;

/// Verbosity flags shared by both binaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Verbosity {
    /// Number of `-v` flags.
    pub verbose: u8,
    /// `-q` was given.
    pub quiet: bool,
}

impl Verbosity {
    /// Level implied by the flags, if any were given.
    pub fn level(self) -> Option<LogLevel> {
        match (self.quiet, self.verbose) {
            (true, _) => Some(LogLevel::Error),
            (false, 0) => None,
            (false, 1) => Some(LogLevel::Debug),
            (false, _) => Some(LogLevel::Trace),
        }
    }
}

/// Directive string for `level`.
pub fn directive(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}

/// Installs the fmt subscriber on stderr.
///
/// Flags win, then `RUST_LOG`, then the configured level.
pub fn init(configured: LogLevel, flags: Verbosity) {
    let filter = match flags.level() {
        Some(level) => EnvFilter::new(directive(level)),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(directive(configured))),
    };
    // A second install (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_map_to_levels() {
        assert_eq!(Verbosity::default().level(), None);
        let v = |verbose, quiet| Verbosity { verbose, quiet }.level();
        assert_eq!(v(1, false), Some(LogLevel::Debug));
        assert_eq!(v(3, false), Some(LogLevel::Trace));
        assert_eq!(v(0, true), Some(LogLevel::Error));
    }

    #[test]
    fn directives_are_lowercase_level_names() {
        assert_eq!(directive(LogLevel::Warn), "warn");
        assert_eq!(directive(LogLevel::Info), "info");
    }
}
