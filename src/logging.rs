//! Log verbosity configuration.
//!
//! Verbosity is read once at startup from `HOSTPROBE_DEBUG` and turned into a
//! `tracing` subscriber. Unset or unparsable values mean errors only; values
//! outside 0..=2 are clamped. `RUST_LOG`, when present, takes precedence.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::FmtSubscriber;

/// Environment variable holding the numeric verbosity
pub const DEBUG_ENV_VAR: &str = "HOSTPROBE_DEBUG";

/// How much the server says.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    /// 0: errors only
    #[default]
    Error,
    /// 1: lifecycle and per-request summaries
    Info,
    /// 2: everything, including per-connection detail
    Debug,
}

impl Verbosity {
    /// Maps a numeric level, clamping to the valid range.
    pub fn from_number(level: i64) -> Self {
        match level {
            i64::MIN..=0 => Verbosity::Error,
            1 => Verbosity::Info,
            _ => Verbosity::Debug,
        }
    }

    pub fn level_filter(self) -> LevelFilter {
        match self {
            Verbosity::Error => LevelFilter::ERROR,
            Verbosity::Info => LevelFilter::INFO,
            Verbosity::Debug => LevelFilter::DEBUG,
        }
    }
}

/// Logging configuration, built once and handed to [`LogConfig::init`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogConfig {
    pub verbosity: Verbosity,
}

impl LogConfig {
    /// Reads [`DEBUG_ENV_VAR`].
    pub fn from_env() -> Self {
        Self::from_value(std::env::var(DEBUG_ENV_VAR).ok().as_deref())
    }

    /// Parses a raw variable value. Anything that is not an integer counts
    /// as 0.
    pub fn from_value(value: Option<&str>) -> Self {
        let level = value
            .and_then(|v| v.trim().parse::<i64>().ok())
            .unwrap_or(0);
        Self {
            verbosity: Verbosity::from_number(level),
        }
    }

    /// Builds the filter: `RUST_LOG` if set, otherwise our verbosity.
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::builder()
            .with_default_directive(self.verbosity.level_filter().into())
            .from_env_lossy()
    }

    /// Installs the global subscriber. Call once, early in `main`.
    pub fn init(&self) {
        FmtSubscriber::builder()
            .with_env_filter(self.env_filter())
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_is_errors_only() {
        assert_eq!(LogConfig::from_value(None).verbosity, Verbosity::Error);
    }

    #[test]
    fn test_numeric_levels() {
        assert_eq!(LogConfig::from_value(Some("0")).verbosity, Verbosity::Error);
        assert_eq!(LogConfig::from_value(Some("1")).verbosity, Verbosity::Info);
        assert_eq!(LogConfig::from_value(Some(" 2 ")).verbosity, Verbosity::Debug);
    }

    #[test]
    fn test_out_of_range_is_clamped() {
        assert_eq!(LogConfig::from_value(Some("-4")).verbosity, Verbosity::Error);
        assert_eq!(LogConfig::from_value(Some("9")).verbosity, Verbosity::Debug);
    }

    #[test]
    fn test_garbage_is_errors_only() {
        assert_eq!(LogConfig::from_value(Some("verbose")).verbosity, Verbosity::Error);
        assert_eq!(LogConfig::from_value(Some("")).verbosity, Verbosity::Error);
    }

    #[test]
    fn test_level_filters() {
        assert_eq!(Verbosity::Error.level_filter(), LevelFilter::ERROR);
        assert_eq!(Verbosity::Info.level_filter(), LevelFilter::INFO);
        assert_eq!(Verbosity::Debug.level_filter(), LevelFilter::DEBUG);
    }
}
