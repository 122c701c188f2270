//! Console configuration.
//!
//! All interactive settings live in [`crate::SessionState`]; this only covers
//! what has to be known before the bar process is launched.

use std::path::PathBuf;

/// Environment variable overriding the bar executable.
pub const PROGRAM_ENV: &str = "BARCONSOLE_PROGRAM";

/// Environment variable enabling file logging.
pub const LOG_ENV: &str = "BARCONSOLE_LOG";

/// Executable launched when nothing else is configured.
pub const DEFAULT_PROGRAM: &str = "./target/debug/istat";

/// Configuration for a console session.
#[derive(Clone, Debug)]
pub struct ConsoleConfig {
    /// Executable speaking the bar protocol. Launched with no arguments.
    pub program: PathBuf,

    /// Where to write tracing output, if anywhere.
    pub log_file: Option<PathBuf>,

    /// Capacity of the event and outbound command channels.
    pub event_capacity: usize,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_PROGRAM),
            log_file: None,
            event_capacity: 256,
        }
    }
}

impl ConsoleConfig {
    /// Create a config for the given executable.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    /// Build a config from `BARCONSOLE_PROGRAM` and `BARCONSOLE_LOG`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var_os(key))
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<std::ffi::OsString>) -> Self {
        let mut config = Self::default();
        if let Some(program) = lookup(PROGRAM_ENV).filter(|p| !p.is_empty()) {
            config.program = PathBuf::from(program);
        }
        config.log_file = lookup(LOG_ENV)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);
        config
    }

    /// Set the channel capacity.
    #[must_use]
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;

    use super::*;

    #[test]
    fn test_defaults_without_env() {
        let config = ConsoleConfig::from_lookup(|_| None);
        assert_eq!(config.program, PathBuf::from(DEFAULT_PROGRAM));
        assert!(config.log_file.is_none());
        assert_eq!(config.event_capacity, 256);
    }

    #[test]
    fn test_env_overrides() {
        let config = ConsoleConfig::from_lookup(|key| match key {
            PROGRAM_ENV => Some(OsString::from("/usr/bin/bar")),
            LOG_ENV => Some(OsString::from("/tmp/console.log")),
            _ => None,
        });
        assert_eq!(config.program, PathBuf::from("/usr/bin/bar"));
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/console.log")));
    }

    #[test]
    fn test_empty_env_values_ignored() {
        let config = ConsoleConfig::from_lookup(|_| Some(OsString::new()));
        assert_eq!(config.program, PathBuf::from(DEFAULT_PROGRAM));
        assert!(config.log_file.is_none());
    }

    #[test]
    fn test_capacity_floor() {
        assert_eq!(ConsoleConfig::new("bar").event_capacity(0).event_capacity, 1);
    }
}
