//! Utility functions and helpers
//!
//! Logging setup, operation timing and display helpers shared by the tables.

pub mod timer;

pub use timer::Timer;

use crate::config::TableConfig;

/// Install an `env_logger` using the configured log level as default filter
///
/// `RUST_LOG` still takes precedence. Returns `false` when a logger was
/// already installed.
pub fn init_logging(config: &TableConfig) -> bool {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_level.as_str()),
    )
    .try_init()
    .is_ok()
}

/// Truncate a string to at most `max_chars` characters, adding an ellipsis
pub fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        None => s.to_string(),
        Some((byte_index, _)) => format!("{}...", &s[..byte_index]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("exactly10!", 10), "exactly10!");
        assert_eq!(truncate("hello world", 5), "hello...");
        // Never splits a multi-byte character
        assert_eq!(truncate("ééééé", 2), "éé...");
    }

    #[test]
    fn test_init_logging_is_idempotent() {
        let config = TableConfig::testing();
        init_logging(&config);
        assert!(!init_logging(&config));
    }
}
