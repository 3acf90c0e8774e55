//! Error types for slabtop.
//!
//! Covers the three fatal classes a run can hit: configuration problems
//! (before the loop starts), provider fetch failures (inside the loop), and
//! terminal I/O failures (session setup, drawing, input).

use std::io;
use thiserror::Error;

/// Error type for slabtop operations.
#[derive(Debug, Error)]
pub enum SlabError {
    /// The slab statistics provider could not produce a snapshot.
    #[error("failed to fetch slab data from '{provider}': {message}")]
    FetchFailed {
        /// The provider that failed.
        provider: &'static str,
        /// Error message describing the failure.
        message: String,
    },

    /// The provider's data source does not exist on this system.
    #[error("slab data source '{provider}' is not available on this system")]
    ProviderUnavailable {
        /// The provider that was checked.
        provider: &'static str,
    },

    /// The slabinfo source had an unexpected layout.
    #[error("malformed slabinfo at line {line}: {message}")]
    SlabinfoFormat {
        /// Line number where the problem was found (1-indexed).
        line: usize,
        /// What was wrong with the line.
        message: String,
    },

    /// Configuration parsing error with line number.
    #[error("configuration error at line {line}: {message}")]
    ConfigParse {
        /// Line number where the error occurred (1-indexed).
        line: usize,
        /// Error message describing the issue.
        message: String,
    },

    /// Configuration file not found.
    #[error("configuration file not found: {0}")]
    ConfigNotFound(String),

    /// Invalid configuration value.
    #[error("invalid configuration value for '{key}': {message}")]
    ConfigInvalid {
        /// The configuration key with invalid value.
        key: String,
        /// Error message describing why the value is invalid.
        message: String,
    },

    /// Drawing was requested on a session that is not active.
    #[error("display session is not active")]
    SessionInactive,

    /// Terminal initialization, rendering or input error.
    #[error("terminal error: {0}")]
    TerminalError(#[from] io::Error),
}

/// Result type alias for slabtop operations.
pub type Result<T> = std::result::Result<T, SlabError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_failed_includes_details() {
        let err = SlabError::FetchFailed {
            provider: "slabinfo",
            message: "/proc/slabinfo: Permission denied".to_string(),
        };
        let display = err.to_string();

        assert!(display.contains("slabinfo"), "Error should include provider: {}", display);
        assert!(display.contains("Permission denied"), "Error should include message: {}", display);
    }

    #[test]
    fn test_provider_unavailable_names_provider() {
        let err = SlabError::ProviderUnavailable { provider: "slabinfo" };
        assert!(err.to_string().contains("'slabinfo'"));
    }

    #[test]
    fn test_slabinfo_format_includes_line_number() {
        let err = SlabError::SlabinfoFormat { line: 7, message: "missing slabdata".to_string() };
        let display = err.to_string();

        assert!(display.contains('7'));
        assert!(display.contains("missing slabdata"));
    }

    #[test]
    fn test_config_parse_error_includes_line_number() {
        let err = SlabError::ConfigParse { line: 42, message: "invalid value".to_string() };
        let display = err.to_string();

        assert!(display.contains("42"), "Error should include line number: {}", display);
        assert!(display.contains("invalid value"), "Error should include message: {}", display);
    }

    #[test]
    fn test_config_invalid_includes_key() {
        let err = SlabError::ConfigInvalid {
            key: "delay".to_string(),
            message: "delay must be positive integer".to_string(),
        };
        let display = err.to_string();

        assert!(display.contains("delay"), "Error should include key: {}", display);
        assert!(display.contains("positive integer"));
    }

    #[test]
    fn test_config_not_found() {
        let err = SlabError::ConfigNotFound("/etc/slabtop.yaml".to_string());
        assert!(err.to_string().contains("/etc/slabtop.yaml"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "no tty");
        let err: SlabError = io_err.into();

        assert!(matches!(err, SlabError::TerminalError(_)), "Should convert to TerminalError");
        assert!(err.to_string().contains("no tty"));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SlabError>();
    }
}
