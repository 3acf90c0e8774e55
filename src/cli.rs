//! Command-line interface.

use std::path::PathBuf;

use clap::Parser;

use crate::sort::criteria_help;

/// slabtop: display kernel slab cache information in real time
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "slabtop")]
#[command(version)]
#[command(about = "Display kernel slab cache information in real time", long_about = None)]
#[command(after_help = criteria_help())]
pub struct Cli {
    /// Delay between updates in seconds
    #[arg(short, long, value_name = "secs", allow_hyphen_values = true)]
    pub delay: Option<i64>,

    /// Only display once, then exit
    #[arg(short, long)]
    pub once: bool,

    /// Sort criteria by character (see below)
    #[arg(short, long, value_name = "char")]
    pub sort: Option<String>,

    /// Config file path
    #[arg(short, long, value_name = "path")]
    pub config: Option<PathBuf>,

    /// Write debug logging to stderr
    #[arg(long)]
    pub debug: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["slabtop"]).unwrap();
        assert_eq!(cli.delay, None);
        assert!(!cli.once);
        assert_eq!(cli.sort, None);
        assert_eq!(cli.config, None);
        assert!(!cli.debug);
    }

    #[test]
    fn test_short_flags() {
        let cli = Cli::try_parse_from(["slabtop", "-d", "5", "-s", "c", "-o"]).unwrap();
        assert_eq!(cli.delay, Some(5));
        assert_eq!(cli.sort.as_deref(), Some("c"));
        assert!(cli.once);
    }

    #[test]
    fn test_long_flags() {
        let cli = Cli::try_parse_from([
            "slabtop",
            "--delay=2",
            "--sort",
            "name",
            "--once",
            "--config",
            "/tmp/slabtop.yaml",
            "--debug",
        ])
        .unwrap();
        assert_eq!(cli.delay, Some(2));
        assert_eq!(cli.sort.as_deref(), Some("name"));
        assert!(cli.once);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/slabtop.yaml")));
        assert!(cli.debug);
    }

    #[test]
    fn test_negative_delay_reaches_validation() {
        let cli = Cli::try_parse_from(["slabtop", "-d", "-3"]).unwrap();
        assert_eq!(cli.delay, Some(-3));
    }

    #[test]
    fn test_non_numeric_delay_is_rejected() {
        let err = Cli::try_parse_from(["slabtop", "-d", "soon"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn test_help_and_version_are_informational() {
        let help = Cli::try_parse_from(["slabtop", "--help"]).unwrap_err();
        assert_eq!(help.kind(), ErrorKind::DisplayHelp);
        assert!(help.to_string().contains("valid sort criteria"));

        let version = Cli::try_parse_from(["slabtop", "-V"]).unwrap_err();
        assert_eq!(version.kind(), ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_unknown_flag_is_an_error() {
        assert!(Cli::try_parse_from(["slabtop", "--bogus"]).is_err());
    }
}
