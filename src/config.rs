//! Configuration for slabtop.
//!
//! YAML file plus command line, with precedence CLI > file > defaults.
//! [`Settings::resolve`] turns both into the validated values a run uses.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cli::Cli;
use crate::error::{Result, SlabError};
use crate::session::SessionMode;
use crate::sort::SortCriterion;

/// Default per-tick capacity of the provider.
pub const DEFAULT_MAX_NODES: usize = 150;

/// Global configuration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Seconds between refreshes in interactive mode.
    #[serde(default = "default_delay_secs")]
    pub delay_secs: i64,

    /// Initial sort key character.
    #[serde(default = "default_sort")]
    pub sort: String,

    /// Most cache nodes kept per tick.
    #[serde(default = "default_max_nodes")]
    pub max_nodes: usize,
}

fn default_delay_secs() -> i64 {
    3
}
fn default_sort() -> String {
    "o".to_string()
}
fn default_max_nodes() -> usize {
    DEFAULT_MAX_NODES
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self { delay_secs: default_delay_secs(), sort: default_sort(), max_nodes: default_max_nodes() }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Configuration version.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Global settings.
    #[serde(default)]
    pub global: GlobalConfig,
}

fn default_version() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self { version: default_version(), global: GlobalConfig::default() }
    }
}

impl Config {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .map_err(|_| SlabError::ConfigNotFound(path.display().to_string()))?;

        Self::parse(&content)
    }

    /// Parses configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error with line number if parsing fails.
    pub fn parse(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| {
            let line = e.location().map(|l| l.line()).unwrap_or(0);
            SlabError::ConfigParse { line, message: e.to_string() }
        })
    }

    /// Loads configuration with fallback to defaults.
    ///
    /// # Errors
    ///
    /// A missing file yields defaults; a file that exists but does not parse
    /// is still an error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        match Self::load(path) {
            Err(SlabError::ConfigNotFound(_)) => Ok(Self::default()),
            other => other,
        }
    }

    /// `<config dir>/slabtop/config.yaml`, if the platform has a config dir.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("slabtop/config.yaml"))
    }

    /// Loads the file named on the command line, or the default file.
    ///
    /// # Errors
    ///
    /// An explicitly named file must exist and parse.
    pub fn for_cli(cli: &Cli) -> Result<Self> {
        match (&cli.config, Self::default_path()) {
            (Some(path), _) => Self::load(path),
            (None, Some(path)) => Self::load_or_default(path),
            (None, None) => Ok(Self::default()),
        }
    }
}

/// Validated values for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub mode: SessionMode,
    /// Wait between ticks; zero in batch mode.
    pub delay: Duration,
    pub criterion: SortCriterion,
    pub max_nodes: usize,
}

impl Settings {
    /// Merges CLI over file values and validates the result.
    ///
    /// # Errors
    ///
    /// Returns [`SlabError::ConfigInvalid`] for a delay below one second or a
    /// zero node capacity.
    pub fn resolve(cli: &Cli, config: &Config) -> Result<Self> {
        let max_nodes = config.global.max_nodes;
        if max_nodes == 0 {
            return Err(SlabError::ConfigInvalid {
                key: "max_nodes".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        let criterion =
            SortCriterion::from_arg(cli.sort.as_deref().unwrap_or(config.global.sort.as_str()));

        let delay_secs = cli.delay.unwrap_or(config.global.delay_secs);
        if delay_secs < 1 {
            return Err(SlabError::ConfigInvalid {
                key: "delay".to_string(),
                message: "delay must be positive integer".to_string(),
            });
        }

        if cli.once {
            return Ok(Self { mode: SessionMode::Batch, delay: Duration::ZERO, criterion, max_nodes });
        }

        Ok(Self {
            mode: SessionMode::Interactive,
            delay: Duration::from_secs(delay_secs as u64),
            criterion,
            max_nodes,
        })
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: SessionMode::Interactive,
            delay: Duration::from_secs(default_delay_secs() as u64),
            criterion: SortCriterion::default(),
            max_nodes: DEFAULT_MAX_NODES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_config_default() {
        let config = Config::default();

        assert_eq!(config.version, 1);
        assert_eq!(config.global.delay_secs, 3);
        assert_eq!(config.global.sort, "o");
        assert_eq!(config.global.max_nodes, 150);
    }

    #[test]
    fn test_config_parse_minimal() {
        let config = Config::parse("version: 1").unwrap();
        assert_eq!(config.version, 1);
        assert_eq!(config.global.delay_secs, 3);
    }

    #[test]
    fn test_config_parse_full() {
        let yaml = r#"
version: 1
global:
  delay_secs: 10
  sort: c
  max_nodes: 40
"#;
        let config = Config::parse(yaml).unwrap();

        assert_eq!(config.global.delay_secs, 10);
        assert_eq!(config.global.sort, "c");
        assert_eq!(config.global.max_nodes, 40);
    }

    #[test]
    fn test_config_parse_error_includes_line() {
        let yaml = r#"
version: 1
global:
  delay_secs: not_a_number
"#;
        let err = Config::parse(yaml).unwrap_err();
        assert!(err.to_string().contains('4'), "Error should include line number: {err}");
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load("/nonexistent/slabtop.yaml").unwrap_err();
        assert!(matches!(err, SlabError::ConfigNotFound(_)));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = Config::load_or_default("/nonexistent/path").unwrap();
        assert_eq!(config.version, 1);
    }

    #[test]
    fn test_load_or_default_keeps_parse_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "global: [unclosed").unwrap();
        assert!(matches!(
            Config::load_or_default(file.path()),
            Err(SlabError::ConfigParse { .. })
        ));
    }

    #[test]
    fn test_for_cli_uses_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "global:\n  delay_secs: 7").unwrap();

        let cli = Cli { config: Some(file.path().to_path_buf()), ..Cli::default() };
        let config = Config::for_cli(&cli).unwrap();
        assert_eq!(config.global.delay_secs, 7);
    }

    #[test]
    fn test_for_cli_explicit_missing_file_fails() {
        let cli = Cli { config: Some(PathBuf::from("/nonexistent/slabtop.yaml")), ..Cli::default() };
        assert!(Config::for_cli(&cli).is_err());
    }

    #[test]
    fn test_resolve_defaults() {
        let settings = Settings::resolve(&Cli::default(), &Config::default()).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_resolve_cli_overrides_file() {
        let mut config = Config::default();
        config.global.delay_secs = 9;
        config.global.sort = "n".to_string();

        let cli = Cli { delay: Some(1), sort: Some("c".to_string()), ..Cli::default() };
        let settings = Settings::resolve(&cli, &config).unwrap();

        assert_eq!(settings.delay, Duration::from_secs(1));
        assert_eq!(settings.criterion, SortCriterion::CacheSize);
    }

    #[test]
    fn test_resolve_file_values_apply() {
        let mut config = Config::default();
        config.global.delay_secs = 9;
        config.global.sort = "U".to_string();

        let settings = Settings::resolve(&Cli::default(), &config).unwrap();
        assert_eq!(settings.delay, Duration::from_secs(9));
        assert_eq!(settings.criterion, SortCriterion::Utilization);
    }

    #[test]
    fn test_resolve_rejects_non_positive_delay() {
        for delay in [0, -1] {
            let cli = Cli { delay: Some(delay), ..Cli::default() };
            let err = Settings::resolve(&cli, &Config::default()).unwrap_err();
            assert!(matches!(err, SlabError::ConfigInvalid { ref key, .. } if key == "delay"));
        }
    }

    #[test]
    fn test_resolve_unknown_sort_falls_back() {
        let cli = Cli { sort: Some("z".to_string()), ..Cli::default() };
        let settings = Settings::resolve(&cli, &Config::default()).unwrap();
        assert_eq!(settings.criterion, SortCriterion::Objects);
    }

    #[test]
    fn test_resolve_once_selects_batch() {
        let cli = Cli { once: true, ..Cli::default() };
        let settings = Settings::resolve(&cli, &Config::default()).unwrap();

        assert_eq!(settings.mode, SessionMode::Batch);
        assert_eq!(settings.delay, Duration::ZERO);
    }

    #[test]
    fn test_resolve_once_still_validates_delay() {
        let cli = Cli { once: true, delay: Some(0), ..Cli::default() };
        assert!(Settings::resolve(&cli, &Config::default()).is_err());
    }

    #[test]
    fn test_resolve_rejects_zero_capacity() {
        let mut config = Config::default();
        config.global.max_nodes = 0;
        assert!(Settings::resolve(&Cli::default(), &config).is_err());
    }
}
