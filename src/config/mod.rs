//! Configuration types and loading from `cts-harness.toml`.

use crate::core::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub mod env;
mod loader;
pub use loader::ConfigLoader;

/// File name looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "cts-harness.toml";

/// Complete configuration for a harness run.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Test selection.
    #[serde(default)]
    pub filter: FilterConfig,

    /// Execution settings.
    #[serde(default)]
    pub run: RunConfig,

    /// Report output.
    #[serde(default)]
    pub report: ReportConfig,

    /// Host device settings.
    #[serde(default)]
    pub device: DeviceConfig,

    /// Free-form parameters readable by tests.
    #[serde(default)]
    pub parameters: HashMap<String, String>,

    /// Enable verbose logging.
    #[serde(default)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a standalone TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("failed to read config file {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }
}

/// Which registered tests to run.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct FilterConfig {
    /// Name filter; substring match unless `exact` or `regex` is set.
    pub pattern: Option<String>,

    /// Match `pattern` against the whole name.
    #[serde(default)]
    pub exact: bool,

    /// Treat `pattern` as a regular expression.
    #[serde(default)]
    pub regex: bool,

    /// Skip tests whose names contain any of these substrings.
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Execution settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RunConfig {
    /// Per-test timeout in seconds.
    pub timeout: Option<u64>,
}

/// Report output settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct ReportConfig {
    /// When to print notes recorded by tests.
    #[serde(default)]
    pub show_notes: ShowNotes,

    /// Write the run report as JSON to this path.
    pub json: Option<PathBuf>,
}

/// Policy for printing notes recorded by tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ShowNotes {
    /// Print notes for every test.
    Always,
    /// Never print notes.
    Never,
    /// Print notes only for failed tests.
    #[default]
    OnFailure,
}

impl std::str::FromStr for ShowNotes {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        serde_plain::from_str(s).map_err(|_| Error::invalid_config("report.show-notes", s))
    }
}

/// Host device settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DeviceConfig {
    /// Worker threads per launch (0 = one per CPU).
    pub threads: usize,

    /// Largest accepted work-group size.
    pub max_work_group_size: usize,

    /// Sub-group width; sub-groups are unsupported when unset.
    pub sub_group_size: Option<usize>,

    /// Advertise double-precision support.
    pub fp64: bool,

    /// Advertise 64-bit atomics.
    pub atomic64: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            threads: 0,
            max_work_group_size: 256,
            sub_group_size: None,
            fp64: true,
            atomic64: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default_values() {
        let config = Config::default();
        assert!(config.filter.pattern.is_none());
        assert!(!config.filter.exact);
        assert!(!config.filter.regex);
        assert!(config.filter.exclude.is_empty());
        assert!(config.run.timeout.is_none());
        assert_eq!(config.report.show_notes, ShowNotes::OnFailure);
        assert!(config.report.json.is_none());
        assert_eq!(config.device.threads, 0);
        assert_eq!(config.device.max_work_group_size, 256);
        assert!(config.device.sub_group_size.is_none());
        assert!(config.device.fp64);
        assert!(config.device.atomic64);
        assert!(config.parameters.is_empty());
        assert!(!config.verbose);
    }

    #[test]
    fn test_config_deserialize_minimal() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.device.max_work_group_size, 256);
        assert_eq!(config.report.show_notes, ShowNotes::OnFailure);
    }

    #[test]
    fn test_config_deserialize_full() {
        let toml_str = r#"
        verbose = true

        [filter]
        pattern = "reduction"
        regex = true
        exclude = ["slow"]

        [run]
        timeout = 30

        [report]
        show-notes = "always"
        json = "report.json"

        [device]
        threads = 4
        max-work-group-size = 128
        sub-group-size = 16
        fp64 = false

        [parameters]
        size = "1024"
        "#;
        let config = Config::from_toml_str(toml_str).unwrap();
        assert!(config.verbose);
        assert_eq!(config.filter.pattern.as_deref(), Some("reduction"));
        assert!(config.filter.regex);
        assert_eq!(config.filter.exclude, vec!["slow"]);
        assert_eq!(config.run.timeout, Some(30));
        assert_eq!(config.report.show_notes, ShowNotes::Always);
        assert_eq!(config.report.json, Some(PathBuf::from("report.json")));
        assert_eq!(config.device.threads, 4);
        assert_eq!(config.device.max_work_group_size, 128);
        assert_eq!(config.device.sub_group_size, Some(16));
        assert!(!config.device.fp64);
        assert!(config.device.atomic64);
        assert_eq!(config.parameters.get("size").unwrap(), "1024");
    }

    #[test]
    fn test_config_deserialize_invalid_show_notes() {
        let toml_str = r#"
        [report]
        show-notes = "sometimes"
        "#;
        let result = Config::from_toml_str(toml_str);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("TOML"));
    }

    #[test]
    fn test_show_notes_from_str() {
        assert_eq!("never".parse::<ShowNotes>().unwrap(), ShowNotes::Never);
        assert_eq!("on-failure".parse::<ShowNotes>().unwrap(), ShowNotes::OnFailure);
        assert!("sometimes".parse::<ShowNotes>().is_err());
    }

    #[test]
    fn test_missing_config_file() {
        let err = Config::from_toml_file("/nonexistent/cts-harness.toml").unwrap_err();
        assert!(err.to_string().contains("config file"));
    }
}
