//! Tool configuration (keel.toml).
//!
//! ```toml
//! [check]
//! close_open_scopes = true
//! format = "text"     # or "json"
//! input = "json"      # default: from the file extension
//! trace = false
//!
//! [log]
//! level = "warn"
//! ```
//!
//! Every key is optional. Command-line flags override the file.

use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use keel_borrow::CheckOptions;
use serde::Deserialize;

pub const DEFAULT_CONFIG: &str = "keel.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// How reports are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Which front end reads a program file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    Text,
    Json,
}

impl InputFormat {
    /// `.json` files are read as JSON, everything else as text.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => InputFormat::Json,
            _ => InputFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub check: CheckConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CheckConfig {
    pub close_open_scopes: bool,
    pub format: OutputFormat,
    pub input: Option<InputFormat>,
    pub trace: bool,
}

impl Default for CheckConfig {
    fn default() -> Self {
        CheckConfig {
            close_open_scopes: true,
            format: OutputFormat::Text,
            input: None,
            trace: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    pub level: Option<String>,
}

impl Config {
    /// Load the configuration.
    ///
    /// An explicit path must exist. Without one, `keel.toml` in the current
    /// directory is used if present and the defaults otherwise.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load_from(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG);
                if path.exists() {
                    Self::load_from(path)
                } else {
                    Ok(Config::default())
                }
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn check_options(&self) -> CheckOptions {
        CheckOptions {
            close_open_scopes: self.check.close_open_scopes,
            record_trace: self.check.trace,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> tempfile::TempDir {
        tempfile::tempdir().expect("failed to create temp dir")
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.check.close_open_scopes);
        assert_eq!(config.check.format, OutputFormat::Text);
        assert_eq!(config.check.input, None);
        assert_eq!(config.log.level, None);
        assert_eq!(config.check_options(), CheckOptions::default());
    }

    #[test]
    fn test_empty_file_is_default() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_parse_full() {
        let config: Config = toml::from_str(
            r#"
            [check]
            close_open_scopes = false
            format = "json"
            input = "text"
            trace = true

            [log]
            level = "debug"
            "#,
        )
        .unwrap();
        assert!(!config.check.close_open_scopes);
        assert_eq!(config.check.format, OutputFormat::Json);
        assert_eq!(config.check.input, Some(InputFormat::Text));
        assert_eq!(config.log.level.as_deref(), Some("debug"));

        let options = config.check_options();
        assert!(!options.close_open_scopes);
        assert!(options.record_trace);
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let config: Config = toml::from_str("[check]\nformat = \"json\"\n").unwrap();
        assert!(config.check.close_open_scopes);
        assert_eq!(config.check.format, OutputFormat::Json);
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(toml::from_str::<Config>("[check]\nclose_scopes = true\n").is_err());
        assert!(toml::from_str::<Config>("[output]\n").is_err());
    }

    #[test]
    fn test_bad_format_rejected() {
        assert!(toml::from_str::<Config>("[check]\nformat = \"yaml\"\n").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = temp_dir();
        let path = dir.path().join("keel.toml");
        fs::write(&path, "[log]\nlevel = \"trace\"\n").unwrap();
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.log.level.as_deref(), Some("trace"));
    }

    #[test]
    fn test_explicit_missing_file() {
        let dir = temp_dir();
        let path = dir.path().join("missing.toml");
        let err = Config::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("missing.toml"));
    }

    #[test]
    fn test_invalid_toml_reports_path() {
        let dir = temp_dir();
        let path = dir.path().join("keel.toml");
        fs::write(&path, "[check\n").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().starts_with("invalid "));
    }

    #[test]
    fn test_input_format_from_extension() {
        assert_eq!(InputFormat::from_path(Path::new("a.json")), InputFormat::Json);
        assert_eq!(InputFormat::from_path(Path::new("a.JSON")), InputFormat::Json);
        assert_eq!(InputFormat::from_path(Path::new("a.keel")), InputFormat::Text);
        assert_eq!(InputFormat::from_path(Path::new("noext")), InputFormat::Text);
    }
}
