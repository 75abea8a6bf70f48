//! Configuration management for the CLI
//!
//! This module handles loading and merging configuration from:
//! - Default values
//! - Configuration files (YAML/JSON)
//! - Environment variables
//! - Command-line arguments

use crate::cli::{OutputFormat, ValidateArgs};
use crate::error::{Error, Result};
use jsonapi_audit_core::ValidationOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// File name looked up in the working directory and the home directory
pub const DEFAULT_CONFIG_NAME: &str = ".jsonapi-audit.yaml";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Options applied to every audited exchange
    pub validation: ValidationOptions,

    /// Output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LogSettings,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format
    pub format: String,

    /// Use colored output by default
    pub color: bool,

    /// Include passed findings in human output
    pub show_passed: bool,

    /// Group findings by category in human output
    pub group_by_category: bool,

    /// Treat warnings as failures when choosing the exit status
    pub fail_on_warnings: bool,
}

/// Logging settings read from the config file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Log level used when no `-v` flag is given
    pub level: Option<String>,

    /// Log format (compact, full, json)
    pub format: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "human".to_string(),
            color: true,
            show_passed: false,
            group_by_category: false,
            fail_on_warnings: false,
        }
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yaml") | Some("yml")
    )
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::config(format!("{} does not exist", path.display())));
        }
        let content = std::fs::read_to_string(path)?;

        let config = if is_yaml(path) {
            serde_yaml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };

        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        for path in Self::default_config_paths() {
            if path.exists() {
                match Self::from_file(&path) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Ignoring unreadable config file");
                    }
                }
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file or default locations
    pub fn load_with_file(file: Option<&Path>) -> Result<Self> {
        match file {
            Some(path) => Self::from_file(path),
            None => Self::load(),
        }
    }

    /// Default configuration file paths to check, in priority order
    pub fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from(DEFAULT_CONFIG_NAME),
            PathBuf::from(".jsonapi-audit.yml"),
            PathBuf::from(".jsonapi-audit.json"),
        ];

        if let Some(config_dir) = dirs::config_dir() {
            let audit_dir = config_dir.join("jsonapi-audit");
            paths.push(audit_dir.join("config.yaml"));
            paths.push(audit_dir.join("config.json"));
        }

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(DEFAULT_CONFIG_NAME));
            paths.push(home_dir.join(".jsonapi-audit.json"));
        }

        paths
    }

    /// Overlay command-line flags; flags only ever tighten or add
    pub fn apply_args(&mut self, args: &ValidateArgs) {
        self.validation.merge(args.options());
        self.output.show_passed |= args.show_passed;
        self.output.group_by_category |= args.group;
        self.output.fail_on_warnings |= args.fail_on_warnings;
    }

    /// Output format from the file, when it names a known one
    pub fn output_format(&self) -> Option<OutputFormat> {
        let format = OutputFormat::from_name(&self.output.format);
        if format.is_none() {
            warn!(format = %self.output.format, "Unknown output format in config, using human");
        }
        format
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = if is_yaml(path) {
            serde_yaml::to_string(self)?
        } else {
            serde_json::to_string_pretty(self)?
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use jsonapi_audit_core::ClientIdPolicy;

    #[test]
    fn test_yaml_config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.yaml");

        let mut config = Config::default();
        config.validation.read_only_fields = vec!["created".to_string()];
        config.output.format = "json".to_string();
        config.save(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.output_format(), Some(OutputFormat::Json));
    }

    #[test]
    fn test_partial_json_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.json");
        std::fs::write(&path, r#"{"validation": {"clientGeneratedIds": "forbidden"}}"#).unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.validation.client_generated_ids, ClientIdPolicy::Forbidden);
        assert!(config.validation.require_vary_accept);
        assert_eq!(config.output, OutputConfig::default());
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let err = Config::load_with_file(Some(Path::new("/nonexistent/audit.yaml"))).unwrap_err();
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn test_flags_overlay_file_values() {
        let mut config = Config::default();
        config.validation.read_only_fields = vec!["created".to_string()];

        let cli = crate::cli::Cli::parse_from([
            "jsonapi-audit",
            "validate",
            "x.json",
            "--read-only",
            "updated",
            "--fail-on-warnings",
        ]);
        let crate::cli::Commands::Validate(args) = cli.command else {
            panic!("expected validate command");
        };
        config.apply_args(&args);

        assert_eq!(config.validation.read_only_fields, vec!["created", "updated"]);
        assert!(config.output.fail_on_warnings);
    }
}
