//! Command-line interface argument parsing and definitions
//!
//! This module defines the CLI structure using clap's derive API.

use clap::{Parser, Subcommand, ValueEnum};
use jsonapi_audit_core::{ClientIdPolicy, ValidationOptions};
use std::io::IsTerminal;
use std::path::PathBuf;

/// jsonapi-audit - JSON:API conformance auditing for captured HTTP exchanges
///
/// Reads request/response envelopes recorded by an HTTP client and reports
/// every conformance finding for each exchange.
#[derive(Parser, Debug)]
#[command(
    name = "jsonapi-audit",
    version,
    author,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "JSONAPI_AUDIT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(short, long, value_enum, global = true)]
    pub output: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate one or more captured exchange envelopes
    Validate(ValidateArgs),

    /// Manage configuration files and settings
    Config(ConfigArgs),
}

/// Arguments for the validate command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Envelope files (JSON or YAML) holding a captured request and response
    #[arg(value_name = "ENVELOPE", required = true)]
    pub envelopes: Vec<PathBuf>,

    /// Exit with a failure status when the report contains warnings
    #[arg(long)]
    pub fail_on_warnings: bool,

    /// Accept resource objects without an id in response bodies
    #[arg(long)]
    pub allow_missing_id: bool,

    /// Fields clients must never send (comma separated)
    #[arg(long = "read-only", value_name = "FIELD", value_delimiter = ',')]
    pub read_only: Vec<String>,

    /// Reject client-generated ids on creation
    #[arg(long)]
    pub forbid_client_ids: bool,

    /// Group findings by category in human output
    #[arg(long)]
    pub group: bool,

    /// Include passed findings in human output
    #[arg(long)]
    pub show_passed: bool,
}

impl ValidateArgs {
    /// Validation options expressed by command-line flags
    pub fn options(&self) -> ValidationOptions {
        let policy = if self.forbid_client_ids {
            ClientIdPolicy::Forbidden
        } else {
            ClientIdPolicy::Allowed
        };
        ValidationOptions::default()
            .with_allow_missing_id(self.allow_missing_id)
            .with_read_only_fields(self.read_only.iter().map(|f| f.trim().to_string()))
            .with_client_generated_ids(policy)
    }
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a default configuration file
    Init(ConfigInitArgs),

    /// Show the effective configuration
    Show(ConfigShowArgs),
}

/// Arguments for config init
#[derive(Parser, Debug)]
pub struct ConfigInitArgs {
    /// Where to write the file (defaults to .jsonapi-audit.yaml)
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Force overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

/// Arguments for config show
#[derive(Parser, Debug)]
pub struct ConfigShowArgs {
    /// Show configuration in specified format
    #[arg(short, long, value_enum, default_value = "yaml")]
    pub format: ConfigFormat,
}

/// Configuration file formats
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    Json,
    Yaml,
}

/// Output format options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable formatted output
    Human,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Pretty-printed JSON output
    JsonPretty,
}

impl OutputFormat {
    /// Parse a format name from a configuration file
    pub fn from_name(name: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(name, true).ok()
    }
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective verbosity level (considering quiet flag)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Check if colored output should be used
    pub fn use_color(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }
}
