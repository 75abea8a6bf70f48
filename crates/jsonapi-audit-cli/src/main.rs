//! jsonapi-audit CLI - audit captured HTTP exchanges for JSON:API conformance
//!
//! This is the main entry point: it loads configuration, sets up logging,
//! and dispatches to the command handlers. Exit status is 0 when every
//! exchange conforms, 1 when any does not, and higher codes for input
//! problems.

mod cli;
mod config;
mod error;
mod handlers;
mod logging;
mod output;

use cli::{Cli, Commands, OutputFormat};
use colored::control;
use config::Config;
use error::Result;
use logging::{timing::Timer, LoggingConfig};
use output::OutputWriter;
use std::process;
use tracing::instrument;

fn main() {
    let cli = Cli::parse_args();

    let config = Config::load_with_file(cli.config.as_deref());
    let use_color = cli.use_color()
        && config.as_ref().map(|c| c.output.color).unwrap_or(true);
    control::set_override(use_color);

    if let Err(e) = init_logging(&cli, config.as_ref().ok()) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let result = config.and_then(|config| run(cli, config));

    match result {
        Ok(()) => process::exit(0),
        Err(e) => {
            eprintln!("{}", error::format_error(&e, use_color));

            if e.should_show_help() {
                eprintln!("\nFor more information, try '--help'");
            }

            process::exit(e.exit_code());
        }
    }
}

/// Main application logic
#[instrument(skip_all, fields(command = ?cli.command))]
fn run(cli: Cli, config: Config) -> Result<()> {
    let _timer = Timer::new("cli_execution");

    let format = cli
        .output
        .or_else(|| config.output_format())
        .unwrap_or(OutputFormat::Human);
    let mut output = OutputWriter::new(format, control::SHOULD_COLORIZE.should_colorize(), cli.quiet);

    tracing::info!(verbosity = cli.verbosity_level(), ?format, "Executing command");

    match cli.command {
        Commands::Validate(args) => handlers::handle_validate(args, &config, &mut output),
        Commands::Config(args) => handlers::handle_config(args, &config, &mut output),
    }
}

/// Initialize the logging system
fn init_logging(cli: &Cli, config: Option<&Config>) -> Result<()> {
    let mut logging_config = LoggingConfig::from_verbosity(cli.verbosity_level());
    if let Some(config) = config {
        logging_config.merge_with_file(&config.logging, cli.verbosity_level());
    }
    logging_config.merge_with_env();

    if cli.quiet {
        logging_config.level = "error".to_string();
        logging_config.console = false;
    }

    logging::init_logging(logging_config)
}
