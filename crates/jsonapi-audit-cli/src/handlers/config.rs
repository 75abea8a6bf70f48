//! Config command handler

use crate::cli::{ConfigAction, ConfigArgs, ConfigFormat};
use crate::config::{Config, DEFAULT_CONFIG_NAME};
use crate::error::{Error, Result};
use crate::output::OutputWriter;
use std::path::PathBuf;
use tracing::info;

/// Handle the config command
pub fn handle_config(args: ConfigArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    match args.action {
        ConfigAction::Init(init) => {
            let path = init.path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_NAME));
            if path.exists() && !init.force {
                return Err(Error::config(format!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                )));
            }
            Config::default().save(&path)?;
            info!(path = %path.display(), "Configuration written");
            output.success(&format!("✓ Wrote {}", path.display()))
        }
        ConfigAction::Show(show) => {
            let rendered = match show.format {
                ConfigFormat::Yaml => serde_yaml::to_string(config)?,
                ConfigFormat::Json => serde_json::to_string_pretty(config)?,
            };
            output.writeln(rendered.trim_end())
        }
    }
}
