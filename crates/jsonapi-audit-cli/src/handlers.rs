//! Command handlers for CLI subcommands

mod config;
mod validate;

pub use config::handle_config;
pub use validate::handle_validate;
