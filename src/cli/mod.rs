//! CLI module for ditapi
//!
//! Provides command-line interface for:
//! - serve: Boot the API and serve until shutdown
//! - schemas: List the endpoint catalogue
//! - verify-user: Mark a user's email as verified

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use commands::{load_config, load_schemas, run_command, schemas, serve, verify_user};
pub use errors::{CliError, CliResult};

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}
