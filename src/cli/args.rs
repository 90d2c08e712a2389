//! CLI argument definitions using clap
//!
//! Commands:
//! - ditapi serve --config <path>
//! - ditapi schemas --config <path>
//! - ditapi verify-user <username> --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// ditapi - REST API of the ditup collaboration network
#[derive(Parser, Debug)]
#[command(name = "ditapi")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP server
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./ditapi.json")]
        config: PathBuf,
    },

    /// Print every endpoint with the schema that guards it
    Schemas {
        /// Path to configuration file
        #[arg(long, default_value = "./ditapi.json")]
        config: PathBuf,
    },

    /// Mark the email of a user as verified
    VerifyUser {
        username: String,

        /// Path to configuration file
        #[arg(long, default_value = "./ditapi.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_default_config() {
        let cli = Cli::try_parse_from(["ditapi", "serve"]).unwrap();
        match cli.command {
            Command::Serve { config } => assert_eq!(config, PathBuf::from("./ditapi.json")),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_verify_user() {
        let cli =
            Cli::try_parse_from(["ditapi", "verify-user", "alice", "--config", "/etc/ditapi.json"])
                .unwrap();
        match cli.command {
            Command::VerifyUser { username, config } => {
                assert_eq!(username, "alice");
                assert_eq!(config, PathBuf::from("/etc/ditapi.json"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_verify_user_requires_username() {
        assert!(Cli::try_parse_from(["ditapi", "verify-user"]).is_err());
    }
}
