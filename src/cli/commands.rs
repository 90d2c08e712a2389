//! CLI command implementations
//!
//! `serve` follows a fixed boot sequence: config, logging, schemas, gates,
//! store, listener. Any failure before the listener is bound aborts boot.
//! Config warnings are collected while loading and logged right after the
//! subscriber is installed.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::auth::JwtManager;
use crate::config::{AppConfig, ConfigWarning};
use crate::gate::{Endpoint, Gates};
use crate::http_server::{ApiServer, AppState};
use crate::models::user;
use crate::observability::{init_logging, log_event, log_event_with_fields, Event};
use crate::schema::SchemaRegistry;
use crate::store::ArangoStore;

use super::args::Command;
use super::errors::CliResult;

/// Run a CLI command
pub fn run_command(command: Command) -> CliResult<()> {
    match command {
        Command::Serve { config } => serve(&config),
        Command::Schemas { config } => schemas(&config),
        Command::VerifyUser { username, config } => verify_user(&config, &username),
    }
}

/// Reads the config file when present; a missing file means defaults plus
/// environment overrides. Nothing is logged here.
pub fn load_config(path: &Path) -> CliResult<(AppConfig, Vec<ConfigWarning>)> {
    let file = path.exists().then_some(path);
    let (config, mut warnings) = AppConfig::load(file)?;
    if file.is_none() {
        warnings.insert(0, ConfigWarning::FileNotFound(path.to_path_buf()));
    }
    Ok((config, warnings))
}

pub fn report_warnings(warnings: &[ConfigWarning]) {
    for warning in warnings {
        warn!(code = warning.code(), "{}", warning);
    }
}

/// Config first, then the subscriber it describes, then whatever loading
/// had to say
fn configure(config_path: &Path) -> CliResult<AppConfig> {
    let (config, warnings) = load_config(config_path)?;
    if let Err(e) = init_logging(&config.log) {
        eprintln!("{}", e);
    }
    report_warnings(&warnings);
    Ok(config)
}

/// The built-in schemas, or the documents of `schema_dir` when configured
pub fn load_schemas(config: &AppConfig) -> CliResult<SchemaRegistry> {
    let registry = match &config.schema_dir {
        Some(dir) => SchemaRegistry::load_dir(dir)?,
        None => SchemaRegistry::builtin()?,
    };
    Ok(registry)
}

fn runtime() -> CliResult<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?)
}

/// Boot the server and serve until a shutdown signal
pub fn serve(config_path: &Path) -> CliResult<()> {
    let config = configure(config_path)?;
    log_event(Event::BootStart);
    let path = config_path.display().to_string();
    log_event_with_fields(Event::ConfigLoaded, &[("path", path.as_str())]);

    match boot(config) {
        Ok(server) => {
            let rt = runtime()?;
            rt.block_on(server.start())?;
            Ok(())
        }
        Err(e) => {
            log_event_with_fields(Event::BootFailed, &[("code", e.code())]);
            Err(e)
        }
    }
}

/// Everything `serve` needs before binding the listener
fn boot(config: AppConfig) -> CliResult<ApiServer> {
    let registry = load_schemas(&config)?;
    let count = registry.len().to_string();
    log_event_with_fields(Event::SchemasLoaded, &[("count", count.as_str())]);

    let gates = Gates::build(&registry)?;
    log_event(Event::GatesBuilt);
    let store = ArangoStore::new(&config.database)?;
    let jwt = JwtManager::new(&config.jwt);
    info!(database = %config.database.name, url = %config.database.url, "graph store configured");

    let state = Arc::new(AppState::new(Arc::new(store), gates, jwt));
    Ok(ApiServer::new(config.http, state))
}

/// Print the endpoint catalogue after compiling every gate. Output goes to
/// stdout, so config warnings go to stderr instead of a subscriber.
pub fn schemas(config_path: &Path) -> CliResult<()> {
    let (config, warnings) = load_config(config_path)?;
    for warning in &warnings {
        eprintln!("{}: {}", warning.code(), warning);
    }
    let registry = load_schemas(&config)?;
    let gates = Gates::build(&registry)?;

    for (endpoint, gate) in gates.iter() {
        println!(
            "{:<28} {:<28} {} requirement(s)",
            format!("{:?}", endpoint),
            gate.schema_name(),
            gate.requirements().len()
        );
    }
    println!("{} endpoints, {} schemas", Endpoint::ALL.len(), registry.len());
    Ok(())
}

/// Mark a user's email as verified
pub fn verify_user(config_path: &Path, username: &str) -> CliResult<()> {
    let config = configure(config_path)?;
    let store = ArangoStore::new(&config.database)?;
    let rt = runtime()?;
    let verified = rt.block_on(user::verify_email(&store, username))?;
    println!("verified {}", verified.username);
    Ok(())
}
