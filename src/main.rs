//! ditapi CLI entry point
//!
//! Parses arguments, dispatches to the CLI module and exits non-zero on
//! failure. Boot logic lives in `cli`.

use ditapi::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}: {}", e.code(), e);
        std::process::exit(1);
    }
}
