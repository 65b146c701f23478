//! Mode routing
//!
//! No subcommand (or `serve`) runs the HTTP server; anything else is a CLI
//! command that exits when done.

pub mod cli;
pub mod server;

pub use cli::run_cli;
pub use server::run_server;

use crate::cli::Commands;

#[derive(Debug, PartialEq)]
pub enum Mode {
    Server,
    Cli,
}

pub fn detect_mode(command: Option<&Commands>) -> Mode {
    match command {
        None | Some(Commands::Serve) => Mode::Server,
        Some(_) => Mode::Cli,
    }
}
