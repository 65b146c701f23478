//! CLI interface module
//!
//! Maintenance commands that run against the database directly: migrations,
//! staff accounts and runtime settings.

pub mod commands;

use std::fmt;

use crate::cli::{Commands, ConfigCommands};
use crate::runtime::lifetime::startup::open_storage;
use commands::{config_management, create_superuser, run_migrate};

#[derive(Debug)]
pub enum CliError {
    StorageError(String),
    ParseError(String),
    CommandError(String),
}

impl CliError {
    pub fn format_simple(&self) -> String {
        match self {
            CliError::StorageError(msg) => format!("Storage error: {}", msg),
            CliError::ParseError(msg) => format!("Parse error: {}", msg),
            CliError::CommandError(msg) => format!("Command error: {}", msg),
        }
    }

    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        match self {
            CliError::StorageError(msg) => {
                format!("{} {}", "Storage error:".red().bold(), msg.white())
            }
            CliError::ParseError(msg) => {
                format!("{} {}", "Parse error:".yellow().bold(), msg.white())
            }
            CliError::CommandError(msg) => {
                format!("{} {}", "Command error:".red().bold(), msg.white())
            }
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for CliError {}

impl From<crate::errors::MajazamoozError> for CliError {
    fn from(err: crate::errors::MajazamoozError) -> Self {
        match err {
            crate::errors::MajazamoozError::Validation(_)
            | crate::errors::MajazamoozError::InvalidForm(_)
            | crate::errors::MajazamoozError::Conflict(_)
            | crate::errors::MajazamoozError::NotFound(_) => {
                CliError::CommandError(err.message())
            }
            _ => CliError::StorageError(err.to_string()),
        }
    }
}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::StorageError(format!("{:#}", err))
    }
}

/// Run a CLI command from clap-parsed input
pub async fn run_cli_command(cmd: Commands) -> Result<(), CliError> {
    match cmd {
        Commands::Serve => Err(CliError::ParseError(
            "`serve` runs the server, not a CLI command".to_string(),
        )),

        Commands::Migrate => run_migrate().await,

        Commands::CreateSuperuser {
            username,
            email,
            password,
            stdin,
        } => create_superuser(username, email, password, stdin).await,

        // Generate doesn't need a database connection
        Commands::Config {
            action: ConfigCommands::Generate { output_path, force },
        } => config_management::config_generate(output_path, force).await,

        Commands::Config { action } => {
            let (_storage, runtime) = open_storage().await?;
            config_management::run_config_command(runtime, action).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::MajazamoozError;

    #[test]
    fn user_errors_become_command_errors() {
        let err: CliError = MajazamoozError::conflict("exists").into();
        assert!(matches!(err, CliError::CommandError(msg) if msg == "exists"));

        let err: CliError = MajazamoozError::database_connection("refused").into();
        assert!(matches!(err, CliError::StorageError(_)));
    }
}
