//! Runtime settings management
//!
//! Reads and writes the `system_config` table directly, so it works while
//! the server is down. A running server picks changes up on restart.

mod config_gen;
mod get;
mod list;
mod set;

use std::sync::Arc;

use crate::cli::ConfigCommands;
use crate::config::RuntimeConfig;
use crate::interfaces::cli::CliError;
use crate::services::ConfigService;

pub use config_gen::config_generate;
pub use get::config_get;
pub use list::config_list;
pub use set::config_set;

pub async fn run_config_command(
    runtime: Arc<RuntimeConfig>,
    cmd: ConfigCommands,
) -> Result<(), CliError> {
    let service = ConfigService::new(runtime);
    match cmd {
        ConfigCommands::Generate { output_path, force } => {
            config_generate(output_path, force).await
        }
        ConfigCommands::List { json } => config_list(&service, json),
        ConfigCommands::Get { key, json } => config_get(&service, &key, json).await,
        ConfigCommands::Set { key, value } => config_set(&service, &key, &value).await,
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| CliError::CommandError(format!("Failed to serialize to JSON: {}", e)))
}
