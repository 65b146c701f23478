//! Config set command

use colored::Colorize;

use crate::interfaces::cli::CliError;
use crate::services::ConfigService;

pub async fn config_set(service: &ConfigService, key: &str, value: &str) -> Result<(), CliError> {
    let result = service.update(key, value, Some("cli")).await?;

    println!(
        "{} Updated configuration: {} = {}",
        "✓".bold().green(),
        result.key.cyan(),
        result.value
    );
    if let Some(old) = result.old_value {
        println!("  {} {}", "Previous value:".dimmed(), old.dimmed());
    }
    // The server caches settings in memory; a restart reloads them.
    println!(
        "{} Restart the server for the change to take effect.",
        "⚠".bold().yellow()
    );
    Ok(())
}
