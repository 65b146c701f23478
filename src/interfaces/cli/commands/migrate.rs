//! Apply pending migrations

use colored::Colorize;

use crate::interfaces::cli::CliError;
use crate::storage;

/// Connecting runs every pending migration, so this only has to open the
/// database and report.
pub async fn run_migrate() -> Result<(), CliError> {
    let storage = storage::open()
        .await
        .map_err(|e| CliError::StorageError(e.to_string()))?;

    println!(
        "{} Database is up to date ({})",
        "✓".green().bold(),
        storage.backend_name().cyan()
    );
    Ok(())
}
