//! create-superuser command

use std::io::{self, BufRead, IsTerminal, Write};
use std::sync::Arc;

use colored::Colorize;

use crate::api::jwt::JwtService;
use crate::config::get_config;
use crate::interfaces::cli::CliError;
use crate::runtime::lifetime::startup::open_storage;
use crate::services::AccountService;
use crate::services::notifications::build_mailer;

/// Password from `--stdin`, `--password` or an interactive prompt, in that order.
fn get_password(password: Option<String>, stdin: bool) -> Result<String, CliError> {
    if stdin {
        let mut line = String::new();
        io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|e| CliError::CommandError(format!("Failed to read from stdin: {}", e)))?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    } else if let Some(password) = password {
        Ok(password)
    } else {
        prompt_password_with_confirm()
    }
}

fn prompt_password_with_confirm() -> Result<String, CliError> {
    if !io::stdin().is_terminal() {
        return Err(CliError::CommandError(
            "No password provided. Use --password or --stdin, or run interactively.".to_string(),
        ));
    }

    let read = |prompt: &str| -> Result<String, CliError> {
        print!("{}", prompt);
        io::stdout()
            .flush()
            .map_err(|e| CliError::CommandError(e.to_string()))?;
        rpassword::read_password()
            .map_err(|e| CliError::CommandError(format!("Failed to read password: {}", e)))
    };

    let password = read("Password: ")?;
    let confirm = read("Password (again): ")?;
    if password != confirm {
        return Err(CliError::CommandError("Passwords do not match".to_string()));
    }
    Ok(password)
}

pub async fn create_superuser(
    username: String,
    email: String,
    password: Option<String>,
    stdin: bool,
) -> Result<(), CliError> {
    let password = get_password(password, stdin)?;

    let (storage, runtime) = open_storage().await?;
    let config = get_config();
    let mailer = build_mailer(&config.email)?;
    let jwt = Arc::new(JwtService::from_runtime(&runtime));
    let accounts = AccountService::new(storage, jwt, mailer, config.site.clone());

    let user = accounts
        .create_superuser(&username, &email, &password)
        .await?;

    println!(
        "{} Superuser {} (id {}) created",
        "✓".green().bold(),
        user.username.cyan(),
        user.id
    );
    Ok(())
}
