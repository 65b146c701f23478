//! Command-line interface definitions using clap

use clap::{Parser, Subcommand};

/// Majazamooz - Persian tutorial platform
#[derive(Parser)]
#[command(name = "majazamooz")]
#[command(version)]
#[command(about = "Persian tutorial platform with rewards, exams and Jalali statistics", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Apply pending database migrations and exit
    Migrate,

    /// Create a staff account with a confirmed e-mail address
    CreateSuperuser {
        #[arg(long)]
        username: String,

        #[arg(long)]
        email: String,

        /// Password (if omitted, prompts interactively)
        #[arg(long, conflicts_with = "stdin")]
        password: Option<String>,

        /// Read the password from stdin (for scripting)
        #[arg(long)]
        stdin: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum ConfigCommands {
    /// Write a sample config.toml
    Generate {
        /// Output path (default: config.example.toml)
        output_path: Option<String>,

        /// Overwrite without asking
        #[arg(long)]
        force: bool,
    },

    /// List runtime settings
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one runtime setting
    Get {
        /// Setting key, e.g. TUTORIAL_LIKE_SCORE
        key: String,

        #[arg(long)]
        json: bool,
    },

    /// Change a runtime setting
    Set { key: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_arguments_means_serve() {
        let cli = Cli::try_parse_from(["majazamooz"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn parses_create_superuser() {
        let cli = Cli::try_parse_from([
            "majazamooz",
            "create-superuser",
            "--username",
            "admin",
            "--email",
            "admin@example.com",
            "--stdin",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::CreateSuperuser {
                username: "admin".into(),
                email: "admin@example.com".into(),
                password: None,
                stdin: true,
            })
        );
    }

    #[test]
    fn password_and_stdin_conflict() {
        let parsed = Cli::try_parse_from([
            "majazamooz",
            "create-superuser",
            "--username",
            "a",
            "--email",
            "a@b.c",
            "--password",
            "x",
            "--stdin",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn parses_config_set() {
        let cli =
            Cli::try_parse_from(["majazamooz", "config", "set", "TUTORIAL_LIKE_SCORE", "7"])
                .unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Config {
                action: ConfigCommands::Set {
                    key: "TUTORIAL_LIKE_SCORE".into(),
                    value: "7".into(),
                }
            })
        );
    }
}
