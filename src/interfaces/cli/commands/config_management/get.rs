//! `config get KEY`: one setting, its definition and the last few changes.

use colored::Colorize;
use serde::Serialize;

use super::to_json;
use crate::config::definitions::get_def;
use crate::interfaces::cli::CliError;
use crate::services::ConfigService;
use crate::services::config_service::{ConfigHistoryView, ConfigItemView};

const SHOWN_CHANGES: usize = 5;

#[derive(Serialize)]
struct Described {
    #[serde(flatten)]
    item: ConfigItemView,
    category: &'static str,
    description: &'static str,
    /// `None` for sensitive settings.
    default: Option<String>,
    recent_changes: Vec<ConfigHistoryView>,
}

pub async fn config_get(service: &ConfigService, key: &str, json: bool) -> Result<(), CliError> {
    let item = service.get(key)?;
    let mut history = service.get_history(key).await?;
    history.truncate(SHOWN_CHANGES);

    let def = get_def(&item.key);
    let described = Described {
        category: def.map_or("other", |d| d.category),
        description: def.map_or("", |d| d.description),
        default: def
            .filter(|_| !item.is_sensitive)
            .map(|d| (d.default_fn)()),
        recent_changes: history,
        item,
    };

    if json {
        println!("{}", to_json(&described)?);
        return Ok(());
    }

    let item = &described.item;
    println!("{} = {}", item.key.green().bold(), item.value);
    println!("  {:<12}{} / {}", "kind".dimmed(), described.category, item.value_type);
    if !described.description.is_empty() {
        println!("  {:<12}{}", "about".dimmed(), described.description);
    }
    if let Some(default) = &described.default {
        println!("  {:<12}{}", "default".dimmed(), default);
    }
    println!(
        "  {:<12}{}",
        "updated".dimmed(),
        item.updated_at.format("%Y-%m-%d %H:%M UTC")
    );
    if item.requires_restart {
        println!("  {}", "takes effect after a restart".yellow());
    }

    if !described.recent_changes.is_empty() {
        println!("  {}", "recent changes:".dimmed());
        for change in &described.recent_changes {
            println!(
                "    {}  {} -> {}  ({})",
                change.changed_at.format("%Y-%m-%d %H:%M"),
                change.old_value.as_deref().unwrap_or("-"),
                change.new_value,
                change.changed_by.as_deref().unwrap_or("unknown")
            );
        }
    }
    Ok(())
}
