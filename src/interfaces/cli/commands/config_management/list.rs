//! Config list command

use std::collections::BTreeMap;

use colored::Colorize;

use super::to_json;
use crate::config::definitions::{categories, get_def};
use crate::interfaces::cli::CliError;
use crate::services::ConfigService;
use crate::services::config_service::ConfigItemView;

const CATEGORY_NAMES: [(&str, &str); 5] = [
    (categories::REWARDS, "Rewards"),
    (categories::PAGINATION, "Pagination"),
    (categories::STATISTICS, "Statistics"),
    (categories::SITE, "Site"),
    (categories::AUTH, "Authentication"),
];

fn category_of(key: &str) -> &'static str {
    get_def(key).map(|d| d.category).unwrap_or("other")
}

pub fn config_list(service: &ConfigService, json: bool) -> Result<(), CliError> {
    let items = service.get_all();

    if json {
        println!("{}", to_json(&items)?);
        return Ok(());
    }

    let mut grouped: BTreeMap<&str, Vec<&ConfigItemView>> = BTreeMap::new();
    for item in &items {
        grouped.entry(category_of(&item.key)).or_default().push(item);
    }

    for (category, name) in CATEGORY_NAMES {
        let Some(configs) = grouped.get(category) else {
            continue;
        };
        println!();
        println!("{}", format!("[{}]", name).cyan().bold());
        for cfg in configs {
            let mut tags = vec![cfg.value_type.to_string().dimmed().to_string()];
            if cfg.is_sensitive {
                tags.push("sensitive".yellow().to_string());
            }
            if cfg.requires_restart {
                tags.push("restart".red().to_string());
            }
            println!(
                "  {} = {} ({})",
                cfg.key.green(),
                cfg.value.white(),
                tags.join(", ")
            );
        }
    }
    println!();
    Ok(())
}
