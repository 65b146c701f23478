//! Runtime configuration management
//!
//! Shared by the admin API and the `config` CLI subcommands. Sensitive values
//! (the JWT secret) never leave this service in clear text.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::config::{RuntimeConfig, ValueType};
use crate::errors::{MajazamoozError, Result};
use crate::storage::{ConfigHistoryEntry, ConfigItem, ConfigUpdateResult};

const REDACTED: &str = "[REDACTED]";
const HISTORY_LIMIT: u64 = 50;

// ============ Service DTOs ============

#[derive(Debug, Clone, Serialize)]
pub struct ConfigItemView {
    pub key: String,
    pub value: String,
    pub value_type: ValueType,
    pub requires_restart: bool,
    pub is_sensitive: bool,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigUpdateView {
    pub key: String,
    pub value: String,
    pub old_value: Option<String>,
    pub requires_restart: bool,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigHistoryView {
    pub id: i32,
    pub config_key: String,
    pub old_value: Option<String>,
    pub new_value: String,
    pub changed_at: chrono::DateTime<chrono::Utc>,
    pub changed_by: Option<String>,
}

// ============ ConfigService Implementation ============

pub struct ConfigService {
    runtime: Arc<RuntimeConfig>,
}

impl ConfigService {
    pub fn new(runtime: Arc<RuntimeConfig>) -> Self {
        Self { runtime }
    }

    fn redact(sensitive: bool, value: String) -> String {
        if sensitive { REDACTED.to_string() } else { value }
    }

    fn to_item_view(item: ConfigItem) -> ConfigItemView {
        ConfigItemView {
            value: Self::redact(item.is_sensitive, (*item.value).clone()),
            key: item.key,
            value_type: item.value_type,
            requires_restart: item.requires_restart,
            is_sensitive: item.is_sensitive,
            updated_at: item.updated_at,
        }
    }

    fn to_update_view(result: ConfigUpdateResult) -> ConfigUpdateView {
        let message = result
            .requires_restart
            .then(|| "This setting takes effect after a restart".to_string());
        ConfigUpdateView {
            value: Self::redact(result.is_sensitive, result.value),
            old_value: result
                .old_value
                .map(|v| Self::redact(result.is_sensitive, v)),
            key: result.key,
            requires_restart: result.requires_restart,
            message,
        }
    }

    /// All settings sorted by key.
    pub fn get_all(&self) -> Vec<ConfigItemView> {
        let mut items: Vec<_> = self
            .runtime
            .get_all()
            .into_values()
            .map(Self::to_item_view)
            .collect();
        items.sort_by(|a, b| a.key.cmp(&b.key));
        items
    }

    pub fn get(&self, key: &str) -> Result<ConfigItemView> {
        self.runtime
            .get_full(key)
            .map(Self::to_item_view)
            .ok_or_else(|| MajazamoozError::not_found(format!("Config key '{}' not found", key)))
    }

    pub async fn update(
        &self,
        key: &str,
        value: &str,
        changed_by: Option<&str>,
    ) -> Result<ConfigUpdateView> {
        if self.runtime.get_full(key).is_none() {
            return Err(MajazamoozError::not_found(format!(
                "Config key '{}' not found",
                key
            )));
        }
        let result = self.runtime.set(key, value, changed_by).await?;
        info!("ConfigService: '{}' updated by {:?}", key, changed_by);
        Ok(Self::to_update_view(result))
    }

    pub async fn get_history(&self, key: &str) -> Result<Vec<ConfigHistoryView>> {
        let sensitive = self
            .runtime
            .get_full(key)
            .map(|item| item.is_sensitive)
            .ok_or_else(|| MajazamoozError::not_found(format!("Config key '{}' not found", key)))?;

        let entries = self.runtime.get_history(key, HISTORY_LIMIT).await?;
        Ok(entries
            .into_iter()
            .map(|e: ConfigHistoryEntry| ConfigHistoryView {
                id: e.id,
                config_key: e.config_key,
                old_value: e.old_value.map(|v| Self::redact(sensitive, v)),
                new_value: Self::redact(sensitive, e.new_value),
                changed_at: e.changed_at,
                changed_by: e.changed_by,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sensitive_values_are_redacted() {
        let view = ConfigService::to_update_view(ConfigUpdateResult {
            key: "AUTH_JWT_SECRET".to_string(),
            value: "secret".to_string(),
            requires_restart: true,
            is_sensitive: true,
            old_value: Some("old".to_string()),
        });
        assert_eq!(view.value, REDACTED);
        assert_eq!(view.old_value.as_deref(), Some(REDACTED));
        assert!(view.message.is_some());
    }

    #[test]
    fn plain_values_pass_through() {
        let view = ConfigService::to_update_view(ConfigUpdateResult {
            key: "USER_PANEL_PAGINATE_BY".to_string(),
            value: "20".to_string(),
            requires_restart: false,
            is_sensitive: false,
            old_value: None,
        });
        assert_eq!(view.value, "20");
        assert!(view.message.is_none());
    }
}
