use arc_swap::ArcSwap;
use sea_orm::DatabaseConnection;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::errors::{MajazamoozError, Result};
use crate::storage::{ConfigHistoryEntry, ConfigItem, ConfigStore, ConfigUpdateResult};

use super::types::parse_bool;
use super::validators;

pub use super::definitions::keys;

type Snapshot = HashMap<String, ConfigItem>;

/// Database-backed settings (reward amounts, page sizes, auth lifetimes).
///
/// Readers see an immutable snapshot and never touch the database or take a
/// lock. Writes persist first, then swap in a new snapshot.
pub struct RuntimeConfig {
    snapshot: ArcSwap<Snapshot>,
    store: Arc<ConfigStore>,
}

impl RuntimeConfig {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(Snapshot::new()),
            store: Arc::new(ConfigStore::new(db)),
        }
    }

    /// Seed missing rows from the definitions, then load everything.
    pub async fn init(db: DatabaseConnection) -> Result<Self> {
        let config = Self::new(db);
        config.store.ensure_defaults().await?;
        config.load().await?;
        Ok(config)
    }

    pub async fn load(&self) -> Result<()> {
        let items = self.store.get_all().await?;
        info!("Loaded {} runtime settings", items.len());
        self.snapshot.store(Arc::new(items));
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.snapshot
            .load()
            .get(key)
            .map(|item| item.value.as_ref().clone())
    }

    pub fn get_full(&self, key: &str) -> Option<ConfigItem> {
        self.snapshot.load().get(key).cloned()
    }

    pub fn get_all(&self) -> Snapshot {
        self.snapshot.load().as_ref().clone()
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        parse_bool(&self.get(key)?)
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key)?.trim().parse().ok()
    }

    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    pub fn get_int_or(&self, key: &str, default: i64) -> i64 {
        self.get_int(key).unwrap_or(default)
    }

    /// Page sizes and month counts: a non-positive value falls back to `default`.
    pub fn get_positive_or(&self, key: &str, default: u64) -> u64 {
        match self.get_int(key) {
            Some(v) if v > 0 => v as u64,
            _ => default,
        }
    }

    /// Validate, persist with history, then publish the new value.
    pub async fn set(
        &self,
        key: &str,
        value: &str,
        changed_by: Option<&str>,
    ) -> Result<ConfigUpdateResult> {
        validators::validate_config_value(key, value).map_err(|e| {
            MajazamoozError::validation(format!("Invalid value for '{}': {}", key, e))
        })?;

        let result = self.store.set(key, value, changed_by).await?;

        let now = chrono::Utc::now();
        self.snapshot.rcu(|current| {
            let mut next = Snapshot::clone(current);
            if let Some(item) = next.get_mut(key) {
                item.value = Arc::new(value.to_string());
                item.updated_at = now;
            }
            next
        });

        info!(
            "Runtime setting '{}' updated by {}",
            key,
            changed_by.unwrap_or("unknown")
        );
        Ok(result)
    }

    pub async fn get_history(&self, key: &str, limit: u64) -> Result<Vec<ConfigHistoryEntry>> {
        self.store.get_history(key, limit).await
    }
}
