use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait, sea_query::OnConflict,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::ValueType;
use crate::config::definitions::{ALL_CONFIGS, ConfigDef, get_def};
use crate::errors::{MajazamoozError, Result};
use migration::entities::{config_history, system_config};

const REDACTED: &str = "[REDACTED]";

#[derive(Debug, Clone)]
pub struct ConfigItem {
    pub key: String,
    pub value: Arc<String>,
    pub value_type: ValueType,
    pub requires_restart: bool,
    pub is_sensitive: bool,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<system_config::Model> for ConfigItem {
    fn from(m: system_config::Model) -> Self {
        Self {
            key: m.key,
            value: Arc::new(m.value),
            value_type: m.value_type.parse().unwrap_or(ValueType::String),
            requires_restart: m.requires_restart,
            is_sensitive: m.is_sensitive,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigUpdateResult {
    pub key: String,
    pub value: String,
    pub requires_restart: bool,
    pub is_sensitive: bool,
    pub old_value: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigHistoryEntry {
    pub id: i32,
    pub config_key: String,
    pub old_value: Option<String>,
    pub new_value: String,
    pub changed_at: chrono::DateTime<chrono::Utc>,
    pub changed_by: Option<String>,
}

impl From<config_history::Model> for ConfigHistoryEntry {
    fn from(m: config_history::Model) -> Self {
        Self {
            id: m.id,
            config_key: m.config_key,
            old_value: m.old_value,
            new_value: m.new_value,
            changed_at: m.changed_at,
            changed_by: m.changed_by,
        }
    }
}

/// Persistence for `system_config` and `config_history`.
pub struct ConfigStore {
    db: DatabaseConnection,
}

fn redact(is_sensitive: bool, value: &str) -> String {
    if is_sensitive {
        REDACTED.to_string()
    } else {
        value.to_string()
    }
}

fn row_for(def: &ConfigDef) -> system_config::ActiveModel {
    system_config::ActiveModel {
        key: Set(def.key.to_string()),
        value: Set((def.default_fn)()),
        value_type: Set(def.value_type.to_string()),
        requires_restart: Set(def.requires_restart),
        is_sensitive: Set(def.is_sensitive),
        updated_at: Set(chrono::Utc::now()),
    }
}

impl ConfigStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let row = system_config::Entity::find_by_id(key).one(&self.db).await?;
        Ok(row.map(|m| m.value))
    }

    pub async fn get_all(&self) -> Result<HashMap<String, ConfigItem>> {
        let rows = system_config::Entity::find().all(&self.db).await?;
        Ok(rows
            .into_iter()
            .map(|m| (m.key.clone(), ConfigItem::from(m)))
            .collect())
    }

    /// Newest first.
    pub async fn get_history(&self, key: &str, limit: u64) -> Result<Vec<ConfigHistoryEntry>> {
        let rows = config_history::Entity::find()
            .filter(config_history::Column::ConfigKey.eq(key))
            .order_by_desc(config_history::Column::ChangedAt)
            .order_by_desc(config_history::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(ConfigHistoryEntry::from).collect())
    }

    /// Write `value` and append a history row in the same transaction.
    /// Setting the current value again is a no-op without history.
    pub async fn set(
        &self,
        key: &str,
        value: &str,
        changed_by: Option<&str>,
    ) -> Result<ConfigUpdateResult> {
        let current = system_config::Entity::find_by_id(key)
            .one(&self.db)
            .await?
            .ok_or_else(|| MajazamoozError::not_found(format!("Unknown setting '{}'", key)))?;

        let is_sensitive = get_def(key).map_or(current.is_sensitive, |def| def.is_sensitive);
        let result = ConfigUpdateResult {
            key: key.to_string(),
            value: value.to_string(),
            requires_restart: current.requires_restart,
            is_sensitive,
            old_value: Some(current.value.clone()),
        };
        if current.value == value {
            return Ok(result);
        }

        let history = config_history::ActiveModel {
            id: Default::default(),
            config_key: Set(key.to_string()),
            old_value: Set(Some(redact(is_sensitive, &current.value))),
            new_value: Set(redact(is_sensitive, value)),
            changed_at: Set(chrono::Utc::now()),
            changed_by: Set(changed_by.map(str::to_string)),
        };
        let mut row: system_config::ActiveModel = current.into();
        row.value = Set(value.to_string());
        row.updated_at = Set(chrono::Utc::now());

        let txn = self.db.begin().await?;
        row.update(&txn).await?;
        history.insert(&txn).await?;
        txn.commit().await.map_err(|e| {
            MajazamoozError::database_operation(format!("Saving setting '{}' failed: {}", key, e))
        })?;

        Ok(result)
    }

    /// Insert every defined setting that has no row yet and bring type and
    /// flags of existing rows in line with their definition. Stored values
    /// are never touched. Returns how many rows were inserted.
    pub async fn ensure_defaults(&self) -> Result<usize> {
        let existing: HashMap<String, system_config::Model> = system_config::Entity::find()
            .all(&self.db)
            .await?
            .into_iter()
            .map(|m| (m.key.clone(), m))
            .collect();

        let missing: Vec<_> = ALL_CONFIGS
            .iter()
            .filter(|def| !existing.contains_key(def.key))
            .map(row_for)
            .collect();
        let inserted = missing.len();

        if !missing.is_empty() {
            // Another process may have seeded the same keys meanwhile.
            match system_config::Entity::insert_many(missing)
                .on_conflict(
                    OnConflict::column(system_config::Column::Key)
                        .do_nothing()
                        .to_owned(),
                )
                .exec(&self.db)
                .await
            {
                Ok(_) | Err(DbErr::RecordNotInserted) => {}
                Err(e) => return Err(e.into()),
            }
            info!("Seeded {} runtime settings with defaults", inserted);
        }

        for def in ALL_CONFIGS {
            let Some(row) = existing.get(def.key) else {
                continue;
            };
            let value_type = def.value_type.to_string();
            if row.value_type == value_type
                && row.requires_restart == def.requires_restart
                && row.is_sensitive == def.is_sensitive
            {
                continue;
            }
            let mut active: system_config::ActiveModel = row.clone().into();
            active.value_type = Set(value_type);
            active.requires_restart = Set(def.requires_restart);
            active.is_sensitive = Set(def.is_sensitive);
            active.update(&self.db).await?;
            debug!("Updated metadata of setting '{}'", def.key);
        }

        Ok(inserted)
    }
}
