//! Persistence: the SeaORM backend for site data and the runtime setting
//! store.

use std::sync::Arc;

use crate::errors::Result;

pub mod backend;
pub mod config_store;
pub mod models;

pub use backend::relations::{RelationRow, RelationScope};
pub use backend::{Backend, SeaOrmStorage};
pub use config_store::{ConfigHistoryEntry, ConfigItem, ConfigStore, ConfigUpdateResult};
pub use models::{AnswerStatus, ConfirmStatus, Page, ParticipationStatus};

/// Open the database named in the `[database]` section of the static config.
pub async fn open() -> Result<Arc<SeaOrmStorage>> {
    let config = crate::config::get_config();
    SeaOrmStorage::connect(&config.database).await.map(Arc::new)
}
