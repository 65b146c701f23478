//! SeaORM storage backend
//!
//! All persistence goes through [`SeaOrmStorage`]. The query and mutation
//! methods are split by domain across the submodules; SQLite, MySQL/MariaDB
//! and PostgreSQL are supported.

mod categories;
mod comments;
mod connection;
mod exams;
pub mod relations;
pub mod retry;
mod statistics;
mod tutorials;
mod users;

use std::time::Duration;

use moka::sync::Cache;
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, ExprTrait, QueryFilter};
use sea_orm::{ColumnTrait, sea_query::Expr};
use tracing::info;

use crate::config::DatabaseConfig;
use crate::errors::{MajazamoozError, Result};
use migration::entities::user;

pub use categories::{CategoryUpdate, NewCategory};
pub use comments::{CommentFilter, CommentUpdate, NewComment};
pub use connection::Backend;
pub use exams::{
    ExamFilter, ExamUpdate, GradeSummary, NewExam, NewQuestion, ParticipationQuery,
    QuestionUpdate, ScoringRules, grade, submission_closes_at,
};
pub use relations::{
    RelationRow, RelationScope, Reward, RewardRecipient, ScoreCoinRelation, ToggleOutcome,
};
pub use statistics::TutorialAggregate;
pub use tutorials::{NewTutorial, TutorialFilter, TutorialUpdate};
pub use users::{NewUser, ProfileUpdate, UserFilter};

/// SeaORM-based storage backend
#[derive(Clone)]
pub struct SeaOrmStorage {
    db: DatabaseConnection,
    backend: Backend,
    /// Pagination COUNT results, 30 second TTL.
    count_cache: Cache<String, u64>,
    retry_config: retry::RetryConfig,
}

impl SeaOrmStorage {
    /// Connect, run pending migrations and return the storage.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        if config.database_url.is_empty() {
            return Err(MajazamoozError::database_config("database_url is not set"));
        }
        let backend = Backend::from_url(&config.database_url)?;
        let db = connection::open(config, backend).await?;
        connection::migrate(&db).await?;

        info!("{} storage ready", backend);
        Ok(SeaOrmStorage {
            db,
            backend,
            count_cache: Cache::builder()
                .time_to_live(Duration::from_secs(30))
                .max_capacity(1000)
                .build(),
            retry_config: retry::RetryConfig::from_database_config(config),
        })
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.into()
    }

    /// Raw connection, for the runtime config store and health checks.
    pub fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Drop cached COUNT results after any write that changes list sizes.
    pub fn invalidate_count_cache(&self) {
        self.count_cache.invalidate_all();
    }

    /// Cached `COUNT(*)` keyed by a description of the filter.
    async fn cached_count<F, Fut>(&self, cache_key: String, op_name: &str, count: F) -> Result<u64>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = std::result::Result<u64, DbErr>>,
    {
        if let Some(cached) = self.count_cache.get(&cache_key) {
            return Ok(cached);
        }
        let total = retry::with_retry(op_name, self.retry_config, count).await?;
        self.count_cache.insert(cache_key, total);
        Ok(total)
    }

    pub async fn ping(&self) -> Result<()> {
        self.db
            .ping()
            .await
            .map_err(|e| MajazamoozError::database_connection(e.to_string()))
    }
}

/// Add deltas to a user's currencies. Runs on whatever connection or
/// transaction the caller holds.
pub(crate) async fn adjust_balance<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    scores: i64,
    coins: i64,
    diamonds: i64,
) -> std::result::Result<(), DbErr> {
    if scores == 0 && coins == 0 && diamonds == 0 {
        return Ok(());
    }
    user::Entity::update_many()
        .col_expr(
            user::Column::Scores,
            Expr::col(user::Column::Scores).add(scores),
        )
        .col_expr(user::Column::Coins, Expr::col(user::Column::Coins).add(coins))
        .col_expr(
            user::Column::Diamonds,
            Expr::col(user::Column::Diamonds).add(diamonds),
        )
        .filter(user::Column::Id.eq(user_id))
        .exec(conn)
        .await?;
    Ok(())
}
