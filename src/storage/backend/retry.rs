//! Exponential backoff for transient database failures.
//!
//! Read paths and the short like/vote/view transactions go through
//! [`with_retry`]. Two readers liking the same tutorial at once is the usual
//! source of deadlocks on MySQL/PostgreSQL and of `SQLITE_BUSY` on SQLite.

use std::future::Future;
use std::ops::Deref;
use std::time::Duration;

use sea_orm::DbErr;
use sea_orm::error::RuntimeErr;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::DatabaseConfig;

/// Driver error codes worth another attempt.
const TRANSIENT_CODES: &[&str] = &[
    // MySQL: deadlock, lock wait timeout
    "1213", "1205",
    // PostgreSQL: serialization failure, deadlock
    "40001", "40P01",
    // SQLite: BUSY, LOCKED
    "5", "6",
];

/// Fallback when the driver gives no code.
const TRANSIENT_MESSAGES: &[&str] = &[
    "deadlock",
    "lock wait timeout",
    "database is locked",
    "serialization failure",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 100,
            max_delay_ms: 2000,
        }
    }
}

impl RetryConfig {
    pub fn from_database_config(db: &DatabaseConfig) -> Self {
        Self {
            max_retries: db.retry_count,
            base_delay_ms: db.retry_base_delay_ms,
            max_delay_ms: db.retry_max_delay_ms,
        }
    }

    /// Delay before retry number `attempt` (1-based): `base * 2^(attempt-1)`,
    /// capped at `max_delay_ms`, plus up to a quarter of jitter.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let doubled = self
            .base_delay_ms
            .saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)));
        let capped = doubled.min(self.max_delay_ms);
        let jitter = rand::random_range(0..=capped / 4);
        Duration::from_millis(capped.saturating_add(jitter))
    }
}

/// Connection loss, pool exhaustion, deadlocks and busy SQLite files.
pub fn is_retryable_error(err: &DbErr) -> bool {
    match err {
        DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => true,
        DbErr::Exec(inner) | DbErr::Query(inner) => is_transient(inner),
        _ => false,
    }
}

fn is_transient(err: &RuntimeErr) -> bool {
    let message = match err {
        RuntimeErr::SqlxError(sqlx_err) => {
            let code = sqlx_err
                .deref()
                .as_database_error()
                .and_then(|db_err| db_err.code());
            if let Some(code) = code {
                return TRANSIENT_CODES.contains(&code.as_ref());
            }
            sqlx_err.to_string()
        }
        RuntimeErr::Internal(msg) => msg.clone(),
        #[allow(unreachable_patterns)]
        _ => return false,
    };
    let message = message.to_lowercase();
    TRANSIENT_MESSAGES.iter().any(|m| message.contains(m))
}

/// Run `operation` until it succeeds, fails for good, or retries run out.
///
/// Each attempt calls `operation` afresh, so a transaction opened inside it
/// is rolled back and started over.
pub async fn with_retry<T, F, Fut>(
    operation_name: &str,
    config: RetryConfig,
    mut operation: F,
) -> Result<T, DbErr>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DbErr>>,
{
    let mut attempt = 0;
    loop {
        let err = match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!("'{}' succeeded after {} retries", operation_name, attempt);
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        if !is_retryable_error(&err) {
            debug!("'{}' failed: {}", operation_name, err);
            return Err(err);
        }
        if attempt >= config.max_retries {
            warn!(
                "'{}' still failing after {} attempts: {}",
                operation_name,
                attempt + 1,
                err
            );
            return Err(err);
        }

        attempt += 1;
        let delay = config.delay_for(attempt);
        warn!(
            "'{}' hit a transient error (attempt {}/{}): {}; retrying in {:?}",
            operation_name,
            attempt,
            config.max_retries + 1,
            err,
            delay
        );
        sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::error::ConnAcquireErr;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast() -> RetryConfig {
        RetryConfig {
            max_retries: 2,
            base_delay_ms: 5,
            max_delay_ms: 20,
        }
    }

    #[test]
    fn classifies_transient_errors() {
        assert!(is_retryable_error(&DbErr::ConnectionAcquire(
            ConnAcquireErr::Timeout
        )));
        assert!(is_retryable_error(&DbErr::Exec(RuntimeErr::Internal(
            "Deadlock found when trying to get lock".into()
        ))));
        assert!(is_retryable_error(&DbErr::Query(RuntimeErr::Internal(
            "database is locked".into()
        ))));
        assert!(!is_retryable_error(&DbErr::Exec(RuntimeErr::Internal(
            "UNIQUE constraint failed: tutorial_likes.user_id".into()
        ))));
        assert!(!is_retryable_error(&DbErr::RecordNotFound("gone".into())));
    }

    #[test]
    fn reads_database_section() {
        let db = DatabaseConfig {
            retry_count: 7,
            retry_base_delay_ms: 50,
            ..Default::default()
        };
        let config = RetryConfig::from_database_config(&db);
        assert_eq!(config.max_retries, 7);
        assert_eq!(config.base_delay_ms, 50);
    }

    #[test]
    fn delay_doubles_then_caps() {
        let config = RetryConfig::default();
        let ms = |attempt| config.delay_for(attempt).as_millis() as u64;
        assert!((100..=125).contains(&ms(1)));
        assert!((200..=250).contains(&ms(2)));
        assert!((400..=500).contains(&ms(3)));
        assert!((2000..=2500).contains(&ms(12)));
    }

    #[tokio::test]
    async fn busy_database_is_retried() {
        let calls = AtomicU32::new(0);
        let result = with_retry("toggle_like", fast(), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(DbErr::Exec(RuntimeErr::Internal("database is locked".into())))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let result = with_retry("find_user", fast(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(DbErr::ConnectionAcquire(ConnAcquireErr::Timeout)) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_errors_fail_fast() {
        let calls = AtomicU32::new(0);
        let result = with_retry("find_tutorial", fast(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(DbErr::RecordNotFound("gone".into())) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
