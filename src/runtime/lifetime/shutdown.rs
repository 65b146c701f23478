use std::time::Duration;

use sea_orm::DatabaseConnection;
use tokio::signal;
use tokio::time::timeout;
use tracing::{error, info, warn};

/// Seconds allowed for closing the connection pool.
const SHUTDOWN_TIMEOUT_SECS: u64 = 10;

/// Resolve on Ctrl+C, then close the database pool.
pub async fn listen_for_shutdown(db: DatabaseConnection) {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received, closing connections..."),
        Err(e) => warn!(
            "Failed to listen for Ctrl+C: {}. Proceeding with shutdown anyway.",
            e
        ),
    }

    match timeout(Duration::from_secs(SHUTDOWN_TIMEOUT_SECS), db.close()).await {
        Ok(Ok(())) => info!("Database connections closed"),
        Ok(Err(e)) => error!("Failed to close database connections: {}", e),
        Err(_) => error!(
            "Closing database connections timed out after {} seconds",
            SHUTDOWN_TIMEOUT_SECS
        ),
    }
}
