//! Server mode
//!
//! Builds the shared state once, then starts the actix-web server with the
//! session, request-id and compression middleware around every route.

use actix_web::{
    App, HttpServer,
    middleware::{Compress, DefaultHeaders},
    web,
};
use anyhow::{Context, Result};
use tracing::{error, warn};

use crate::api::middleware::{RequestIdMiddleware, SessionAuth};
use crate::api::services::configure_routes;
use crate::config::get_config;
use crate::runtime::lifetime;

/// Maximum request body, in bytes.
const PAYLOAD_LIMIT: usize = 1024 * 1024;

/// Run the HTTP server until it stops or Ctrl+C arrives.
///
/// Logging must be initialized before calling this.
pub async fn run_server() -> Result<()> {
    let startup = lifetime::startup::prepare_server_startup()
        .await
        .inspect_err(|e| error!("Server startup failed: {:#}", e))?;

    let config = get_config();
    let cpu_count = config.server.cpu_count.clamp(1, 32);
    warn!("Using {} CPU cores for the server", cpu_count);

    let state = web::Data::new(startup.app_state());
    let db_for_shutdown = startup.storage.get_db().clone();

    let server = HttpServer::new(move || {
        App::new()
            .wrap(SessionAuth)
            .wrap(RequestIdMiddleware)
            .wrap(Compress::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("Cache-Control", "no-cache, no-store, must-revalidate"))
                    .add(("X-Content-Type-Options", "nosniff")),
            )
            .app_data(state.clone())
            .app_data(web::PayloadConfig::new(PAYLOAD_LIMIT))
            .configure(configure_routes)
    })
    .keep_alive(std::time::Duration::from_secs(30))
    .client_request_timeout(std::time::Duration::from_millis(5000))
    .workers(cpu_count);

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    warn!("Starting server at http://{}", bind_address);
    let server = server
        .bind(&bind_address)
        .with_context(|| format!("Failed to bind {}", bind_address))?
        .run();

    tokio::select! {
        res = server => {
            res.context("HTTP server error")?;
        }
        _ = lifetime::shutdown::listen_for_shutdown(db_for_shutdown) => {
            warn!("Graceful shutdown completed");
        }
    }

    Ok(())
}
