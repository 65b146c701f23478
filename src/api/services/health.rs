//! `/health` probes.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{error, info, trace};

use crate::api::AppState;

use super::error_code::ErrorCode;
use super::helpers::json_response;

#[derive(Debug, Serialize)]
pub struct StorageCheck {
    pub status: &'static str,
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub uptime: u64,
    pub storage: StorageCheck,
    pub response_time_ms: u64,
}

/// `GET /health`: pings the database with a 5 second timeout.
pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let start = Instant::now();
    trace!("Received health check request");

    let backend = state.storage.backend_name().to_string();
    let storage = match tokio::time::timeout(Duration::from_secs(5), state.storage.ping()).await {
        Ok(Ok(())) => StorageCheck {
            status: "healthy",
            backend,
            error: None,
        },
        Ok(Err(e)) => {
            error!("Storage health check failed: {}", e);
            StorageCheck {
                status: "unhealthy",
                backend,
                error: Some(format!("database error: {}", e)),
            }
        }
        Err(_) => {
            error!("Storage health check timeout");
            StorageCheck {
                status: "unhealthy",
                backend,
                error: Some("timeout".to_string()),
            }
        }
    };

    let now = chrono::Utc::now();
    let healthy = storage.error.is_none();
    let body = HealthResponse {
        status: if healthy { "healthy" } else { "unhealthy" },
        timestamp: now.to_rfc3339(),
        uptime: (now - state.started_at).num_seconds().max(0) as u64,
        storage,
        response_time_ms: start.elapsed().as_millis() as u64,
    };

    info!(
        "Health check completed in {:?}, status: {}",
        start.elapsed(),
        body.status
    );

    if healthy {
        json_response(StatusCode::OK, ErrorCode::Success, "OK", Some(body))
    } else {
        json_response(
            StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::ServiceUnavailable,
            "Service Unavailable",
            Some(body),
        )
    }
}

/// `GET /health/ready`
pub async fn readiness_check() -> impl Responder {
    trace!("Received readiness check request");
    HttpResponse::Ok().finish()
}

/// `GET /health/live`
pub async fn liveness_check() -> impl Responder {
    trace!("Received liveness check request");
    HttpResponse::NoContent().finish()
}

pub fn health_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/health")
            .route("", web::get().to(health_check))
            .route("/ready", web::get().to(readiness_check))
            .route("/live", web::get().to(liveness_check)),
    );
}
