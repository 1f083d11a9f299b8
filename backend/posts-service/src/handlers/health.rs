/// Health endpoints
///
/// `/health/live` only proves the process answers; `/health` and
/// `/health/ready` also ask the store.
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use serde::Serialize;
use std::time::Instant;

#[derive(Serialize, Clone, Copy)]
#[serde(rename_all = "lowercase")]
enum ComponentStatus {
    Healthy,
    Unhealthy,
}

#[derive(Serialize)]
struct ComponentCheck {
    status: ComponentStatus,
    message: String,
    latency_ms: u64,
}

#[derive(Serialize)]
struct ReadinessResponse {
    ready: bool,
    store: ComponentCheck,
    timestamp: String,
}

pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    match state.store.health_check().await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "posts-service",
            "version": env!("CARGO_PKG_VERSION"),
        })),
        Err(e) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "unhealthy",
            "error": e.to_string(),
            "service": "posts-service",
        })),
    }
}

pub async fn liveness() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "alive" }))
}

pub async fn readiness(state: web::Data<AppState>) -> HttpResponse {
    let start = Instant::now();
    let result = state.store.health_check().await;
    let latency_ms = start.elapsed().as_millis() as u64;

    let store = match result {
        Ok(()) => ComponentCheck {
            status: ComponentStatus::Healthy,
            message: "store reachable".to_string(),
            latency_ms,
        },
        Err(e) => {
            tracing::warn!("readiness check failed: {}", e);
            ComponentCheck {
                status: ComponentStatus::Unhealthy,
                message: e.to_string(),
                latency_ms,
            }
        }
    };

    let ready = matches!(store.status, ComponentStatus::Healthy);
    let body = ReadinessResponse {
        ready,
        store,
        timestamp: chrono::Utc::now().to_rfc3339(),
    };

    if ready {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::ServiceUnavailable().json(body)
    }
}
