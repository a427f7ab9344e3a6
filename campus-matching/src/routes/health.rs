use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use campus_shared::{HealthCheck, HealthResponse, HealthStatus};
use std::sync::Arc;

use crate::AppState;

/// Health check covering the database and the event bus.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Response {
    let database = match state.store.ping().await {
        Ok(()) => HealthCheck::healthy("database"),
        Err(e) => HealthCheck::unhealthy("database", e.to_string()),
    };

    let rabbitmq = match &state.rabbitmq {
        Some(client) if client.is_connected() => HealthCheck::healthy("rabbitmq"),
        Some(_) => HealthCheck::unhealthy("rabbitmq", "channel closed"),
        None => HealthCheck {
            name: "rabbitmq".into(),
            status: HealthStatus::Degraded,
            message: Some("not configured".into()),
        },
    };

    let response = HealthResponse::healthy("campus-matching", env!("CARGO_PKG_VERSION"))
        .with_checks(vec![database, rabbitmq]);

    let status = match response.status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status, Json(response)).into_response()
}

/// Returns Prometheus metrics.
pub async fn metrics(State(state): State<Arc<AppState>>) -> String {
    state.metrics_handle.render()
}
