//! Health check handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use core_kernel::{AdapterHealth, HealthCheckResult};

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub adapters: Vec<HealthCheckResult>,
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        adapters: Vec::new(),
    })
}

/// Readiness check (asks every storage adapter)
pub async fn readiness_check(
    State(state): State<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let adapters = vec![
        state.ports.users.health_check().await,
        state.ports.catalog.health_check().await,
        state.ports.bookings.health_check().await,
        state.ports.payments.health_check().await,
    ];

    let ready = adapters.iter().all(|a| a.status != AdapterHealth::Unhealthy);
    let (code, status) = if ready {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
    };

    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            adapters,
        }),
    )
}
