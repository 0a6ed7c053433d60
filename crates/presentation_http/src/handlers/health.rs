//! Health check handlers

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Liveness check - is the server running?
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub story_generation: ServiceStatus,
    pub narration: ServiceStatus,
}

/// Status of one provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Readiness check - are both providers reachable?
pub async fn readiness_check(
    State(state): State<AppState>,
) -> (StatusCode, Json<ReadinessResponse>) {
    let (generation_healthy, narration_healthy) = tokio::join!(
        state.story_generator.is_healthy(),
        state.narrator.is_available()
    );

    let story_generation = ServiceStatus {
        healthy: generation_healthy,
        model: generation_healthy.then(|| state.story_generator.model_name()),
    };
    let narration = ServiceStatus {
        healthy: narration_healthy,
        model: None,
    };

    let ready = generation_healthy && narration_healthy;
    let status_code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(ReadinessResponse {
            ready,
            story_generation,
            narration,
        }),
    )
}
