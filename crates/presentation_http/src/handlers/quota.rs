//! Remaining stories for the caller

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{error::ApiError, middleware::ClientIdentity, state::AppState};

#[derive(Debug, Clone, Serialize)]
pub struct QuotaResponse {
    pub used: u32,
    pub remaining: u32,
    pub daily_limit: u32,
    pub resets_at: DateTime<Utc>,
    pub message: String,
}

pub async fn get_quota(
    State(state): State<AppState>,
    ClientIdentity(identity): ClientIdentity,
) -> Result<Json<QuotaResponse>, ApiError> {
    let status = state.pipeline.quota_status(&identity).await?;

    Ok(Json(QuotaResponse {
        used: status.used,
        remaining: status.remaining,
        daily_limit: status.daily_limit,
        resets_at: status.resets_at,
        message: status.message(),
    }))
}
