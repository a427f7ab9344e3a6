use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use campus_shared::errors::{AppError, AppResult};
use campus_shared::types::auth::AuthUser;
use campus_shared::types::ApiResponse;

use crate::matching::report::Report;
use crate::services::profile_service;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct ReportPayload {
    pub reported_id: Uuid,
    #[validate(length(min = 1, max = 1000))]
    pub reason: String,
}

/// POST /reports
pub async fn report_user(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ReportPayload>,
) -> AppResult<Json<ApiResponse<Report>>> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let report = profile_service::report_user(
        state.store.as_ref(),
        user.id,
        payload.reported_id,
        payload.reason.trim().to_string(),
    )
    .await?;
    Ok(Json(ApiResponse::ok_with_message(report, "report submitted")))
}
