use axum::extract::{Path, State};
use axum::Json;
use std::sync::Arc;
use uuid::Uuid;

use campus_shared::errors::AppResult;
use campus_shared::types::auth::AuthUser;
use campus_shared::types::ApiResponse;

use crate::matching::profile::Profile;
use crate::matching::protocol;
use crate::services::profile_service;
use crate::AppState;

/// GET /blocks
pub async fn list_blocked(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<Profile>>>> {
    let blocked = profile_service::blocked_profiles(state.store.as_ref(), user.id).await?;
    Ok(Json(ApiResponse::ok(blocked)))
}

/// POST /blocks/:id
pub async fn block_user(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(target_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    protocol::block(state.store.as_ref(), user.id, target_id).await?;
    Ok(Json(ApiResponse::ok_with_message((), "user blocked")))
}

/// DELETE /blocks/:id
pub async fn unblock_user(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(target_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    protocol::unblock(state.store.as_ref(), user.id, target_id).await?;
    Ok(Json(ApiResponse::ok_with_message((), "user unblocked")))
}
