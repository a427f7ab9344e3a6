use axum::extract::{Path, Query, State};
use axum::Json;
use std::sync::Arc;
use uuid::Uuid;

use campus_shared::errors::AppResult;
use campus_shared::types::auth::AuthUser;
use campus_shared::types::{ApiResponse, Paginated, PaginationParams};

use crate::events::publisher;
use crate::matching::protocol::{self, MatchStats, MatchSummary};
use crate::AppState;

/// GET /matches?page=1&per_page=20
pub async fn list_matches(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<ApiResponse<Paginated<MatchSummary>>>> {
    let all = protocol::list_matches(state.store.as_ref(), user.id).await?;
    Ok(Json(ApiResponse::ok(Paginated::from_all(all, &params))))
}

/// GET /matches/stats
pub async fn match_stats(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<MatchStats>>> {
    let stats = protocol::match_stats(state.store.as_ref(), user.id).await?;
    Ok(Json(ApiResponse::ok(stats)))
}

/// DELETE /matches/:id
pub async fn unmatch(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(match_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    protocol::unmatch(state.store.as_ref(), match_id, user.id).await?;

    if let Some(rabbitmq) = &state.rabbitmq {
        publisher::publish_match_removed(rabbitmq, match_id, user.id).await;
    }

    Ok(Json(ApiResponse::ok_with_message((), "match removed")))
}
