use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use campus_shared::errors::{AppError, AppResult};
use campus_shared::types::auth::AuthUser;
use campus_shared::types::ApiResponse;

use crate::events::publisher;
use crate::matching::protocol::{self, JoinOutcome};
use crate::matching::profile::Profile;
use crate::matching::requests::{
    MatchRequest, NewMatchRequest, OwnedRequest, RankedRequest, RequestStatus, RequestUpdate,
};
use crate::services::request_service;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListRequestsQuery {
    pub category: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRequestPayload {
    #[validate(length(min = 3, max = 200))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub category: String,
    #[serde(default)]
    #[validate(length(max = 20))]
    pub related_interests: Vec<String>,
    #[validate(range(min = 1, max = 100))]
    pub max_participants: Option<i32>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateRequestPayload {
    #[validate(length(min = 3, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub category: Option<String>,
    #[validate(length(max = 20))]
    pub related_interests: Option<Vec<String>>,
    pub status: Option<RequestStatus>,
    #[validate(range(min = 1, max = 100))]
    pub max_participants: Option<i32>,
}

impl From<UpdateRequestPayload> for RequestUpdate {
    fn from(p: UpdateRequestPayload) -> Self {
        RequestUpdate {
            title: p.title.map(|t| t.trim().to_string()),
            description: p.description,
            category: p.category,
            related_interests: p.related_interests,
            status: p.status,
            max_participants: p.max_participants,
        }
    }
}

/// GET /requests?category=project
pub async fn list_requests(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListRequestsQuery>,
) -> AppResult<Json<ApiResponse<Vec<RankedRequest>>>> {
    // "all" is what clients send for no category filter
    let category = query.category.as_deref().filter(|c| *c != "all" && !c.is_empty());
    let requests = request_service::list_requests(state.store.as_ref(), user.id, category).await?;
    Ok(Json(ApiResponse::ok(requests)))
}

/// POST /requests
pub async fn create_request(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateRequestPayload>,
) -> AppResult<Json<ApiResponse<MatchRequest>>> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let request = request_service::create_request(
        state.store.as_ref(),
        NewMatchRequest {
            owner_id: user.id,
            title: payload.title.trim().to_string(),
            description: payload.description,
            category: payload.category,
            related_interests: payload.related_interests,
            max_participants: payload.max_participants,
        },
    )
    .await?;

    Ok(Json(ApiResponse::ok(request)))
}

/// GET /requests/mine
pub async fn my_requests(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<OwnedRequest>>>> {
    let requests = request_service::my_requests(state.store.as_ref(), user.id).await?;
    Ok(Json(ApiResponse::ok(requests)))
}

/// PATCH /requests/:id
pub async fn update_request(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(request_id): Path<Uuid>,
    Json(payload): Json<UpdateRequestPayload>,
) -> AppResult<Json<ApiResponse<MatchRequest>>> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let request =
        request_service::update_request(state.store.as_ref(), request_id, user.id, payload.into())
            .await?;
    Ok(Json(ApiResponse::ok(request)))
}

/// DELETE /requests/:id
pub async fn delete_request(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(request_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    request_service::delete_request(state.store.as_ref(), request_id, user.id).await?;
    Ok(Json(ApiResponse::ok_with_message((), "request deleted")))
}

/// GET /requests/:id/members
pub async fn request_members(
    _user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(request_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Vec<Profile>>>> {
    let members = request_service::request_members(state.store.as_ref(), request_id).await?;
    Ok(Json(ApiResponse::ok(members)))
}

/// POST /requests/:id/join
pub async fn join_request(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(request_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<JoinOutcome>>> {
    let outcome = protocol::join_request(state.store.as_ref(), request_id, user.id).await?;

    if let Some(rabbitmq) = &state.rabbitmq {
        if outcome.joined {
            publisher::publish_request_joined(
                rabbitmq,
                request_id,
                outcome.owner_id,
                user.id,
                outcome.match_id,
            )
            .await;
        }
        if let (Some(m), Some(chat_id)) = (&outcome.created, outcome.chat_id) {
            publisher::publish_match_created(rabbitmq, m, chat_id, user.id).await;
        }
    }

    Ok(Json(ApiResponse::ok(outcome)))
}

/// DELETE /requests/:id/join
pub async fn leave_request(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(request_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    protocol::leave_request(state.store.as_ref(), request_id, user.id).await?;
    Ok(Json(ApiResponse::ok_with_message((), "left request")))
}
