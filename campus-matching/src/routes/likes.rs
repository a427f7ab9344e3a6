use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use campus_shared::errors::AppResult;
use campus_shared::types::auth::AuthUser;
use campus_shared::types::ApiResponse;

use crate::events::publisher;
use crate::matching::pair::LikeKind;
use crate::matching::protocol::{self, LikeOutcome};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SendLikeRequest {
    pub target_id: Uuid,
    #[serde(default = "default_kind")]
    pub kind: LikeKind,
}

fn default_kind() -> LikeKind {
    LikeKind::Friend
}

/// POST /likes
pub async fn send_like(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<SendLikeRequest>,
) -> AppResult<Json<ApiResponse<LikeOutcome>>> {
    let outcome =
        protocol::register_like(state.store.as_ref(), user.id, req.target_id, req.kind).await?;

    if let Some(rabbitmq) = &state.rabbitmq {
        if outcome.like_created {
            publisher::publish_like_sent(rabbitmq, user.id, req.target_id, req.kind).await;
        }
        if let (Some(m), Some(chat_id)) = (&outcome.created, outcome.chat_id) {
            publisher::publish_match_created(rabbitmq, m, chat_id, user.id).await;
        }
    }

    let message = if outcome.matched { "it's a match" } else { "like recorded" };
    Ok(Json(ApiResponse::ok_with_message(outcome, message)))
}
