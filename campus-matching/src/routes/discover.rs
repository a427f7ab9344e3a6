use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;

use campus_shared::errors::AppResult;
use campus_shared::types::auth::AuthUser;
use campus_shared::types::ApiResponse;

use crate::matching::discovery::{Candidate, DiscoverFilters, DiscoveryMode};
use crate::matching::profile::{LEVEL_MAX, LEVEL_MIN};
use crate::services::discovery_service;
use crate::AppState;

/// Query string of `GET /discover`. List filters are comma separated.
#[derive(Debug, Default, Deserialize)]
pub struct DiscoverQuery {
    pub branch: Option<String>,
    pub year: Option<i32>,
    #[serde(default)]
    pub dating_only: bool,
    pub interests: Option<String>,
    pub hobbies: Option<String>,
    pub goals: Option<String>,
    pub social_min: Option<i32>,
    pub social_max: Option<i32>,
    pub activity_min: Option<i32>,
    pub activity_max: Option<i32>,
    pub limit: Option<usize>,
}

fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

fn range(min: Option<i32>, max: Option<i32>) -> Option<(i32, i32)> {
    match (min, max) {
        (None, None) => None,
        (min, max) => Some((min.unwrap_or(LEVEL_MIN), max.unwrap_or(LEVEL_MAX))),
    }
}

impl DiscoverQuery {
    pub fn filters(&self) -> DiscoverFilters {
        DiscoverFilters {
            branch: self.branch.clone().filter(|b| !b.is_empty()),
            year: self.year,
            dating_only: self.dating_only,
            interests: split_list(self.interests.as_deref()),
            hobbies: split_list(self.hobbies.as_deref()),
            goals: split_list(self.goals.as_deref()),
            social_range: range(self.social_min, self.social_max),
            activity_range: range(self.activity_min, self.activity_max),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

/// GET /discover
pub async fn discover_profiles(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Query(query): Query<DiscoverQuery>,
) -> AppResult<Json<ApiResponse<Vec<Candidate>>>> {
    let limit = query.limit.unwrap_or(state.config.discover_limit).clamp(1, 100);
    let candidates = discovery_service::discover_for(
        state.store.as_ref(),
        user.id,
        DiscoveryMode::General(query.filters()),
        limit,
        state.config.dating_prefetch,
    )
    .await?;

    Ok(Json(ApiResponse::ok(candidates)))
}

/// GET /discover/dating
pub async fn discover_dating(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Query(query): Query<LimitQuery>,
) -> AppResult<Json<ApiResponse<Vec<Candidate>>>> {
    let limit = query.limit.unwrap_or(state.config.discover_limit).clamp(1, 100);
    let candidates = discovery_service::discover_for(
        state.store.as_ref(),
        user.id,
        DiscoveryMode::DatingOnly,
        limit,
        state.config.dating_prefetch,
    )
    .await?;

    Ok(Json(ApiResponse::ok(candidates)))
}
