use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use campus_shared::errors::{AppError, AppResult};
use campus_shared::types::auth::AuthUser;
use campus_shared::types::ApiResponse;

use crate::matching::profile::{Communication, DatingPreference, Profile, ProfileUpdate, WakeCycle};
use crate::services::profile_service;
use crate::AppState;

fn default_level() -> i32 {
    5
}

fn default_communication() -> Communication {
    Communication::Text
}

fn default_wake_cycle() -> WakeCycle {
    WakeCycle::Flexible
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProfilePayload {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 100))]
    pub branch: Option<String>,
    #[validate(range(min = 1, max = 6))]
    pub year: Option<i32>,
    #[serde(default)]
    #[validate(length(max = 20))]
    pub interests: Vec<String>,
    #[serde(default)]
    #[validate(length(max = 20))]
    pub hobbies: Vec<String>,
    #[serde(default)]
    #[validate(length(max = 20))]
    pub goals: Vec<String>,
    #[serde(default = "default_level")]
    #[validate(range(min = 0, max = 10))]
    pub personality_social_level: i32,
    #[serde(default = "default_level")]
    #[validate(range(min = 0, max = 10))]
    pub personality_activity_level: i32,
    #[serde(default = "default_communication")]
    pub personality_communication: Communication,
    #[serde(default = "default_wake_cycle")]
    pub personality_wake_cycle: WakeCycle,
    #[serde(default)]
    pub dating_mode: bool,
    pub dating_preference: Option<DatingPreference>,
    #[validate(length(max = 20))]
    pub gender: Option<String>,
    #[serde(default)]
    pub onboarding_completed: bool,
}

impl CreateProfilePayload {
    fn into_profile(self, user: &AuthUser) -> Profile {
        Profile {
            id: user.id,
            name: self.name.trim().to_string(),
            branch: self.branch,
            year: self.year,
            interests: self.interests,
            hobbies: self.hobbies,
            goals: self.goals,
            personality_social_level: self.personality_social_level,
            personality_activity_level: self.personality_activity_level,
            personality_communication: self.personality_communication,
            personality_wake_cycle: self.personality_wake_cycle,
            dating_enabled: self.dating_mode,
            dating_preference: self.dating_preference,
            gender: self.gender,
            onboarding_completed: self.onboarding_completed,
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProfilePayload {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 100))]
    pub branch: Option<String>,
    #[validate(range(min = 1, max = 6))]
    pub year: Option<i32>,
    #[validate(length(max = 20))]
    pub interests: Option<Vec<String>>,
    #[validate(length(max = 20))]
    pub hobbies: Option<Vec<String>>,
    #[validate(length(max = 20))]
    pub goals: Option<Vec<String>>,
    #[validate(range(min = 0, max = 10))]
    pub personality_social_level: Option<i32>,
    #[validate(range(min = 0, max = 10))]
    pub personality_activity_level: Option<i32>,
    pub personality_communication: Option<Communication>,
    pub personality_wake_cycle: Option<WakeCycle>,
    pub dating_mode: Option<bool>,
    pub dating_preference: Option<DatingPreference>,
    #[validate(length(max = 20))]
    pub gender: Option<String>,
    pub onboarding_completed: Option<bool>,
}

impl From<UpdateProfilePayload> for ProfileUpdate {
    fn from(p: UpdateProfilePayload) -> Self {
        ProfileUpdate {
            name: p.name.map(|n| n.trim().to_string()),
            branch: p.branch,
            year: p.year,
            interests: p.interests,
            hobbies: p.hobbies,
            goals: p.goals,
            personality_social_level: p.personality_social_level,
            personality_activity_level: p.personality_activity_level,
            personality_communication: p.personality_communication,
            personality_wake_cycle: p.personality_wake_cycle,
            dating_enabled: p.dating_mode,
            dating_preference: p.dating_preference,
            gender: p.gender,
            onboarding_completed: p.onboarding_completed,
        }
    }
}

/// POST /profiles
pub async fn create_profile(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateProfilePayload>,
) -> AppResult<Json<ApiResponse<Profile>>> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let profile =
        profile_service::create_profile(state.store.as_ref(), payload.into_profile(&user)).await?;
    Ok(Json(ApiResponse::ok(profile)))
}

/// GET /profiles/me
pub async fn get_my_profile(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Profile>>> {
    let profile = profile_service::get_profile(state.store.as_ref(), user.id).await?;
    Ok(Json(ApiResponse::ok(profile)))
}

/// PATCH /profiles/me
pub async fn update_my_profile(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(payload): Json<UpdateProfilePayload>,
) -> AppResult<Json<ApiResponse<Profile>>> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let profile =
        profile_service::update_profile(state.store.as_ref(), user.id, payload.into()).await?;
    Ok(Json(ApiResponse::ok(profile)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_outside_scale_rejected() {
        let bad = UpdateProfilePayload {
            personality_social_level: Some(11),
            name: Some(String::new()),
            ..Default::default()
        };
        let errors = bad.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("personality_social_level"));
        assert!(fields.contains_key("name"));
        assert!(UpdateProfilePayload::default().validate().is_ok());
    }

    #[test]
    fn create_payload_fills_defaults() {
        let payload: CreateProfilePayload =
            serde_json::from_str(r#"{"name":"Meera","dating_preference":"male"}"#).unwrap();
        assert!(payload.validate().is_ok());
        assert_eq!(payload.personality_social_level, 5);
        assert_eq!(payload.personality_wake_cycle, WakeCycle::Flexible);
        assert_eq!(
            payload.dating_preference,
            Some(DatingPreference::Only("male".into()))
        );
        assert!(!payload.onboarding_completed);
    }
}
