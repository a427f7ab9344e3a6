use uuid::Uuid;

use campus_shared::{AppError, AppResult, ErrorCode};

use crate::matching::profile::{Profile, ProfileUpdate};
use crate::matching::report::{NewReport, Report};
use crate::store::{MatchStore, StoreError};

fn profile_not_found() -> AppError {
    AppError::new(ErrorCode::ProfileNotFound, "profile not found")
}

pub async fn create_profile(store: &dyn MatchStore, profile: Profile) -> AppResult<Profile> {
    match store.insert_profile(&profile).await {
        Ok(created) => {
            tracing::info!(user = %created.id, onboarded = created.onboarding_completed, "profile created");
            Ok(created)
        }
        Err(StoreError::Conflict) => Err(AppError::new(
            ErrorCode::ProfileAlreadyExists,
            "profile already exists",
        )),
        Err(e) => Err(e.into()),
    }
}

pub async fn get_profile(store: &dyn MatchStore, user_id: Uuid) -> AppResult<Profile> {
    store.get_profile(user_id).await?.ok_or_else(profile_not_found)
}

/// Applies `update` over the stored profile and writes the result back.
pub async fn update_profile(
    store: &dyn MatchStore,
    user_id: Uuid,
    update: ProfileUpdate,
) -> AppResult<Profile> {
    let current = get_profile(store, user_id).await?;
    let updated = store
        .update_profile(&update.apply(current))
        .await?
        .ok_or_else(profile_not_found)?;
    tracing::info!(user = %user_id, "profile updated");
    Ok(updated)
}

pub async fn blocked_profiles(store: &dyn MatchStore, user_id: Uuid) -> AppResult<Vec<Profile>> {
    Ok(store.list_blocked_profiles(user_id).await?)
}

pub async fn report_user(
    store: &dyn MatchStore,
    reporter_id: Uuid,
    reported_id: Uuid,
    reason: String,
) -> AppResult<Report> {
    if reporter_id == reported_id {
        return Err(AppError::new(ErrorCode::CannotReportSelf, "cannot report yourself"));
    }
    if store.get_profile(reported_id).await?.is_none() {
        return Err(profile_not_found());
    }

    let report = store
        .insert_report(&NewReport {
            reporter_id,
            reported_id,
            reason,
        })
        .await?;
    tracing::warn!(
        report_id = %report.id,
        reporter = %reporter_id,
        reported = %reported_id,
        "user reported"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::profile::fixtures::profile;
    use crate::matching::protocol::block;
    use crate::store::InMemoryStore;

    #[tokio::test]
    async fn create_then_update() {
        let store = InMemoryStore::new();
        let me = profile(Uuid::new_v4());
        create_profile(&store, me.clone()).await.unwrap();

        let err = create_profile(&store, me.clone()).await.unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ProfileAlreadyExists));

        let updated = update_profile(
            &store,
            me.id,
            ProfileUpdate {
                year: Some(2),
                goals: Some(vec!["Internship".into()]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.year, Some(2));
        assert_eq!(updated.goals, vec!["Internship".to_string()]);
        assert_eq!(get_profile(&store, me.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn updating_unknown_profile_fails() {
        let store = InMemoryStore::new();
        let err = update_profile(&store, Uuid::new_v4(), ProfileUpdate::default())
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ProfileNotFound));
    }

    #[tokio::test]
    async fn blocked_list_only_has_own_blocks() {
        let store = InMemoryStore::new();
        let (me, target, stranger) = (
            profile(Uuid::new_v4()),
            profile(Uuid::new_v4()),
            profile(Uuid::new_v4()),
        );
        for p in [&me, &target, &stranger] {
            store.upsert_profile(p.clone()).await;
        }
        block(&store, me.id, target.id).await.unwrap();
        block(&store, stranger.id, me.id).await.unwrap();

        let blocked = blocked_profiles(&store, me.id).await.unwrap();
        assert_eq!(blocked, vec![target]);
    }

    #[tokio::test]
    async fn reports_need_a_real_other_user() {
        let store = InMemoryStore::new();
        let (me, them) = (profile(Uuid::new_v4()), profile(Uuid::new_v4()));
        store.upsert_profile(me.clone()).await;
        store.upsert_profile(them.clone()).await;

        let err = report_user(&store, me.id, me.id, "spam".into()).await.unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::CannotReportSelf));

        let err = report_user(&store, me.id, Uuid::new_v4(), "spam".into())
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ProfileNotFound));

        let report = report_user(&store, me.id, them.id, "spam".into()).await.unwrap();
        assert_eq!(report.reported_id, them.id);
        assert_eq!(store.report_count().await, 1);
    }
}
