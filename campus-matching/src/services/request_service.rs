use std::collections::HashSet;

use uuid::Uuid;

use campus_shared::{AppError, AppResult, ErrorCode};

use crate::matching::profile::Profile;
use crate::matching::requests::{
    rank_open_requests, MatchRequest, NewMatchRequest, OwnedRequest, RankedRequest, RequestUpdate,
};
use crate::store::MatchStore;

pub async fn create_request(store: &dyn MatchStore, new: NewMatchRequest) -> AppResult<MatchRequest> {
    let request = store.insert_request(&new).await?;
    tracing::info!(
        request_id = %request.id,
        owner = %request.owner_id,
        category = %request.category,
        "request created"
    );
    Ok(request)
}

/// Open requests for `viewer_id`, ranked by relevance, with membership info.
pub async fn list_requests(
    store: &dyn MatchStore,
    viewer_id: Uuid,
    category: Option<&str>,
) -> AppResult<Vec<RankedRequest>> {
    let viewer = store
        .get_profile(viewer_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ProfileNotFound, "profile not found"))?;

    let blocked: HashSet<Uuid> = store.list_blocked_ids(viewer_id).await?.into_iter().collect();
    let open = store.list_open_requests(category).await?;

    let mut ranked = Vec::new();
    for entry in rank_open_requests(&viewer, open, &blocked) {
        let members = store.list_request_member_ids(entry.request.id).await?;
        ranked.push(entry.with_members(&members, viewer_id));
    }
    Ok(ranked)
}

/// Loads the request and checks `user` posted it.
async fn owned_request(store: &dyn MatchStore, request_id: Uuid, user: Uuid) -> AppResult<MatchRequest> {
    let request = store
        .get_request(request_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::RequestNotFound, "request not found"))?;
    if request.owner_id != user {
        return Err(AppError::new(
            ErrorCode::NotRequestOwner,
            "only the owner can change this request",
        ));
    }
    Ok(request)
}

/// Owner-only edit. Setting the status to closed stops further joins.
pub async fn update_request(
    store: &dyn MatchStore,
    request_id: Uuid,
    user: Uuid,
    update: RequestUpdate,
) -> AppResult<MatchRequest> {
    let current = owned_request(store, request_id, user).await?;
    let updated = store
        .update_request(&update.apply(current))
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::RequestNotFound, "request not found"))?;
    tracing::info!(request_id = %request_id, status = updated.status.as_str(), "request updated");
    Ok(updated)
}

pub async fn delete_request(store: &dyn MatchStore, request_id: Uuid, user: Uuid) -> AppResult<()> {
    owned_request(store, request_id, user).await?;
    if !store.delete_request(request_id).await? {
        return Err(AppError::new(ErrorCode::RequestNotFound, "request not found"));
    }
    tracing::info!(request_id = %request_id, "request deleted");
    Ok(())
}

/// Everything `user` posted, open or closed, with head counts.
pub async fn my_requests(store: &dyn MatchStore, user: Uuid) -> AppResult<Vec<OwnedRequest>> {
    let mut owned = Vec::new();
    for request in store.list_requests_by_owner(user).await? {
        let member_count = store.list_request_member_ids(request.id).await?.len();
        owned.push(OwnedRequest {
            request,
            member_count,
        });
    }
    Ok(owned)
}

pub async fn request_members(store: &dyn MatchStore, request_id: Uuid) -> AppResult<Vec<Profile>> {
    if store.get_request(request_id).await?.is_none() {
        return Err(AppError::new(ErrorCode::RequestNotFound, "request not found"));
    }
    Ok(store.list_request_members(request_id).await?)
}
