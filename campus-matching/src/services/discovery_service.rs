use uuid::Uuid;

use campus_shared::{AppError, AppResult, ErrorCode};

use crate::matching::discovery::{discover, Candidate, DiscoveryMode, ExclusionSet, PoolQuery};
use crate::store::MatchStore;

/// Builds `viewer_id`'s exclusion set from the store.
pub async fn exclusions_for(store: &dyn MatchStore, viewer_id: Uuid) -> AppResult<ExclusionSet> {
    let blocked = store.list_blocked_ids(viewer_id).await?;
    let matched = store.list_matched_ids(viewer_id).await?;
    let liked = store.list_liked_to_ids(viewer_id).await?;
    Ok(ExclusionSet::build(viewer_id, blocked, matched, liked))
}

/// Loads the viewer, their exclusions and a candidate pool, then ranks.
///
/// The store applies exclusions and filters before capping the pool at
/// `prefetch` rows, so every row it returns is eligible.
pub async fn discover_for(
    store: &dyn MatchStore,
    viewer_id: Uuid,
    mode: DiscoveryMode,
    limit: usize,
    prefetch: usize,
) -> AppResult<Vec<Candidate>> {
    let viewer = store
        .get_profile(viewer_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ProfileNotFound, "profile not found"))?;

    if matches!(mode, DiscoveryMode::DatingOnly) && !viewer.dating_enabled {
        return Ok(Vec::new());
    }

    let exclusions = exclusions_for(store, viewer_id).await?;
    let query = PoolQuery::new(viewer, &exclusions, mode, prefetch.max(limit));
    let pool = store.candidate_pool(&query).await?;

    let ranked = discover(&query.viewer, &pool, &exclusions, &query.mode, limit);
    tracing::debug!(
        viewer = %viewer_id,
        dating = query.dating_only(),
        pool = pool.len(),
        excluded = exclusions.len(),
        returned = ranked.len(),
        "discovery ranked"
    );
    Ok(ranked)
}
