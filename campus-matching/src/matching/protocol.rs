//! Reciprocal-like matching and request joins.
//!
//! State lives entirely in the [`MatchStore`]. The one race that matters is
//! both sides of a pair completing the match at once; the store's unique
//! constraint on the canonical pair decides the winner and the loser reports
//! the stored match as already existing.

use metrics::{counter, describe_counter};
use serde::Serialize;
use uuid::Uuid;

use campus_shared::{AppError, AppResult, ErrorCode};

use super::compatibility::{calculate_compatibility, is_dating_compatible};
use super::pair::{CanonicalPair, Chat, LikeKind, Match, NewLike, NewMatch};
use super::requests::RequestMember;
use crate::store::{MatchStore, StoreError};

pub fn describe_metrics() {
    describe_counter!("likes_registered_total", "Likes newly recorded");
    describe_counter!("matches_created_total", "Matches created, labelled by dating");
    describe_counter!("match_conflicts_total", "Match inserts that lost the pair race");
}

#[derive(Debug, Clone, Serialize)]
pub struct LikeOutcome {
    pub matched: bool,
    pub match_id: Option<Uuid>,
    pub chat_id: Option<Uuid>,
    pub existing_match: bool,
    pub like_created: bool,
    #[serde(skip)]
    pub created: Option<Match>,
}

impl LikeOutcome {
    fn one_sided(like_created: bool) -> Self {
        Self {
            matched: false,
            match_id: None,
            chat_id: None,
            existing_match: false,
            like_created,
            created: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JoinOutcome {
    pub member: RequestMember,
    pub owner_id: Uuid,
    /// False when the user was already a member.
    pub joined: bool,
    pub match_created: bool,
    pub existing_match: bool,
    pub match_id: Option<Uuid>,
    pub chat_id: Option<Uuid>,
    #[serde(skip)]
    pub created: Option<Match>,
}

enum Materialized {
    Created(Match, Chat),
    Existing(Match),
}

/// Inserts match + chat for the pair. A unique violation means another
/// writer got there first, so the stored row is returned instead.
async fn materialize_match(store: &dyn MatchStore, new: NewMatch) -> AppResult<Materialized> {
    match store.insert_match(&new).await {
        Ok((m, chat)) => {
            counter!("matches_created_total", "dating" => m.is_dating_match.to_string())
                .increment(1);
            tracing::info!(
                match_id = %m.id,
                chat_id = %chat.id,
                pair = %new.pair,
                score = m.compatibility_score,
                dating = m.is_dating_match,
                "match created"
            );
            Ok(Materialized::Created(m, chat))
        }
        Err(StoreError::Conflict) => {
            counter!("match_conflicts_total").increment(1);
            tracing::debug!(pair = %new.pair, "match insert lost race, reusing stored row");
            store
                .find_match(new.pair)
                .await?
                .map(Materialized::Existing)
                .ok_or_else(|| AppError::internal("match conflict without stored row"))
        }
        Err(e) => Err(e.into()),
    }
}

/// Records `from`'s like of `to` and materializes a match if `to` already
/// liked `from`.
///
/// Re-liking is a no-op that keeps the original kind. Once the pair is
/// matched, further likes report the existing match. A pair that was
/// unmatched never matches again.
pub async fn register_like(
    store: &dyn MatchStore,
    from: Uuid,
    to: Uuid,
    kind: LikeKind,
) -> AppResult<LikeOutcome> {
    if from == to {
        return Err(AppError::new(ErrorCode::CannotLikeSelf, "cannot like yourself"));
    }

    let liker = store
        .get_profile(from)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ProfileNotFound, "profile not found"))?;
    let target = store
        .get_profile(to)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ProfileNotFound, "liked profile not found"))?;

    // written before the reciprocal lookup so two simultaneous likes
    // cannot both miss each other
    let like_created = store
        .insert_like(&NewLike {
            from_user: from,
            to_user: to,
            kind,
        })
        .await?;
    if like_created {
        counter!("likes_registered_total").increment(1);
        tracing::info!(from = %from, to = %to, kind = kind.as_str(), "like recorded");
    }

    let pair = CanonicalPair::new(from, to);
    if let Some(existing) = store.find_match(pair).await? {
        return Ok(LikeOutcome {
            matched: false,
            match_id: Some(existing.id),
            chat_id: None,
            existing_match: true,
            like_created,
            created: None,
        });
    }

    let Some(reciprocal) = store.find_like(to, from).await? else {
        return Ok(LikeOutcome::one_sided(like_created));
    };

    if store.is_pair_closed(pair).await? {
        tracing::debug!(pair = %pair, "pair was unmatched, not re-matching");
        return Ok(LikeOutcome::one_sided(like_created));
    }

    let is_dating_match = is_dating_compatible(&liker, &target)
        && (kind.is_dating() || reciprocal.kind.is_dating());

    let new = NewMatch {
        pair,
        compatibility_score: calculate_compatibility(&liker, &target),
        is_dating_match,
    };

    Ok(match materialize_match(store, new).await? {
        Materialized::Created(m, chat) => LikeOutcome {
            matched: true,
            match_id: Some(m.id),
            chat_id: Some(chat.id),
            existing_match: false,
            like_created,
            created: Some(m),
        },
        Materialized::Existing(m) => LikeOutcome {
            matched: false,
            match_id: Some(m.id),
            chat_id: None,
            existing_match: true,
            like_created,
            created: None,
        },
    })
}

/// Adds `user` to an open request and matches them with its owner.
///
/// Request matches are never dating matches. Joining twice, or joining when
/// the pair is already matched, reuses what exists. Both profiles must exist
/// before any membership is written.
pub async fn join_request(
    store: &dyn MatchStore,
    request_id: Uuid,
    user: Uuid,
) -> AppResult<JoinOutcome> {
    let request = store
        .get_request(request_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::RequestNotFound, "request not found"))?;

    if !request.is_open() {
        return Err(AppError::new(ErrorCode::RequestClosed, "request is closed"));
    }

    let joiner = store
        .get_profile(user)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ProfileNotFound, "profile not found"))?;
    let owner = if request.owner_id == user {
        None
    } else {
        let owner = store.get_profile(request.owner_id).await?.ok_or_else(|| {
            AppError::new(ErrorCode::ProfileNotFound, "request owner profile not found")
        })?;
        Some(owner)
    };

    let (member, joined) = match store.insert_request_member(request_id, user).await {
        Ok(inserted) => inserted,
        Err(StoreError::NotFound) => {
            return Err(AppError::new(ErrorCode::RequestNotFound, "request not found"))
        }
        Err(e) => return Err(e.into()),
    };
    if joined {
        tracing::info!(request_id = %request_id, user = %user, "joined request");
    }

    let mut outcome = JoinOutcome {
        member,
        owner_id: request.owner_id,
        joined,
        match_created: false,
        existing_match: false,
        match_id: None,
        chat_id: None,
        created: None,
    };

    let Some(owner) = owner else {
        return Ok(outcome);
    };

    let pair = CanonicalPair::new(user, request.owner_id);
    if let Some(existing) = store.find_match(pair).await? {
        outcome.existing_match = true;
        outcome.match_id = Some(existing.id);
        return Ok(outcome);
    }

    if store.is_pair_closed(pair).await? {
        return Ok(outcome);
    }

    let new = NewMatch {
        pair,
        compatibility_score: calculate_compatibility(&joiner, &owner),
        is_dating_match: false,
    };

    match materialize_match(store, new).await? {
        Materialized::Created(m, chat) => {
            outcome.match_created = true;
            outcome.match_id = Some(m.id);
            outcome.chat_id = Some(chat.id);
            outcome.created = Some(m);
        }
        Materialized::Existing(m) => {
            outcome.existing_match = true;
            outcome.match_id = Some(m.id);
        }
    }
    Ok(outcome)
}

pub async fn leave_request(store: &dyn MatchStore, request_id: Uuid, user: Uuid) -> AppResult<()> {
    if store.get_request(request_id).await?.is_none() {
        return Err(AppError::new(ErrorCode::RequestNotFound, "request not found"));
    }
    if !store.delete_request_member(request_id, user).await? {
        return Err(AppError::new(
            ErrorCode::NotRequestMember,
            "not a member of this request",
        ));
    }
    tracing::info!(request_id = %request_id, user = %user, "left request");
    Ok(())
}

/// Removes a match on behalf of one of its participants. The pair is closed
/// for good.
pub async fn unmatch(store: &dyn MatchStore, match_id: Uuid, by: Uuid) -> AppResult<Match> {
    let m = store
        .get_match(match_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::MatchNotFound, "match not found"))?;

    if !m.pair().contains(by) {
        return Err(AppError::new(
            ErrorCode::NotMatchParticipant,
            "not a participant of this match",
        ));
    }

    let removed = store
        .remove_match(match_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::MatchNotFound, "match not found"))?;

    tracing::info!(match_id = %match_id, by = %by, "match removed");
    Ok(removed)
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchSummary {
    pub match_id: Uuid,
    pub partner_id: Uuid,
    pub chat_id: Option<Uuid>,
    pub compatibility_score: i32,
    pub is_dating_match: bool,
    pub last_message_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// `user`'s matches, newest first.
pub async fn list_matches(store: &dyn MatchStore, user: Uuid) -> AppResult<Vec<MatchSummary>> {
    let rows = store.list_matches(user).await?;
    Ok(rows
        .into_iter()
        .filter_map(|(m, chat)| {
            let partner_id = m.pair().partner_of(user)?;
            Some(MatchSummary {
                match_id: m.id,
                partner_id,
                chat_id: chat.as_ref().map(|c| c.id),
                compatibility_score: m.compatibility_score,
                is_dating_match: m.is_dating_match,
                last_message_at: chat.and_then(|c| c.last_message_at),
                created_at: m.created_at,
            })
        })
        .collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatchStats {
    pub total: usize,
    pub dating: usize,
    pub friend: usize,
}

pub async fn match_stats(store: &dyn MatchStore, user: Uuid) -> AppResult<MatchStats> {
    let rows = store.list_matches(user).await?;
    let total = rows.len();
    let dating = rows.iter().filter(|(m, _)| m.is_dating_match).count();
    Ok(MatchStats {
        total,
        dating,
        friend: total - dating,
    })
}

/// Blocks `target` for `blocker`. Idempotent.
pub async fn block(store: &dyn MatchStore, blocker: Uuid, target: Uuid) -> AppResult<()> {
    if blocker == target {
        return Err(AppError::new(ErrorCode::CannotBlockSelf, "cannot block yourself"));
    }
    if store.insert_block(blocker, target).await? {
        tracing::info!(blocker = %blocker, blocked = %target, "user blocked");
    }
    Ok(())
}

pub async fn unblock(store: &dyn MatchStore, blocker: Uuid, target: Uuid) -> AppResult<()> {
    if !store.delete_block(blocker, target).await? {
        return Err(AppError::new(ErrorCode::BlockNotFound, "block not found"));
    }
    tracing::info!(blocker = %blocker, blocked = %target, "user unblocked");
    Ok(())
}
