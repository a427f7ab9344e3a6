//! Persistence seam for profiles, likes, matches, blocks and requests.
//!
//! The matching protocol only ever talks to a [`MatchStore`]. The uniqueness
//! constraints it relies on (one like per ordered pair, one match per
//! canonical pair, one chat per match) are enforced by the implementation,
//! and a lost insert race surfaces as [`StoreError::Conflict`].

use async_trait::async_trait;
use diesel::r2d2::PoolError;
use uuid::Uuid;

use campus_shared::{AppError, ErrorCode};

use crate::matching::discovery::PoolQuery;
use crate::matching::pair::{CanonicalPair, Chat, LikeEvent, Match, NewLike, NewMatch};
use crate::matching::profile::Profile;
use crate::matching::report::{NewReport, Report};
use crate::matching::requests::{MatchRequest, NewMatchRequest, RequestMember};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unique constraint violated")]
    Conflict,

    #[error("record not found")]
    NotFound,

    #[error("request has no free places")]
    CapacityReached,

    #[error("database error: {0}")]
    Database(diesel::result::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] PoolError),

    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error("blocking task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<diesel::result::Error> for StoreError {
    fn from(err: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error};
        match err {
            Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => Self::Conflict,
            Error::NotFound => Self::NotFound,
            other => Self::Database(other),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => AppError::new(ErrorCode::Conflict, "resource already exists"),
            StoreError::NotFound => AppError::not_found("resource not found"),
            StoreError::CapacityReached => AppError::new(ErrorCode::RequestClosed, "request is full"),
            StoreError::Database(e) => AppError::Database(e),
            StoreError::Pool(e) => AppError::internal(e.to_string()),
            StoreError::Corrupt(msg) => AppError::internal(msg),
            StoreError::Task(e) => AppError::internal(e.to_string()),
        }
    }
}

#[async_trait]
pub trait MatchStore: Send + Sync {
    /// Cheap round-trip used by the health check.
    async fn ping(&self) -> StoreResult<()>;

    // -- Profiles --

    async fn get_profile(&self, id: Uuid) -> StoreResult<Option<Profile>>;

    /// `Conflict` if a profile with this id exists.
    async fn insert_profile(&self, profile: &Profile) -> StoreResult<Profile>;

    /// Overwrites the stored profile. `None` if there is none.
    async fn update_profile(&self, profile: &Profile) -> StoreResult<Option<Profile>>;

    /// Profiles satisfying [`PoolQuery::admits`], newest first, capped at
    /// `query.limit` only after every predicate is applied.
    async fn candidate_pool(&self, query: &PoolQuery) -> StoreResult<Vec<Profile>>;

    // -- Exclusion inputs --

    /// Users `id` has blocked or been blocked by.
    async fn list_blocked_ids(&self, id: Uuid) -> StoreResult<Vec<Uuid>>;

    async fn list_matched_ids(&self, id: Uuid) -> StoreResult<Vec<Uuid>>;

    async fn list_liked_to_ids(&self, id: Uuid) -> StoreResult<Vec<Uuid>>;

    // -- Likes --

    async fn find_like(&self, from: Uuid, to: Uuid) -> StoreResult<Option<LikeEvent>>;

    /// Records the like unless one already exists for the ordered pair.
    /// Returns whether a row was written.
    async fn insert_like(&self, like: &NewLike) -> StoreResult<bool>;

    // -- Matches --

    async fn find_match(&self, pair: CanonicalPair) -> StoreResult<Option<Match>>;

    async fn get_match(&self, id: Uuid) -> StoreResult<Option<Match>>;

    /// Writes the match and its chat together. `Conflict` if the pair is
    /// already matched.
    async fn insert_match(&self, new: &NewMatch) -> StoreResult<(Match, Chat)>;

    /// Matches involving `user`, newest first, with their chat if any.
    async fn list_matches(&self, user: Uuid) -> StoreResult<Vec<(Match, Option<Chat>)>>;

    /// Deletes the match and its chat and marks the pair closed. Returns the
    /// removed match, or `None` if it did not exist.
    async fn remove_match(&self, id: Uuid) -> StoreResult<Option<Match>>;

    /// Whether the pair was unmatched before and may not match again.
    async fn is_pair_closed(&self, pair: CanonicalPair) -> StoreResult<bool>;

    // -- Blocks --

    async fn insert_block(&self, blocker: Uuid, blocked: Uuid) -> StoreResult<bool>;

    async fn delete_block(&self, blocker: Uuid, blocked: Uuid) -> StoreResult<bool>;

    /// Profiles `blocker` has blocked, most recent block first.
    async fn list_blocked_profiles(&self, blocker: Uuid) -> StoreResult<Vec<Profile>>;

    // -- Reports --

    async fn insert_report(&self, new: &NewReport) -> StoreResult<Report>;

    // -- Requests --

    async fn insert_request(&self, new: &NewMatchRequest) -> StoreResult<MatchRequest>;

    async fn get_request(&self, id: Uuid) -> StoreResult<Option<MatchRequest>>;

    /// Writes every editable column of `request`. `None` if it is gone.
    async fn update_request(&self, request: &MatchRequest) -> StoreResult<Option<MatchRequest>>;

    /// Deletes the request and its memberships.
    async fn delete_request(&self, id: Uuid) -> StoreResult<bool>;

    /// Open requests, newest first, optionally of one category.
    async fn list_open_requests(&self, category: Option<&str>) -> StoreResult<Vec<MatchRequest>>;

    /// Every request `owner` posted, newest first, whatever its status.
    async fn list_requests_by_owner(&self, owner: Uuid) -> StoreResult<Vec<MatchRequest>>;

    /// Adds `user` to the request. The flag is false if they already were a
    /// member, in which case the existing membership is returned.
    ///
    /// The capacity check and the insert are atomic: `CapacityReached` when
    /// `max_participants` members already joined, `NotFound` when the
    /// request does not exist.
    async fn insert_request_member(
        &self,
        request_id: Uuid,
        user: Uuid,
    ) -> StoreResult<(RequestMember, bool)>;

    async fn delete_request_member(&self, request_id: Uuid, user: Uuid) -> StoreResult<bool>;

    async fn list_request_member_ids(&self, request_id: Uuid) -> StoreResult<Vec<Uuid>>;

    /// Member profiles in join order.
    async fn list_request_members(&self, request_id: Uuid) -> StoreResult<Vec<Profile>>;
}
