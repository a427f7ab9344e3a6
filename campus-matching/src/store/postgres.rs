use async_trait::async_trait;
use diesel::dsl::exists;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use campus_shared::clients::db::DbPool;

use super::{MatchStore, StoreError, StoreResult};
use crate::matching::discovery::{DiscoveryMode, PoolQuery};
use crate::matching::pair::{CanonicalPair, Chat, LikeEvent, Match, NewLike, NewMatch};
use crate::matching::profile::{DatingPreference, Profile};
use crate::matching::report::{NewReport, Report};
use crate::matching::requests::{MatchRequest, NewMatchRequest, RequestMember, RequestStatus};
use crate::models::{
    ChatRow, LikeRow, MatchRow, NewBlockRow, NewChatRow, NewLikeRow, NewMatchRow, NewProfileRow,
    NewReportRow, NewRequestMemberRow, NewRequestRow, NewTombstoneRow, ProfileChangeset, ProfileRow,
    ReportRow, RequestChangeset, RequestMemberRow, RequestRow,
};
use crate::schema::{
    blocks, chats, likes, match_tombstones, matches, profiles, reports, request_members, requests,
};

/// Diesel-backed store. Queries run on the blocking pool so the r2d2
/// checkout and the synchronous driver never stall the runtime.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn run<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> StoreResult<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            f(&mut conn)
        })
        .await?
    }
}

fn row_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

fn load_profiles(rows: Vec<ProfileRow>) -> StoreResult<Vec<Profile>> {
    rows.into_iter().map(Profile::try_from).collect()
}

/// Translates a [`PoolQuery`] into SQL predicates. Mirrors
/// `PoolQuery::admits` so the `LIMIT` only ever cuts eligible rows.
fn pool_statement(query: &PoolQuery) -> profiles::BoxedQuery<'static, diesel::pg::Pg> {
    let viewer = &query.viewer;
    let mut statement = profiles::table
        .filter(profiles::id.ne(viewer.id))
        .filter(profiles::onboarding_completed.eq(true))
        .into_boxed();
    if !query.exclude.is_empty() {
        statement = statement.filter(profiles::id.ne_all(query.exclude.clone()));
    }
    if query.dating_only() {
        statement = statement.filter(profiles::dating_mode.eq(true));
    }

    match &query.mode {
        DiscoveryMode::General(filters) => {
            if let Some(branch) = &filters.branch {
                statement = statement.filter(profiles::branch.eq(branch.clone()));
            }
            if let Some(year) = filters.year {
                statement = statement.filter(profiles::year.eq(year));
            }
            if !filters.interests.is_empty() {
                statement = statement.filter(profiles::interests.overlaps_with(filters.interests.clone()));
            }
            if !filters.hobbies.is_empty() {
                statement = statement.filter(profiles::hobbies.overlaps_with(filters.hobbies.clone()));
            }
            if !filters.goals.is_empty() {
                statement = statement.filter(profiles::goals.overlaps_with(filters.goals.clone()));
            }
            if let Some((min, max)) = filters.social_range {
                statement = statement.filter(profiles::personality_social_level.between(min, max));
            }
            if let Some((min, max)) = filters.activity_range {
                statement = statement.filter(profiles::personality_activity_level.between(min, max));
            }
        }
        DiscoveryMode::DatingOnly => {
            // the viewer must accept the candidate's gender
            if let DatingPreference::Only(gender) = viewer.preference() {
                statement = statement.filter(profiles::gender.eq(gender));
            }
            // and the candidate must accept the viewer's; unset means everyone
            let mut accepted = vec![String::from(DatingPreference::Everyone)];
            if let Some(gender) = viewer.gender() {
                accepted.push(gender.to_string());
            }
            statement = statement.filter(
                profiles::dating_preference
                    .is_null()
                    .or(profiles::dating_preference.assume_not_null().eq_any(accepted)),
            );
        }
    }
    statement
}

#[async_trait]
impl MatchStore for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        self.run(|conn| {
            diesel::sql_query("SELECT 1").execute(conn)?;
            Ok(())
        })
        .await
    }

    async fn get_profile(&self, id: Uuid) -> StoreResult<Option<Profile>> {
        self.run(move |conn| {
            profiles::table
                .find(id)
                .select(ProfileRow::as_select())
                .first::<ProfileRow>(conn)
                .optional()?
                .map(Profile::try_from)
                .transpose()
        })
        .await
    }

    async fn insert_profile(&self, profile: &Profile) -> StoreResult<Profile> {
        let profile = profile.clone();
        self.run(move |conn| {
            diesel::insert_into(profiles::table)
                .values(&NewProfileRow {
                    id: profile.id,
                    fields: ProfileChangeset::from(&profile),
                })
                .returning(ProfileRow::as_returning())
                .get_result::<ProfileRow>(conn)?
                .try_into()
        })
        .await
    }

    async fn update_profile(&self, profile: &Profile) -> StoreResult<Option<Profile>> {
        let profile = profile.clone();
        self.run(move |conn| {
            diesel::update(profiles::table.find(profile.id))
                .set((
                    &ProfileChangeset::from(&profile),
                    profiles::updated_at.eq(diesel::dsl::now),
                ))
                .returning(ProfileRow::as_returning())
                .get_result::<ProfileRow>(conn)
                .optional()?
                .map(Profile::try_from)
                .transpose()
        })
        .await
    }

    async fn candidate_pool(&self, query: &PoolQuery) -> StoreResult<Vec<Profile>> {
        let statement = pool_statement(query);
        let limit = row_limit(query.limit);
        self.run(move |conn| {
            let rows = statement
                .select(ProfileRow::as_select())
                .order(profiles::created_at.desc())
                .limit(limit)
                .load::<ProfileRow>(conn)?;
            load_profiles(rows)
        })
        .await
    }

    async fn list_blocked_ids(&self, id: Uuid) -> StoreResult<Vec<Uuid>> {
        self.run(move |conn| {
            let mut ids: Vec<Uuid> = blocks::table
                .filter(blocks::blocker_id.eq(id))
                .select(blocks::blocked_id)
                .load(conn)?;
            let blocked_by: Vec<Uuid> = blocks::table
                .filter(blocks::blocked_id.eq(id))
                .select(blocks::blocker_id)
                .load(conn)?;
            ids.extend(blocked_by);
            Ok(ids)
        })
        .await
    }

    async fn list_matched_ids(&self, id: Uuid) -> StoreResult<Vec<Uuid>> {
        self.run(move |conn| {
            let pairs: Vec<(Uuid, Uuid)> = matches::table
                .filter(matches::user_a.eq(id).or(matches::user_b.eq(id)))
                .select((matches::user_a, matches::user_b))
                .load(conn)?;
            Ok(pairs
                .into_iter()
                .map(|(a, b)| if a == id { b } else { a })
                .collect())
        })
        .await
    }

    async fn list_liked_to_ids(&self, id: Uuid) -> StoreResult<Vec<Uuid>> {
        self.run(move |conn| {
            Ok(likes::table
                .filter(likes::from_user.eq(id))
                .select(likes::to_user)
                .load(conn)?)
        })
        .await
    }

    async fn find_like(&self, from: Uuid, to: Uuid) -> StoreResult<Option<LikeEvent>> {
        self.run(move |conn| {
            likes::table
                .filter(likes::from_user.eq(from))
                .filter(likes::to_user.eq(to))
                .select(LikeRow::as_select())
                .first::<LikeRow>(conn)
                .optional()?
                .map(LikeEvent::try_from)
                .transpose()
        })
        .await
    }

    async fn insert_like(&self, like: &NewLike) -> StoreResult<bool> {
        let like = like.clone();
        self.run(move |conn| {
            let inserted = diesel::insert_into(likes::table)
                .values(&NewLikeRow {
                    from_user: like.from_user,
                    to_user: like.to_user,
                    kind: like.kind.as_str(),
                })
                .on_conflict((likes::from_user, likes::to_user))
                .do_nothing()
                .execute(conn)?;
            Ok(inserted > 0)
        })
        .await
    }

    async fn find_match(&self, pair: CanonicalPair) -> StoreResult<Option<Match>> {
        self.run(move |conn| {
            Ok(matches::table
                .filter(matches::user_a.eq(pair.low()))
                .filter(matches::user_b.eq(pair.high()))
                .select(MatchRow::as_select())
                .first::<MatchRow>(conn)
                .optional()?
                .map(Match::from))
        })
        .await
    }

    async fn get_match(&self, id: Uuid) -> StoreResult<Option<Match>> {
        self.run(move |conn| {
            Ok(matches::table
                .find(id)
                .select(MatchRow::as_select())
                .first::<MatchRow>(conn)
                .optional()?
                .map(Match::from))
        })
        .await
    }

    async fn insert_match(&self, new: &NewMatch) -> StoreResult<(Match, Chat)> {
        let new = new.clone();
        self.run(move |conn| {
            conn.transaction::<_, StoreError, _>(|conn| {
                let m = diesel::insert_into(matches::table)
                    .values(&NewMatchRow {
                        user_a: new.pair.low(),
                        user_b: new.pair.high(),
                        compatibility_score: new.compatibility_score,
                        is_dating_match: new.is_dating_match,
                    })
                    .returning(MatchRow::as_returning())
                    .get_result::<MatchRow>(conn)?;

                let chat = diesel::insert_into(chats::table)
                    .values(&NewChatRow { match_id: m.id })
                    .returning(ChatRow::as_returning())
                    .get_result::<ChatRow>(conn)?;

                Ok((m.into(), chat.into()))
            })
        })
        .await
    }

    async fn list_matches(&self, user: Uuid) -> StoreResult<Vec<(Match, Option<Chat>)>> {
        self.run(move |conn| {
            let rows = matches::table
                .left_join(chats::table)
                .filter(matches::user_a.eq(user).or(matches::user_b.eq(user)))
                .order(matches::created_at.desc())
                .select((MatchRow::as_select(), Option::<ChatRow>::as_select()))
                .load::<(MatchRow, Option<ChatRow>)>(conn)?;
            Ok(rows
                .into_iter()
                .map(|(m, chat)| (m.into(), chat.map(Chat::from)))
                .collect())
        })
        .await
    }

    async fn remove_match(&self, id: Uuid) -> StoreResult<Option<Match>> {
        self.run(move |conn| {
            conn.transaction::<_, StoreError, _>(|conn| {
                let Some(row) = matches::table
                    .find(id)
                    .select(MatchRow::as_select())
                    .for_update()
                    .first::<MatchRow>(conn)
                    .optional()?
                else {
                    return Ok(None);
                };

                diesel::delete(chats::table.filter(chats::match_id.eq(id))).execute(conn)?;
                diesel::delete(matches::table.find(id)).execute(conn)?;
                diesel::insert_into(match_tombstones::table)
                    .values(&NewTombstoneRow {
                        user_a: row.user_a,
                        user_b: row.user_b,
                    })
                    .on_conflict_do_nothing()
                    .execute(conn)?;

                Ok(Some(row.into()))
            })
        })
        .await
    }

    async fn is_pair_closed(&self, pair: CanonicalPair) -> StoreResult<bool> {
        self.run(move |conn| {
            Ok(diesel::select(exists(
                match_tombstones::table.find((pair.low(), pair.high())),
            ))
            .get_result::<bool>(conn)?)
        })
        .await
    }

    async fn insert_block(&self, blocker: Uuid, blocked: Uuid) -> StoreResult<bool> {
        self.run(move |conn| {
            let inserted = diesel::insert_into(blocks::table)
                .values(&NewBlockRow {
                    blocker_id: blocker,
                    blocked_id: blocked,
                })
                .on_conflict((blocks::blocker_id, blocks::blocked_id))
                .do_nothing()
                .execute(conn)?;
            Ok(inserted > 0)
        })
        .await
    }

    async fn delete_block(&self, blocker: Uuid, blocked: Uuid) -> StoreResult<bool> {
        self.run(move |conn| {
            let deleted = diesel::delete(
                blocks::table
                    .filter(blocks::blocker_id.eq(blocker))
                    .filter(blocks::blocked_id.eq(blocked)),
            )
            .execute(conn)?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn list_blocked_profiles(&self, blocker: Uuid) -> StoreResult<Vec<Profile>> {
        self.run(move |conn| {
            let rows = blocks::table
                .inner_join(profiles::table.on(profiles::id.eq(blocks::blocked_id)))
                .filter(blocks::blocker_id.eq(blocker))
                .order(blocks::created_at.desc())
                .select(ProfileRow::as_select())
                .load::<ProfileRow>(conn)?;
            load_profiles(rows)
        })
        .await
    }

    async fn insert_report(&self, new: &NewReport) -> StoreResult<Report> {
        let new = new.clone();
        self.run(move |conn| {
            Ok(diesel::insert_into(reports::table)
                .values(&NewReportRow {
                    reporter_id: new.reporter_id,
                    reported_id: new.reported_id,
                    reason: &new.reason,
                })
                .returning(ReportRow::as_returning())
                .get_result::<ReportRow>(conn)?
                .into())
        })
        .await
    }

    async fn insert_request(&self, new: &NewMatchRequest) -> StoreResult<MatchRequest> {
        let new = new.clone();
        self.run(move |conn| {
            diesel::insert_into(requests::table)
                .values(&NewRequestRow {
                    user_id: new.owner_id,
                    title: &new.title,
                    description: new.description.as_deref(),
                    category: &new.category,
                    related_interests: &new.related_interests,
                    status: RequestStatus::Open.as_str(),
                    max_participants: new.max_participants,
                })
                .returning(RequestRow::as_returning())
                .get_result::<RequestRow>(conn)?
                .try_into()
        })
        .await
    }

    async fn get_request(&self, id: Uuid) -> StoreResult<Option<MatchRequest>> {
        self.run(move |conn| {
            requests::table
                .find(id)
                .select(RequestRow::as_select())
                .first::<RequestRow>(conn)
                .optional()?
                .map(MatchRequest::try_from)
                .transpose()
        })
        .await
    }

    async fn update_request(&self, request: &MatchRequest) -> StoreResult<Option<MatchRequest>> {
        let request = request.clone();
        self.run(move |conn| {
            diesel::update(requests::table.find(request.id))
                .set(&RequestChangeset::from(&request))
                .returning(RequestRow::as_returning())
                .get_result::<RequestRow>(conn)
                .optional()?
                .map(MatchRequest::try_from)
                .transpose()
        })
        .await
    }

    async fn delete_request(&self, id: Uuid) -> StoreResult<bool> {
        self.run(move |conn| {
            // memberships go with it through ON DELETE CASCADE
            let deleted = diesel::delete(requests::table.find(id)).execute(conn)?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn list_open_requests(&self, category: Option<&str>) -> StoreResult<Vec<MatchRequest>> {
        let category = category.map(str::to_owned);
        self.run(move |conn| {
            let mut query = requests::table
                .filter(requests::status.eq(RequestStatus::Open.as_str()))
                .select(RequestRow::as_select())
                .into_boxed();
            if let Some(category) = category {
                query = query.filter(requests::category.eq(category));
            }
            query
                .order(requests::created_at.desc())
                .load::<RequestRow>(conn)?
                .into_iter()
                .map(MatchRequest::try_from)
                .collect()
        })
        .await
    }

    async fn list_requests_by_owner(&self, owner: Uuid) -> StoreResult<Vec<MatchRequest>> {
        self.run(move |conn| {
            requests::table
                .filter(requests::user_id.eq(owner))
                .order(requests::created_at.desc())
                .select(RequestRow::as_select())
                .load::<RequestRow>(conn)?
                .into_iter()
                .map(MatchRequest::try_from)
                .collect()
        })
        .await
    }

    async fn insert_request_member(
        &self,
        request_id: Uuid,
        user: Uuid,
    ) -> StoreResult<(RequestMember, bool)> {
        self.run(move |conn| {
            conn.transaction::<_, StoreError, _>(|conn| {
                // the row lock serializes joins to one request, so the
                // count below cannot go stale before the insert
                let max_participants = requests::table
                    .find(request_id)
                    .select(requests::max_participants)
                    .for_update()
                    .first::<Option<i32>>(conn)?;

                let existing = request_members::table
                    .filter(request_members::request_id.eq(request_id))
                    .filter(request_members::user_id.eq(user))
                    .select(RequestMemberRow::as_select())
                    .first::<RequestMemberRow>(conn)
                    .optional()?;
                if let Some(row) = existing {
                    return Ok((row.into(), false));
                }

                if let Some(max) = max_participants {
                    let joined = request_members::table
                        .filter(request_members::request_id.eq(request_id))
                        .count()
                        .get_result::<i64>(conn)?;
                    if joined >= i64::from(max) {
                        return Err(StoreError::CapacityReached);
                    }
                }

                let row = diesel::insert_into(request_members::table)
                    .values(&NewRequestMemberRow {
                        request_id,
                        user_id: user,
                    })
                    .returning(RequestMemberRow::as_returning())
                    .get_result::<RequestMemberRow>(conn)?;
                Ok((row.into(), true))
            })
        })
        .await
    }

    async fn delete_request_member(&self, request_id: Uuid, user: Uuid) -> StoreResult<bool> {
        self.run(move |conn| {
            let deleted = diesel::delete(
                request_members::table
                    .filter(request_members::request_id.eq(request_id))
                    .filter(request_members::user_id.eq(user)),
            )
            .execute(conn)?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn list_request_member_ids(&self, request_id: Uuid) -> StoreResult<Vec<Uuid>> {
        self.run(move |conn| {
            Ok(request_members::table
                .filter(request_members::request_id.eq(request_id))
                .order(request_members::created_at.asc())
                .select(request_members::user_id)
                .load(conn)?)
        })
        .await
    }

    async fn list_request_members(&self, request_id: Uuid) -> StoreResult<Vec<Profile>> {
        self.run(move |conn| {
            let rows = request_members::table
                .inner_join(profiles::table.on(profiles::id.eq(request_members::user_id)))
                .filter(request_members::request_id.eq(request_id))
                .order(request_members::created_at.asc())
                .select(ProfileRow::as_select())
                .load::<ProfileRow>(conn)?;
            load_profiles(rows)
        })
        .await
    }
}
