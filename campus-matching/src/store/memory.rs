use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{MatchStore, StoreError, StoreResult};
use crate::matching::discovery::PoolQuery;
use crate::matching::pair::{CanonicalPair, Chat, LikeEvent, Match, NewLike, NewMatch};
use crate::matching::profile::Profile;
use crate::matching::report::{NewReport, Report};
use crate::matching::requests::{MatchRequest, NewMatchRequest, RequestMember, RequestStatus};

#[derive(Default)]
struct Tables {
    profiles: HashMap<Uuid, Profile>,
    // keyed by ordered (from, to)
    likes: HashMap<(Uuid, Uuid), LikeEvent>,
    matches: HashMap<CanonicalPair, Match>,
    chats: HashMap<Uuid, Chat>,
    closed_pairs: HashSet<CanonicalPair>,
    // (blocker, blocked) in block order
    blocks: Vec<(Uuid, Uuid)>,
    reports: Vec<Report>,
    requests: Vec<MatchRequest>,
    members: Vec<RequestMember>,
}

/// Process-local store with the same uniqueness guarantees as the
/// Postgres schema. Every operation holds the table lock for its duration.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn upsert_profile(&self, profile: Profile) {
        self.tables.lock().await.profiles.insert(profile.id, profile);
    }

    pub async fn like_count(&self) -> usize {
        self.tables.lock().await.likes.len()
    }

    pub async fn match_count(&self) -> usize {
        self.tables.lock().await.matches.len()
    }

    pub async fn chat_count(&self) -> usize {
        self.tables.lock().await.chats.len()
    }

    pub async fn report_count(&self) -> usize {
        self.tables.lock().await.reports.len()
    }
}

#[async_trait]
impl MatchStore for InMemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn get_profile(&self, id: Uuid) -> StoreResult<Option<Profile>> {
        Ok(self.tables.lock().await.profiles.get(&id).cloned())
    }

    async fn insert_profile(&self, profile: &Profile) -> StoreResult<Profile> {
        let mut tables = self.tables.lock().await;
        if tables.profiles.contains_key(&profile.id) {
            return Err(StoreError::Conflict);
        }
        tables.profiles.insert(profile.id, profile.clone());
        Ok(profile.clone())
    }

    async fn update_profile(&self, profile: &Profile) -> StoreResult<Option<Profile>> {
        let mut tables = self.tables.lock().await;
        Ok(tables.profiles.get_mut(&profile.id).map(|stored| {
            *stored = profile.clone();
            stored.clone()
        }))
    }

    async fn candidate_pool(&self, query: &PoolQuery) -> StoreResult<Vec<Profile>> {
        let tables = self.tables.lock().await;
        let mut pool: Vec<Profile> = tables
            .profiles
            .values()
            .filter(|p| query.admits(p))
            .cloned()
            .collect();
        // HashMap order is arbitrary; keep results deterministic
        pool.sort_by_key(|p| p.id);
        pool.truncate(query.limit);
        Ok(pool)
    }

    async fn list_blocked_ids(&self, id: Uuid) -> StoreResult<Vec<Uuid>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .blocks
            .iter()
            .filter_map(|&(blocker, blocked)| {
                if blocker == id {
                    Some(blocked)
                } else if blocked == id {
                    Some(blocker)
                } else {
                    None
                }
            })
            .collect())
    }

    async fn list_matched_ids(&self, id: Uuid) -> StoreResult<Vec<Uuid>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .matches
            .keys()
            .filter_map(|pair| pair.partner_of(id))
            .collect())
    }

    async fn list_liked_to_ids(&self, id: Uuid) -> StoreResult<Vec<Uuid>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .likes
            .keys()
            .filter(|(from, _)| *from == id)
            .map(|(_, to)| *to)
            .collect())
    }

    async fn find_like(&self, from: Uuid, to: Uuid) -> StoreResult<Option<LikeEvent>> {
        Ok(self.tables.lock().await.likes.get(&(from, to)).cloned())
    }

    async fn insert_like(&self, like: &NewLike) -> StoreResult<bool> {
        let mut tables = self.tables.lock().await;
        let key = (like.from_user, like.to_user);
        if tables.likes.contains_key(&key) {
            return Ok(false);
        }
        tables.likes.insert(
            key,
            LikeEvent {
                id: Uuid::new_v4(),
                from_user: like.from_user,
                to_user: like.to_user,
                kind: like.kind,
                created_at: Utc::now(),
            },
        );
        Ok(true)
    }

    async fn find_match(&self, pair: CanonicalPair) -> StoreResult<Option<Match>> {
        Ok(self.tables.lock().await.matches.get(&pair).cloned())
    }

    async fn get_match(&self, id: Uuid) -> StoreResult<Option<Match>> {
        let tables = self.tables.lock().await;
        Ok(tables.matches.values().find(|m| m.id == id).cloned())
    }

    async fn insert_match(&self, new: &NewMatch) -> StoreResult<(Match, Chat)> {
        let mut tables = self.tables.lock().await;
        if tables.matches.contains_key(&new.pair) {
            return Err(StoreError::Conflict);
        }
        let now = Utc::now();
        let m = Match {
            id: Uuid::new_v4(),
            user_low: new.pair.low(),
            user_high: new.pair.high(),
            compatibility_score: new.compatibility_score,
            is_dating_match: new.is_dating_match,
            created_at: now,
        };
        let chat = Chat {
            id: Uuid::new_v4(),
            match_id: m.id,
            last_message_at: None,
            created_at: now,
        };
        tables.matches.insert(new.pair, m.clone());
        tables.chats.insert(m.id, chat.clone());
        Ok((m, chat))
    }

    async fn list_matches(&self, user: Uuid) -> StoreResult<Vec<(Match, Option<Chat>)>> {
        let tables = self.tables.lock().await;
        let mut rows: Vec<(Match, Option<Chat>)> = tables
            .matches
            .values()
            .filter(|m| m.pair().contains(user))
            .map(|m| (m.clone(), tables.chats.get(&m.id).cloned()))
            .collect();
        rows.sort_by(|a, b| b.0.created_at.cmp(&a.0.created_at));
        Ok(rows)
    }

    async fn remove_match(&self, id: Uuid) -> StoreResult<Option<Match>> {
        let mut tables = self.tables.lock().await;
        let Some(pair) = tables
            .matches
            .values()
            .find(|m| m.id == id)
            .map(Match::pair)
        else {
            return Ok(None);
        };
        tables.chats.remove(&id);
        tables.closed_pairs.insert(pair);
        Ok(tables.matches.remove(&pair))
    }

    async fn is_pair_closed(&self, pair: CanonicalPair) -> StoreResult<bool> {
        Ok(self.tables.lock().await.closed_pairs.contains(&pair))
    }

    async fn insert_block(&self, blocker: Uuid, blocked: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.lock().await;
        if tables.blocks.contains(&(blocker, blocked)) {
            return Ok(false);
        }
        tables.blocks.push((blocker, blocked));
        Ok(true)
    }

    async fn delete_block(&self, blocker: Uuid, blocked: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.lock().await;
        let before = tables.blocks.len();
        tables.blocks.retain(|&pair| pair != (blocker, blocked));
        Ok(tables.blocks.len() != before)
    }

    async fn list_blocked_profiles(&self, blocker: Uuid) -> StoreResult<Vec<Profile>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .blocks
            .iter()
            .rev()
            .filter(|(from, _)| *from == blocker)
            .filter_map(|(_, blocked)| tables.profiles.get(blocked).cloned())
            .collect())
    }

    async fn insert_report(&self, new: &NewReport) -> StoreResult<Report> {
        let report = Report {
            id: Uuid::new_v4(),
            reporter_id: new.reporter_id,
            reported_id: new.reported_id,
            reason: new.reason.clone(),
            created_at: Utc::now(),
        };
        self.tables.lock().await.reports.push(report.clone());
        Ok(report)
    }

    async fn insert_request(&self, new: &NewMatchRequest) -> StoreResult<MatchRequest> {
        let request = MatchRequest {
            id: Uuid::new_v4(),
            owner_id: new.owner_id,
            title: new.title.clone(),
            description: new.description.clone(),
            category: new.category.clone(),
            related_interests: new.related_interests.clone(),
            status: RequestStatus::Open,
            max_participants: new.max_participants,
            created_at: Utc::now(),
        };
        self.tables.lock().await.requests.push(request.clone());
        Ok(request)
    }

    async fn get_request(&self, id: Uuid) -> StoreResult<Option<MatchRequest>> {
        let tables = self.tables.lock().await;
        Ok(tables.requests.iter().find(|r| r.id == id).cloned())
    }

    async fn update_request(&self, request: &MatchRequest) -> StoreResult<Option<MatchRequest>> {
        let mut tables = self.tables.lock().await;
        Ok(tables
            .requests
            .iter_mut()
            .find(|r| r.id == request.id)
            .map(|stored| {
                *stored = MatchRequest {
                    owner_id: stored.owner_id,
                    created_at: stored.created_at,
                    ..request.clone()
                };
                stored.clone()
            }))
    }

    async fn delete_request(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.lock().await;
        let before = tables.requests.len();
        tables.requests.retain(|r| r.id != id);
        if tables.requests.len() == before {
            return Ok(false);
        }
        tables.members.retain(|m| m.request_id != id);
        Ok(true)
    }

    async fn list_open_requests(&self, category: Option<&str>) -> StoreResult<Vec<MatchRequest>> {
        let tables = self.tables.lock().await;
        // insertion order is creation order; newest first
        Ok(tables
            .requests
            .iter()
            .rev()
            .filter(|r| r.is_open())
            .filter(|r| category.map_or(true, |c| r.category == c))
            .cloned()
            .collect())
    }

    async fn list_requests_by_owner(&self, owner: Uuid) -> StoreResult<Vec<MatchRequest>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .requests
            .iter()
            .rev()
            .filter(|r| r.owner_id == owner)
            .cloned()
            .collect())
    }

    async fn insert_request_member(
        &self,
        request_id: Uuid,
        user: Uuid,
    ) -> StoreResult<(RequestMember, bool)> {
        let mut tables = self.tables.lock().await;
        let max = tables
            .requests
            .iter()
            .find(|r| r.id == request_id)
            .ok_or(StoreError::NotFound)?
            .max_participants;
        if let Some(existing) = tables
            .members
            .iter()
            .find(|m| m.request_id == request_id && m.user_id == user)
        {
            return Ok((existing.clone(), false));
        }
        if let Some(max) = max {
            let joined = tables.members.iter().filter(|m| m.request_id == request_id).count();
            if joined >= usize::try_from(max).unwrap_or(0) {
                return Err(StoreError::CapacityReached);
            }
        }
        let member = RequestMember {
            id: Uuid::new_v4(),
            request_id,
            user_id: user,
            joined_at: Utc::now(),
        };
        tables.members.push(member.clone());
        Ok((member, true))
    }

    async fn delete_request_member(&self, request_id: Uuid, user: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.lock().await;
        let before = tables.members.len();
        tables
            .members
            .retain(|m| !(m.request_id == request_id && m.user_id == user));
        Ok(tables.members.len() != before)
    }

    async fn list_request_member_ids(&self, request_id: Uuid) -> StoreResult<Vec<Uuid>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .members
            .iter()
            .filter(|m| m.request_id == request_id)
            .map(|m| m.user_id)
            .collect())
    }

    async fn list_request_members(&self, request_id: Uuid) -> StoreResult<Vec<Profile>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .members
            .iter()
            .filter(|m| m.request_id == request_id)
            .filter_map(|m| tables.profiles.get(&m.user_id).cloned())
            .collect())
    }
}
