use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::matching::pair::{Chat, LikeEvent, LikeKind, Match};
use crate::matching::profile::{DatingPreference, Profile};
use crate::matching::report::Report;
use crate::matching::requests::{MatchRequest, RequestMember};
use crate::schema::{
    blocks, chats, likes, match_tombstones, matches, profiles, reports, request_members, requests,
};
use crate::store::StoreError;

fn parse_column<T>(column: &str, value: &str) -> Result<T, StoreError>
where
    T: std::str::FromStr<Err = String>,
{
    value
        .parse()
        .map_err(|e| StoreError::Corrupt(format!("{column}: {e}")))
}

// --- Profile ---

#[derive(Debug, Queryable, Selectable, Identifiable, Clone)]
#[diesel(table_name = profiles)]
pub struct ProfileRow {
    pub id: Uuid,
    pub name: String,
    pub branch: Option<String>,
    pub year: Option<i32>,
    pub interests: Vec<String>,
    pub hobbies: Vec<String>,
    pub goals: Vec<String>,
    pub personality_social_level: i32,
    pub personality_activity_level: i32,
    pub personality_communication: String,
    pub personality_wake_cycle: String,
    pub dating_mode: bool,
    pub dating_preference: Option<String>,
    pub gender: Option<String>,
    pub onboarding_completed: bool,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = StoreError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        Ok(Profile {
            id: row.id,
            name: row.name,
            branch: row.branch,
            year: row.year,
            interests: row.interests,
            hobbies: row.hobbies,
            goals: row.goals,
            personality_social_level: row.personality_social_level,
            personality_activity_level: row.personality_activity_level,
            personality_communication: parse_column(
                "personality_communication",
                &row.personality_communication,
            )?,
            personality_wake_cycle: parse_column(
                "personality_wake_cycle",
                &row.personality_wake_cycle,
            )?,
            dating_enabled: row.dating_mode,
            dating_preference: row.dating_preference.map(DatingPreference::from),
            gender: row.gender,
            onboarding_completed: row.onboarding_completed,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = profiles)]
pub struct NewProfileRow<'a> {
    pub id: Uuid,
    #[diesel(embed)]
    pub fields: ProfileChangeset<'a>,
}

/// Every editable profile column. `None` writes NULL.
#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = profiles, treat_none_as_null = true)]
pub struct ProfileChangeset<'a> {
    pub name: &'a str,
    pub branch: Option<&'a str>,
    pub year: Option<i32>,
    pub interests: &'a [String],
    pub hobbies: &'a [String],
    pub goals: &'a [String],
    pub personality_social_level: i32,
    pub personality_activity_level: i32,
    pub personality_communication: &'a str,
    pub personality_wake_cycle: &'a str,
    pub dating_mode: bool,
    pub dating_preference: Option<String>,
    pub gender: Option<&'a str>,
    pub onboarding_completed: bool,
}

impl<'a> From<&'a Profile> for ProfileChangeset<'a> {
    fn from(p: &'a Profile) -> Self {
        ProfileChangeset {
            name: &p.name,
            branch: p.branch.as_deref(),
            year: p.year,
            interests: &p.interests,
            hobbies: &p.hobbies,
            goals: &p.goals,
            personality_social_level: p.personality_social_level,
            personality_activity_level: p.personality_activity_level,
            personality_communication: p.personality_communication.as_str(),
            personality_wake_cycle: p.personality_wake_cycle.as_str(),
            dating_mode: p.dating_enabled,
            dating_preference: p.dating_preference.clone().map(String::from),
            gender: p.gender.as_deref(),
            onboarding_completed: p.onboarding_completed,
        }
    }
}

// --- Like ---

#[derive(Debug, Queryable, Selectable, Identifiable, Clone)]
#[diesel(table_name = likes)]
pub struct LikeRow {
    pub id: Uuid,
    pub from_user: Uuid,
    pub to_user: Uuid,
    pub kind: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<LikeRow> for LikeEvent {
    type Error = StoreError;

    fn try_from(row: LikeRow) -> Result<Self, Self::Error> {
        Ok(LikeEvent {
            id: row.id,
            from_user: row.from_user,
            to_user: row.to_user,
            kind: parse_column::<LikeKind>("likes.type", &row.kind)?,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = likes)]
pub struct NewLikeRow<'a> {
    pub from_user: Uuid,
    pub to_user: Uuid,
    pub kind: &'a str,
}

// --- Match / Chat ---

#[derive(Debug, Queryable, Selectable, Identifiable, Clone)]
#[diesel(table_name = matches)]
pub struct MatchRow {
    pub id: Uuid,
    pub user_a: Uuid,
    pub user_b: Uuid,
    pub compatibility_score: i32,
    pub is_dating_match: bool,
    pub created_at: DateTime<Utc>,
}

impl From<MatchRow> for Match {
    fn from(row: MatchRow) -> Self {
        Match {
            id: row.id,
            user_low: row.user_a,
            user_high: row.user_b,
            compatibility_score: row.compatibility_score,
            is_dating_match: row.is_dating_match,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = matches)]
pub struct NewMatchRow {
    pub user_a: Uuid,
    pub user_b: Uuid,
    pub compatibility_score: i32,
    pub is_dating_match: bool,
}

#[derive(Debug, Queryable, Selectable, Identifiable, Clone)]
#[diesel(table_name = chats)]
pub struct ChatRow {
    pub id: Uuid,
    pub match_id: Uuid,
    pub last_message_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<ChatRow> for Chat {
    fn from(row: ChatRow) -> Self {
        Chat {
            id: row.id,
            match_id: row.match_id,
            last_message_at: row.last_message_at,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = chats)]
pub struct NewChatRow {
    pub match_id: Uuid,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = match_tombstones)]
pub struct NewTombstoneRow {
    pub user_a: Uuid,
    pub user_b: Uuid,
}

// --- Block ---

#[derive(Debug, Insertable)]
#[diesel(table_name = blocks)]
pub struct NewBlockRow {
    pub blocker_id: Uuid,
    pub blocked_id: Uuid,
}

// --- Report ---

#[derive(Debug, Queryable, Selectable, Identifiable, Clone)]
#[diesel(table_name = reports)]
pub struct ReportRow {
    pub id: Uuid,
    pub reporter_id: Uuid,
    pub reported_id: Uuid,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

impl From<ReportRow> for Report {
    fn from(row: ReportRow) -> Self {
        Report {
            id: row.id,
            reporter_id: row.reporter_id,
            reported_id: row.reported_id,
            reason: row.reason,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = reports)]
pub struct NewReportRow<'a> {
    pub reporter_id: Uuid,
    pub reported_id: Uuid,
    pub reason: &'a str,
}

// --- Request ---

#[derive(Debug, Queryable, Selectable, Identifiable, Clone)]
#[diesel(table_name = requests)]
pub struct RequestRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub related_interests: Vec<String>,
    pub status: String,
    pub max_participants: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<RequestRow> for MatchRequest {
    type Error = StoreError;

    fn try_from(row: RequestRow) -> Result<Self, Self::Error> {
        Ok(MatchRequest {
            id: row.id,
            owner_id: row.user_id,
            title: row.title,
            description: row.description,
            category: row.category,
            related_interests: row.related_interests,
            status: parse_column("requests.status", &row.status)?,
            max_participants: row.max_participants,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = requests)]
pub struct NewRequestRow<'a> {
    pub user_id: Uuid,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub category: &'a str,
    pub related_interests: &'a [String],
    pub status: &'a str,
    pub max_participants: Option<i32>,
}

/// Owner-editable request columns. `None` writes NULL.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = requests, treat_none_as_null = true)]
pub struct RequestChangeset<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub category: &'a str,
    pub related_interests: &'a [String],
    pub status: &'a str,
    pub max_participants: Option<i32>,
}

impl<'a> From<&'a MatchRequest> for RequestChangeset<'a> {
    fn from(r: &'a MatchRequest) -> Self {
        RequestChangeset {
            title: &r.title,
            description: r.description.as_deref(),
            category: &r.category,
            related_interests: &r.related_interests,
            status: r.status.as_str(),
            max_participants: r.max_participants,
        }
    }
}

#[derive(Debug, Queryable, Selectable, Identifiable, Clone)]
#[diesel(table_name = request_members)]
pub struct RequestMemberRow {
    pub id: Uuid,
    pub request_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<RequestMemberRow> for RequestMember {
    fn from(row: RequestMemberRow) -> Self {
        RequestMember {
            id: row.id,
            request_id: row.request_id,
            user_id: row.user_id,
            joined_at: row.created_at,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = request_members)]
pub struct NewRequestMemberRow {
    pub request_id: Uuid,
    pub user_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::profile::{Communication, WakeCycle};

    fn row() -> ProfileRow {
        ProfileRow {
            id: Uuid::new_v4(),
            name: "Asha".into(),
            branch: Some("Computer Science".into()),
            year: Some(3),
            interests: vec!["AI/ML".into()],
            hobbies: vec![],
            goals: vec![],
            personality_social_level: 6,
            personality_activity_level: 4,
            personality_communication: "vc".into(),
            personality_wake_cycle: "night-owl".into(),
            dating_mode: true,
            dating_preference: Some("everyone".into()),
            gender: Some("female".into()),
            onboarding_completed: true,
        }
    }

    #[test]
    fn profile_row_converts() {
        let profile = Profile::try_from(row()).unwrap();
        assert_eq!(profile.personality_communication, Communication::VoiceCall);
        assert_eq!(profile.personality_wake_cycle, WakeCycle::NightOwl);
        assert!(profile.dating_enabled);
        assert_eq!(profile.dating_preference, Some(DatingPreference::Everyone));
    }

    #[test]
    fn unknown_enum_value_is_corrupt() {
        let bad = ProfileRow {
            personality_wake_cycle: "sometimes".into(),
            ..row()
        };
        let err = Profile::try_from(bad).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(msg) if msg.contains("personality_wake_cycle")));
    }

    #[test]
    fn changeset_writes_wire_spellings() {
        let profile = Profile::try_from(row()).unwrap();
        let changeset = ProfileChangeset::from(&profile);
        assert_eq!(changeset.personality_communication, "vc");
        assert_eq!(changeset.personality_wake_cycle, "night-owl");
        assert_eq!(changeset.dating_preference.as_deref(), Some("everyone"));
        assert!(changeset.dating_mode);
    }

    #[test]
    fn like_row_kind_parses() {
        let row = LikeRow {
            id: Uuid::new_v4(),
            from_user: Uuid::new_v4(),
            to_user: Uuid::new_v4(),
            kind: "dating".into(),
            created_at: Utc::now(),
        };
        assert_eq!(LikeEvent::try_from(row).unwrap().kind, LikeKind::Dating);
    }
}
